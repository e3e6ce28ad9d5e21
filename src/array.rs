use crate::{
    Address, Bus, Clock, Error, FunctionCommand, OpCode, Resolution, Scratchpad, SearchState,
    FAMILY_CODE,
};
use heapless::Vec;

/// Ready timestamp meaning "no conversion in flight".
const NO_CONVERSION: u64 = u64::MAX;

#[derive(Debug, Clone, Copy)]
struct Sensor {
    address: Address,
    resolution: Resolution,
    last_temperature: f32,
    ready_at_ms: u64,
}

impl Sensor {
    fn new(address: Address) -> Self {
        Sensor {
            address,
            resolution: Resolution::Bits12,
            last_temperature: 0.0,
            ready_at_ms: NO_CONVERSION,
        }
    }
}

/// Outcome of a successful discovery pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Discovery {
    /// Number of sensors now in the table.
    pub count: usize,
    /// The table filled up before the bus ran out of candidates.
    pub truncated: bool,
}

/// Driver for all DS18B20 sensors sharing one bus.
///
/// Owns the transport, the clock and a table of up to `N` sensors filled
/// once by [`discover`](Ds18b20Array::discover). Indices into the table stay
/// stable for the lifetime of the driver.
///
/// Measurements are scheduled without blocking: starting a conversion only
/// records when the sensor will be done, and the caller's own loop polls
/// [`is_ready`](Ds18b20Array::is_ready) or simply reads
/// [`temperature`](Ds18b20Array::temperature), which hands back the previous
/// value until a fresh conversion has finished.
pub struct Ds18b20Array<B, C, const N: usize> {
    bus: B,
    clock: C,
    sensors: Vec<Sensor, N>,
}

impl<B: Bus, C: Clock, const N: usize> Ds18b20Array<B, C, N> {
    pub fn new(bus: B, clock: C) -> Self {
        Ds18b20Array {
            bus,
            clock,
            sensors: Vec::new(),
        }
    }

    /// Searches the bus and fills the sensor table.
    ///
    /// Candidates whose family code is not the DS18B20's are skipped, mixed
    /// buses are expected. A candidate with a bad address checksum fails the
    /// whole pass since the bus can no longer be trusted. When the table
    /// fills up before the bus runs out of candidates the pass still
    /// succeeds, with [`Discovery::truncated`] set. An empty bus is a
    /// success with `count == 0`.
    pub fn discover(&mut self) -> Result<Discovery, Error<B::Error>> {
        self.sensors.clear();
        let mut search = SearchState::new();

        while let Some(candidate) = self.bus.search_next(&mut search)? {
            if self.sensors.is_full() {
                #[cfg(feature = "defmt")]
                defmt::warn!("sensor table full, discovery stopped early");
                return Ok(Discovery {
                    count: self.sensors.len(),
                    truncated: true,
                });
            }

            if let Err(error) = candidate.ensure_crc_valid() {
                #[cfg(feature = "defmt")]
                defmt::error!("candidate address failed CRC check, check the bus");
                return Err(error);
            }

            if candidate.family_code() != FAMILY_CODE {
                continue;
            }

            // cannot fail, fullness was checked above
            self.sensors.push(Sensor::new(candidate)).ok();
        }

        #[cfg(feature = "defmt")]
        defmt::debug!("discovery found {} sensors", self.sensors.len());
        Ok(Discovery {
            count: self.sensors.len(),
            truncated: false,
        })
    }

    /// Number of discovered sensors.
    pub fn len(&self) -> usize {
        self.sensors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sensors.is_empty()
    }

    pub fn address(&self, index: usize) -> Option<&Address> {
        self.sensors.get(index).map(|sensor| &sensor.address)
    }

    pub fn resolution(&self, index: usize) -> Option<Resolution> {
        self.sensors.get(index).map(|sensor| sensor.resolution)
    }

    /// Last successfully decoded temperature, 0.0 before any read.
    pub fn last_temperature(&self, index: usize) -> Option<f32> {
        self.sensors.get(index).map(|sensor| sensor.last_temperature)
    }

    /// Writes the configuration register of one sensor and caches the new
    /// resolution. An in-flight conversion is neither started nor
    /// invalidated by this.
    pub fn set_resolution(
        &mut self,
        index: usize,
        resolution: Resolution,
    ) -> Result<(), Error<B::Error>> {
        let address = self.sensor(index)?.address;

        self.reset_bus()?;
        self.bus.select(&address)?;
        self.bus.write_byte(FunctionCommand::WriteScratchpad.op_code())?;
        self.bus.write_byte(0x00)?; // alarm high
        self.bus.write_byte(0x00)?; // alarm low
        self.bus.write_byte(resolution.config_byte())?;

        self.sensors[index].resolution = resolution;
        Ok(())
    }

    /// Starts a conversion and records when it will be done.
    ///
    /// Starting again while a conversion is in flight just moves the ready
    /// time; the physical conversion is idempotent, so no queueing is done.
    pub fn start_measurement(&mut self, index: usize) -> Result<(), Error<B::Error>> {
        let sensor = *self.sensor(index)?;

        self.reset_bus()?;
        self.bus.select(&sensor.address)?;
        self.bus.write_byte(FunctionCommand::Convert.op_code())?;

        self.sensors[index].ready_at_ms = self.clock.now_ms() + sensor.resolution.latency_ms();
        Ok(())
    }

    /// Whether the sensor's conversion has finished.
    /// Silently false for an out-of-bounds index.
    pub fn is_ready(&mut self, index: usize) -> bool {
        match self.sensors.get(index) {
            Some(sensor) => self.clock.now_ms() >= sensor.ready_at_ms,
            None => false,
        }
    }

    /// Reads the temperature of one sensor in degrees Celsius.
    ///
    /// Before the conversion is done this succeeds with the previous cached
    /// value, so periodic polling needs no explicit readiness check. A
    /// scratchpad checksum failure leaves the cache untouched and surfaces
    /// as [`Error::CrcMismatch`], the caller decides on retries.
    pub fn temperature(&mut self, index: usize) -> Result<f32, Error<B::Error>> {
        let sensor = *self.sensor(index)?;

        if self.clock.now_ms() < sensor.ready_at_ms {
            #[cfg(feature = "defmt")]
            defmt::debug!("sensor {} not ready, returning previous measurement", index);
            return Ok(sensor.last_temperature);
        }

        self.reset_bus()?;
        self.bus.select(&sensor.address)?;
        self.bus.write_byte(FunctionCommand::ReadScratchpad.op_code())?;

        let mut data = [0_u8; Scratchpad::BYTES];
        self.bus.read_bytes(&mut data)?;
        let scratchpad = Scratchpad::from(data);
        if let Err(error) = scratchpad.ensure_crc_valid() {
            #[cfg(feature = "defmt")]
            defmt::error!("scratchpad failed CRC check, check the bus");
            return Err(error);
        }

        let temperature = scratchpad.temperature();
        self.sensors[index].last_temperature = temperature;
        Ok(temperature)
    }

    fn sensor(&self, index: usize) -> Result<&Sensor, Error<B::Error>> {
        self.sensors.get(index).ok_or_else(|| {
            #[cfg(feature = "defmt")]
            defmt::error!("sensor index {} out of bounds", index);
            Error::IndexOutOfBounds
        })
    }

    fn reset_bus(&mut self) -> Result<(), Error<B::Error>> {
        let result = self.bus.reset();
        #[cfg(feature = "defmt")]
        if result.is_err() {
            defmt::error!("bus reset failed, the lines may be shorted or a sensor is malfunctioning");
        }
        result
    }
}
