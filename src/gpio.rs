use crate::{Bus, Error};
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};

/// Bit-banged single-wire transport over one open-drain capable GPIO pin.
///
/// The delay provider is only used for the protocol time slots; conversion
/// waiting is never done here.
pub struct GpioBus<P, D> {
    pin: P,
    delay: D,
}

impl<P, D> GpioBus<P, D>
where
    P: InputPin + OutputPin,
    D: DelayNs,
{
    pub fn new(pin: P, delay: D) -> Self {
        GpioBus { pin, delay }
    }

    pub fn release(self) -> (P, D) {
        (self.pin, self.delay)
    }

    fn ensure_wire_high(&mut self) -> Result<(), Error<P::Error>> {
        for _ in 0..125 {
            if self.pin.is_high()? {
                return Ok(());
            }
            self.delay.delay_us(2);
        }
        Err(Error::WireFault)
    }
}

impl<P, D> Bus for GpioBus<P, D>
where
    P: InputPin + OutputPin,
    D: DelayNs,
{
    type Error = P::Error;

    /// Performs a reset and listens for a presence pulse.
    /// Returns Err(WireFault) if the wire seems to be shortened,
    /// Ok(()) if a presence pulse has been received and Err(NoPresence)
    /// if no device was detected but the wire seems to be ok.
    fn reset(&mut self) -> Result<(), Error<P::Error>> {
        self.pin.set_high()?;
        self.ensure_wire_high()?;

        self.pin.set_low()?;
        self.delay.delay_us(480);
        self.pin.set_high()?;

        let mut presence = false;
        for _ in 0..7 {
            self.delay.delay_us(10);
            presence |= self.pin.is_low()?;
        }
        self.delay.delay_us(410);
        if presence {
            Ok(())
        } else {
            Err(Error::NoPresence)
        }
    }

    fn write_bit(&mut self, bit: bool) -> Result<(), Error<P::Error>> {
        self.pin.set_low()?;
        self.delay.delay_us(if bit { 10 } else { 65 });
        self.pin.set_high()?;
        self.delay.delay_us(if bit { 55 } else { 5 });
        Ok(())
    }

    fn read_bit(&mut self) -> Result<bool, Error<P::Error>> {
        self.pin.set_low()?;
        self.delay.delay_us(3);
        self.pin.set_high()?;
        self.delay.delay_us(2);
        let bit = self.pin.is_high()?;
        self.delay.delay_us(61);
        Ok(bit)
    }
}
