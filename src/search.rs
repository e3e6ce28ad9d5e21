use crate::{Address, Bus, Error, OpCode, RomCommand};

#[derive(Debug, Clone, Copy, PartialEq, Default)]
enum Phase {
    #[default]
    Started,
    DeviceFound,
    Exhausted,
}

/// Cursor of an in-progress ROM search.
///
/// Holds the last returned address and the bit positions where more than one
/// device answered, so the next pass can walk a different branch. A finished
/// search is not restartable, construct a new state instead.
#[derive(Clone, Default)]
pub struct SearchState {
    address: [u8; Address::BYTES as usize],
    discrepancies: [u8; Address::BYTES as usize],
    phase: Phase,
}

impl SearchState {
    pub fn new() -> SearchState {
        SearchState::default()
    }

    fn address_bit(&self, bit: u8) -> bool {
        bit_set(&self.address, bit)
    }

    fn write_address_bit(&mut self, bit: u8, value: bool) {
        if value {
            set_bit(&mut self.address, bit);
        } else {
            clear_bit(&mut self.address, bit);
        }
    }

    fn set_discrepancy_bit(&mut self, bit: u8) {
        set_bit(&mut self.discrepancies, bit);
    }

    fn clear_discrepancy_bit(&mut self, bit: u8) {
        clear_bit(&mut self.discrepancies, bit);
    }

    fn last_discrepancy(&self) -> Option<u8> {
        (0..Address::BITS)
            .filter(|bit| bit_set(&self.discrepancies, *bit))
            .last()
    }
}

fn bit_set(array: &[u8; 8], bit: u8) -> bool {
    array[(bit / 8) as usize] & (0x01 << (bit % 8)) != 0x00
}

fn set_bit(array: &mut [u8; 8], bit: u8) {
    array[(bit / 8) as usize] |= 0x01 << (bit % 8);
}

fn clear_bit(array: &mut [u8; 8], bit: u8) {
    array[(bit / 8) as usize] &= !(0x01 << (bit % 8));
}

/// One pass of the ROM search algorithm.
///
/// Heavily inspired by https://github.com/ntruchsess/arduino-OneWire/blob/85d1aae63ea4919c64151e03f7e24c2efbc40198/OneWire.cpp#L362
///
/// An empty bus (no presence pulse) ends the search instead of failing, a
/// wire fault or port error is propagated.
pub(crate) fn advance<B: Bus>(
    bus: &mut B,
    state: &mut SearchState,
    cmd: RomCommand,
) -> Result<Option<Address>, Error<B::Error>> {
    if state.phase == Phase::Exhausted {
        return Ok(None);
    }

    let mut discrepancy_found = false;
    let last_discrepancy = state.last_discrepancy();

    match bus.reset() {
        Ok(()) => {}
        Err(Error::NoPresence) => return Ok(None),
        Err(error) => return Err(error),
    }

    bus.write_byte(cmd.op_code())?;

    if let Some(last_discrepancy) = last_discrepancy {
        // walk previous path
        for i in 0..last_discrepancy {
            let bit0 = bus.read_bit()?;
            let bit1 = bus.read_bit()?;

            if bit0 && bit1 {
                // no device responded
                return Ok(None);
            } else {
                let bit = state.address_bit(i);
                bus.write_bit(bit)?;
            }
        }
    } else {
        // no discrepancy and device found, meaning the one found is the only one
        if state.phase == Phase::DeviceFound {
            state.phase = Phase::Exhausted;
            return Ok(None);
        }
    }

    for i in last_discrepancy.unwrap_or(0)..Address::BITS {
        let bit0 = bus.read_bit()?; // normal bit
        let bit1 = bus.read_bit()?; // complementar bit

        if last_discrepancy.eq(&Some(i)) {
            // be sure to go different path from before (go second path, thus writing 1)
            state.clear_discrepancy_bit(i);
            state.write_address_bit(i, true);
            bus.write_bit(true)?;
        } else {
            if bit0 && bit1 {
                // no response received
                return Ok(None);
            }

            if !bit0 && !bit1 {
                // addresses with 0 and 1
                // found new path, go first path by default (thus writing 0)
                discrepancy_found |= true;
                state.set_discrepancy_bit(i);
                state.write_address_bit(i, false);
                bus.write_bit(false)?;
            } else {
                // addresses only with bit0
                state.write_address_bit(i, bit0);
                bus.write_bit(bit0)?;
            }
        }
    }

    if !discrepancy_found && state.last_discrepancy().is_none() {
        state.phase = Phase::Exhausted;
    } else {
        state.phase = Phase::DeviceFound;
    }
    Ok(Some(Address::from(state.address)))
}
