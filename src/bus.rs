use crate::{Address, Error, OpCode, RomCommand, SearchState};
use core::fmt::Debug;

/// Transport abstraction over a shared single-wire bus.
///
/// Implementations provide the reset pulse and the single-bit time slots;
/// byte transfers, device selection and the ROM search are built on top of
/// those primitives and can be overridden by transports that handle them
/// natively.
///
/// The bus is an exclusive-access resource: a reset, select and the commands
/// that follow form one transaction, and interleaving transactions corrupts
/// addressing. No internal locking is provided.
pub trait Bus {
    type Error: Debug;

    /// Issues a reset pulse and listens for a presence pulse.
    ///
    /// Returns [`Error::NoPresence`] when no device asserts presence and
    /// [`Error::WireFault`] when the wire never reaches the high level,
    /// either of which signals a faulty or disconnected bus.
    fn reset(&mut self) -> Result<(), Error<Self::Error>>;

    fn write_bit(&mut self, bit: bool) -> Result<(), Error<Self::Error>>;

    fn read_bit(&mut self) -> Result<bool, Error<Self::Error>>;

    /// Writes a byte, least significant bit first.
    fn write_byte(&mut self, byte: u8) -> Result<(), Error<Self::Error>> {
        let mut byte = byte;
        for _ in 0..8 {
            self.write_bit(byte & 0x01 == 0x01)?;
            byte >>= 1;
        }
        Ok(())
    }

    /// Reads a byte, least significant bit first.
    fn read_byte(&mut self) -> Result<u8, Error<Self::Error>> {
        let mut byte = 0_u8;
        for _ in 0..8 {
            byte >>= 1;
            if self.read_bit()? {
                byte |= 0x80;
            }
        }
        Ok(byte)
    }

    fn read_bytes(&mut self, dst: &mut [u8]) -> Result<(), Error<Self::Error>> {
        for d in dst {
            *d = self.read_byte()?;
        }
        Ok(())
    }

    /// Addresses a single device for the commands that follow.
    /// Assumes a prior successful [`reset`](Bus::reset).
    fn select(&mut self, address: &Address) -> Result<(), Error<Self::Error>> {
        self.write_byte(RomCommand::MatchRom.op_code())?;
        for byte in address.as_ref() {
            self.write_byte(*byte)?;
        }
        Ok(())
    }

    /// Addresses every device on the bus at once.
    fn skip(&mut self) -> Result<(), Error<Self::Error>> {
        self.write_byte(RomCommand::SkipRom.op_code())
    }

    /// Advances the ROM search and yields the next candidate address.
    ///
    /// The sequence is lazy and finite; once `Ok(None)` is returned the
    /// search is exhausted and can only be restarted with a fresh
    /// [`SearchState`]. Candidates are not CRC-validated here, that is the
    /// caller's job.
    fn search_next(
        &mut self,
        search: &mut SearchState,
    ) -> Result<Option<Address>, Error<Self::Error>>
    where
        Self: Sized,
    {
        crate::search::advance(self, search, RomCommand::SearchRom)
    }
}
