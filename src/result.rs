use core::fmt::Debug;

/// Error type
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E: Sized + Debug> {
    /// Wire was never released to high
    WireFault,
    /// No presence pulse after a bus reset
    NoPresence,
    /// CRC-8 mismatch, (computed, received)
    CrcMismatch(u8, u8),
    /// Sensor index outside the discovered table
    IndexOutOfBounds,
    PortError(E),
}

impl<E: Sized + Debug> From<E> for Error<E> {
    fn from(e: E) -> Self {
        Error::PortError(e)
    }
}
