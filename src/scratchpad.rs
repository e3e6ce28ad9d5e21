use crate::Error;
use byteorder::{ByteOrder, LittleEndian};
use core::fmt::Debug;

/// Measurement resolution, as written to the configuration register.
///
/// Each level trades conversion latency for precision; the low raw bits
/// that a level leaves undefined are cleared during decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Resolution {
    Bits9 = 0x1F,
    Bits10 = 0x3F,
    Bits11 = 0x5F,
    #[default]
    Bits12 = 0x7F,
}

impl Resolution {
    /// Worst-case conversion latency in milliseconds.
    pub fn latency_ms(&self) -> u64 {
        match self {
            Resolution::Bits9 => 110,
            Resolution::Bits10 => 200,
            Resolution::Bits11 => 400,
            Resolution::Bits12 => 800,
        }
    }

    pub(crate) fn config_byte(&self) -> u8 {
        *self as _
    }

    /// Resolution encoded in bits 5..6 of scratchpad byte 4.
    fn from_config(byte: u8) -> Self {
        match byte & 0x60 {
            0x00 => Resolution::Bits9,
            0x20 => Resolution::Bits10,
            0x40 => Resolution::Bits11,
            _ => Resolution::Bits12,
        }
    }

    /// Mask clearing the raw bits left undefined at this resolution.
    fn undefined_bits_mask(&self) -> i16 {
        match self {
            Resolution::Bits9 => !0b111,
            Resolution::Bits10 => !0b11,
            Resolution::Bits11 => !0b1,
            Resolution::Bits12 => !0,
        }
    }
}

/// The 9-byte scratchpad as read from a sensor.
///
/// Bytes 0..1 hold the raw two's-complement reading, byte 4 the
/// configuration register, byte 8 a CRC-8 over bytes 0..7.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Scratchpad {
    raw: [u8; Self::BYTES],
}

impl Scratchpad {
    pub const BYTES: usize = 9;

    pub fn crc_valid(&self) -> bool {
        crate::crc8(&self.raw[..8]) == self.raw[8]
    }

    pub fn ensure_crc_valid<E: Debug>(&self) -> Result<(), Error<E>> {
        let computed = crate::crc8(&self.raw[..8]);
        if computed != self.raw[8] {
            Err(Error::CrcMismatch(computed, self.raw[8]))
        } else {
            Ok(())
        }
    }

    /// The resolution the sensor reports for this conversion.
    ///
    /// Decoding trusts this over any cached per-sensor resolution, which
    /// keeps readings correct even when the cached value is stale.
    pub fn resolution(&self) -> Resolution {
        Resolution::from_config(self.raw[4])
    }

    /// Raw reading with the resolution-dependent undefined bits cleared.
    pub fn raw_temperature(&self) -> i16 {
        LittleEndian::read_i16(&self.raw[0..2]) & self.resolution().undefined_bits_mask()
    }

    /// Calibrated reading in degrees Celsius.
    pub fn temperature(&self) -> f32 {
        self.raw_temperature() as f32 / 16.0
    }
}

impl From<[u8; Self::BYTES]> for Scratchpad {
    fn from(raw: [u8; Self::BYTES]) -> Self {
        Scratchpad { raw }
    }
}

impl AsRef<[u8]> for Scratchpad {
    fn as_ref(&self) -> &[u8] {
        &self.raw
    }
}

#[cfg(test)]
mod tests {
    use super::{Resolution, Scratchpad};
    use crate::{crc8, Error};

    fn scratchpad(raw: i16, config: u8) -> Scratchpad {
        let mut data = [0_u8; Scratchpad::BYTES];
        data[0..2].copy_from_slice(&raw.to_le_bytes());
        data[4] = config;
        data[8] = crc8(&data[..8]);
        Scratchpad::from(data)
    }

    #[test]
    fn latency_table() {
        assert_eq!(Resolution::Bits9.latency_ms(), 110);
        assert_eq!(Resolution::Bits10.latency_ms(), 200);
        assert_eq!(Resolution::Bits11.latency_ms(), 400);
        assert_eq!(Resolution::Bits12.latency_ms(), 800);
    }

    #[test]
    fn decodes_full_resolution_reading() {
        let pad = scratchpad(200, Resolution::Bits12.config_byte());
        assert!(pad.crc_valid());
        assert_eq!(pad.resolution(), Resolution::Bits12);
        assert_eq!(pad.raw_temperature(), 200);
        assert_eq!(pad.temperature(), 12.5);
    }

    #[test]
    fn masks_undefined_bits_at_reduced_resolution() {
        let pad = scratchpad(0b1111, Resolution::Bits9.config_byte());
        assert_eq!(pad.raw_temperature(), 0b1000);
        assert_eq!(pad.temperature(), 0.5);

        let pad = scratchpad(0b1111, Resolution::Bits10.config_byte());
        assert_eq!(pad.raw_temperature(), 0b1100);

        let pad = scratchpad(0b1111, Resolution::Bits11.config_byte());
        assert_eq!(pad.raw_temperature(), 0b1110);
    }

    #[test]
    fn decodes_negative_reading() {
        // -10.125 °C, from the DS18B20 datasheet temperature table
        let pad = scratchpad(0xFF5E_u16 as i16, Resolution::Bits12.config_byte());
        assert_eq!(pad.temperature(), -10.125);
    }

    #[test]
    fn masking_keeps_sign() {
        let pad = scratchpad(-1, Resolution::Bits9.config_byte());
        assert_eq!(pad.raw_temperature(), -8);
        assert_eq!(pad.temperature(), -0.5);
    }

    #[test]
    fn rejects_corrupted_scratchpad() {
        let mut data: [u8; 9] = scratchpad(200, 0x7F).raw;
        data[1] ^= 0x10;
        let pad = Scratchpad::from(data);
        assert!(!pad.crc_valid());
        assert!(matches!(
            pad.ensure_crc_valid::<()>(),
            Err(Error::CrcMismatch(_, _))
        ));
    }
}
