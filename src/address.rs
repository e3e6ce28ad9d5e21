use crate::Error;
use core::{
    fmt::{Debug, Display, Formatter, Result as FmtResult},
    ops::{Deref, DerefMut},
    str::FromStr,
};

/// 64-bit device address: family code in byte 0, six serial bytes,
/// CRC-8 over bytes 0..7 in byte 7.
#[derive(Debug, Clone, Copy, PartialOrd, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(transparent)]
pub struct Address {
    raw: [u8; Self::BYTES as usize],
}

impl Default for Address {
    fn default() -> Self {
        Self::from([0; Self::BYTES as usize])
    }
}

impl From<[u8; Self::BYTES as usize]> for Address {
    fn from(raw: [u8; Self::BYTES as usize]) -> Self {
        Address { raw }
    }
}

impl From<Address> for [u8; Address::BYTES as usize] {
    fn from(addr: Address) -> [u8; Address::BYTES as usize] {
        addr.raw
    }
}

impl From<u64> for Address {
    fn from(raw: u64) -> Self {
        Address {
            raw: raw.to_le_bytes(),
        }
    }
}

impl From<Address> for u64 {
    fn from(addr: Address) -> u64 {
        u64::from_le_bytes(addr.raw)
    }
}

impl Deref for Address {
    type Target = [u8; Self::BYTES as usize];

    fn deref(&self) -> &Self::Target {
        &self.raw
    }
}

impl DerefMut for Address {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.raw
    }
}

impl AsRef<[u8]> for Address {
    fn as_ref(&self) -> &[u8] {
        self.deref() as _
    }
}

impl AsMut<[u8]> for Address {
    fn as_mut(&mut self) -> &mut [u8] {
        self.deref_mut() as _
    }
}

impl Address {
    /// The length of device address in bytes
    pub const BYTES: u8 = 8;

    /// The length of device address in bits
    pub const BITS: u8 = Self::BYTES * 8;

    pub fn family_code(&self) -> u8 {
        self[0]
    }

    /// The six unique serial bytes between family code and checksum
    pub fn serial(&self) -> &[u8] {
        &self.raw[1..7]
    }

    pub fn crc_valid(&self) -> bool {
        crate::crc8(&self.raw[..7]) == self.raw[7]
    }

    pub fn ensure_crc_valid<E: Debug>(&self) -> Result<(), Error<E>> {
        let computed = crate::crc8(&self.raw[..7]);
        if computed != self.raw[7] {
            Err(Error::CrcMismatch(computed, self.raw[7]))
        } else {
            Ok(())
        }
    }
}

/// Error type
#[derive(Debug)]
pub enum AddressError {
    NotEnough,
    Invalid,
}

fn hex_to_u8(c: char) -> Option<u8> {
    if c.is_ascii_digit() {
        Some((c as u32 - '0' as u32) as _)
    } else if ('a'..='f').contains(&c) {
        Some((c as u32 - 'a' as u32 + 10) as _)
    } else if ('A'..='F').contains(&c) {
        Some((c as u32 - 'A' as u32 + 10) as _)
    } else {
        None
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut addr = Address::default();
        let mut chars = s.chars().filter(|c| !c.is_whitespace() && *c != ':');

        for i in 0..Self::BYTES as usize {
            match (chars.next(), chars.next()) {
                (Some(h), Some(l)) => match (hex_to_u8(h), hex_to_u8(l)) {
                    (Some(h), Some(l)) => {
                        addr[i] = (h << 4) | l;
                    }
                    _ => return Err(AddressError::Invalid),
                },
                _ => return Err(AddressError::NotEnough),
            }
        }

        Ok(addr)
    }
}

impl Display for Address {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            self[0], self[1], self[2], self[3], self[4], self[5], self[6], self[7],
        )
    }
}

#[cfg(test)]
mod test {
    use super::Address;
    use crate::{crc8, Error, FAMILY_CODE};

    fn valid_address(serial: u8) -> Address {
        let mut raw = [FAMILY_CODE, serial, 0x64, 0x1e, 0x0f, 0x3c, 0x00, 0x00];
        raw[7] = crc8(&raw[..7]);
        Address::from(raw)
    }

    #[test]
    fn parse_address() {
        let addr: Address = "01228ff908000168".parse().unwrap();

        assert_eq!(
            addr,
            Address::from([0x01, 0x22, 0x8f, 0xf9, 0x08, 0x00, 0x01, 0x68])
        );
    }

    #[test]
    fn parse_address_space_separated() {
        let addr: Address = "01 22 8f f9 08 00 01 68".parse().unwrap();

        assert_eq!(
            addr,
            Address::from([0x01, 0x22, 0x8f, 0xf9, 0x08, 0x00, 0x01, 0x68])
        );
    }

    #[test]
    fn parse_address_colon_separated() {
        let addr: Address = "01:22:8f:f9:08:00:01:68".parse().unwrap();

        assert_eq!(
            addr,
            Address::from([0x01, 0x22, 0x8f, 0xf9, 0x08, 0x00, 0x01, 0x68])
        );
    }

    #[test]
    fn checksum_accepts_consistent_address() {
        let addr = valid_address(0xa5);
        assert!(addr.crc_valid());
        assert!(addr.ensure_crc_valid::<()>().is_ok());
    }

    #[test]
    fn checksum_rejects_corrupted_serial() {
        let mut addr = valid_address(0xa5);
        addr[3] ^= 0x01;
        assert!(!addr.crc_valid());
        assert!(matches!(
            addr.ensure_crc_valid::<()>(),
            Err(Error::CrcMismatch(_, _))
        ));
    }

    #[test]
    fn appending_checksum_zeroes_running_crc() {
        let addr = valid_address(0x42);
        assert_eq!(crc8(addr.as_ref()), 0);
    }

    #[test]
    fn u64_round_trip_is_little_endian() {
        let addr = valid_address(0x7b);
        let raw: u64 = addr.into();
        assert_eq!(raw & 0xff, u64::from(addr.family_code()));
        assert_eq!(Address::from(raw), addr);
    }
}
