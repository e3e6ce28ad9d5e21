#![no_std]
#![doc = include_str!("../README.md")]

#[cfg(test)]
extern crate std;

mod address;
mod array;
mod bus;
mod clock;
mod command;
mod gpio;
mod result;
mod scratchpad;
mod search;

pub use address::Address;
pub use array::{Discovery, Ds18b20Array};
pub use bus::Bus;
pub use clock::Clock;
pub use command::{FunctionCommand, OpCode, RomCommand};
pub use gpio::GpioBus;
pub use result::Error;
pub use scratchpad::{Resolution, Scratchpad};
pub use search::SearchState;

/// DS18B20 family code, byte 0 of every sensor address.
pub const FAMILY_CODE: u8 = 0x28;

/// CRC-8 over `data` with the Dallas/Maxim polynomial (x^8+x^5+x^4+1).
pub fn crc8(data: &[u8]) -> u8 {
    compute_partial_crc8(0, data)
}

pub fn compute_partial_crc8(crc: u8, data: &[u8]) -> u8 {
    let mut crc = crc;
    for byte in data.iter() {
        let mut byte = *byte;
        for _ in 0..8 {
            let mix = (crc ^ byte) & 0x01;
            crc >>= 1;
            if mix != 0x00 {
                crc ^= 0x8C;
            }
            byte >>= 1;
        }
    }
    crc
}
