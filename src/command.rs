pub trait OpCode {
    fn op_code(&self) -> u8;
}

/// ROM level commands, addressed to the bus as a whole
#[derive(Clone, Copy, Debug)]
#[repr(u8)]
pub enum RomCommand {
    MatchRom = 0x55,
    SearchRom = 0xF0,
    SearchRomAlarmed = 0xEC,
    SkipRom = 0xCC,
    ReadRom = 0x33,
}

impl OpCode for RomCommand {
    fn op_code(&self) -> u8 {
        *self as _
    }
}

/// DS18B20 function commands, addressed to a selected device
#[derive(Clone, Copy, Debug)]
#[repr(u8)]
pub enum FunctionCommand {
    Convert = 0x44,
    WriteScratchpad = 0x4E,
    ReadScratchpad = 0xBE,
}

impl OpCode for FunctionCommand {
    fn op_code(&self) -> u8 {
        *self as _
    }
}
