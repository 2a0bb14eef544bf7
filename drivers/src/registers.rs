use crate::transport::{ByteRegister, RegisterBank};

// probe ASIC registers
pub const OP_MODE: ByteRegister = ByteRegister::new(0x00);
pub const REC_MOD: ByteRegister = ByteRegister::new(0x01);
pub const CAL_MOD: ByteRegister = ByteRegister::new(0x02);
pub const STATUS: ByteRegister = ByteRegister::new(0x08);
pub const SYNC: ByteRegister = ByteRegister::new(0x09);
pub const SR_CHAIN3: ByteRegister = ByteRegister::new(0x0C); // odd channels
pub const SR_CHAIN2: ByteRegister = ByteRegister::new(0x0D); // even channels
pub const SR_CHAIN1: ByteRegister = ByteRegister::new(0x0E); // shank
pub const SR_LENGTH2: ByteRegister = ByteRegister::new(0x0F); // length high byte
pub const SR_LENGTH1: ByteRegister = ByteRegister::new(0x10); // length low byte

// headstage registers
pub const ADC_OFFSET_THRESHOLD: RegisterBank = RegisterBank::new(0x8001); // indexed by even ADC
pub const CHANNEL_LFP_GAIN: RegisterBank = RegisterBank::new(0x8021); // indexed by channel
pub const CHANNEL_AP_GAIN: RegisterBank = RegisterBank::new(0x81A1); // indexed by channel

pub const STATUS_SHIFT_REGISTER_SUCCESS: u8 = 1 << 7;

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalibrationMode {
    Off = 0x00,
}

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordMode {
    DigitalAndChannelReset = 0x00,
    Active = 0x80,
}

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationMode {
    Record = 0x20,
}
