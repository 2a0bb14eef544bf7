use crate::bits;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Shift register data is empty")]
    Empty,

    #[error("Shift register data is {0} bytes long (the length registers hold at most 65535)")]
    TooLong(usize),
}

const fn reverse(byte: u8) -> u8 {
    let mut reversed = 0;
    let mut index = 0;
    while index < 8 {
        reversed |= ((byte >> index) & 1) << (7 - index);
        index += 1;
    }
    reversed
}

const fn reversed_table() -> [u8; 256] {
    let mut table = [0; 256];
    let mut byte = 0;
    while byte < 256 {
        table[byte] = reverse(byte as u8);
        byte += 1;
    }
    table
}

const REVERSED: [u8; 256] = reversed_table();

/// Mirrors the bits of a byte (bit 0 ↔ bit 7, bit 1 ↔ bit 6...).
pub fn reverse_bits(byte: u8) -> u8 {
    REVERSED[byte as usize]
}

/// Bytes in shift-register order, ready to be streamed to a chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    bytes: Vec<u8>,
}

impl Image {
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, Error> {
        if bytes.is_empty() {
            return Err(Error::Empty);
        }
        if bytes.len() > u16::MAX as usize {
            return Err(Error::TooLong(bytes.len()));
        }
        Ok(Self { bytes })
    }

    /// The length announced to the length registers.
    pub fn length(&self) -> u16 {
        self.bytes.len() as u16
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

// Bits are packed low bit first, but the shift registers consume each byte most significant bit
// first, hence the per-byte reversal.
pub fn encode(bits: &bits::Bits) -> Result<Image, Error> {
    if bits.is_empty() {
        return Err(Error::Empty);
    }
    Image::from_bytes(
        bits.as_raw_slice()
            .iter()
            .map(|byte| reverse_bits(*byte))
            .collect(),
    )
}
