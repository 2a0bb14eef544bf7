/// Register access to one probe.
///
/// Implementations are provided by the acquisition hardware layer. Every call is a blocking
/// round trip, and the caller must hold exclusive access to the probe's address for the whole
/// configuration sequence.
pub trait Transport {
    type Error: std::error::Error + Send + Sync + 'static;

    fn write_byte(&mut self, address: u32, value: u8) -> Result<(), Self::Error>;

    fn write_register(&mut self, address: u32, value: u32) -> Result<(), Self::Error>;

    fn read_register(&mut self, address: u32) -> Result<u32, Self::Error>;
}

pub type BoxedError = Box<dyn std::error::Error + Send + Sync>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Writing {value:#04X} to register {address:#06X} failed")]
    WriteByte {
        address: u32,
        value: u8,
        #[source]
        error: BoxedError,
    },

    #[error("Writing {value:#010X} to register {address:#06X} failed")]
    WriteRegister {
        address: u32,
        value: u32,
        #[source]
        error: BoxedError,
    },

    #[error("Reading register {address:#06X} failed")]
    ReadRegister {
        address: u32,
        #[source]
        error: BoxedError,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRegister {
    pub address: u32,
}

impl ByteRegister {
    pub const fn new(address: u32) -> Self {
        Self { address }
    }

    pub fn get<T: Transport>(&self, transport: &mut T) -> Result<u8, Error> {
        transport
            .read_register(self.address)
            .map(|value| (value & 0xFF) as u8)
            .map_err(|error| Error::ReadRegister {
                address: self.address,
                error: Box::new(error),
            })
    }

    pub fn set<T: Transport>(&self, transport: &mut T, value: u8) -> Result<(), Error> {
        transport
            .write_byte(self.address, value)
            .map_err(|error| Error::WriteByte {
                address: self.address,
                value,
                error: Box::new(error),
            })
    }
}

/// A bank of consecutive 32-bit registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterBank {
    pub base: u32,
}

impl RegisterBank {
    pub const fn new(base: u32) -> Self {
        Self { base }
    }

    pub fn address(&self, index: usize) -> u32 {
        self.base + index as u32
    }

    pub fn set<T: Transport>(
        &self,
        transport: &mut T,
        index: usize,
        value: u32,
    ) -> Result<(), Error> {
        let address = self.address(index);
        transport
            .write_register(address, value)
            .map_err(|error| Error::WriteRegister {
                address,
                value,
                error: Box::new(error),
            })
    }
}
