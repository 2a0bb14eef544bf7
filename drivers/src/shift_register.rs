use crate::codec;
use crate::registers;
use crate::transport;

use transport::Transport;

/// The image is loaded this many times before the ASIC latches it.
pub const PASSES: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Chain {
    Shank,
    BaseEven,
    BaseOdd,
}

impl Chain {
    /// Base configuration chains in write order.
    pub const BASE: [Chain; 2] = [Chain::BaseEven, Chain::BaseOdd];

    pub fn register(self) -> transport::ByteRegister {
        match self {
            Chain::Shank => registers::SR_CHAIN1,
            Chain::BaseEven => registers::SR_CHAIN2,
            Chain::BaseOdd => registers::SR_CHAIN3,
        }
    }

    // The shank chain never reports success (ASIC defect), its status is not checked.
    pub fn verified(self) -> bool {
        !matches!(self, Chain::Shank)
    }
}

impl std::fmt::Display for Chain {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Chain::Shank => write!(formatter, "shank"),
            Chain::BaseEven => write!(formatter, "base (even channels)"),
            Chain::BaseOdd => write!(formatter, "base (odd channels)"),
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Shift register {chain} status check failed (status {status:#04X})")]
    VerificationFailed { chain: Chain, status: u8 },

    #[error(transparent)]
    Transport(#[from] transport::Error),
}

fn load<T: Transport>(
    transport: &mut T,
    chain: Chain,
    image: &codec::Image,
) -> Result<(), transport::Error> {
    let [low, high] = image.length().to_le_bytes();
    registers::SR_LENGTH1.set(transport, low)?;
    registers::SR_LENGTH2.set(transport, high)?;
    let register = chain.register();
    for byte in image.bytes() {
        register.set(transport, *byte)?;
    }
    Ok(())
}

/// Loads an image into one chain and checks that the ASIC accepted it.
///
/// A failure leaves the probe in an undefined state, the whole configuration sequence must be
/// run again.
pub fn write_chain<T: Transport>(
    transport: &mut T,
    chain: Chain,
    image: &codec::Image,
) -> Result<(), Error> {
    for pass in 0..PASSES {
        tracing::debug!(%chain, pass, length = image.length(), "loading shift register");
        load(transport, chain, image)?;
    }
    if chain.verified() {
        let status = registers::STATUS.get(transport)?;
        if status & registers::STATUS_SHIFT_REGISTER_SUCCESS == 0 {
            return Err(Error::VerificationFailed { chain, status });
        }
    }
    Ok(())
}

/// Writes the even then the odd base configuration chain, stopping at the first failure.
pub fn write_base_configuration<T: Transport>(
    transport: &mut T,
    images: &[codec::Image; 2],
) -> Result<(), Error> {
    for (chain, image) in Chain::BASE.iter().zip(images.iter()) {
        write_chain(transport, *chain, image)?;
    }
    Ok(())
}
