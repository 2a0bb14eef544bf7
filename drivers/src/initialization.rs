use crate::registers;
use crate::transport;

use registers::{CalibrationMode, OperationMode, RecordMode};
use transport::Transport;

/// Takes the probe from power-on to active recording.
pub fn initialize<T: Transport>(transport: &mut T) -> Result<(), transport::Error> {
    tracing::debug!("disabling calibration mode");
    registers::CAL_MOD.set(transport, CalibrationMode::Off as u8)?;
    registers::SYNC.set(transport, 0)?;
    tracing::debug!("resetting digital and channel logic");
    registers::REC_MOD.set(transport, RecordMode::DigitalAndChannelReset as u8)?;
    registers::OP_MODE.set(transport, OperationMode::Record as u8)?;
    tracing::debug!("starting acquisition");
    registers::REC_MOD.set(transport, RecordMode::Active as u8)?;
    Ok(())
}
