pub mod base_configuration;
pub mod bits;
pub mod calibration;
pub mod codec;
pub mod configuration;
pub mod gain_correction;
pub mod initialization;
pub mod probe;
pub mod properties;
pub mod registers;
pub mod shift_register;
pub mod transport;

pub use calibration::Error as CalibrationError;
pub use codec::Error as CodecError;
pub use shift_register::Error as ShiftRegisterError;

pub use calibration::Calibration;
pub use configuration::{Configuration, Gain, Reference, PROPERTIES};
pub use probe::{Error, Probe};
pub use shift_register::Chain;
pub use transport::Transport;
