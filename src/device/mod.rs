pub mod session;

pub use session::{CommandOutcome, DeviceSession};

#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    /// No grammar document exists for the requested device id. Fatal to
    /// session construction.
    #[error("No device grammar found for \"{0}\"")]
    ConfigMissing(String),

    /// The grammar is structurally incomplete or references transport
    /// settings the serial layer does not recognize. Fatal to construction.
    #[error("Invalid device configuration: {0}")]
    InvalidConfig(String),

    /// Unknown command, or an action not valid for that command. Fails the
    /// single call; the session stays usable.
    #[error("Invalid command: {0}")]
    InvalidCommand(String),

    /// The device reply signals a rejected or invalid state transition.
    #[error("Command failed: {message} (response: {response:?})")]
    CommandFailed { message: String, response: String },

    /// The device reply signals an internal device-side fault.
    #[error("Command raised an exception on the device (response: {response:?})")]
    CommandException { response: String },

    #[error("Serial communication error: {0}")]
    Serial(#[from] crate::serial::SerialError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, DeviceError>;
