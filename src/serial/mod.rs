pub mod interface;

pub use interface::SerialInterface;

use std::time::Duration;

use serialport::{DataBits, FlowControl, Parity, StopBits};

/// Fully resolved transport settings for one session.
///
/// Produced by the configuration resolver from a device grammar plus caller
/// overrides; never built by hand outside of tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialSettings {
    pub port: Option<String>,
    pub baud_rate: u32,
    pub data_bits: DataBits,
    pub parity: Parity,
    pub stop_bits: StopBits,
    pub flow_control: FlowControl,
    pub timeout: Duration,
}

impl Default for SerialSettings {
    fn default() -> Self {
        Self {
            port: None,
            baud_rate: 9600,
            data_bits: DataBits::Eight,
            parity: Parity::None,
            stop_bits: StopBits::One,
            flow_control: FlowControl::None,
            timeout: Duration::from_secs(1),
        }
    }
}

/// Byte-oriented duplex channel the session engine talks through.
///
/// [`SerialInterface`] implements this over a real port; tests substitute a
/// scripted double.
pub trait SerialLink: Send {
    /// Write all of `data` to the device.
    fn write_bytes(&mut self, data: &[u8]) -> Result<usize>;

    /// Read up to `buf.len()` bytes. Returns 0 when the channel's own read
    /// timeout elapses with nothing buffered.
    fn read_bytes(&mut self, buf: &mut [u8]) -> Result<usize>;

    /// Number of bytes currently buffered on the channel.
    fn bytes_available(&mut self) -> Result<usize>;
}

#[derive(Debug, thiserror::Error)]
pub enum SerialError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialport error: {0}")]
    SerialportError(#[from] serialport::Error),
}

pub type Result<T> = std::result::Result<T, SerialError>;
