//! Translates symbolic device actions ("power on") into wire strings for
//! half-duplex serial devices and classifies the replies, driven by
//! per-device grammar documents.

pub mod config;
pub mod device;
pub mod serial;

pub use config::{
    resolve, CommandEntry, DeviceGrammar, EffectiveConfig, GrammarRegistry, Handshake,
};
pub use device::{CommandOutcome, DeviceError, DeviceSession};
pub use serial::{SerialInterface, SerialLink, SerialSettings};
