pub mod grammar;
pub mod resolver;

pub use grammar::{CommandEntry, DeviceGrammar, GrammarRegistry, Handshake};
pub use resolver::{resolve, EffectiveConfig};
