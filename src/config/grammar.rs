//! Device grammar documents and the registry that holds them.
//!
//! A grammar describes one device: its transport defaults, its command and
//! action vocabulary, the tokens used to frame a request on the wire, and the
//! rules for classifying replies. Documents are JSON, one file per device id.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;

use crate::device::{DeviceError, Result};

/// One command alias with its wire token and action vocabulary.
#[derive(Debug, Clone, Deserialize)]
pub struct CommandEntry {
    pub command: String,
    pub actions: BTreeMap<String, String>,
}

/// Optional preliminary send/expect exchange, performed before every request.
/// A mismatched reply is advisory only and never fails the exchange.
#[derive(Debug, Clone, Deserialize)]
pub struct Handshake {
    pub send: String,
    pub wait: f64,
    pub expect: String,
}

/// Declarative description of one device.
#[derive(Debug, Clone, Deserialize)]
pub struct DeviceGrammar {
    /// Transport defaults, keyed by setting name. Values stay untyped here;
    /// the resolver validates and translates them.
    #[serde(default)]
    pub serial: Option<BTreeMap<String, Value>>,

    #[serde(default)]
    pub command_list: BTreeMap<String, CommandEntry>,

    #[serde(default)]
    pub left_surround: String,

    #[serde(default)]
    pub right_surround: String,

    // Older grammar files spell this key "seperator".
    #[serde(default, alias = "seperator")]
    pub separator: String,

    #[serde(default)]
    pub handshake: Option<Handshake>,

    /// Delay in seconds between sending a request and draining the reply.
    #[serde(default = "default_wait_time")]
    pub wait_time: f64,

    /// Exact trimmed reply -> human-readable meaning. Checked before the
    /// substring rules below.
    #[serde(default)]
    pub known_responses: BTreeMap<String, String>,

    /// Substring marking a rejected state transition.
    #[serde(default)]
    pub command_failed_message: Option<String>,

    /// Substring marking a device-side fault.
    #[serde(default)]
    pub exception_message: Option<String>,
}

fn default_wait_time() -> f64 {
    1.0
}

/// Immutable mapping from device id to grammar, loaded once at startup and
/// passed to the resolver by reference.
#[derive(Debug, Clone, Default)]
pub struct GrammarRegistry {
    grammars: BTreeMap<String, DeviceGrammar>,
}

impl GrammarRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every `*.json` document in `dir`; the file stem becomes the
    /// device id. Other files are ignored.
    pub fn load_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let mut registry = Self::new();
        for entry in fs::read_dir(dir.as_ref())? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(id) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let data = fs::read_to_string(&path)?;
            let grammar: DeviceGrammar = serde_json::from_str(&data).map_err(|e| {
                DeviceError::InvalidConfig(format!("grammar document for {id}: {e}"))
            })?;
            log::debug!("Loaded device grammar {} from {}", id, path.display());
            registry.grammars.insert(id.to_string(), grammar);
        }
        Ok(registry)
    }

    pub fn insert(&mut self, device_id: impl Into<String>, grammar: DeviceGrammar) {
        self.grammars.insert(device_id.into(), grammar);
    }

    pub fn get(&self, device_id: &str) -> Result<&DeviceGrammar> {
        self.grammars
            .get(device_id)
            .ok_or_else(|| DeviceError::ConfigMissing(device_id.to_string()))
    }

    pub fn device_ids(&self) -> impl Iterator<Item = &str> {
        self.grammars.keys().map(String::as_str)
    }
}
