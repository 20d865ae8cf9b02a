#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use beamlink::serial::{self, SerialLink};
use beamlink::{resolve, DeviceGrammar, EffectiveConfig, GrammarRegistry};

/// Scripted stand-in for a serial port: replays a canned reply and records
/// everything the engine writes.
pub struct ScriptedLink {
    reply: Vec<u8>,
    pos: usize,
    written: Arc<Mutex<Vec<u8>>>,
}

impl ScriptedLink {
    /// Returns the link plus a handle to the bytes written through it.
    pub fn new(reply: &[u8]) -> (Self, Arc<Mutex<Vec<u8>>>) {
        let written = Arc::new(Mutex::new(Vec::new()));
        (
            Self {
                reply: reply.to_vec(),
                pos: 0,
                written: written.clone(),
            },
            written,
        )
    }
}

impl SerialLink for ScriptedLink {
    fn write_bytes(&mut self, data: &[u8]) -> serial::Result<usize> {
        self.written.lock().unwrap().extend_from_slice(data);
        Ok(data.len())
    }

    fn read_bytes(&mut self, buf: &mut [u8]) -> serial::Result<usize> {
        let n = buf.len().min(self.reply.len() - self.pos);
        buf[..n].copy_from_slice(&self.reply[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }

    fn bytes_available(&mut self) -> serial::Result<usize> {
        Ok(self.reply.len() - self.pos)
    }
}

pub fn registry_with(device_id: &str, document: serde_json::Value) -> GrammarRegistry {
    let grammar: DeviceGrammar = serde_json::from_value(document).expect("grammar document");
    let mut registry = GrammarRegistry::new();
    registry.insert(device_id, grammar);
    registry
}

pub fn effective(device_id: &str, document: serde_json::Value) -> EffectiveConfig {
    let registry = registry_with(device_id, document);
    resolve(&registry, device_id, &BTreeMap::new()).expect("resolve")
}
