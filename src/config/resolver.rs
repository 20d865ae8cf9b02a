//! Merges a device grammar with caller overrides into typed transport
//! settings. Resolution is pure; the port is opened elsewhere.

use std::collections::BTreeMap;
use std::time::Duration;

use once_cell::sync::Lazy;
use serde_json::Value;
use serialport::{DataBits, FlowControl, Parity, StopBits};

use super::grammar::{DeviceGrammar, GrammarRegistry};
use crate::device::{DeviceError, Result};
use crate::serial::SerialSettings;

/// Transport setting names the serial layer understands.
const RECOGNIZED_SETTINGS: &[&str] = &[
    "port", "baudrate", "bytesize", "parity", "stopbits", "timeout", "xonxoff", "rtscts",
];

static BYTESIZE_TABLE: Lazy<BTreeMap<u64, DataBits>> = Lazy::new(|| {
    BTreeMap::from([
        (5, DataBits::Five),
        (6, DataBits::Six),
        (7, DataBits::Seven),
        (8, DataBits::Eight),
    ])
});

static PARITY_TABLE: Lazy<BTreeMap<&'static str, Parity>> = Lazy::new(|| {
    BTreeMap::from([
        ("none", Parity::None),
        ("even", Parity::Even),
        ("odd", Parity::Odd),
    ])
});

static STOPBITS_TABLE: Lazy<BTreeMap<u64, StopBits>> =
    Lazy::new(|| BTreeMap::from([(1, StopBits::One), (2, StopBits::Two)]));

/// The resolved (grammar + overrides) pair used for one session.
#[derive(Debug, Clone)]
pub struct EffectiveConfig {
    pub settings: SerialSettings,
    pub grammar: DeviceGrammar,
}

/// Resolve the grammar for `device_id`, apply `overrides` over its `serial`
/// section and translate the merged map into [`SerialSettings`].
pub fn resolve(
    registry: &GrammarRegistry,
    device_id: &str,
    overrides: &BTreeMap<String, Value>,
) -> Result<EffectiveConfig> {
    let grammar = registry.get(device_id)?.clone();

    let Some(serial) = grammar.serial.as_ref() else {
        return Err(DeviceError::InvalidConfig(format!(
            "grammar for {device_id} does not contain a serial section"
        )));
    };
    if grammar.command_list.is_empty() {
        return Err(DeviceError::InvalidConfig(format!(
            "grammar for {device_id} does not define any commands"
        )));
    }

    // Overrides replace same-named keys wholesale.
    let mut merged = serial.clone();
    for (key, value) in overrides {
        merged.insert(key.clone(), value.clone());
    }

    let settings = settings_from_map(device_id, &merged)?;
    Ok(EffectiveConfig { settings, grammar })
}

fn settings_from_map(device_id: &str, map: &BTreeMap<String, Value>) -> Result<SerialSettings> {
    let mut settings = SerialSettings::default();
    for (key, value) in map {
        match key.as_str() {
            "port" => {
                let port = value
                    .as_str()
                    .ok_or_else(|| bad_value(device_id, key, value))?;
                settings.port = Some(port.to_string());
            }
            "baudrate" => {
                let baud = value
                    .as_u64()
                    .ok_or_else(|| bad_value(device_id, key, value))?;
                settings.baud_rate = baud as u32;
            }
            "bytesize" => {
                let bits = value
                    .as_u64()
                    .and_then(|v| BYTESIZE_TABLE.get(&v))
                    .ok_or_else(|| bad_value(device_id, key, value))?;
                settings.data_bits = *bits;
            }
            "parity" => {
                let parity = value
                    .as_str()
                    .and_then(|v| PARITY_TABLE.get(v))
                    .ok_or_else(|| bad_value(device_id, key, value))?;
                settings.parity = *parity;
            }
            "stopbits" => {
                let stop = value
                    .as_u64()
                    .and_then(|v| STOPBITS_TABLE.get(&v))
                    .ok_or_else(|| bad_value(device_id, key, value))?;
                settings.stop_bits = *stop;
            }
            "timeout" => {
                let secs = value
                    .as_f64()
                    .filter(|s| *s >= 0.0)
                    .ok_or_else(|| bad_value(device_id, key, value))?;
                settings.timeout = Duration::from_secs_f64(secs);
            }
            "xonxoff" => {
                let enabled = value
                    .as_bool()
                    .ok_or_else(|| bad_value(device_id, key, value))?;
                if enabled {
                    settings.flow_control = FlowControl::Software;
                }
            }
            "rtscts" => {
                let enabled = value
                    .as_bool()
                    .ok_or_else(|| bad_value(device_id, key, value))?;
                if enabled {
                    settings.flow_control = FlowControl::Hardware;
                }
            }
            other => {
                return Err(DeviceError::InvalidConfig(format!(
                    "grammar for {device_id} specifies a serial setting \"{other}\" \
                     not recognized by the transport layer (expected one of: {})",
                    RECOGNIZED_SETTINGS.join(", ")
                )));
            }
        }
    }
    Ok(settings)
}

fn bad_value(device_id: &str, key: &str, value: &Value) -> DeviceError {
    DeviceError::InvalidConfig(format!(
        "grammar for {device_id} specifies serial setting value {value} for key \"{key}\" \
         not supported by the transport layer"
    ))
}
