mod common;

use std::collections::BTreeMap;

use beamlink::{resolve, DeviceError};
use serde_json::{json, Value};
use serialport::{DataBits, Parity};

use common::registry_with;

fn no_overrides() -> BTreeMap<String, Value> {
    BTreeMap::new()
}

fn valid_document() -> Value {
    json!({
        "serial": { "baudrate": 9600, "bytesize": 8, "parity": "none", "stopbits": 1 },
        "command_list": { "power": { "command": "pow", "actions": { "on": "on" } } }
    })
}

#[test]
fn missing_serial_section_is_invalid() {
    let registry = registry_with(
        "acme",
        json!({
            "command_list": { "power": { "command": "pow", "actions": { "on": "on" } } }
        }),
    );
    let err = resolve(&registry, "acme", &no_overrides()).expect_err("must fail");
    assert!(matches!(err, DeviceError::InvalidConfig(_)), "got {err:?}");
    assert!(err.to_string().contains("serial section"));
}

#[test]
fn empty_command_list_is_invalid() {
    let registry = registry_with("acme", json!({ "serial": { "baudrate": 9600 } }));
    let err = resolve(&registry, "acme", &no_overrides()).expect_err("must fail");
    assert!(matches!(err, DeviceError::InvalidConfig(_)), "got {err:?}");
    assert!(err.to_string().contains("commands"));
}

#[test]
fn unknown_device_id_is_config_missing() {
    let registry = registry_with("acme", valid_document());
    let err = resolve(&registry, "nonesuch", &no_overrides()).expect_err("must fail");
    assert!(matches!(err, DeviceError::ConfigMissing(_)), "got {err:?}");
}

#[test]
fn overrides_take_precedence_per_key() {
    let registry = registry_with("acme", valid_document());
    let mut overrides = BTreeMap::new();
    overrides.insert("baudrate".to_string(), json!(115200));

    let config = resolve(&registry, "acme", &overrides).expect("resolve");
    assert_eq!(config.settings.baud_rate, 115200);
    // Keys not overridden keep the grammar default.
    assert_eq!(config.settings.data_bits, DataBits::Eight);
    assert_eq!(config.settings.parity, Parity::None);
}

#[test]
fn unknown_override_key_is_invalid_and_named() {
    let registry = registry_with("acme", valid_document());
    let mut overrides = BTreeMap::new();
    overrides.insert("dsrdtr".to_string(), json!(true));

    let err = resolve(&registry, "acme", &overrides).expect_err("must fail");
    assert!(matches!(err, DeviceError::InvalidConfig(_)), "got {err:?}");
    assert!(err.to_string().contains("dsrdtr"));
}

#[test]
fn enum_value_outside_table_names_key_and_value() {
    let registry = registry_with(
        "acme",
        json!({
            "serial": { "baudrate": 9600, "bytesize": 16 },
            "command_list": { "power": { "command": "pow", "actions": { "on": "on" } } }
        }),
    );
    let err = resolve(&registry, "acme", &no_overrides()).expect_err("must fail");
    let text = err.to_string();
    assert!(text.contains("bytesize"), "missing key in: {text}");
    assert!(text.contains("16"), "missing value in: {text}");
}

#[test]
fn resolution_does_not_require_a_port() {
    // Resolution is pure; the port is injected at connect time.
    let registry = registry_with("acme", valid_document());
    let config = resolve(&registry, "acme", &no_overrides()).expect("resolve");
    assert!(config.settings.port.is_none());
}
