//! Power a BenQ projector on and off over a serial port.
//!
//! Usage: `cargo run --example power_cycle -- /dev/ttyUSB0`

use std::collections::BTreeMap;
use std::thread;
use std::time::Duration;

use anyhow::Result;
use beamlink::{DeviceSession, GrammarRegistry};

fn main() -> Result<()> {
    env_logger::init();

    let port = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "/dev/ttyUSB0".to_string());

    let registry = GrammarRegistry::load_dir("device_configs")?;
    let mut session = DeviceSession::connect(&registry, "benq", &port, &BTreeMap::new())?;

    println!("{:?}", session.execute("power", "on")?);
    thread::sleep(Duration::from_secs(5));

    println!("{:?}", session.execute("power", "status")?);
    thread::sleep(Duration::from_secs(5));

    println!("{:?}", session.execute("mute", "on")?);
    thread::sleep(Duration::from_secs(5));

    println!("{:?}", session.execute("mute", "off")?);
    println!("Finished.");
    Ok(())
}
