use std::io::{Read, Write};

use serialport::SerialPort;

use super::{Result, SerialError, SerialLink, SerialSettings};

/// Blocking wrapper around one open serial port.
pub struct SerialInterface {
    port: Box<dyn SerialPort>,
    port_name: String,
}

impl SerialInterface {
    /// List the serial ports known to the system.
    pub fn available_ports() -> Result<Vec<String>> {
        let ports = serialport::available_ports()?;
        Ok(ports.into_iter().map(|p| p.port_name).collect())
    }

    /// Open a port with fully resolved settings.
    pub fn open(settings: &SerialSettings) -> Result<Self> {
        let port_name = settings
            .port
            .clone()
            .ok_or_else(|| SerialError::ConnectionFailed("no port configured".to_string()))?;

        let port = serialport::new(&port_name, settings.baud_rate)
            .data_bits(settings.data_bits)
            .parity(settings.parity)
            .stop_bits(settings.stop_bits)
            .flow_control(settings.flow_control)
            .timeout(settings.timeout)
            .open()
            .map_err(|e| SerialError::ConnectionFailed(e.to_string()))?;

        log::info!("Opened serial port {}", port_name);
        Ok(Self { port, port_name })
    }

    pub fn port_name(&self) -> &str {
        &self.port_name
    }
}

impl SerialLink for SerialInterface {
    fn write_bytes(&mut self, data: &[u8]) -> Result<usize> {
        log::debug!(
            "{} send: {:?}",
            self.port_name,
            String::from_utf8_lossy(data)
        );
        self.port.write_all(data)?;
        self.port.flush()?;
        Ok(data.len())
    }

    fn read_bytes(&mut self, buf: &mut [u8]) -> Result<usize> {
        match self.port.read(buf) {
            Ok(n) => {
                if n > 0 {
                    log::debug!(
                        "{} recv: {:?}",
                        self.port_name,
                        String::from_utf8_lossy(&buf[..n])
                    );
                }
                Ok(n)
            }
            // A timed-out read is not a fault; the device simply had nothing
            // buffered within the port timeout.
            Err(ref e) if e.kind() == std::io::ErrorKind::TimedOut => Ok(0),
            Err(e) => Err(SerialError::IoError(e)),
        }
    }

    fn bytes_available(&mut self) -> Result<usize> {
        Ok(self.port.bytes_to_read()? as usize)
    }
}
