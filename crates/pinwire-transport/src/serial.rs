use std::io::{Read, Write};
use std::time::Duration;

use serialport::{DataBits, FlowControl, Parity, SerialPort, StopBits};
use tracing::{debug, info};

use crate::error::{Result, TransportError};
use crate::traits::Transport;

/// Line settings for a Firmata serial link.
///
/// Firmata firmwares ship with 57600 baud, 8-N-1 framing and no flow
/// control; in practice only the baud rate and read timeout ever change.
#[derive(Debug, Clone)]
pub struct SerialConfig {
    pub baud_rate: u32,
    pub data_bits: DataBits,
    pub parity: Parity,
    pub stop_bits: StopBits,
    pub flow_control: FlowControl,
    /// Read timeout; a `read_byte` that outlives it yields `Ok(None)`.
    pub timeout: Duration,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            baud_rate: 57_600,
            data_bits: DataBits::Eight,
            parity: Parity::None,
            stop_bits: StopBits::One,
            flow_control: FlowControl::None,
            timeout: Duration::from_millis(100),
        }
    }
}

/// Serial transport backed by the `serialport` crate.
///
/// Holds the open port behind an `Option` so `close` can release it exactly
/// once; every operation after that fails with `Closed`. Dropping the
/// transport closes it as a safety net, explicit `close` is preferred.
pub struct SerialTransport {
    port: Option<Box<dyn SerialPort>>,
    path: String,
}

impl SerialTransport {
    /// Open `path` with stock Firmata line settings.
    pub fn open(path: &str) -> Result<Self> {
        Self::open_with_config(path, &SerialConfig::default())
    }

    /// Open `path` with explicit line settings.
    pub fn open_with_config(path: &str, config: &SerialConfig) -> Result<Self> {
        let port = serialport::new(path, config.baud_rate)
            .data_bits(config.data_bits)
            .parity(config.parity)
            .stop_bits(config.stop_bits)
            .flow_control(config.flow_control)
            .timeout(config.timeout)
            .open()
            .map_err(|e| TransportError::Open {
                path: path.to_string(),
                source: e,
            })?;

        info!(path, baud = config.baud_rate, "opened serial link");

        Ok(Self {
            port: Some(port),
            path: path.to_string(),
        })
    }

    fn port_mut(&mut self) -> Result<&mut Box<dyn SerialPort>> {
        self.port.as_mut().ok_or(TransportError::Closed)
    }

    /// The device path this link was opened on.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Whether the link is still open.
    pub fn is_open(&self) -> bool {
        self.port.is_some()
    }
}

impl Transport for SerialTransport {
    fn read_byte(&mut self) -> Result<Option<u8>> {
        let port = self.port_mut()?;
        let mut buf = [0u8; 1];
        loop {
            match port.read(&mut buf) {
                Ok(0) => return Ok(None),
                Ok(_) => return Ok(Some(buf[0])),
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e)
                    if e.kind() == std::io::ErrorKind::TimedOut
                        || e.kind() == std::io::ErrorKind::WouldBlock =>
                {
                    return Ok(None)
                }
                Err(e) => return Err(TransportError::Io(e)),
            }
        }
    }

    fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        let port = self.port_mut()?;
        let mut written = 0;
        while written < bytes.len() {
            match port.write(&bytes[written..]) {
                Ok(0) => return Err(TransportError::LinkClosed),
                Ok(n) => written += n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(TransportError::Io(e)),
            }
        }
        Ok(())
    }

    fn bytes_available(&mut self) -> Result<usize> {
        let port = self.port_mut()?;
        Ok(port.bytes_to_read()? as usize)
    }

    fn close(&mut self) -> Result<()> {
        if let Some(port) = self.port.take() {
            debug!(path = %self.path, "closing serial link");
            drop(port);
        }
        Ok(())
    }

    fn port_name(&self) -> Option<&str> {
        Some(&self.path)
    }
}

impl Drop for SerialTransport {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

impl std::fmt::Debug for SerialTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialTransport")
            .field("path", &self.path)
            .field("open", &self.port.is_some())
            .finish()
    }
}

/// Enumerate serial devices visible to the host.
pub fn available_ports() -> Result<Vec<serialport::SerialPortInfo>> {
    Ok(serialport::available_ports()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_firmata_8n1() {
        let config = SerialConfig::default();
        assert_eq!(config.baud_rate, 57_600);
        assert_eq!(config.data_bits, DataBits::Eight);
        assert_eq!(config.parity, Parity::None);
        assert_eq!(config.stop_bits, StopBits::One);
        assert_eq!(config.flow_control, FlowControl::None);
    }

    #[test]
    fn open_missing_device_reports_path() {
        let result = SerialTransport::open("/dev/pinwire-test-no-such-device");
        match result {
            Err(TransportError::Open { path, .. }) => {
                assert_eq!(path, "/dev/pinwire-test-no-such-device");
            }
            other => panic!("expected Open error, got {other:?}"),
        }
    }
}
