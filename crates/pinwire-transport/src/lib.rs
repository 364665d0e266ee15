//! Serial transport for the pinwire Firmata driver.
//!
//! Provides the byte-level [`Transport`] trait the upper layers are written
//! against, plus a `serialport`-backed implementation for real hardware.
//! This is the lowest layer of pinwire.

pub mod error;
pub mod serial;
pub mod traits;

pub use error::{Result, TransportError};
pub use serial::{available_ports, SerialConfig, SerialTransport};
pub use serialport::{Error as SerialError, ErrorKind as SerialErrorKind};
pub use serialport::{SerialPortInfo, SerialPortType};
pub use traits::Transport;
