use crate::error::Result;

/// Byte-level link to a board running a Firmata firmware.
///
/// The driver above this trait is single-threaded and cooperative: it pumps
/// one frame at a time and must never stall waiting for traffic that is not
/// there. Implementations therefore bound `read_byte` by the link's read
/// timeout and report buffered traffic through `bytes_available` without
/// waiting.
pub trait Transport {
    /// Read a single byte.
    ///
    /// Returns `Ok(None)` when no byte arrived within the link's read
    /// timeout. `Err` means the link itself failed.
    fn read_byte(&mut self) -> Result<Option<u8>>;

    /// Write the whole buffer to the device.
    fn write_bytes(&mut self, bytes: &[u8]) -> Result<()>;

    /// Number of bytes buffered and readable without waiting.
    fn bytes_available(&mut self) -> Result<usize>;

    /// Release the link. Idempotent: second and later calls are no-ops.
    /// Reads and writes after `close` fail with
    /// [`TransportError::Closed`](crate::error::TransportError::Closed).
    fn close(&mut self) -> Result<()>;

    /// Device path or label for diagnostics, when the link has one.
    fn port_name(&self) -> Option<&str> {
        None
    }
}
