//! High-level Firmata board management.
//!
//! This is the "just works" layer. Open a board over a transport,
//! acquire pins by descriptor, write values, and pump [`Board::iterate`]
//! to keep reported values fresh.
//!
//! ```no_run
//! use pinwire_board::Board;
//! use pinwire_transport::SerialTransport;
//!
//! # fn main() -> pinwire_board::Result<()> {
//! let link = SerialTransport::open("/dev/ttyACM0")?;
//! let mut board = Board::open(link)?;
//! let led = board.acquire_pin("d13o")?;
//! board.write(led, 1.0)?;
//! board.teardown()?;
//! # Ok(())
//! # }
//! ```

pub mod board;
pub mod error;
pub mod layout;
mod negotiation;
pub mod pin;
mod pinspec;
pub mod port;

pub use board::{Board, BoardConfig};
pub use error::{BoardError, Result};
pub use layout::Layout;
pub use pin::{
    Pin, PinId, PinType, SERVO_DEFAULT_ANGLE, SERVO_DEFAULT_MAX_PULSE, SERVO_DEFAULT_MIN_PULSE,
};
pub use port::{Port, PINS_PER_PORT};
