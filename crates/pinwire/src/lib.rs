//! Host-side driver for the Firmata wire protocol.
//!
//! pinwire talks to Firmata firmware over a serial link: it negotiates
//! the board's pin roster, translates pin intents into framed messages,
//! and keeps reported pin values fresh.
//!
//! # Crate Structure
//!
//! - [`transport`]: byte-level serial transport abstraction
//! - [`protocol`]: command vocabulary, 14-bit codec, dispatch and framing
//! - [`board`]: high-level board, pin and port management (behind the
//!   `board` feature)

/// Re-export transport types.
pub mod transport {
    pub use pinwire_transport::*;
}

/// Re-export protocol types.
pub mod protocol {
    pub use pinwire_protocol::*;
}

/// Re-export board types (requires `board` feature).
#[cfg(feature = "board")]
pub mod board {
    pub use pinwire_board::*;
}
