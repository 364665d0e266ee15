//! Firmata wire protocol: command vocabulary, 14-bit codec, dispatch and
//! framing.
//!
//! Three framing disciplines share the stream, chosen by the lead byte:
//! - `0x80..0xF0` channel messages: command in the high nibble, pin or
//!   port number in the low one, then the command's declared arity in
//!   data bytes
//! - `0xF0` sysex: an id byte, then data bytes until `END_SYSEX`
//! - `0xF1..=0xFF` system messages: the byte is the command, declared
//!   arity follows
//!
//! Data bytes keep the high bit clear; multi-byte values travel as 14
//! bits split across two 7-bit bytes, LSB first.

pub mod codec;
pub mod command;
pub mod dispatch;
pub mod error;
pub mod parser;

pub use codec::{
    decode_14bit_chars, encode_sysex, pack_14bit, unpack_14bit, MAX_14BIT, MAX_SYSEX_PAYLOAD,
};
pub use command::{command_name, PinMode};
pub use dispatch::{DispatchEntry, DispatchTable, HandlerKind};
pub use error::{ProtocolError, Result};
pub use parser::{read_frame, InboundFrame};
