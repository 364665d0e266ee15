use pinwire_transport::TransportError;

/// Errors that can occur while encoding or parsing Firmata traffic.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// A sysex id must fit in 7 bits.
    #[error("sysex id 0x{id:02X} does not fit in 7 bits")]
    InvalidSysexId { id: u8 },

    /// Sysex data bytes are unescaped and must each fit in 7 bits.
    #[error("data byte 0x{value:02X} at offset {index} does not fit in 7 bits")]
    InvalidDataByte { index: usize, value: u8 },

    /// The transport failed underneath the parser.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
}

pub type Result<T> = std::result::Result<T, ProtocolError>;
