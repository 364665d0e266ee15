use std::fmt;
use std::io;

use pinwire_board::BoardError;
use pinwire_transport::{SerialError, SerialErrorKind, TransportError};

// Exit code constants aligned with rsfulmen/DDR-0002 semantics.
pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const TRANSPORT_ERROR: i32 = 3;
pub const HEALTH_CHECK_FAILED: i32 = 30;
pub const PERMISSION_DENIED: i32 = 50;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const TIMEOUT: i32 = 124;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

fn code_for_io_kind(kind: io::ErrorKind) -> i32 {
    match kind {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => TIMEOUT,
        io::ErrorKind::ConnectionRefused => FAILURE,
        _ => INTERNAL,
    }
}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    CliError::new(code_for_io_kind(err.kind()), format!("{context}: {err}"))
}

pub fn serial_error(context: &str, err: SerialError) -> CliError {
    let code = match err.kind() {
        SerialErrorKind::NoDevice => TRANSPORT_ERROR,
        SerialErrorKind::InvalidInput => USAGE,
        SerialErrorKind::Io(kind) => code_for_io_kind(kind),
        SerialErrorKind::Unknown => TRANSPORT_ERROR,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn transport_error(context: &str, err: TransportError) -> CliError {
    match err {
        TransportError::Open { source, .. } | TransportError::Serial(source) => {
            serial_error(context, source)
        }
        TransportError::Io(source) => io_error(context, source),
        TransportError::LinkClosed | TransportError::Closed => {
            CliError::new(TRANSPORT_ERROR, format!("{context}: {err}"))
        }
    }
}

pub fn board_error(context: &str, err: BoardError) -> CliError {
    match err {
        BoardError::Transport(err) => transport_error(context, err),
        BoardError::Protocol(_) => CliError::new(DATA_INVALID, format!("{context}: {err}")),
        BoardError::SetupFailed(_) => {
            CliError::new(HEALTH_CHECK_FAILED, format!("{context}: {err}"))
        }
        BoardError::InvalidPinSpec { .. } => CliError::new(USAGE, format!("{context}: {err}")),
        BoardError::MalformedFrame(_) => CliError::new(INTERNAL, format!("{context}: {err}")),
        BoardError::PinUnavailable { .. }
        | BoardError::PinNotPwmCapable { .. }
        | BoardError::PinNotDigital { .. }
        | BoardError::PinAlreadyTaken { .. }
        | BoardError::NotAnInput { .. }
        | BoardError::NotWritable { .. } => CliError::new(FAILURE, format!("{context}: {err}")),
    }
}
