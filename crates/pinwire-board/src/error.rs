use pinwire_protocol::PinMode;

/// Errors that can occur in board operations.
#[derive(Debug, thiserror::Error)]
pub enum BoardError {
    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] pinwire_transport::TransportError),

    /// Protocol-level error.
    #[error("protocol error: {0}")]
    Protocol(#[from] pinwire_protocol::ProtocolError),

    /// Setup could not produce a usable pin roster, either because
    /// capability negotiation came up empty or the layout is unusable.
    #[error("board setup failed: {0}")]
    SetupFailed(String),

    /// The pin cannot be used through Firmata.
    #[error("pin {pin} is unavailable")]
    PinUnavailable { pin: u8 },

    /// PWM was requested on a pin without PWM capability.
    #[error("pin {pin} does not support PWM")]
    PinNotPwmCapable { pin: u8 },

    /// Servo mode only applies to digital pins.
    #[error("pin {pin} is not a digital pin")]
    PinNotDigital { pin: u8 },

    /// The pin was already handed out.
    #[error("pin {spec} is already taken")]
    PinAlreadyTaken { spec: String },

    /// The pin descriptor did not parse or named a pin the board lacks.
    #[error("invalid pin spec {spec:?}: {reason}")]
    InvalidPinSpec { spec: String, reason: String },

    /// Reporting only applies to pins in input mode.
    #[error("pin {pin} is in {mode} mode, not input")]
    NotAnInput { pin: u8, mode: PinMode },

    /// Writing only applies to output-capable modes.
    #[error("pin {pin} is in {mode} mode and cannot be written")]
    NotWritable { pin: u8, mode: PinMode },

    /// An inbound frame did not fit the board. Caught at the dispatch
    /// boundary and logged; never surfaced to `iterate` callers.
    #[error("malformed frame: {0}")]
    MalformedFrame(String),
}

pub type Result<T> = std::result::Result<T, BoardError>;
