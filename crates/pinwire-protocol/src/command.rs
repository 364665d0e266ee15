//! Firmata command vocabulary.
//!
//! Command bytes fall into three ranges: channel commands (`0x80..0xF0`,
//! low nibble carries a pin or port number), system commands
//! (`0xF1..=0xFF`), and sysex ids (`< 0x80`, meaningful only between
//! `START_SYSEX` and `END_SYSEX`).

/// Digital I/O for one 8-pin port, value as a bitmask.
pub const DIGITAL_MESSAGE: u8 = 0x90;
/// Analog sample for a pin, or a PWM/servo value going out.
pub const ANALOG_MESSAGE: u8 = 0xE0;
/// Toggle analog reporting for one pin.
pub const REPORT_ANALOG: u8 = 0xC0;
/// Toggle digital reporting for one port.
pub const REPORT_DIGITAL: u8 = 0xD0;

/// Start of a sysex frame.
pub const START_SYSEX: u8 = 0xF0;
/// Set a pin's mode.
pub const SET_PIN_MODE: u8 = 0xF4;
/// End of a sysex frame.
pub const END_SYSEX: u8 = 0xF7;
/// Protocol version report (major, minor).
pub const REPORT_VERSION: u8 = 0xF9;
/// Reset the firmware to its power-up state.
pub const SYSTEM_RESET: u8 = 0xFF;

/// Ask which pins map to analog channels.
pub const ANALOG_MAPPING_QUERY: u8 = 0x69;
/// Analog channel mapping reply.
pub const ANALOG_MAPPING_RESPONSE: u8 = 0x6A;
/// Ask for each pin's supported modes and resolutions.
pub const CAPABILITY_QUERY: u8 = 0x6B;
/// Per-pin capability lists reply.
pub const CAPABILITY_RESPONSE: u8 = 0x6C;
/// Ask for a pin's current mode and state.
pub const PIN_STATE_QUERY: u8 = 0x6D;
/// Pin mode and state reply.
pub const PIN_STATE_RESPONSE: u8 = 0x6E;
/// Analog message for channels above 15.
pub const EXTENDED_ANALOG: u8 = 0x6F;
/// Configure servo pulse bounds for a pin.
pub const SERVO_CONFIG: u8 = 0x70;
/// Text payload, 14 bits per character.
pub const STRING_DATA: u8 = 0x71;
/// Shift register data.
pub const SHIFT_DATA: u8 = 0x75;
/// I2C read/write request.
pub const I2C_REQUEST: u8 = 0x76;
/// I2C reply.
pub const I2C_REPLY: u8 = 0x77;
/// I2C configuration.
pub const I2C_CONFIG: u8 = 0x78;
/// Firmware version and name report.
pub const REPORT_FIRMWARE: u8 = 0x79;
/// Set the analog sampling interval.
pub const SAMPLING_INTERVAL: u8 = 0x7A;
/// MIDI-reserved sysex id (non-realtime).
pub const SYSEX_NON_REALTIME: u8 = 0x7E;
/// MIDI-reserved sysex id (realtime).
pub const SYSEX_REALTIME: u8 = 0x7F;

/// Returns a human-readable name for a command byte.
///
/// Channel commands are expected with their nibble already masked off.
pub fn command_name(command: u8) -> &'static str {
    match command {
        DIGITAL_MESSAGE => "DIGITAL_MESSAGE",
        ANALOG_MESSAGE => "ANALOG_MESSAGE",
        REPORT_ANALOG => "REPORT_ANALOG",
        REPORT_DIGITAL => "REPORT_DIGITAL",
        START_SYSEX => "START_SYSEX",
        SET_PIN_MODE => "SET_PIN_MODE",
        END_SYSEX => "END_SYSEX",
        REPORT_VERSION => "REPORT_VERSION",
        SYSTEM_RESET => "SYSTEM_RESET",
        ANALOG_MAPPING_QUERY => "ANALOG_MAPPING_QUERY",
        ANALOG_MAPPING_RESPONSE => "ANALOG_MAPPING_RESPONSE",
        CAPABILITY_QUERY => "CAPABILITY_QUERY",
        CAPABILITY_RESPONSE => "CAPABILITY_RESPONSE",
        PIN_STATE_QUERY => "PIN_STATE_QUERY",
        PIN_STATE_RESPONSE => "PIN_STATE_RESPONSE",
        EXTENDED_ANALOG => "EXTENDED_ANALOG",
        SERVO_CONFIG => "SERVO_CONFIG",
        STRING_DATA => "STRING_DATA",
        SHIFT_DATA => "SHIFT_DATA",
        I2C_REQUEST => "I2C_REQUEST",
        I2C_REPLY => "I2C_REPLY",
        I2C_CONFIG => "I2C_CONFIG",
        REPORT_FIRMWARE => "REPORT_FIRMWARE",
        SAMPLING_INTERVAL => "SAMPLING_INTERVAL",
        _ => "UNKNOWN",
    }
}

/// Pin modes a Firmata firmware understands, plus a host-side
/// `Unavailable` marker for pins a board exposes but cannot drive.
///
/// The set is closed on purpose: every place a mode is applied matches
/// exhaustively, so a new mode cannot slip through half-handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PinMode {
    /// Not usable through Firmata. Never encoded on the wire.
    Unavailable,
    Input,
    Output,
    Analog,
    Pwm,
    Servo,
}

impl PinMode {
    /// Wire code used by `SET_PIN_MODE` and capability lists.
    ///
    /// `Unavailable` is host-side bookkeeping and has no code.
    pub fn code(self) -> Option<u8> {
        match self {
            PinMode::Unavailable => None,
            PinMode::Input => Some(0),
            PinMode::Output => Some(1),
            PinMode::Analog => Some(2),
            PinMode::Pwm => Some(3),
            PinMode::Servo => Some(4),
        }
    }

    /// Mode for a wire code; `None` for codes this driver does not model.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(PinMode::Input),
            1 => Some(PinMode::Output),
            2 => Some(PinMode::Analog),
            3 => Some(PinMode::Pwm),
            4 => Some(PinMode::Servo),
            _ => None,
        }
    }
}

impl std::fmt::Display for PinMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PinMode::Unavailable => "unavailable",
            PinMode::Input => "input",
            PinMode::Output => "output",
            PinMode::Analog => "analog",
            PinMode::Pwm => "pwm",
            PinMode::Servo => "servo",
        };
        f.write_str(name)
    }
}
