use std::fmt;

use bytes::BytesMut;

use pinwire_protocol::command::{
    ANALOG_MESSAGE, DIGITAL_MESSAGE, REPORT_ANALOG, SERVO_CONFIG, SET_PIN_MODE,
};
use pinwire_protocol::{encode_sysex, pack_14bit, PinMode};
use pinwire_transport::Transport;

use crate::error::{BoardError, Result};

/// Default servo pulse bounds and start angle, matching stock firmware.
pub const SERVO_DEFAULT_MIN_PULSE: u16 = 544;
/// See [`SERVO_DEFAULT_MIN_PULSE`].
pub const SERVO_DEFAULT_MAX_PULSE: u16 = 2400;
/// Initial servo angle applied when entering servo mode without an
/// explicit configuration.
pub const SERVO_DEFAULT_ANGLE: u16 = 0;

/// Which address space a pin lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PinType {
    /// Analog input channel, addressed by channel number.
    Analog,
    /// Digital pin, addressed by global pin index.
    Digital,
}

impl fmt::Display for PinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PinType::Analog => write!(f, "analog"),
            PinType::Digital => write!(f, "digital"),
        }
    }
}

/// Handle to an acquired pin, as returned by `Board::acquire_pin`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PinId {
    /// Analog channel number.
    Analog(u8),
    /// Global digital pin index.
    Digital(u8),
}

impl PinId {
    /// Address space of the pin.
    pub fn pin_type(self) -> PinType {
        match self {
            PinId::Analog(_) => PinType::Analog,
            PinId::Digital(_) => PinType::Digital,
        }
    }

    /// Index within the address space.
    pub fn index(self) -> u8 {
        match self {
            PinId::Analog(index) | PinId::Digital(index) => index,
        }
    }
}

impl fmt::Display for PinId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PinId::Analog(index) => write!(f, "a{index}"),
            PinId::Digital(index) => write!(f, "d{index}"),
        }
    }
}

/// What a prepared write still needs from the caller.
///
/// `prepare_write` validates and records the value; actually putting
/// bytes on the wire is left to whoever can reach the transport and,
/// for port-managed output pins, the owning port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WriteAction {
    /// Nothing to send.
    None,
    /// Re-send the owning port's output bitmask.
    PortMask,
    /// Send these bytes as-is.
    Direct([u8; 3]),
}

/// Host-side state for a single pin.
///
/// The type and index are fixed at construction; mode, reporting flag
/// and value cache move through the operations below. All wire traffic
/// goes out over the transport handed into each call.
#[derive(Debug)]
pub struct Pin {
    pin_type: PinType,
    index: u8,
    port: Option<u8>,
    mode: PinMode,
    reporting: bool,
    pwm_capable: bool,
    value: Option<f32>,
}

impl Pin {
    /// Digital pin at global `index`, owned by the port at `port`.
    pub(crate) fn digital(index: u8, port: Option<u8>) -> Self {
        Self {
            pin_type: PinType::Digital,
            index,
            port,
            mode: PinMode::Output,
            reporting: false,
            pwm_capable: false,
            value: None,
        }
    }

    /// Analog input channel at `index`.
    pub(crate) fn analog(index: u8) -> Self {
        Self {
            pin_type: PinType::Analog,
            index,
            port: None,
            mode: PinMode::Input,
            reporting: false,
            pwm_capable: false,
            value: None,
        }
    }

    /// Address space of the pin.
    pub fn pin_type(&self) -> PinType {
        self.pin_type
    }

    /// Index within the address space.
    pub fn index(&self) -> u8 {
        self.index
    }

    /// Owning port index, for port-managed digital pins.
    pub fn port(&self) -> Option<u8> {
        self.port
    }

    /// Current mode.
    pub fn mode(&self) -> PinMode {
        self.mode
    }

    /// Whether this pin's samples are applied when frames arrive.
    pub fn is_reporting(&self) -> bool {
        self.reporting
    }

    /// Whether the firmware advertised PWM on this pin.
    pub fn pwm_capable(&self) -> bool {
        self.pwm_capable
    }

    pub(crate) fn set_pwm_capable(&mut self, capable: bool) {
        self.pwm_capable = capable;
    }

    pub(crate) fn set_reporting(&mut self, reporting: bool) {
        self.reporting = reporting;
    }

    /// Record a mode without touching the wire. Used when a layout marks
    /// a pin off limits and when servo setup records its own mode.
    pub(crate) fn force_mode(&mut self, mode: PinMode) {
        self.mode = mode;
    }

    pub(crate) fn value(&self) -> Option<f32> {
        self.value
    }

    /// Store a value reported by the firmware.
    pub(crate) fn update_value(&mut self, value: f32) {
        self.value = Some(value);
    }

    /// Apply a mode change, emitting the matching wire traffic.
    ///
    /// Digital pins entering `Input` additionally need their port's
    /// reporting enabled; the board handles that after this returns.
    pub(crate) fn apply_mode<T: Transport>(&mut self, mode: PinMode, link: &mut T) -> Result<()> {
        let Some(code) = mode.code() else {
            // Unavailable is host-side bookkeeping; the firmware has no
            // notion of it.
            self.mode = PinMode::Unavailable;
            return Ok(());
        };
        if self.mode == PinMode::Unavailable {
            return Err(BoardError::PinUnavailable { pin: self.index });
        }
        match mode {
            PinMode::Pwm if !self.pwm_capable => {
                Err(BoardError::PinNotPwmCapable { pin: self.index })
            }
            PinMode::Servo => self.configure_servo(
                SERVO_DEFAULT_MIN_PULSE,
                SERVO_DEFAULT_MAX_PULSE,
                SERVO_DEFAULT_ANGLE,
                link,
            ),
            _ => {
                self.mode = mode;
                link.write_bytes(&[SET_PIN_MODE, self.index, code])?;
                if mode == PinMode::Input && self.pin_type == PinType::Analog {
                    self.enable_reporting(link)?;
                }
                Ok(())
            }
        }
    }

    /// Start applying reported samples to this pin.
    ///
    /// Only the analog path lives here; digital pins report through
    /// their port and the board routes them there.
    pub(crate) fn enable_reporting<T: Transport>(&mut self, link: &mut T) -> Result<()> {
        if self.mode != PinMode::Input {
            return Err(BoardError::NotAnInput {
                pin: self.index,
                mode: self.mode,
            });
        }
        self.reporting = true;
        // Drop any sample cached before reporting was on; the next frame
        // repopulates it.
        self.value = None;
        link.write_bytes(&[REPORT_ANALOG | (self.index & 0x0F), 1])?;
        Ok(())
    }

    /// Stop applying reported samples to this pin.
    pub(crate) fn disable_reporting<T: Transport>(&mut self, link: &mut T) -> Result<()> {
        self.reporting = false;
        link.write_bytes(&[REPORT_ANALOG | (self.index & 0x0F), 0])?;
        Ok(())
    }

    /// Last value written or reported, `None` until either happened.
    pub fn read(&self) -> Result<Option<f32>> {
        if self.mode == PinMode::Unavailable {
            return Err(BoardError::PinUnavailable { pin: self.index });
        }
        Ok(self.value)
    }

    /// Validate and record a write, returning what still has to be sent.
    ///
    /// Writing the cached value again is a no-op; the cache updates
    /// before any bytes leave, so a transport failure mid-write does not
    /// leave a stale cache behind a retried call.
    pub(crate) fn prepare_write(&mut self, value: f32) -> Result<WriteAction> {
        if self.mode == PinMode::Unavailable {
            return Err(BoardError::PinUnavailable { pin: self.index });
        }
        if self.mode == PinMode::Input {
            return Err(BoardError::NotWritable {
                pin: self.index,
                mode: self.mode,
            });
        }
        if self.value == Some(value) {
            return Ok(WriteAction::None);
        }
        self.value = Some(value);

        let action = match self.mode {
            // Rejected above; spelled out so the match stays exhaustive.
            PinMode::Unavailable | PinMode::Input => WriteAction::None,
            // Analog-mode pins only ever receive values.
            PinMode::Analog => WriteAction::None,
            PinMode::Output => match self.port {
                Some(_) => WriteAction::PortMask,
                None => WriteAction::Direct([DIGITAL_MESSAGE, self.index, value as u8]),
            },
            PinMode::Pwm => {
                let duty = (value * 255.0).round() as u16;
                let [lsb, msb] = pack_14bit(duty);
                WriteAction::Direct([ANALOG_MESSAGE | (self.index & 0x0F), lsb, msb])
            }
            PinMode::Servo => {
                let angle = value as u16;
                let [lsb, msb] = pack_14bit(angle);
                WriteAction::Direct([ANALOG_MESSAGE | (self.index & 0x0F), lsb, msb])
            }
        };
        Ok(action)
    }

    /// Configure servo pulse bounds, record servo mode and drive the
    /// initial angle.
    ///
    /// The mode is recorded directly; routing it through `apply_mode`
    /// would come straight back here.
    pub(crate) fn configure_servo<T: Transport>(
        &mut self,
        min_pulse: u16,
        max_pulse: u16,
        angle: u16,
        link: &mut T,
    ) -> Result<()> {
        if self.pin_type != PinType::Digital {
            return Err(BoardError::PinNotDigital { pin: self.index });
        }
        if self.mode == PinMode::Unavailable {
            return Err(BoardError::PinUnavailable { pin: self.index });
        }

        let mut data = Vec::with_capacity(5);
        data.push(self.index);
        data.extend_from_slice(&pack_14bit(min_pulse));
        data.extend_from_slice(&pack_14bit(max_pulse));
        let mut frame = BytesMut::new();
        encode_sysex(SERVO_CONFIG, &data, &mut frame)?;
        link.write_bytes(&frame)?;

        self.force_mode(PinMode::Servo);

        match self.prepare_write(angle as f32)? {
            WriteAction::Direct(msg) => link.write_bytes(&msg)?,
            // Servo values encode directly; the port path is output-only.
            WriteAction::None | WriteAction::PortMask => {}
        }
        Ok(())
    }
}

impl fmt::Display for Pin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let space = match self.pin_type {
            PinType::Analog => "Analog",
            PinType::Digital => "Digital",
        };
        write!(f, "{space} pin {}", self.index)
    }
}
