use std::collections::HashSet;
use std::fmt;
use std::thread;
use std::time::Duration;

use bytes::BytesMut;
use tracing::{debug, info, warn};

use pinwire_protocol::command::CAPABILITY_QUERY;
use pinwire_protocol::{
    decode_14bit_chars, encode_sysex, read_frame, unpack_14bit, DispatchTable, HandlerKind,
    InboundFrame, PinMode,
};
use pinwire_transport::Transport;

use crate::error::{BoardError, Result};
use crate::layout::Layout;
use crate::negotiation::{derive_layout, split_capability_lists};
use crate::pin::{Pin, PinId, PinType, WriteAction};
use crate::pinspec;
use crate::port::{Port, PINS_PER_PORT};

/// Upper bound on roster size. A wire pin index travels as a single
/// 7-bit data byte, so pins past 127 cannot be addressed at all.
const MAX_ADDRESSABLE_PINS: usize = 128;

/// Timing knobs for board setup.
#[derive(Debug, Clone)]
pub struct BoardConfig {
    /// Wait after opening the transport before talking to the firmware.
    /// Stock firmware resets on connect and spends a few seconds
    /// booting, blinking its version before it will answer anything.
    /// Only the negotiating [`Board::open`] path waits; explicit-layout
    /// construction talks immediately.
    pub startup_settle: Duration,
    /// Wait between sending the capability query and draining the
    /// response.
    pub negotiation_settle: Duration,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            startup_settle: Duration::from_secs(5),
            negotiation_settle: Duration::from_millis(100),
        }
    }
}

/// A Firmata board on the far end of a transport.
///
/// Owns the pin and port state machines, the dispatch table for inbound
/// frames and the transport itself. All pin operations go through
/// [`PinId`] handles handed out by [`Board::acquire_pin`].
#[derive(Debug)]
pub struct Board<T: Transport> {
    link: T,
    config: BoardConfig,
    name: String,
    ports: Vec<Port>,
    analog: Vec<Pin>,
    taken: HashSet<(PinType, u8)>,
    dispatch: DispatchTable,
    protocol_version: Option<(u8, u8)>,
    firmware_version: Option<(u8, u8)>,
    firmware_name: Option<String>,
    pending_layout: Option<Layout>,
    torn_down: bool,
}

fn digital_pin(ports: &[Port], index: u8) -> Option<&Pin> {
    let slot = usize::from(index / PINS_PER_PORT);
    ports.get(slot)?.pins().get(usize::from(index % PINS_PER_PORT))
}

fn digital_pin_mut(ports: &mut [Port], index: u8) -> Option<&mut Pin> {
    let slot = usize::from(index / PINS_PER_PORT);
    ports.get_mut(slot)?.pin_mut(index % PINS_PER_PORT)
}

fn no_such_pin(id: PinId) -> BoardError {
    BoardError::InvalidPinSpec {
        spec: id.to_string(),
        reason: "no such pin".to_string(),
    }
}

fn round4(value: f32) -> f32 {
    (value * 10_000.0).round() / 10_000.0
}

impl<T: Transport> Board<T> {
    /// Set up a board whose pin roster is known ahead of time.
    pub fn with_layout(link: T, layout: Layout) -> Result<Self> {
        Self::with_layout_and_config(link, layout, BoardConfig::default())
    }

    /// [`Board::with_layout`] with an explicit [`BoardConfig`].
    ///
    /// The settle windows only matter to the negotiating constructors;
    /// this path builds from `layout` and talks immediately.
    pub fn with_layout_and_config(link: T, layout: Layout, config: BoardConfig) -> Result<Self> {
        let mut board = Self::bare(link, config, DispatchTable::standard());
        board.apply_layout(&layout)?;
        board.drain()?;
        info!(
            board = %board.name,
            digital = board.layout_digital_count(),
            analog = board.analog.len(),
            "board ready"
        );
        Ok(board)
    }

    /// Set up a board by asking the firmware what pins it has.
    ///
    /// Waits out the firmware's boot window first, then runs capability
    /// negotiation. Fails with `SetupFailed` when no capability response
    /// arrives.
    pub fn open(link: T) -> Result<Self> {
        Self::open_with_config(link, BoardConfig::default())
    }

    /// [`Board::open`] with explicit timing.
    pub fn open_with_config(link: T, config: BoardConfig) -> Result<Self> {
        let mut board = Self::bare(link, config, DispatchTable::with_capability_response());
        thread::sleep(board.config.startup_settle);
        let layout = board.negotiate()?;
        board.apply_layout(&layout)?;
        board.drain()?;
        info!(
            board = %board.name,
            digital = board.layout_digital_count(),
            analog = board.analog.len(),
            firmware = board.firmware_name.as_deref().unwrap_or("unknown"),
            "board ready"
        );
        Ok(board)
    }

    fn bare(link: T, config: BoardConfig, dispatch: DispatchTable) -> Self {
        let name = link.port_name().unwrap_or("board").to_string();
        Self {
            link,
            config,
            name,
            ports: Vec::new(),
            analog: Vec::new(),
            taken: HashSet::new(),
            dispatch,
            protocol_version: None,
            firmware_version: None,
            firmware_name: None,
            pending_layout: None,
            torn_down: false,
        }
    }

    /// Ask the firmware to describe its pins and wait for the answer.
    fn negotiate(&mut self) -> Result<Layout> {
        self.send_sysex(CAPABILITY_QUERY, &[])?;
        thread::sleep(self.config.negotiation_settle);
        self.drain()?;
        self.pending_layout.take().ok_or_else(|| {
            BoardError::SetupFailed("no capability response from firmware".to_string())
        })
    }

    /// Build ports and analog channels from a layout.
    ///
    /// Digital indices are positional; out-of-range `pwm`, `disabled`
    /// and `analog` entries are skipped with a warning rather than
    /// rejecting the whole roster. A roster describing more pins than
    /// the wire can address is rejected outright.
    fn apply_layout(&mut self, layout: &Layout) -> Result<()> {
        let pin_count = layout.digital.len();
        if pin_count > MAX_ADDRESSABLE_PINS || layout.analog.len() > MAX_ADDRESSABLE_PINS {
            return Err(BoardError::SetupFailed(format!(
                "layout describes {pin_count} digital pins and {} analog channels; wire addressing stops at {MAX_ADDRESSABLE_PINS}",
                layout.analog.len()
            )));
        }
        if layout
            .digital
            .iter()
            .enumerate()
            .any(|(position, &index)| usize::from(index) != position)
        {
            warn!("digital pin list is not contiguous from zero; assigning indices positionally");
        }
        self.ports = (0..pin_count)
            .step_by(usize::from(PINS_PER_PORT))
            .map(|base| {
                let count = (pin_count - base).min(usize::from(PINS_PER_PORT)) as u8;
                Port::new((base / usize::from(PINS_PER_PORT)) as u8, count)
            })
            .collect();

        for &index in &layout.pwm {
            match digital_pin_mut(&mut self.ports, index) {
                Some(pin) => pin.set_pwm_capable(true),
                None => warn!(pin = index, "pwm index outside the digital range, skipped"),
            }
        }
        for &index in &layout.disabled {
            match digital_pin_mut(&mut self.ports, index) {
                Some(pin) => pin.force_mode(PinMode::Unavailable),
                None => warn!(pin = index, "disabled index outside the digital range, skipped"),
            }
        }

        let mut channels: usize = 0;
        for &index in &layout.analog {
            if pin_count > 0 && usize::from(index) >= pin_count {
                warn!(pin = index, "analog index outside the digital range, skipped");
                continue;
            }
            channels += 1;
        }
        self.analog = (0..channels).map(|channel| Pin::analog(channel as u8)).collect();
        Ok(())
    }

    /// Pump the parser until the transport runs dry.
    pub fn drain(&mut self) -> Result<()> {
        while self.link.bytes_available()? > 0 {
            self.iterate()?;
        }
        Ok(())
    }

    /// Read and dispatch at most one inbound frame.
    ///
    /// Returns immediately when no byte is waiting. A frame whose
    /// payload does not hold up is logged and dropped; parsing resumes
    /// on the next call. Transport failures propagate.
    pub fn iterate(&mut self) -> Result<()> {
        let Some(frame) = read_frame(&mut self.link, &self.dispatch)? else {
            return Ok(());
        };
        if let Err(err) = self.dispatch_frame(frame) {
            debug!(error = %err, "dropping malformed frame");
        }
        Ok(())
    }

    fn dispatch_frame(&mut self, frame: InboundFrame) -> Result<()> {
        match frame.handler {
            HandlerKind::AnalogValue => self.handle_analog(&frame.payload),
            HandlerKind::DigitalBitmask => self.handle_digital(&frame.payload),
            HandlerKind::ReportVersion => self.handle_version(&frame.payload),
            HandlerKind::ReportFirmware => self.handle_firmware(&frame.payload),
            HandlerKind::CapabilityResponse => self.handle_capability(&frame.payload),
        }
    }

    fn handle_analog(&mut self, payload: &[u8]) -> Result<()> {
        let &[channel, lsb, msb] = payload else {
            return Err(BoardError::MalformedFrame(format!(
                "analog payload of {} bytes",
                payload.len()
            )));
        };
        let raw = unpack_14bit(lsb, msb);
        let value = round4(f32::from(raw) / 1023.0);
        let pin = self
            .analog
            .get_mut(usize::from(channel))
            .ok_or_else(|| BoardError::MalformedFrame(format!("analog channel {channel} out of range")))?;
        // A sample for a silenced channel leaves no trace.
        if pin.is_reporting() {
            pin.update_value(value);
        }
        Ok(())
    }

    fn handle_digital(&mut self, payload: &[u8]) -> Result<()> {
        let &[port, lsb, msb] = payload else {
            return Err(BoardError::MalformedFrame(format!(
                "digital payload of {} bytes",
                payload.len()
            )));
        };
        let mask = unpack_14bit(lsb, msb);
        let port = self
            .ports
            .get_mut(usize::from(port))
            .ok_or_else(|| BoardError::MalformedFrame(format!("port {port} out of range")))?;
        port.update(mask);
        Ok(())
    }

    fn handle_version(&mut self, payload: &[u8]) -> Result<()> {
        let &[major, minor] = payload else {
            return Err(BoardError::MalformedFrame(format!(
                "version payload of {} bytes",
                payload.len()
            )));
        };
        debug!(major, minor, "protocol version reported");
        self.protocol_version = Some((major, minor));
        Ok(())
    }

    fn handle_firmware(&mut self, payload: &[u8]) -> Result<()> {
        let [major, minor, name @ ..] = payload else {
            return Err(BoardError::MalformedFrame(format!(
                "firmware payload of {} bytes",
                payload.len()
            )));
        };
        self.firmware_version = Some((*major, *minor));
        self.firmware_name = Some(decode_14bit_chars(name));
        debug!(
            major = *major,
            minor = *minor,
            name = self.firmware_name.as_deref().unwrap_or(""),
            "firmware reported"
        );
        Ok(())
    }

    fn handle_capability(&mut self, payload: &[u8]) -> Result<()> {
        let lists = split_capability_lists(payload);
        if lists.len() > MAX_ADDRESSABLE_PINS {
            return Err(BoardError::MalformedFrame(format!(
                "capability response describes {} pins; at most {MAX_ADDRESSABLE_PINS} are addressable",
                lists.len()
            )));
        }
        let layout = derive_layout(&lists);
        debug!(
            digital = layout.digital.len(),
            analog = layout.analog.len(),
            "capability response received"
        );
        self.pending_layout = Some(layout);
        Ok(())
    }

    /// Claim a pin by descriptor and apply its requested mode.
    ///
    /// Descriptors: `d13` or `d13o` for digital output, `d2i` input,
    /// `d3p` PWM, `d9s` servo, `a0` analog input; colons tolerated
    /// (`d:13:o`). An acquisition whose mode cannot be applied is rolled
    /// back and the pin stays claimable.
    pub fn acquire_pin(&mut self, spec: &str) -> Result<PinId> {
        let request = pinspec::parse(spec)?;
        let id = match request.space {
            PinType::Analog => PinId::Analog(request.index),
            PinType::Digital => PinId::Digital(request.index),
        };
        let pin = match id {
            PinId::Analog(channel) => self.analog.get(usize::from(channel)),
            PinId::Digital(index) => digital_pin(&self.ports, index),
        };
        let Some(pin) = pin else {
            return Err(BoardError::InvalidPinSpec {
                spec: spec.to_string(),
                reason: "pin index out of range".to_string(),
            });
        };
        if pin.mode() == PinMode::Unavailable {
            return Err(BoardError::InvalidPinSpec {
                spec: spec.to_string(),
                reason: "pin is unavailable".to_string(),
            });
        }
        let key = (request.space, request.index);
        if self.taken.contains(&key) {
            return Err(BoardError::PinAlreadyTaken {
                spec: spec.to_string(),
            });
        }

        self.taken.insert(key);
        let applied = match id {
            // Analog pins are born inputs; claiming one just starts its
            // reporting.
            PinId::Analog(_) => self.enable_reporting(id),
            PinId::Digital(_) => self.set_pin_mode(id, request.mode),
        };
        if let Err(err) = applied {
            self.taken.remove(&key);
            return Err(err);
        }
        debug!(pin = %id, mode = %request.mode, "pin acquired");
        Ok(id)
    }

    /// Change a pin's mode.
    ///
    /// `Servo` routes through [`Board::configure_servo`] with default
    /// pulse bounds. A digital pin entering `Input` starts its whole
    /// port reporting.
    pub fn set_pin_mode(&mut self, id: PinId, mode: PinMode) -> Result<()> {
        match id {
            PinId::Analog(channel) => {
                let pin = self
                    .analog
                    .get_mut(usize::from(channel))
                    .ok_or_else(|| no_such_pin(id))?;
                pin.apply_mode(mode, &mut self.link)
            }
            PinId::Digital(index) => {
                let pin =
                    digital_pin_mut(&mut self.ports, index).ok_or_else(|| no_such_pin(id))?;
                pin.apply_mode(mode, &mut self.link)?;
                if mode == PinMode::Input {
                    let slot = usize::from(index / PINS_PER_PORT);
                    let port = self.ports.get_mut(slot).ok_or_else(|| no_such_pin(id))?;
                    port.enable_reporting(&mut self.link)?;
                }
                Ok(())
            }
        }
    }

    /// Write a value to a pin.
    ///
    /// Digital output takes 0 or 1, PWM a normalized `[0, 1]` duty,
    /// servo an angle in degrees. Writing the value a pin already holds
    /// sends nothing.
    pub fn write(&mut self, id: PinId, value: f32) -> Result<()> {
        match id {
            PinId::Analog(channel) => {
                let pin = self
                    .analog
                    .get_mut(usize::from(channel))
                    .ok_or_else(|| no_such_pin(id))?;
                match pin.prepare_write(value)? {
                    WriteAction::Direct(msg) => self.link.write_bytes(&msg).map_err(Into::into),
                    WriteAction::None | WriteAction::PortMask => Ok(()),
                }
            }
            PinId::Digital(index) => {
                let pin =
                    digital_pin_mut(&mut self.ports, index).ok_or_else(|| no_such_pin(id))?;
                match pin.prepare_write(value)? {
                    WriteAction::None => Ok(()),
                    WriteAction::Direct(msg) => self.link.write_bytes(&msg).map_err(Into::into),
                    WriteAction::PortMask => {
                        let slot = usize::from(index / PINS_PER_PORT);
                        let port = self.ports.get_mut(slot).ok_or_else(|| no_such_pin(id))?;
                        port.write(&mut self.link)
                    }
                }
            }
        }
    }

    /// Last value written to or reported for a pin.
    pub fn read(&self, id: PinId) -> Result<Option<f32>> {
        let pin = match id {
            PinId::Analog(channel) => self.analog.get(usize::from(channel)),
            PinId::Digital(index) => digital_pin(&self.ports, index),
        };
        pin.ok_or_else(|| no_such_pin(id))?.read()
    }

    /// Start streaming a pin's state from the firmware.
    ///
    /// Digital reporting is port-granular: enabling one pin starts its
    /// whole port.
    pub fn enable_reporting(&mut self, id: PinId) -> Result<()> {
        match id {
            PinId::Analog(channel) => {
                let pin = self
                    .analog
                    .get_mut(usize::from(channel))
                    .ok_or_else(|| no_such_pin(id))?;
                pin.enable_reporting(&mut self.link)
            }
            PinId::Digital(index) => {
                let pin = digital_pin(&self.ports, index).ok_or_else(|| no_such_pin(id))?;
                if pin.mode() != PinMode::Input {
                    return Err(BoardError::NotAnInput {
                        pin: index,
                        mode: pin.mode(),
                    });
                }
                let slot = usize::from(index / PINS_PER_PORT);
                let port = self.ports.get_mut(slot).ok_or_else(|| no_such_pin(id))?;
                port.enable_reporting(&mut self.link)
            }
        }
    }

    /// Stop streaming a pin's state.
    pub fn disable_reporting(&mut self, id: PinId) -> Result<()> {
        match id {
            PinId::Analog(channel) => {
                let pin = self
                    .analog
                    .get_mut(usize::from(channel))
                    .ok_or_else(|| no_such_pin(id))?;
                pin.disable_reporting(&mut self.link)
            }
            PinId::Digital(index) => {
                if digital_pin(&self.ports, index).is_none() {
                    return Err(no_such_pin(id));
                }
                let slot = usize::from(index / PINS_PER_PORT);
                let port = self.ports.get_mut(slot).ok_or_else(|| no_such_pin(id))?;
                port.disable_reporting(&mut self.link)
            }
        }
    }

    /// Configure servo pulse bounds on a digital pin and drive it to an
    /// initial angle.
    ///
    /// Records servo mode directly; the generic mode setter routes here
    /// for `Servo`, not the other way around.
    pub fn configure_servo(
        &mut self,
        pin: u8,
        min_pulse: u16,
        max_pulse: u16,
        angle: u16,
    ) -> Result<()> {
        let Some(target) = digital_pin_mut(&mut self.ports, pin) else {
            return Err(BoardError::InvalidPinSpec {
                spec: format!("d{pin}"),
                reason: "pin index out of range".to_string(),
            });
        };
        target.configure_servo(min_pulse, max_pulse, angle, &mut self.link)
    }

    /// Send a raw sysex frame. Data bytes must stay below `0x80`.
    pub fn send_sysex(&mut self, command: u8, data: &[u8]) -> Result<()> {
        let mut frame = BytesMut::new();
        encode_sysex(command, data, &mut frame)?;
        self.link.write_bytes(&frame)?;
        Ok(())
    }

    /// Detach servos and close the transport.
    ///
    /// Safe to call repeatedly; `Drop` runs it as a safety net for
    /// scopes that unwind early.
    pub fn teardown(&mut self) -> Result<()> {
        if self.torn_down {
            return Ok(());
        }
        self.torn_down = true;
        for port in &mut self.ports {
            for pin in port.pins_mut() {
                if pin.mode() == PinMode::Servo {
                    if let Err(err) = pin.apply_mode(PinMode::Output, &mut self.link) {
                        warn!(pin = pin.index(), error = %err, "servo detach failed");
                    }
                }
            }
        }
        self.link.close()?;
        debug!(board = %self.name, "board torn down");
        Ok(())
    }

    /// Board name; defaults to the transport's device path.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Protocol version from the firmware's version report.
    pub fn protocol_version(&self) -> Option<(u8, u8)> {
        self.protocol_version
    }

    /// Firmware version from the firmware report.
    pub fn firmware_version(&self) -> Option<(u8, u8)> {
        self.firmware_version
    }

    /// Firmware name from the firmware report.
    pub fn firmware_name(&self) -> Option<&str> {
        self.firmware_name.as_deref()
    }

    /// Digital ports, in index order.
    pub fn ports(&self) -> &[Port] {
        &self.ports
    }

    /// Analog channels, in channel order.
    pub fn analog_channels(&self) -> &[Pin] {
        &self.analog
    }

    /// Snapshot of the pin roster as currently configured.
    pub fn layout(&self) -> Layout {
        let mut layout = Layout::default();
        for port in &self.ports {
            for pin in port.pins() {
                layout.digital.push(pin.index());
                if pin.pwm_capable() {
                    layout.pwm.push(pin.index());
                }
                if pin.mode() == PinMode::Unavailable {
                    layout.disabled.push(pin.index());
                }
            }
        }
        layout.analog = self.analog.iter().map(Pin::index).collect();
        layout
    }

    fn layout_digital_count(&self) -> usize {
        self.ports.iter().map(|port| port.pins().len()).sum()
    }
}

impl<T: Transport> fmt::Display for Board<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Board {}", self.name)
    }
}

impl<T: Transport> Drop for Board<T> {
    fn drop(&mut self) {
        if let Err(err) = self.teardown() {
            debug!(error = %err, "teardown during drop failed");
        }
    }
}
