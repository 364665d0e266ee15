use std::fmt;

use tracing::trace;

use pinwire_protocol::command::{DIGITAL_MESSAGE, REPORT_DIGITAL};
use pinwire_protocol::{pack_14bit, PinMode};
use pinwire_transport::Transport;

use crate::error::Result;
use crate::pin::Pin;

/// Pins per digital port on the wire.
pub const PINS_PER_PORT: u8 = 8;

/// A group of up to eight digital pins reported and written as one unit.
///
/// The pin at local offset `k` has global index `index * 8 + k`.
#[derive(Debug)]
pub struct Port {
    index: u8,
    pins: Vec<Pin>,
    reporting: bool,
}

impl Port {
    /// Build the port at `index` with `pin_count` member pins.
    pub(crate) fn new(index: u8, pin_count: u8) -> Self {
        let base = usize::from(index) * usize::from(PINS_PER_PORT);
        let pins = (0..pin_count)
            .map(|offset| Pin::digital((base + usize::from(offset)) as u8, Some(index)))
            .collect();
        Self {
            index,
            pins,
            reporting: false,
        }
    }

    /// Port index on the wire.
    pub fn index(&self) -> u8 {
        self.index
    }

    /// Whether the firmware is streaming this port's state.
    pub fn is_reporting(&self) -> bool {
        self.reporting
    }

    /// Member pins, ordered by local offset.
    pub fn pins(&self) -> &[Pin] {
        &self.pins
    }

    pub(crate) fn pin_mut(&mut self, offset: u8) -> Option<&mut Pin> {
        self.pins.get_mut(usize::from(offset))
    }

    pub(crate) fn pins_mut(&mut self) -> &mut [Pin] {
        &mut self.pins
    }

    /// Ask the firmware to stream this port, and mark every member pin
    /// already in input mode as reporting.
    pub(crate) fn enable_reporting<T: Transport>(&mut self, link: &mut T) -> Result<()> {
        self.reporting = true;
        link.write_bytes(&[REPORT_DIGITAL | (self.index & 0x0F), 1])?;
        for pin in &mut self.pins {
            if pin.mode() == PinMode::Input {
                pin.set_reporting(true);
            }
        }
        Ok(())
    }

    /// Stop the firmware streaming this port.
    ///
    /// Member pin flags keep their state; `update` gates on the port
    /// flag, so their values stop moving anyway.
    pub(crate) fn disable_reporting<T: Transport>(&mut self, link: &mut T) -> Result<()> {
        self.reporting = false;
        link.write_bytes(&[REPORT_DIGITAL | (self.index & 0x0F), 0])?;
        Ok(())
    }

    /// Send the port's output state as a single bitmask message.
    pub(crate) fn write<T: Transport>(&mut self, link: &mut T) -> Result<()> {
        let mut mask: u16 = 0;
        for (offset, pin) in self.pins.iter().enumerate() {
            if pin.mode() == PinMode::Output && pin.value().is_some_and(|v| v != 0.0) {
                mask |= 1 << offset;
            }
        }
        let [lsb, msb] = pack_14bit(mask);
        link.write_bytes(&[DIGITAL_MESSAGE | (self.index & 0x0F), lsb, msb])?;
        Ok(())
    }

    /// Apply an inbound state bitmask to reporting input pins.
    ///
    /// With the port flag off the frame is dropped whole: the client
    /// stopped asking, so a stale frame must not overwrite pin values.
    pub(crate) fn update(&mut self, mask: u16) {
        if !self.reporting {
            trace!(port = self.index, "dropping frame for silenced port");
            return;
        }
        for (offset, pin) in self.pins.iter_mut().enumerate() {
            if pin.mode() == PinMode::Input && pin.is_reporting() {
                let level = mask & (1 << offset) != 0;
                pin.update_value(if level { 1.0 } else { 0.0 });
            }
        }
    }
}

impl fmt::Display for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digital port {}", self.index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct RecordingLink {
        sent: Vec<u8>,
    }

    impl Transport for RecordingLink {
        fn read_byte(&mut self) -> pinwire_transport::Result<Option<u8>> {
            Ok(None)
        }

        fn write_bytes(&mut self, bytes: &[u8]) -> pinwire_transport::Result<()> {
            self.sent.extend_from_slice(bytes);
            Ok(())
        }

        fn bytes_available(&mut self) -> pinwire_transport::Result<usize> {
            Ok(0)
        }

        fn close(&mut self) -> pinwire_transport::Result<()> {
            Ok(())
        }
    }

    fn input_port(link: &mut RecordingLink) -> Port {
        let mut port = Port::new(0, 8);
        for offset in 0..8 {
            port.pin_mut(offset)
                .unwrap()
                .apply_mode(PinMode::Input, link)
                .unwrap();
        }
        port.enable_reporting(link).unwrap();
        port
    }

    #[test]
    fn pins_carry_global_indices() {
        let port = Port::new(1, 8);
        let indices: Vec<u8> = port.pins().iter().map(|p| p.index()).collect();
        assert_eq!(indices, vec![8, 9, 10, 11, 12, 13, 14, 15]);
        assert!(port.pins().iter().all(|p| p.port() == Some(1)));
    }

    #[test]
    fn short_tail_port_holds_fewer_pins() {
        let port = Port::new(2, 4);
        assert_eq!(port.pins().len(), 4);
        assert_eq!(port.pins()[3].index(), 19);
    }

    #[test]
    fn write_packs_output_pins_into_mask() {
        let mut link = RecordingLink::default();
        let mut port = Port::new(0, 8);
        for offset in [0, 2, 5] {
            port.pin_mut(offset).unwrap().prepare_write(1.0).unwrap();
        }
        port.write(&mut link).unwrap();
        // mask 0b100101 = 37
        assert_eq!(link.sent, vec![DIGITAL_MESSAGE, 0x25, 0x00]);
    }

    #[test]
    fn write_skips_non_output_pins() {
        let mut link = RecordingLink::default();
        let mut port = Port::new(0, 8);
        port.pin_mut(0).unwrap().prepare_write(1.0).unwrap();
        port.pin_mut(1)
            .unwrap()
            .apply_mode(PinMode::Input, &mut link)
            .unwrap();
        link.sent.clear();
        port.write(&mut link).unwrap();
        assert_eq!(link.sent, vec![DIGITAL_MESSAGE, 0x01, 0x00]);
    }

    #[test]
    fn enable_reporting_marks_input_members() {
        let mut link = RecordingLink::default();
        let mut port = Port::new(1, 8);
        port.pin_mut(0)
            .unwrap()
            .apply_mode(PinMode::Input, &mut link)
            .unwrap();
        link.sent.clear();

        port.enable_reporting(&mut link).unwrap();
        assert!(port.is_reporting());
        assert_eq!(link.sent, vec![REPORT_DIGITAL | 1, 1]);
        assert!(port.pins()[0].is_reporting());
        assert!(!port.pins()[1].is_reporting());
    }

    #[test]
    fn disable_reporting_leaves_member_flags() {
        let mut link = RecordingLink::default();
        let mut port = input_port(&mut link);
        port.disable_reporting(&mut link).unwrap();
        assert!(!port.is_reporting());
        assert!(port.pins().iter().all(Pin::is_reporting));
        assert_eq!(link.sent.last(), Some(&0));
    }

    #[test]
    fn update_sets_reporting_input_pins() {
        let mut link = RecordingLink::default();
        let mut port = input_port(&mut link);
        port.update(0b0000_0101);
        assert_eq!(port.pins()[0].read().unwrap(), Some(1.0));
        assert_eq!(port.pins()[1].read().unwrap(), Some(0.0));
        assert_eq!(port.pins()[2].read().unwrap(), Some(1.0));
    }

    #[test]
    fn update_is_dropped_while_port_is_silenced() {
        let mut link = RecordingLink::default();
        let mut port = input_port(&mut link);
        port.disable_reporting(&mut link).unwrap();
        port.update(0b1111_1111);
        assert!(port.pins().iter().all(|p| p.read().unwrap().is_none()));
    }

    #[test]
    fn update_skips_output_pins() {
        let mut link = RecordingLink::default();
        let mut port = Port::new(0, 8);
        port.pin_mut(3)
            .unwrap()
            .apply_mode(PinMode::Input, &mut link)
            .unwrap();
        port.enable_reporting(&mut link).unwrap();
        port.update(0b1111_1111);
        assert_eq!(port.pins()[3].read().unwrap(), Some(1.0));
        // Output pin untouched by inbound frames.
        assert_eq!(port.pins()[0].read().unwrap(), None);
    }
}
