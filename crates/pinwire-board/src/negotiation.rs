//! Capability negotiation.
//!
//! The firmware answers a capability query with one flat payload
//! describing every pin. The helpers here split that payload into
//! per-pin capability lists and derive a [`Layout`] from them; the
//! board drives the query itself.

use pinwire_protocol::PinMode;

use crate::layout::Layout;

/// Terminator closing one pin's capability list.
const CAPABILITY_LIST_END: u8 = 0x7F;

/// Split a capability-response payload into per-pin capability lists.
///
/// Each pin contributes a run of `(mode, resolution)` byte pairs closed
/// by `0x7F`. An empty run is a pin the firmware exposes but cannot
/// drive. A trailing run missing its terminator is discarded.
pub(crate) fn split_capability_lists(payload: &[u8]) -> Vec<Vec<u8>> {
    let mut lists = Vec::new();
    let mut current = Vec::new();
    for &byte in payload {
        if byte == CAPABILITY_LIST_END {
            lists.push(std::mem::take(&mut current));
        } else {
            current.push(byte);
        }
    }
    lists
}

/// Derive the pin roster from per-pin capability lists.
///
/// Digital indices are assigned sequentially by input order and never
/// compacted. The analog list keeps global indices; a pin's exposed
/// analog channel number is its position in that list, so the channel
/// space is compacted while the digital space is not. Callers bound
/// the list count to the wire's addressable range before deriving.
pub(crate) fn derive_layout(lists: &[Vec<u8>]) -> Layout {
    let mut layout = Layout::default();
    for (index, list) in lists.iter().enumerate() {
        let index = index as u8;
        layout.digital.push(index);
        if list.is_empty() {
            layout.disabled.push(index);
            continue;
        }
        // Mode codes sit at even offsets; odd offsets are resolutions.
        let mut analog = false;
        let mut pwm = false;
        for &code in list.iter().step_by(2) {
            if Some(code) == PinMode::Analog.code() {
                analog = true;
            }
            // Code 3 is PWM proper; code 4 (servo) rides the same
            // analog-write path, so pins advertising either take
            // duty-cycle output.
            if code == 0x03 || code == 0x04 {
                pwm = true;
            }
        }
        if analog {
            layout.analog.push(index);
        }
        if pwm {
            layout.pwm.push(index);
        }
    }
    layout
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_terminators() {
        let lists = split_capability_lists(&[0x00, 0x01, 0x7F, 0x7F, 0x02, 0x0A, 0x7F]);
        assert_eq!(
            lists,
            vec![vec![0x00, 0x01], vec![], vec![0x02, 0x0A]]
        );
    }

    #[test]
    fn unterminated_tail_is_discarded() {
        let lists = split_capability_lists(&[0x00, 0x01, 0x7F, 0x03, 0x08]);
        assert_eq!(lists, vec![vec![0x00, 0x01]]);
    }

    #[test]
    fn derives_disabled_and_pwm_pins() {
        let lists = split_capability_lists(&[
            0x01, 0x01, 0x7F, // pin 0: output only
            0x00, 0x01, 0x04, 0x0E, 0x7F, // pin 1: input + servo-grade output
            0x7F, // pin 2: absent
        ]);
        let layout = derive_layout(&lists);
        assert_eq!(layout.digital, vec![0, 1, 2]);
        assert_eq!(layout.disabled, vec![2]);
        assert_eq!(layout.pwm, vec![1]);
        assert!(layout.analog.is_empty());
    }

    #[test]
    fn analog_pins_keep_global_indices() {
        let lists = split_capability_lists(&[
            0x00, 0x01, 0x01, 0x01, 0x7F, // pin 0: digital only
            0x00, 0x01, 0x01, 0x01, 0x7F, // pin 1: digital only
            0x00, 0x01, 0x02, 0x0A, 0x7F, // pin 2: input + analog
            0x02, 0x0A, 0x7F, // pin 3: analog only
        ]);
        let layout = derive_layout(&lists);
        assert_eq!(layout.analog, vec![2, 3]);
        assert_eq!(layout.digital, vec![0, 1, 2, 3]);
    }

    #[test]
    fn resolution_bytes_never_count_as_modes() {
        // Resolution 2 after mode 1 must not read as the analog code.
        let layout = derive_layout(&[vec![0x01, 0x02]]);
        assert!(layout.analog.is_empty());
        // Resolution 3 after mode 0 must not read as PWM.
        let layout = derive_layout(&[vec![0x00, 0x03]]);
        assert!(layout.pwm.is_empty());
    }

    #[test]
    fn plain_pwm_code_counts() {
        let layout = derive_layout(&[vec![0x01, 0x01, 0x03, 0x08]]);
        assert_eq!(layout.pwm, vec![0]);
    }
}
