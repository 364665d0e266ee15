use serde::{Deserialize, Serialize};

/// Pin roster for a board.
///
/// Either negotiated from a capability response or supplied directly
/// for firmware whose roster is known ahead of time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Layout {
    /// Global digital pin indices, in order. Never compacted; a disabled
    /// pin still occupies its slot.
    pub digital: Vec<u8>,
    /// Global indices of pins with an analog channel. Position in this
    /// list is the exposed analog channel number.
    pub analog: Vec<u8>,
    /// Global indices of PWM-capable pins.
    pub pwm: Vec<u8>,
    /// Global indices of pins the host must treat as off limits.
    pub disabled: Vec<u8>,
}

impl Layout {
    /// Number of digital pins.
    pub fn digital_pin_count(&self) -> usize {
        self.digital.len()
    }

    /// Number of analog channels.
    pub fn analog_channel_count(&self) -> usize {
        self.analog.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_layout_is_empty() {
        let layout = Layout::default();
        assert_eq!(layout.digital_pin_count(), 0);
        assert_eq!(layout.analog_channel_count(), 0);
    }

    #[test]
    fn serializes_with_field_names() {
        let layout = Layout {
            digital: vec![0, 1, 2, 3],
            analog: vec![2, 3],
            pwm: vec![1],
            disabled: vec![0],
        };
        let json = serde_json::to_value(&layout).unwrap();
        assert_eq!(json["digital"], serde_json::json!([0, 1, 2, 3]));
        assert_eq!(json["analog"], serde_json::json!([2, 3]));
        assert_eq!(json["pwm"], serde_json::json!([1]));
        assert_eq!(json["disabled"], serde_json::json!([0]));
    }
}
