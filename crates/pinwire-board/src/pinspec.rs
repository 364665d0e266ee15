use pinwire_protocol::PinMode;

use crate::error::{BoardError, Result};
use crate::pin::PinType;

/// A parsed pin descriptor: address space, index and requested mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PinRequest {
    pub space: PinType,
    pub index: u8,
    pub mode: PinMode,
}

fn invalid(spec: &str, reason: impl Into<String>) -> BoardError {
    BoardError::InvalidPinSpec {
        spec: spec.to_string(),
        reason: reason.into(),
    }
}

/// Parse a pin descriptor.
///
/// Canonical form is `<space><index><mode>` (`d13o`, `a0`); colons
/// between the fields are tolerated (`d:13:o`). The mode letter is
/// optional: digital pins default to output, analog pins to input, and
/// analog pins accept no other mode.
pub(crate) fn parse(spec: &str) -> Result<PinRequest> {
    let compact: String = spec.trim().chars().filter(|&c| c != ':').collect();
    let mut chars = compact.chars();
    let space = match chars.next() {
        Some('a') => PinType::Analog,
        Some('d') => PinType::Digital,
        Some(other) => return Err(invalid(spec, format!("unknown address space {other:?}"))),
        None => return Err(invalid(spec, "empty descriptor")),
    };

    let rest = chars.as_str();
    let digits_end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    let (digits, mode_part) = rest.split_at(digits_end);
    if digits.is_empty() {
        return Err(invalid(spec, "missing pin index"));
    }
    let index: u8 = digits
        .parse()
        .map_err(|_| invalid(spec, "pin index out of range"))?;

    let mode = match mode_part {
        "" => match space {
            PinType::Digital => PinMode::Output,
            PinType::Analog => PinMode::Input,
        },
        "i" => PinMode::Input,
        "o" => PinMode::Output,
        "p" => PinMode::Pwm,
        "s" => PinMode::Servo,
        other => return Err(invalid(spec, format!("unknown mode {other:?}"))),
    };
    if space == PinType::Analog && mode != PinMode::Input {
        return Err(invalid(spec, "analog pins are input-only"));
    }

    Ok(PinRequest { space, index, mode })
}
