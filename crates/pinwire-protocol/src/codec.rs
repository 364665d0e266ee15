use bytes::{BufMut, BytesMut};

use crate::command::{END_SYSEX, START_SYSEX};
use crate::error::{ProtocolError, Result};

/// Largest value that fits in two 7-bit bytes.
pub const MAX_14BIT: u16 = 0x3FFF;

/// Storage cap for one sysex payload. Overlong frames keep draining off
/// the wire so the stream stays in sync, but their contents are dropped.
pub const MAX_SYSEX_PAYLOAD: usize = 1024;

/// Split a value into two 7-bit bytes, LSB first.
///
/// Firmata reserves the high bit for command bytes, so every multi-byte
/// value travels this way. Values above [`MAX_14BIT`] are masked down;
/// the plain message format has no wider encoding.
pub fn pack_14bit(value: u16) -> [u8; 2] {
    let value = value & MAX_14BIT;
    [(value & 0x7F) as u8, (value >> 7) as u8]
}

/// Reassemble a value from its two 7-bit halves.
///
/// High bits above the seventh are masked off each byte, so slightly
/// out-of-spec senders still decode predictably.
pub fn unpack_14bit(lsb: u8, msb: u8) -> u16 {
    (((msb & 0x7F) as u16) << 7) | (lsb & 0x7F) as u16
}

/// Decode text sent as 14 bits per character, LSB first.
///
/// This is how `REPORT_FIRMWARE` carries the firmware name. An odd
/// trailing byte has no partner and is dropped.
pub fn decode_14bit_chars(data: &[u8]) -> String {
    data.chunks_exact(2)
        .map(|pair| {
            let value = unpack_14bit(pair[0], pair[1]);
            char::from_u32(value as u32).unwrap_or(char::REPLACEMENT_CHARACTER)
        })
        .collect()
}

/// Assemble a complete sysex frame: `START_SYSEX, id, data…, END_SYSEX`.
///
/// Sysex data is unescaped on the wire, so the id and every data byte
/// must fit in 7 bits; anything larger would read as a command byte on
/// the far side and desynchronize the stream.
pub fn encode_sysex(id: u8, data: &[u8], dst: &mut BytesMut) -> Result<()> {
    if id >= 0x80 {
        return Err(ProtocolError::InvalidSysexId { id });
    }
    if let Some(index) = data.iter().position(|&b| b >= 0x80) {
        return Err(ProtocolError::InvalidDataByte {
            index,
            value: data[index],
        });
    }

    dst.reserve(data.len() + 3);
    dst.put_u8(START_SYSEX);
    dst.put_u8(id);
    dst.put_slice(data);
    dst.put_u8(END_SYSEX);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::SERVO_CONFIG;

    #[test]
    fn test_pack_unpack_roundtrip_full_range() {
        for value in 0..=MAX_14BIT {
            let [lsb, msb] = pack_14bit(value);
            assert!(lsb < 0x80 && msb < 0x80);
            assert_eq!(unpack_14bit(lsb, msb), value);
        }
    }

    #[test]
    fn test_pack_masks_oversize_values() {
        assert_eq!(pack_14bit(0x4001), pack_14bit(0x0001));
    }

    #[test]
    fn test_unpack_masks_high_bits() {
        assert_eq!(unpack_14bit(0xFF, 0x83), unpack_14bit(0x7F, 0x03));
    }

    #[test]
    fn test_known_encodings() {
        assert_eq!(pack_14bit(0), [0x00, 0x00]);
        assert_eq!(pack_14bit(37), [0x25, 0x00]);
        assert_eq!(pack_14bit(511), [0x7F, 0x03]);
        assert_eq!(pack_14bit(544), [0x20, 0x04]);
        assert_eq!(pack_14bit(2400), [0x60, 0x12]);
        assert_eq!(unpack_14bit(0x7F, 0x7F), MAX_14BIT);
    }

    #[test]
    fn test_decode_chars() {
        let data = [b'S', 0, b'F', 0, b'w', 0];
        assert_eq!(decode_14bit_chars(&data), "SFw");
    }

    #[test]
    fn test_decode_chars_drops_odd_trailing_byte() {
        let data = [b'o', 0, b'k', 0, b'!'];
        assert_eq!(decode_14bit_chars(&data), "ok");
        assert_eq!(decode_14bit_chars(&[b'x']), "");
    }

    #[test]
    fn test_decode_chars_empty() {
        assert_eq!(decode_14bit_chars(&[]), "");
    }

    #[test]
    fn test_encode_sysex_frames_payload() {
        let mut buf = BytesMut::new();
        encode_sysex(SERVO_CONFIG, &[9, 0x20, 0x04, 0x60, 0x12], &mut buf).unwrap();
        assert_eq!(
            buf.as_ref(),
            &[START_SYSEX, SERVO_CONFIG, 9, 0x20, 0x04, 0x60, 0x12, END_SYSEX]
        );
    }

    #[test]
    fn test_encode_sysex_rejects_wide_data() {
        let mut buf = BytesMut::new();
        let err = encode_sysex(SERVO_CONFIG, &[0x12, 0x80], &mut buf).unwrap_err();
        assert!(matches!(
            err,
            ProtocolError::InvalidDataByte {
                index: 1,
                value: 0x80
            }
        ));
        assert!(buf.is_empty());
    }

    #[test]
    fn test_encode_sysex_rejects_wide_id() {
        let mut buf = BytesMut::new();
        let err = encode_sysex(0x90, &[], &mut buf).unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidSysexId { id: 0x90 }));
    }
}
