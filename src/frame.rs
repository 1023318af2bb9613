//! Frame construction and decoding for the FX programming-port protocol
//!
//! This module implements the ASCII-hex command framing: read/write frame
//! construction, checksum computation and verification, register address
//! encoding for the three address spaces, and decoding of register values
//! from response payloads.
//!
//! The codec is exact-width and exact-offset. Every field sits at a fixed
//! byte position and the checksum covers the raw bytes from the op byte
//! through ETX inclusive, so the remote parser and the checksum both depend
//! on byte-for-byte layout.

use bytes::{BufMut, Bytes, BytesMut};

use crate::constants::{
    DATA_REGISTERS_BASE, ETX, INPUT_BITS_BASE, MAX_ADDRESS, MAX_COUNT_FIELD, OP_READ, OP_WRITE,
    OUTPUT_BITS_BASE, READ_FRAME_LEN, STX,
};
use crate::error::{FxError, Result};

/// Register family addressed by a command
///
/// Each space has its own offset into the device's linear address map, and
/// word registers additionally use two bytes per address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterSpace {
    /// Input bit blocks (X devices)
    InputBits,
    /// Output bit blocks (Y devices)
    OutputBits,
    /// 16-bit data registers (D devices)
    DataRegisters,
}

impl RegisterSpace {
    /// Map a register address into the device's linear address map
    pub fn encode_address(self, address: u16) -> u16 {
        match self {
            RegisterSpace::InputBits => address + INPUT_BITS_BASE,
            RegisterSpace::OutputBits => address + OUTPUT_BITS_BASE,
            RegisterSpace::DataRegisters => address * 2 + DATA_REGISTERS_BASE,
        }
    }
}

/// Render a nibble as an uppercase hex ASCII digit
fn hex_digit(value: u16) -> u8 {
    match value {
        0..=9 => b'0' + value as u8,
        _ => b'A' + (value - 10) as u8,
    }
}

/// Parse one hex ASCII digit
fn hex_value(digit: u8) -> Result<u16> {
    match digit {
        b'0'..=b'9' => Ok(u16::from(digit - b'0')),
        b'A'..=b'F' => Ok(u16::from(digit - b'A') + 10),
        other => Err(FxError::InvalidParameter(format!(
            "invalid hex digit 0x{other:02X}"
        ))),
    }
}

/// Render a 16-bit value as four uppercase hex ASCII digits, most
/// significant nibble first
pub fn word_to_ascii(value: u16) -> [u8; 4] {
    [
        hex_digit((value >> 12) & 0xF),
        hex_digit((value >> 8) & 0xF),
        hex_digit((value >> 4) & 0xF),
        hex_digit(value & 0xF),
    ]
}

/// Decode a four-digit ASCII payload into a register value
///
/// Bit spaces carry the digits in natural order. Word registers carry the
/// halves swapped on the wire, so the middle pair and the outer pair switch
/// places before combining — the inverse of the ordering applied when
/// writing.
pub fn decode_word(ascii: &[u8], space: RegisterSpace) -> Result<u16> {
    if ascii.len() < 4 {
        return Err(FxError::InvalidParameter(format!(
            "payload of {} bytes is too short to decode",
            ascii.len()
        )));
    }

    let (d0, d1, d2, d3) = match space {
        RegisterSpace::InputBits | RegisterSpace::OutputBits => {
            (ascii[0], ascii[1], ascii[2], ascii[3])
        }
        RegisterSpace::DataRegisters => (ascii[2], ascii[3], ascii[0], ascii[1]),
    };

    Ok(hex_value(d0)? << 12 | hex_value(d1)? << 8 | hex_value(d2)? << 4 | hex_value(d3)?)
}

/// Sum the given bytes, mask to 8 bits, and render as two uppercase hex
/// ASCII digits
pub fn checksum(bytes: &[u8]) -> [u8; 2] {
    let sum = bytes.iter().fold(0u32, |acc, &b| acc + u32::from(b)) & 0xFF;
    [hex_digit((sum >> 4) as u16), hex_digit((sum & 0xF) as u16)]
}

/// Recompute the op..ETX checksum of a complete frame and compare it with
/// the trailing two digits
pub fn verify_frame_checksum(frame: &[u8]) -> bool {
    if frame.len() < 4 {
        return false;
    }
    let (body, digits) = frame.split_at(frame.len() - 2);
    checksum(&body[1..]) == [digits[0], digits[1]]
}

fn validate_request(address: u16, word_count: u8, operation: &str) -> Result<usize> {
    if address > MAX_ADDRESS {
        return Err(FxError::InvalidParameter(format!(
            "{operation} address {address} exceeds {MAX_ADDRESS}"
        )));
    }

    // The count field carries the doubled word count as two decimal digits.
    let count = usize::from(word_count) * 2;
    if count > MAX_COUNT_FIELD {
        return Err(FxError::InvalidParameter(format!(
            "{operation} of {word_count} words does not fit the count field"
        )));
    }

    Ok(count)
}

fn put_header(frame: &mut BytesMut, op: u8, address: u16, count: usize, space: RegisterSpace) {
    frame.put_u8(STX);
    frame.put_u8(op);
    frame.extend_from_slice(&word_to_ascii(space.encode_address(address)));
    frame.put_u8(hex_digit((count / 10) as u16));
    frame.put_u8(hex_digit((count % 10) as u16));
}

fn put_trailer(frame: &mut BytesMut) {
    frame.put_u8(ETX);
    let digits = checksum(&frame[1..]);
    frame.extend_from_slice(&digits);
}

/// Build a read command frame for `word_count` registers starting at
/// `address`
pub fn build_read_frame(address: u16, word_count: u8, space: RegisterSpace) -> Result<Bytes> {
    let count = validate_request(address, word_count, "read")?;

    let mut frame = BytesMut::with_capacity(READ_FRAME_LEN);
    put_header(&mut frame, OP_READ, address, count, space);
    put_trailer(&mut frame);

    Ok(frame.freeze())
}

/// Build a write command frame
///
/// `data` holds the pre-encoded ASCII payload, four digits per register
/// (see [`word_to_ascii`]). Each four-byte group is emitted halfword
/// swapped — (d2, d3, d0, d1) — as the wire format requires.
pub fn build_write_frame(
    address: u16,
    word_count: u8,
    data: &[u8],
    space: RegisterSpace,
) -> Result<Bytes> {
    let count = validate_request(address, word_count, "write")?;

    if data.len() != count * 2 {
        return Err(FxError::InvalidParameter(format!(
            "payload of {} bytes does not match a {word_count} word write",
            data.len()
        )));
    }

    let mut frame = BytesMut::with_capacity(READ_FRAME_LEN + data.len());
    put_header(&mut frame, OP_WRITE, address, count, space);
    for group in data.chunks_exact(4) {
        frame.put_u8(group[2]);
        frame.put_u8(group[3]);
        frame.put_u8(group[0]);
        frame.put_u8(group[1]);
    }
    put_trailer(&mut frame);

    Ok(frame.freeze())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_encoding() {
        assert_eq!(RegisterSpace::InputBits.encode_address(0), 0x0080);
        assert_eq!(RegisterSpace::OutputBits.encode_address(0), 0x00A0);
        assert_eq!(RegisterSpace::DataRegisters.encode_address(10), 0x1014);
        assert_eq!(RegisterSpace::InputBits.encode_address(3), 0x0083);
    }

    #[test]
    fn test_word_to_ascii() {
        assert_eq!(word_to_ascii(0x0000), *b"0000");
        assert_eq!(word_to_ascii(0xAB3D), *b"AB3D");
        assert_eq!(word_to_ascii(0x1014), *b"1014");
    }

    #[test]
    fn test_read_frame_layout() {
        let frame = build_read_frame(0, 1, RegisterSpace::InputBits).unwrap();
        assert_eq!(
            &frame[..],
            &[0x02, b'0', b'0', b'0', b'8', b'0', b'0', b'2', 0x03, b'5', b'D']
        );
        assert!(verify_frame_checksum(&frame));
    }

    #[test]
    fn test_read_frame_count_doubling() {
        // 4 words -> count field "08"
        let frame = build_read_frame(1, 4, RegisterSpace::DataRegisters).unwrap();
        assert_eq!(&frame[6..8], b"08");
        assert!(verify_frame_checksum(&frame));
    }

    #[test]
    fn test_write_frame_layout() {
        let frame =
            build_write_frame(120, 1, &word_to_ascii(0xAB3D), RegisterSpace::DataRegisters)
                .unwrap();

        assert_eq!(frame[0], STX);
        assert_eq!(frame[1], OP_WRITE);
        // 120 * 2 + 0x1000 = 0x10F0
        assert_eq!(&frame[2..6], b"10F0");
        assert_eq!(&frame[6..8], b"02");
        // payload "AB3D" goes out halfword swapped
        assert_eq!(&frame[8..12], b"3DAB");
        assert_eq!(frame[12], ETX);
        assert!(verify_frame_checksum(&frame));
    }

    #[test]
    fn test_write_payload_ordering() {
        let frame =
            build_write_frame(0, 1, b"0123", RegisterSpace::DataRegisters).unwrap();
        assert_eq!(&frame[8..12], b"2301");
    }

    #[test]
    fn test_checksum_round_trip() {
        for address in [0u16, 1, 17, 255] {
            for space in [
                RegisterSpace::InputBits,
                RegisterSpace::OutputBits,
                RegisterSpace::DataRegisters,
            ] {
                let frame = build_read_frame(address, 1, space).unwrap();
                assert!(verify_frame_checksum(&frame), "address {address}");
            }
        }
    }

    #[test]
    fn test_decode_word_bit_spaces() {
        assert_eq!(decode_word(b"00FF", RegisterSpace::InputBits).unwrap(), 0x00FF);
        assert_eq!(decode_word(b"1234", RegisterSpace::OutputBits).unwrap(), 0x1234);
    }

    #[test]
    fn test_decode_word_data_registers() {
        // Word registers arrive halfword swapped on the wire
        assert_eq!(decode_word(b"3412", RegisterSpace::DataRegisters).unwrap(), 0x1234);
        assert_eq!(decode_word(b"3DAB", RegisterSpace::DataRegisters).unwrap(), 0xAB3D);
    }

    #[test]
    fn test_decode_matches_encode() {
        for value in [0x0000u16, 0x00FF, 0xAB3D, 0xFFFF] {
            let ascii = word_to_ascii(value);
            let frame =
                build_write_frame(0, 1, &ascii, RegisterSpace::DataRegisters).unwrap();
            // What was emitted on the wire decodes back to the value.
            assert_eq!(
                decode_word(&frame[8..12], RegisterSpace::DataRegisters).unwrap(),
                value
            );
        }
    }

    #[test]
    fn test_decode_word_errors() {
        assert!(decode_word(b"012", RegisterSpace::InputBits).is_err());
        assert!(decode_word(b"01G2", RegisterSpace::InputBits).is_err());
        assert!(decode_word(b"ab3d", RegisterSpace::DataRegisters).is_err());
    }

    #[test]
    fn test_build_rejects_bad_inputs() {
        assert!(build_read_frame(256, 1, RegisterSpace::InputBits).is_err());
        // 50 words double to 100, which no longer fits two decimal digits
        assert!(build_read_frame(0, 50, RegisterSpace::InputBits).is_err());
        assert!(build_read_frame(0, 49, RegisterSpace::InputBits).is_ok());

        assert!(build_write_frame(256, 1, b"0000", RegisterSpace::DataRegisters).is_err());
        // payload length must match the word count
        assert!(build_write_frame(0, 1, b"00", RegisterSpace::DataRegisters).is_err());
        assert!(build_write_frame(0, 2, b"0000", RegisterSpace::DataRegisters).is_err());
    }

    #[test]
    fn test_verify_frame_checksum_rejects_corruption() {
        let frame = build_read_frame(7, 1, RegisterSpace::DataRegisters).unwrap();
        let mut corrupted = frame.to_vec();
        corrupted[3] ^= 0x01;
        assert!(!verify_frame_checksum(&corrupted));
        assert!(!verify_frame_checksum(&[0x02, 0x03]));
    }
}
