//! Binary wire format shared with the browser client.
//!
//! Every frame is `[id][payload..][checksum]`. The low nibble of the id byte
//! is the payload length, so the total length of a frame follows from its
//! first byte alone. The checksum byte is not validated here; the browser
//! client omits it entirely, so frames are accepted with or without it.
//!
//! | Id | Direction | Payload |
//! |----|-----------|---------|
//! | `0x04` | controller → client | output flags, status flags, voltage, temperature + 128 |
//! | `0x12` | client → controller | duty low byte, `dir << 6 \| duty high 6 bits` |
//!
//! # Example
//!
//! ```rust
//! use rs_rmpp::codec::{decode, Command, OutputCommand};
//! use rs_rmpp::Direction;
//!
//! let cmd = decode(&[0x12, 0x00, 0x48]).unwrap();
//! assert_eq!(
//!     cmd,
//!     Command::OutputWrite(OutputCommand { direction: Direction::Forward, duty: 0x0800 })
//! );
//! ```

use thiserror::Error;

use crate::state::OutputMode;
use crate::traits::Direction;

/// Bytes taken by the command id.
pub const CMD_ID_LEN: usize = 1;
/// Bytes taken by the trailing checksum.
pub const CHECKSUM_LEN: usize = 1;
/// Largest payload expressible in the id nibble.
pub const PAYLOAD_MAX: usize = 0x0F;
/// Shortest complete frame.
pub const CMD_LEN_MIN: usize = CMD_ID_LEN + CHECKSUM_LEN;
/// Longest complete frame.
pub const CMD_LEN_MAX: usize = CMD_LEN_MIN + PAYLOAD_MAX;

/// Status reply, 4 payload bytes.
pub const CMD_ID_STATUS: u8 = 0x00 | 4;
/// Output write, 2 payload bytes.
pub const CMD_ID_OUTPUT_WRITE: u8 = 0x10 | 2;

/// Length of an encoded status frame (id and payload, no checksum).
pub const STATUS_FRAME_LEN: usize = CMD_ID_LEN + 4;

/// Largest duty carried by an output-write command (14 bits).
pub const WIRE_DUTY_MAX: u16 = 0x3FFF;

const DIR_FORWARD: u8 = 0x40;
const DIR_REVERSE: u8 = 0x80;
const DIR_MASK: u8 = 0xC0;
const DUTY_HIGH_MASK: u8 = 0x3F;

const OUT_MODE_MASK: u8 = 0x0F;
const OUT_FORWARD: u8 = 1 << 4;
const OUT_REVERSE: u8 = 1 << 5;

const ST_EXT_CTRL: u8 = 1 << 0;
const ST_OVER_CURRENT: u8 = 1 << 4;
const ST_SYSTEM_FAIL: u8 = 1 << 7;

/// Payload length encoded in a command id.
#[inline]
pub const fn payload_len(id: u8) -> usize {
    (id & 0x0F) as usize
}

/// Full frame length (id, payload, checksum) for a command id.
#[inline]
pub const fn command_len(id: u8) -> usize {
    payload_len(id) + CMD_LEN_MIN
}

/// Structural problems with an inbound frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FrameError {
    /// Zero-length buffer.
    #[error("empty frame")]
    Empty,
    /// Longer than any valid frame.
    #[error("frame of {len} bytes exceeds the {max} byte maximum", max = CMD_LEN_MAX)]
    TooLong {
        /// Received length.
        len: usize,
    },
    /// Shorter than the id byte announces.
    #[error("frame 0x{id:02x} needs {expected} payload bytes, got {len} bytes total")]
    Truncated {
        /// Command id.
        id: u8,
        /// Payload length announced by the id.
        expected: usize,
        /// Received length.
        len: usize,
    },
    /// Id not defined by the protocol.
    #[error("unknown command id 0x{0:02x}")]
    UnknownCommand(u8),
    /// Known id with a payload that does not parse.
    #[error("malformed payload for command 0x{0:02x}")]
    Malformed(u8),
}

/// Bound-check a frame and return its id and payload.
///
/// Bytes past the payload (the checksum, if present) are ignored.
pub fn split_frame(buf: &[u8]) -> Result<(u8, &[u8]), FrameError> {
    let (&id, rest) = buf.split_first().ok_or(FrameError::Empty)?;
    if buf.len() > CMD_LEN_MAX {
        return Err(FrameError::TooLong { len: buf.len() });
    }
    let expected = payload_len(id);
    if rest.len() < expected {
        return Err(FrameError::Truncated {
            id,
            expected,
            len: buf.len(),
        });
    }
    Ok((id, &rest[..expected]))
}

// ============================================================================
// Flag bytes
// ============================================================================

/// Byte 1 of the status frame.
///
/// Bits 0..3 carry the mode, bit 4 forward, bit 5 reverse.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct OutputFlags {
    /// Output mode.
    pub mode: OutputMode,
    /// Latched direction.
    pub direction: Direction,
}

impl OutputFlags {
    /// Serialize to the wire byte.
    pub const fn to_byte(self) -> u8 {
        let dir = match self.direction {
            Direction::None => 0,
            Direction::Forward => OUT_FORWARD,
            Direction::Reverse => OUT_REVERSE,
        };
        (self.mode.wire_value() & OUT_MODE_MASK) | dir
    }

    /// Parse the wire byte. Unknown modes and both direction bits set are rejected.
    pub const fn from_byte(byte: u8) -> Option<Self> {
        let Some(mode) = OutputMode::from_wire(byte & OUT_MODE_MASK) else {
            return None;
        };
        let direction = match (byte & OUT_FORWARD != 0, byte & OUT_REVERSE != 0) {
            (false, false) => Direction::None,
            (true, false) => Direction::Forward,
            (false, true) => Direction::Reverse,
            (true, true) => return None,
        };
        Some(Self { mode, direction })
    }
}

/// Byte 2 of the status frame.
///
/// Bit 0 external control, bit 4 over-current latch, bit 7 system failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct StatusFlags {
    /// A client is in control of the output.
    pub external_control: bool,
    /// Over-current latch set.
    pub over_current: bool,
    /// Controller is in the terminal failure mode.
    pub system_fail: bool,
}

impl StatusFlags {
    /// Serialize to the wire byte.
    pub const fn to_byte(self) -> u8 {
        let mut byte = 0;
        if self.external_control {
            byte |= ST_EXT_CTRL;
        }
        if self.over_current {
            byte |= ST_OVER_CURRENT;
        }
        if self.system_fail {
            byte |= ST_SYSTEM_FAIL;
        }
        byte
    }

    /// Parse the wire byte. Undefined bits are ignored.
    pub const fn from_byte(byte: u8) -> Self {
        Self {
            external_control: byte & ST_EXT_CTRL != 0,
            over_current: byte & ST_OVER_CURRENT != 0,
            system_fail: byte & ST_SYSTEM_FAIL != 0,
        }
    }
}

// ============================================================================
// Commands
// ============================================================================

/// Output-write command from a client.
///
/// `direction == Direction::None` is a stop request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OutputCommand {
    /// Requested direction.
    pub direction: Direction,
    /// Requested duty, 14 bits on the wire.
    pub duty: u16,
}

impl OutputCommand {
    /// Stop request.
    pub const fn stop() -> Self {
        Self {
            direction: Direction::None,
            duty: 0,
        }
    }

    /// Parse the two payload bytes.
    ///
    /// Selector `11` is read as forward; the forward bit is checked first.
    pub const fn from_payload(lo: u8, hi: u8) -> Self {
        let selector = hi & DIR_MASK;
        let direction = if selector == 0 {
            Direction::None
        } else if selector & DIR_FORWARD != 0 {
            Direction::Forward
        } else {
            Direction::Reverse
        };
        let duty = (((hi & DUTY_HIGH_MASK) as u16) << 8) | lo as u16;
        Self { direction, duty }
    }

    /// Encode as the browser client does: id and payload, no checksum.
    pub const fn encode(&self) -> [u8; 3] {
        let duty = if self.duty > WIRE_DUTY_MAX {
            WIRE_DUTY_MAX
        } else {
            self.duty
        };
        let dir = match self.direction {
            Direction::None => 0,
            Direction::Forward => DIR_FORWARD,
            Direction::Reverse => DIR_REVERSE,
        };
        [
            CMD_ID_OUTPUT_WRITE,
            (duty & 0xFF) as u8,
            ((duty >> 8) as u8 & DUTY_HIGH_MASK) | dir,
        ]
    }
}

/// Status frame published every sampling period.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct StatusFrame {
    /// Byte 1.
    pub output: OutputFlags,
    /// Byte 2.
    pub status: StatusFlags,
    /// Input voltage in 0.1 V units, saturated at 255.
    pub voltage_dv: u8,
    /// CPU temperature in whole degrees Celsius.
    pub temperature_c: i8,
}

impl StatusFrame {
    /// Encode to the 5-byte wire form.
    pub const fn encode(&self) -> [u8; STATUS_FRAME_LEN] {
        [
            CMD_ID_STATUS,
            self.output.to_byte(),
            self.status.to_byte(),
            self.voltage_dv,
            temperature_to_wire(self.temperature_c),
        ]
    }

    /// Parse the four payload bytes.
    pub const fn from_payload(payload: [u8; 4]) -> Option<Self> {
        let Some(output) = OutputFlags::from_byte(payload[0]) else {
            return None;
        };
        Some(Self {
            output,
            status: StatusFlags::from_byte(payload[1]),
            voltage_dv: payload[2],
            temperature_c: temperature_from_wire(payload[3]),
        })
    }

    /// Input voltage in volts.
    pub fn voltage_v(&self) -> f32 {
        f32::from(self.voltage_dv) / 10.0
    }
}

/// Offset a signed temperature into an unsigned byte.
#[inline]
pub const fn temperature_to_wire(celsius: i8) -> u8 {
    (celsius as i16 + 128) as u8
}

/// Inverse of [`temperature_to_wire`].
#[inline]
pub const fn temperature_from_wire(byte: u8) -> i8 {
    (byte as i16 - 128) as i8
}

/// A decoded inbound frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    /// `0x12` output write.
    OutputWrite(OutputCommand),
    /// `0x04` status (echoed back or produced by another controller).
    Status(StatusFrame),
}

/// Decode one frame.
pub fn decode(buf: &[u8]) -> Result<Command, FrameError> {
    let (id, payload) = split_frame(buf)?;
    match (id, payload) {
        (CMD_ID_OUTPUT_WRITE, &[lo, hi]) => {
            Ok(Command::OutputWrite(OutputCommand::from_payload(lo, hi)))
        }
        (CMD_ID_STATUS, &[a, b, c, d]) => StatusFrame::from_payload([a, b, c, d])
            .map(Command::Status)
            .ok_or(FrameError::Malformed(id)),
        _ => Err(FrameError::UnknownCommand(id)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // Framing
    // =========================================================================

    #[test]
    fn command_len_from_id() {
        assert_eq!(command_len(CMD_ID_STATUS), 6);
        assert_eq!(command_len(CMD_ID_OUTPUT_WRITE), 4);
        assert_eq!(command_len(0x0F), CMD_LEN_MAX);
        assert_eq!(command_len(0x00), CMD_LEN_MIN);
    }

    #[test]
    fn split_rejects_empty() {
        assert_eq!(split_frame(&[]), Err(FrameError::Empty));
    }

    #[test]
    fn split_rejects_too_long() {
        let buf = [0x0Fu8; CMD_LEN_MAX + 1];
        assert_eq!(
            split_frame(&buf),
            Err(FrameError::TooLong { len: CMD_LEN_MAX + 1 })
        );
    }

    #[test]
    fn split_rejects_truncated_payload() {
        assert_eq!(
            split_frame(&[CMD_ID_OUTPUT_WRITE, 0x10]),
            Err(FrameError::Truncated {
                id: CMD_ID_OUTPUT_WRITE,
                expected: 2,
                len: 2
            })
        );
    }

    #[test]
    fn split_accepts_missing_or_present_checksum() {
        let (id, payload) = split_frame(&[0x12, 0xAA, 0x41]).unwrap();
        assert_eq!(id, 0x12);
        assert_eq!(payload, &[0xAA, 0x41]);

        let (_, payload) = split_frame(&[0x12, 0xAA, 0x41, 0x99]).unwrap();
        assert_eq!(payload, &[0xAA, 0x41]);
    }

    #[test]
    fn decode_status_with_bad_flags_is_malformed() {
        assert_eq!(
            decode(&[CMD_ID_STATUS, 0x0A, 0, 0, 0]),
            Err(FrameError::Malformed(CMD_ID_STATUS))
        );
    }

    #[test]
    fn decode_unknown_id() {
        assert_eq!(
            decode(&[0x13, 0, 0, 0, 0]),
            Err(FrameError::UnknownCommand(0x13))
        );
    }

    // =========================================================================
    // Output write
    // =========================================================================

    #[test]
    fn output_write_selectors() {
        assert_eq!(
            OutputCommand::from_payload(0xFF, 0x40 | 0x0F),
            OutputCommand {
                direction: Direction::Forward,
                duty: 0x0FFF
            }
        );
        assert_eq!(
            OutputCommand::from_payload(0x00, 0x80 | 0x08).direction,
            Direction::Reverse
        );
        assert_eq!(OutputCommand::from_payload(0x00, 0x00), OutputCommand::stop());
        // both selector bits: forward wins
        assert_eq!(
            OutputCommand::from_payload(0x00, 0xC0).direction,
            Direction::Forward
        );
    }

    #[test]
    fn output_write_duty_is_fourteen_bits() {
        let cmd = OutputCommand::from_payload(0xFF, 0x40 | 0x3F);
        assert_eq!(cmd.duty, WIRE_DUTY_MAX);
    }

    #[test]
    fn output_write_encode_matches_browser_bytes() {
        let cmd = OutputCommand {
            direction: Direction::Reverse,
            duty: 4095,
        };
        assert_eq!(cmd.encode(), [0x12, 0xFF, 0x80 | 0x0F]);
        assert_eq!(OutputCommand::stop().encode(), [0x12, 0x00, 0x00]);
    }

    // =========================================================================
    // Status frame
    // =========================================================================

    #[test]
    fn flag_bytes_layout() {
        let out = OutputFlags {
            mode: OutputMode::On,
            direction: Direction::Reverse,
        };
        assert_eq!(out.to_byte(), 0x22);

        let st = StatusFlags {
            external_control: true,
            over_current: true,
            system_fail: false,
        };
        assert_eq!(st.to_byte(), 0x11);
    }

    #[test]
    fn output_flags_reject_conflicting_direction() {
        assert_eq!(OutputFlags::from_byte(0x32), None);
        assert_eq!(OutputFlags::from_byte(0x09), None);
    }

    #[test]
    fn status_frame_round_trip() {
        let frame = StatusFrame {
            output: OutputFlags {
                mode: OutputMode::On,
                direction: Direction::Forward,
            },
            status: StatusFlags {
                external_control: true,
                ..Default::default()
            },
            voltage_dv: 120,
            temperature_c: -12,
        };
        let bytes = frame.encode();
        assert_eq!(bytes[0], CMD_ID_STATUS);
        assert_eq!(bytes[4], 116);
        assert_eq!(decode(&bytes), Ok(Command::Status(frame)));
    }

    #[test]
    fn temperature_offset_covers_full_range() {
        assert_eq!(temperature_to_wire(-128), 0);
        assert_eq!(temperature_to_wire(0), 128);
        assert_eq!(temperature_to_wire(127), 255);
        assert_eq!(temperature_from_wire(temperature_to_wire(45)), 45);
    }

    #[test]
    fn frame_error_messages() {
        assert_eq!(
            format!("{}", FrameError::UnknownCommand(0x13)),
            "unknown command id 0x13"
        );
        assert_eq!(
            format!("{}", FrameError::TooLong { len: 20 }),
            "frame of 20 bytes exceeds the 17 byte maximum"
        );
    }
}
