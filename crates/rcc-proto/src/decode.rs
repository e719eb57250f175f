//! Response decoding: a byte-at-a-time state machine that turns the raw
//! stream coming back from the tuner into typed [`DecodedReply`] values.
//!
//! Mirrors the original listener's `handlebyte`/`procmsg`/`decodemsg` split:
//! one state machine collects a frame's body, then a second stage
//! interprets the body according to the command's declared [`ReplyFormat`].
//! Unlike the original, un-escaping is deliberately NOT performed on read;
//! see the crate-level docs for why.

use thiserror::Error;

use crate::codebook::{Band, Command, ReplyFormat};
use crate::{constants, BEGIN};

/// A fully decoded, dispatched reply.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedReply {
    pub command: Command,
    pub value: ReplyValue,
}

/// The typed value carried by a decoded reply, per [`ReplyFormat`].
#[derive(Debug, Clone, PartialEq)]
pub enum ReplyValue {
    Boolean(bool),
    Int(u16),
    Str(String),
    BandFreq(Band, u16),
    /// `none` / `int:string` formats: payload intentionally not decoded.
    Ignored,
}

/// Reasons a candidate message was dropped instead of dispatched.
///
/// None of these are surfaced to the host: malformed frames are silently
/// discarded. This type exists so the decoder's unit tests (and `tracing`
/// debug events) can distinguish the cases without the decoder ever
/// panicking or blocking.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecodeError {
    #[error("checksum mismatch: expected {expected:#04x}, got {got:#04x}")]
    ChecksumMismatch { expected: u8, got: u8 },
    #[error("unknown opcode ({0:#04x}, {1:#04x})")]
    UnknownOpcode(u8, u8),
    #[error("reply body too short for its declared format")]
    Truncated,
    #[error("string length field describes more bytes than the frame carries")]
    InvalidStringLength,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    Len,
    Payload { remaining: usize },
    Csum,
}

/// The incremental frame decoder. Feed it bytes one at a time as they
/// arrive from the serial endpoint; it returns `Ok(Some(reply))` on a
/// successfully dispatched message, `Ok(None)` while still accumulating,
/// and `Err` (non-fatal, already logged) on a dropped malformed message.
pub struct Decoder {
    state: State,
    len: u8,
    body: Vec<u8>,
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder {
    pub fn new() -> Self {
        Decoder {
            state: State::Idle,
            len: 0,
            body: Vec::new(),
        }
    }

    /// Feed one byte from the wire. Returns `Some` only on a byte that
    /// completes a message, whether that message dispatches cleanly or is
    /// dropped as malformed.
    pub fn feed(&mut self, byte: u8) -> Option<Result<DecodedReply, DecodeError>> {
        match self.state {
            State::Idle => {
                if byte == BEGIN {
                    self.state = State::Len;
                }
                None
            }
            State::Len => {
                self.len = byte;
                self.body.clear();
                self.body.reserve(byte as usize);
                if byte == 0 {
                    self.state = State::Csum;
                } else {
                    self.state = State::Payload {
                        remaining: byte as usize,
                    };
                }
                None
            }
            State::Payload { remaining } => {
                self.body.push(byte);
                let remaining = remaining - 1;
                if remaining == 0 {
                    self.state = State::Csum;
                } else {
                    self.state = State::Payload { remaining };
                }
                None
            }
            State::Csum => {
                self.state = State::Idle;
                let expected = checksum(self.len, &self.body);
                if byte != expected {
                    tracing::debug!(expected, got = byte, "dropping frame: checksum mismatch");
                    return Some(Err(DecodeError::ChecksumMismatch {
                        expected,
                        got: byte,
                    }));
                }
                Some(dispatch(&self.body))
            }
        }
    }
}

fn checksum(len: u8, body: &[u8]) -> u8 {
    let sum: u32 = u32::from(BEGIN) + u32::from(len) + body.iter().map(|&b| u32::from(b)).sum::<u32>();
    (sum % 256) as u8
}

/// Interpret a checksum-verified body: `[cmd0, cmd1, op0, op1, value...]`.
/// The op bytes are not re-validated here (every inbound message is a
/// reply, `02 00`); only the opcode and value are used.
fn dispatch(body: &[u8]) -> Result<DecodedReply, DecodeError> {
    if body.len() < 4 {
        return Err(DecodeError::Truncated);
    }
    let command = Command::from_opcode(body[0], body[1])
        .ok_or(DecodeError::UnknownOpcode(body[0], body[1]))?;
    let value_bytes = &body[4..];
    let value = parse_value(command.format(), value_bytes)?;
    Ok(DecodedReply { command, value })
}

fn parse_value(format: ReplyFormat, value: &[u8]) -> Result<ReplyValue, DecodeError> {
    match format {
        ReplyFormat::Boolean => {
            if value.len() < 4 {
                return Err(DecodeError::Truncated);
            }
            Ok(ReplyValue::Boolean(value[0..4] == constants::ONE))
        }
        ReplyFormat::Int => {
            if value.len() < 4 {
                return Err(DecodeError::Truncated);
            }
            let raw = u16::from_le_bytes([value[0], value[1]]);
            Ok(ReplyValue::Int(raw))
        }
        ReplyFormat::Str => {
            if value.len() < 6 {
                return Err(DecodeError::Truncated);
            }
            let len = u32::from_le_bytes([value[2], value[3], value[4], value[5]]) as usize;
            let text_start = 6;
            let text_end = text_start
                .checked_add(len)
                .ok_or(DecodeError::InvalidStringLength)?;
            if text_end > value.len() {
                return Err(DecodeError::InvalidStringLength);
            }
            let text = String::from_utf8_lossy(&value[text_start..text_end]).into_owned();
            Ok(ReplyValue::Str(text))
        }
        ReplyFormat::BandInt => {
            if value.len() < 8 {
                return Err(DecodeError::Truncated);
            }
            let band = Band::from_byte(value[0]).ok_or(DecodeError::Truncated)?;
            let freq = u16::from_le_bytes([value[4], value[5]]);
            Ok(ReplyValue::BandFreq(band, freq))
        }
        ReplyFormat::IntString | ReplyFormat::None => Ok(ReplyValue::Ignored),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::encode_frame;
    use crate::{Band as B, Op};

    fn feed_all(decoder: &mut Decoder, bytes: &[u8]) -> Vec<Result<DecodedReply, DecodeError>> {
        bytes.iter().filter_map(|&b| decoder.feed(b)).collect()
    }

    #[test]
    fn decodes_boolean_reply() {
        let frame = encode_frame(Command::Power, Op::Reply, &constants::ONE);
        let mut d = Decoder::new();
        let out = feed_all(&mut d, &frame);
        assert_eq!(out.len(), 1);
        let reply = out[0].clone().unwrap();
        assert_eq!(reply.command, Command::Power);
        assert_eq!(reply.value, ReplyValue::Boolean(true));
    }

    #[test]
    fn decodes_int_reply() {
        // The int sits immediately after the op pair, not after two
        // phantom leading zero bytes.
        let mut payload = 300u16.to_le_bytes().to_vec();
        payload.extend_from_slice(&[0, 0]);
        let frame = encode_frame(Command::SignalStrength, Op::Reply, &payload);
        let mut d = Decoder::new();
        let out = feed_all(&mut d, &frame);
        let reply = out[0].clone().unwrap();
        assert_eq!(reply.value, ReplyValue::Int(300));
    }

    #[test]
    fn decodes_signal_strength_reply_from_raw_bytes() {
        // `A4 08 01 01 02 00 2C 01 00 00 <csum>`: signalstrength=300.
        let body = [0x01, 0x01, 0x02, 0x00, 0x2C, 0x01, 0x00, 0x00];
        let len = body.len() as u8;
        let csum = checksum(len, &body);
        let mut d = Decoder::new();
        d.feed(BEGIN);
        d.feed(len);
        for &b in &body {
            d.feed(b);
        }
        let reply = d.feed(csum).unwrap().unwrap();
        assert_eq!(reply.command, Command::SignalStrength);
        assert_eq!(reply.value, ReplyValue::Int(300));
    }

    #[test]
    fn decodes_band_freq_reply() {
        let mut payload = vec![0u8; 8];
        payload[0..4].copy_from_slice(&B::Fm.bytes());
        payload[4..6].copy_from_slice(&9750u16.to_le_bytes());
        let frame = encode_frame(Command::Tune, Op::Reply, &payload);
        let mut d = Decoder::new();
        let out = feed_all(&mut d, &frame);
        let reply = out[0].clone().unwrap();
        assert_eq!(reply.value, ReplyValue::BandFreq(B::Fm, 9750));
    }

    #[test]
    fn decodes_tune_reply_band_from_raw_bytes() {
        // `01 00 00 00 CF 03 00 00`: band=FM, freq=0x03CF=975.
        let mut body = vec![0x02, 0x01, 0x02, 0x00];
        body.extend_from_slice(&[0x01, 0x00, 0x00, 0x00, 0xCF, 0x03, 0x00, 0x00]);
        let len = body.len() as u8;
        let csum = checksum(len, &body);
        let mut d = Decoder::new();
        d.feed(BEGIN);
        d.feed(len);
        for &b in &body {
            d.feed(b);
        }
        let reply = d.feed(csum).unwrap().unwrap();
        assert_eq!(reply.command, Command::Tune);
        assert_eq!(reply.value, ReplyValue::BandFreq(B::Fm, 975));
    }

    #[test]
    fn decodes_string_reply() {
        let text = b"KXYZ";
        let mut payload = vec![0u8; 2];
        payload.extend_from_slice(&(text.len() as u32).to_le_bytes());
        payload.extend_from_slice(text);
        let frame = encode_frame(Command::HdCallsign, Op::Reply, &payload);
        let mut d = Decoder::new();
        let out = feed_all(&mut d, &frame);
        let reply = out[0].clone().unwrap();
        assert_eq!(reply.value, ReplyValue::Str("KXYZ".to_string()));
    }

    #[test]
    fn bad_checksum_is_dropped_and_decoder_recovers() {
        let frame = encode_frame(Command::Power, Op::Reply, &constants::ONE);
        let mut corrupted = frame.clone();
        *corrupted.last_mut().unwrap() ^= 0xFF;
        let mut d = Decoder::new();
        let out = feed_all(&mut d, &corrupted);
        assert_eq!(out.len(), 1);
        assert!(matches!(out[0], Err(DecodeError::ChecksumMismatch { .. })));

        // decoder must have returned to IDLE and accept the next good frame
        let good = encode_frame(Command::Mute, Op::Reply, &constants::ZERO);
        let out2 = feed_all(&mut d, &good);
        assert_eq!(out2.len(), 1);
        assert!(out2[0].is_ok());
    }

    #[test]
    fn garbage_before_begin_is_ignored() {
        let frame = encode_frame(Command::Power, Op::Reply, &constants::ONE);
        let mut noisy = vec![0x00, 0xFF, 0x10];
        noisy.extend_from_slice(&frame);
        let mut d = Decoder::new();
        let out = feed_all(&mut d, &noisy);
        assert_eq!(out.len(), 1);
        assert!(out[0].is_ok());
    }

    #[test]
    fn unknown_opcode_is_reported_not_panicked() {
        // Hand-build a frame for an opcode nothing maps to.
        let body = [0xEE, 0xEE, 0x02, 0x00];
        let len = body.len() as u8;
        let csum = checksum(len, &body);
        let mut d = Decoder::new();
        d.feed(BEGIN);
        d.feed(len);
        for &b in &body {
            d.feed(b);
        }
        let result = d.feed(csum).unwrap();
        assert!(matches!(result, Err(DecodeError::UnknownOpcode(0xEE, 0xEE))));
    }
}
