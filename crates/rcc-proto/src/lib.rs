//! Wire protocol for the DMHD-1000 serial tuner.
//!
//! This crate has no knowledge of threads, serial ports, or the host
//! framework; it only knows how to turn symbolic commands into framed,
//! checksummed, escaped byte sequences (see [`encode`]) and how to turn a
//! byte stream coming back from the device into typed replies (see
//! [`decode`]). The [`codebook`] module is the immutable lookup table both
//! sides are built from.

pub mod codebook;
pub mod decode;
pub mod encode;

pub use codebook::{constants, Band, Command, Op, ReplyFormat};
pub use decode::{Decoder, DecodedReply, DecodeError, ReplyValue};
pub use encode::encode_frame;

/// Frame start / sentinel byte. Never escaped, never appears mid-frame.
pub const BEGIN: u8 = 0xA4;

/// Escape introducer byte.
pub const ESC: u8 = 0x1B;

/// What an escaped `BEGIN` is replaced with on the wire.
pub const ESC_BEGIN: u8 = 0x48;
