//! RUSH frame encoding and parsing.
//!
//! Every frame is self-contained:
//!
//! ```text
//! length(8, LE) | id(8, LE) | type(1) | type-specific fields
//! ```
//!
//! `length` counts every byte after the length field itself. All integers are
//! little-endian. Encoders are pure functions of the frame id, the session's
//! timescales, and the packet; the caller owns the id counter.

mod audio;
mod connect;
mod reader;
mod video;

pub use audio::encode_audio;
pub use connect::encode_connect;
pub use reader::{Frame, FrameReader};
pub use video::encode_video;

use bytes::{BufMut, Bytes, BytesMut};

/// Size of the length field.
pub const LENGTH_SIZE: usize = 8;

/// Size of the length and id fields together.
pub const HEADER_SIZE: usize = LENGTH_SIZE + 8;

/// Protocol version written into the Connect frame.
pub const RUSH_VERSION: u8 = 0;

/// Broadcast id written into the Connect frame.
pub const BROADCAST_ID: u64 = 0;

/// Connect frame payload: an empty JSON object.
pub const CONNECT_PAYLOAD: &[u8] = b"{}";

/// Frame type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
#[repr(u8)]
pub enum FrameType {
    /// Session header, always the first frame.
    Connect = 0x00,
    /// Video with track id.
    Video = 0x0d,
    /// Audio with codec header (extradata).
    Audio = 0x14,
}

impl FrameType {
    pub fn tag(self) -> u8 {
        self as u8
    }

    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0x00 => Some(Self::Connect),
            0x0d => Some(Self::Video),
            0x14 => Some(Self::Audio),
            _ => None,
        }
    }
}

/// Audio codec tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum AudioCodec {
    Aac = 1,
}

/// Video codec tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum VideoCodec {
    H264 = 1,
}

/// Buffer for one frame under construction.
///
/// The length field is written as a placeholder and patched in `finish`, so
/// the encoders only describe the fields that follow the type tag.
pub(crate) struct FrameBuf {
    buf: BytesMut,
}

impl FrameBuf {
    pub(crate) fn new(id: u64, frame_type: FrameType, body_hint: usize) -> Self {
        let mut buf = BytesMut::with_capacity(HEADER_SIZE + 1 + body_hint);
        buf.put_u64_le(0); // placeholder
        buf.put_u64_le(id);
        buf.put_u8(frame_type.tag());
        Self { buf }
    }

    pub(crate) fn body(&mut self) -> &mut BytesMut {
        &mut self.buf
    }

    pub(crate) fn finish(mut self) -> Bytes {
        let len = (self.buf.len() - LENGTH_SIZE) as u64;
        self.buf[..LENGTH_SIZE].copy_from_slice(&len.to_le_bytes());
        self.buf.freeze()
    }
}
