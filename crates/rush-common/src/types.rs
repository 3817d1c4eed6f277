//! Core type definitions for packets, tracks, and time bases.
//!
//! The host delivers one [`EncoderPacket`] at a time; each packet carries its
//! own source [`Timebase`]. A session resolves its [`Timescales`] once, when
//! the Connect frame is written, and rescales every later timestamp with them.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Video timescale used when the host has no video info.
pub const DEFAULT_VIDEO_TIMESCALE: u16 = 1000;

/// Audio timescale used when the host has no audio info.
pub const DEFAULT_AUDIO_TIMESCALE: u16 = 44100;

/// Kind of media carried by a packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    /// Encoded audio (AAC).
    Audio,
    /// Encoded video (H.264).
    Video,
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Audio => write!(f, "audio"),
            Self::Video => write!(f, "video"),
        }
    }
}

/// Track binding written into data frames.
///
/// One track per media kind. The wire ids are part of the format: video
/// frames carry track 0, audio frames carry track 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Track {
    Video,
    Audio,
}

impl Track {
    /// Track bound to the given media kind.
    pub fn for_kind(kind: MediaKind) -> Self {
        match kind {
            MediaKind::Video => Self::Video,
            MediaKind::Audio => Self::Audio,
        }
    }

    /// Track id as written on the wire.
    pub fn id(self) -> u8 {
        match self {
            Self::Video => 0,
            Self::Audio => 1,
        }
    }

    /// Media kind carried on this track.
    pub fn kind(self) -> MediaKind {
        match self {
            Self::Video => MediaKind::Video,
            Self::Audio => MediaKind::Audio,
        }
    }
}

impl fmt::Display for Track {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.kind(), self.id())
    }
}

/// Rational timebase of a packet's timestamps (seconds per tick = num / den).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Timebase {
    pub num: i64,
    pub den: i64,
}

impl Timebase {
    pub const fn new(num: i64, den: i64) -> Self {
        Self { num, den }
    }
}

impl fmt::Display for Timebase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.num, self.den)
    }
}

/// Destination timescales for a session, fixed once the Connect frame is out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timescales {
    pub video: u16,
    pub audio: u16,
}

impl Timescales {
    /// Resolve timescales from host-provided rates.
    ///
    /// `video_rate` is the frame-rate numerator, `audio_rate` the sample rate.
    /// Missing, zero, or out-of-range values fall back to the defaults.
    pub fn resolve(video_rate: Option<u32>, audio_rate: Option<u32>) -> Self {
        Self {
            video: narrow("video", video_rate, DEFAULT_VIDEO_TIMESCALE),
            audio: narrow("audio", audio_rate, DEFAULT_AUDIO_TIMESCALE),
        }
    }

    /// Timescale used for the given media kind.
    pub fn for_kind(&self, kind: MediaKind) -> u16 {
        match kind {
            MediaKind::Video => self.video,
            MediaKind::Audio => self.audio,
        }
    }
}

impl Default for Timescales {
    fn default() -> Self {
        Self {
            video: DEFAULT_VIDEO_TIMESCALE,
            audio: DEFAULT_AUDIO_TIMESCALE,
        }
    }
}

fn narrow(kind: &str, rate: Option<u32>, default: u16) -> u16 {
    match rate {
        None => default,
        Some(0) => {
            tracing::warn!(kind, default, "Host reported a zero timescale; using default");
            default
        }
        Some(rate) => u16::try_from(rate).unwrap_or_else(|_| {
            tracing::warn!(kind, rate, default, "Timescale does not fit in 16 bits; using default");
            default
        }),
    }
}

/// An encoded packet as delivered by the host's encoder.
#[derive(Debug, Clone)]
pub struct EncoderPacket {
    /// Audio or video.
    pub kind: MediaKind,
    /// Timebase of `pts` and `dts`.
    pub timebase: Timebase,
    /// Presentation timestamp in `timebase` units.
    pub pts: i64,
    /// Decode timestamp in `timebase` units.
    pub dts: i64,
    /// Decode timestamp on the host's system clock, in microseconds.
    /// Compared against the stop threshold.
    pub sys_dts_usec: i64,
    /// Whether the packet starts a keyframe.
    pub keyframe: bool,
    /// Encoded payload. Video payloads are Annex-B byte streams.
    pub data: Bytes,
}

impl EncoderPacket {
    /// Create a video packet.
    pub fn video(timebase: Timebase, pts: i64, dts: i64, sys_dts_usec: i64, data: Bytes) -> Self {
        Self {
            kind: MediaKind::Video,
            timebase,
            pts,
            dts,
            sys_dts_usec,
            keyframe: false,
            data,
        }
    }

    /// Create an audio packet. Audio has no reordering so pts equals dts.
    pub fn audio(timebase: Timebase, dts: i64, sys_dts_usec: i64, data: Bytes) -> Self {
        Self {
            kind: MediaKind::Audio,
            timebase,
            pts: dts,
            dts,
            sys_dts_usec,
            keyframe: true,
            data,
        }
    }

    /// Mark the packet as a keyframe.
    pub fn with_keyframe(mut self, keyframe: bool) -> Self {
        self.keyframe = keyframe;
        self
    }

    pub fn is_video(&self) -> bool {
        self.kind == MediaKind::Video
    }

    pub fn is_audio(&self) -> bool {
        self.kind == MediaKind::Audio
    }
}

/// Outcome reported to the host when a session finalizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StopCode {
    /// Graceful end of capture.
    Success,
    /// Abnormal stop with a host-defined code.
    Error(i32),
}

impl StopCode {
    /// Map a raw host code: zero is success, anything else an error.
    pub fn from_raw(code: i32) -> Self {
        if code == 0 {
            Self::Success
        } else {
            Self::Error(code)
        }
    }

    /// Raw code as understood by the host.
    pub fn raw(self) -> i32 {
        match self {
            Self::Success => 0,
            Self::Error(code) => code,
        }
    }

    pub fn is_success(self) -> bool {
        self == Self::Success
    }
}

impl fmt::Display for StopCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::Error(code) => write!(f, "error({code})"),
        }
    }
}
