//! Interfaces to the capture host.
//!
//! The host owns the encoders and the capture pipeline. The output only asks
//! it for permission, tells it when capture begins and ends, and reads the
//! media parameters it needs for the Connect frame.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Video parameters reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoInfo {
    /// Frame-rate numerator. Used as the session's video timescale.
    pub fps_num: u32,
    /// Frame-rate denominator.
    pub fps_den: u32,
}

/// Audio parameters reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioInfo {
    /// Sample rate in Hz. Used as the session's audio timescale.
    pub samples_per_sec: u32,
    pub channels: u32,
}

/// Capture lifecycle controls provided by the host.
///
/// Implementations must tolerate being called from whichever thread drives
/// the output: `start` runs on the caller's thread, finalization runs on the
/// thread delivering the triggering packet.
pub trait CaptureHost: Send + Sync {
    /// Whether the host currently allows a data capture to begin.
    fn can_begin_capture(&self) -> bool;

    /// Prepare the audio and video encoders. `false` aborts the start.
    fn initialize_encoders(&self) -> bool;

    /// Begin delivering encoded packets.
    fn begin_capture(&self);

    /// Graceful end of capture.
    fn end_capture(&self);

    /// Abnormal end of capture with a host-defined, non-zero code.
    fn signal_stop(&self, code: i32);

    /// Current AAC codec header of the audio encoder, if any.
    fn audio_extra_data(&self) -> Option<Bytes>;
}

/// Source of the media parameters written into the Connect frame.
pub trait MediaInfoSource: Send + Sync {
    fn video_info(&self) -> Option<VideoInfo>;
    fn audio_info(&self) -> Option<AudioInfo>;
}
