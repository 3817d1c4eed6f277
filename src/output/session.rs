//! Per-capture session state.
//!
//! A session lives from a successful `start` to finalization. All of its
//! fields are only touched under the output's lock.

use bytes::Bytes;
use rush_common::{EncoderPacket, MediaKind, Timescales, Track};
use rush_media::frame::{encode_audio, encode_connect, encode_video};
use rush_media::FrameSink;
use serde::Serialize;

use super::OutputState;
use crate::host::{CaptureHost, MediaInfoSource};

/// Counters for one capture session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SessionStats {
    /// Frames handed to the sink, Connect included.
    pub frames_written: u64,
    pub video_frames: u64,
    pub audio_frames: u64,
    /// Bytes successfully written.
    pub bytes_written: u64,
    /// Frames the sink failed to accept.
    pub write_errors: u64,
}

pub(crate) struct Session {
    pub(crate) state: OutputState,
    /// Id given to the next encoded frame. Starts at 1 for the Connect frame.
    next_id: u64,
    /// Set once the Connect frame has been produced.
    timescales: Option<Timescales>,
    /// Packets with `sys_dts_usec` at or past this are not written.
    stop_threshold_usec: Option<i64>,
    sink: Option<Box<dyn FrameSink>>,
    pub(crate) stats: SessionStats,
}

impl Session {
    pub(crate) fn new(sink: Box<dyn FrameSink>) -> Self {
        Self {
            state: OutputState::Capturing,
            next_id: 1,
            timescales: None,
            stop_threshold_usec: None,
            sink: Some(sink),
            stats: SessionStats::default(),
        }
    }

    pub(crate) fn timescales(&self) -> Option<Timescales> {
        self.timescales
    }

    pub(crate) fn request_stop(&mut self, threshold_usec: i64) {
        self.stop_threshold_usec = Some(threshold_usec);
        self.state = OutputState::Stopping;
    }

    /// Whether a packet with this system timestamp ends the session.
    pub(crate) fn stop_reached(&self, sys_dts_usec: i64) -> bool {
        self.stop_threshold_usec
            .is_some_and(|threshold| sys_dts_usec >= threshold)
    }

    /// Write the Connect frame if this session has not written one yet.
    pub(crate) fn write_headers(&mut self, info: &dyn MediaInfoSource) {
        if self.timescales.is_some() {
            return;
        }
        let timescales = Timescales::resolve(
            info.video_info().map(|v| v.fps_num),
            info.audio_info().map(|a| a.samples_per_sec),
        );
        tracing::debug!(
            video_timescale = timescales.video,
            audio_timescale = timescales.audio,
            "Writing RUSH connect frame"
        );
        self.timescales = Some(timescales);
        let frame = encode_connect(self.next_id, timescales);
        self.commit(frame, None);
    }

    /// Encode and write one data frame. Headers must already be out.
    pub(crate) fn write_packet(&mut self, packet: &EncoderPacket, host: &dyn CaptureHost) {
        let timescale = self.timescales.unwrap_or_default().for_kind(packet.kind);
        let track = Track::for_kind(packet.kind);
        let frame = match packet.kind {
            MediaKind::Video => encode_video(self.next_id, timescale, track, packet),
            MediaKind::Audio => {
                let extradata = host.audio_extra_data().unwrap_or_default();
                encode_audio(self.next_id, timescale, track, packet, &extradata)
            }
        };
        self.commit(frame, Some(packet.kind));
    }

    /// Hand a frame to the sink and advance the id counter.
    ///
    /// The id is consumed even if the write fails, so ids are never reused.
    fn commit(&mut self, frame: Bytes, kind: Option<MediaKind>) {
        let id = self.next_id;
        self.next_id += 1;

        let Some(sink) = self.sink.as_mut() else {
            return;
        };
        match sink.write_frame(&frame) {
            Ok(()) => {
                self.stats.frames_written += 1;
                self.stats.bytes_written += frame.len() as u64;
                match kind {
                    Some(MediaKind::Video) => self.stats.video_frames += 1,
                    Some(MediaKind::Audio) => self.stats.audio_frames += 1,
                    None => {}
                }
                tracing::trace!(id, len = frame.len(), "Wrote RUSH frame");
            }
            Err(e) => {
                self.stats.write_errors += 1;
                tracing::warn!(id, error = %e, "Failed to write RUSH frame");
            }
        }
    }

    /// Close the sink and mark the session finalized.
    pub(crate) fn finalize(&mut self) {
        self.close_sink();
        self.state = OutputState::Finalized;
    }

    pub(crate) fn close_sink(&mut self) {
        if let Some(mut sink) = self.sink.take() {
            if let Err(e) = sink.close() {
                tracing::warn!(error = %e, "Failed to close RUSH sink");
            }
        }
    }
}
