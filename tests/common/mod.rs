//! Shared test harness for integration tests.
//!
//! Provides [`TestHarness`] which wires a [`SyntheticHost`] and an in-memory
//! sink into a [`RushOutput`], plus helpers to build packets and parse what
//! was written.

#![allow(dead_code)]

use std::sync::Arc;

use bytes::Bytes;
use rush_common::{EncoderPacket, Timebase};
use rush_media::{Frame, FrameReader, MemorySink, SinkTarget};
use rush_output::synthetic::SyntheticHost;
use rush_output::RushOutput;

/// Millisecond timebase used by the packet helpers.
pub const MS: Timebase = Timebase::new(1, 1000);

/// A single IDR slice in Annex-B form.
pub const IDR: &[u8] = &[0x00, 0x00, 0x00, 0x01, 0x65, 0x88, 0x84];

/// Test harness wrapping an output, its host and its sink.
pub struct TestHarness {
    pub host: Arc<SyntheticHost>,
    pub sink: MemorySink,
    pub output: RushOutput,
}

impl TestHarness {
    /// Create a new harness with a cooperative default host.
    pub fn new() -> Self {
        Self::with_host(SyntheticHost::new())
    }

    /// Create a new harness around a customized host.
    pub fn with_host(host: SyntheticHost) -> Self {
        let host = Arc::new(host);
        let sink = MemorySink::new();
        let output = RushOutput::new(host.clone(), host.clone(), SinkTarget::Memory(sink.clone()));
        Self { host, sink, output }
    }

    /// Start the output, panicking on failure.
    pub fn started() -> Self {
        let harness = Self::new();
        harness.output.start().expect("start failed");
        harness
    }

    /// Every frame written so far.
    pub fn frames(&self) -> Vec<Frame> {
        parse_frames(&self.sink.contents())
    }
}

/// Parse a complete RUSH byte stream.
pub fn parse_frames(data: &[u8]) -> Vec<Frame> {
    FrameReader::new(data)
        .collect::<Result<Vec<_>, _>>()
        .expect("stream did not parse")
}

/// Video packet in milliseconds.
pub fn video(pts: i64, dts: i64, sys_dts_usec: i64) -> EncoderPacket {
    EncoderPacket::video(MS, pts, dts, sys_dts_usec, Bytes::from_static(IDR)).with_keyframe(true)
}

/// Audio packet in milliseconds.
pub fn audio(dts: i64, sys_dts_usec: i64) -> EncoderPacket {
    EncoderPacket::audio(MS, dts, sys_dts_usec, Bytes::from_static(&[0x21, 0x10, 0x04]))
}
