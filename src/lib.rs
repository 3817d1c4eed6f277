//! Rush-Output - real-time RUSH container muxer
//!
//! Turns a host's encoded H.264/AAC packets into a RUSH byte stream: one
//! Connect frame followed by audio and video frames, written to a sink. The
//! frame encoders and sinks live in `rush-media`; this crate holds the
//! capture controller and the host interfaces it is driven through.
//!
//! ```no_run
//! use std::sync::Arc;
//! use rush_media::SinkTarget;
//! use rush_output::{synthetic::{SyntheticHost, SyntheticSource}, RushOutput};
//!
//! let host = Arc::new(SyntheticHost::new());
//! let output = RushOutput::new(host.clone(), host.clone(), SinkTarget::file("/tmp/test.fbvp"));
//! output.start()?;
//! output.stop(1_000_000_000);
//! for packet in SyntheticSource::for_host(host.as_ref(), 0, 2_000_000) {
//!     output.encoded_packet(&packet);
//! }
//! # Ok::<(), rush_common::Error>(())
//! ```

pub mod config;
pub mod host;
pub mod output;
pub mod synthetic;

pub use host::{AudioInfo, CaptureHost, MediaInfoSource, VideoInfo};
pub use output::{OutputState, RushOutput, SessionStats};
