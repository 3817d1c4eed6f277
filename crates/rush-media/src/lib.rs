//! Rush-Media: the RUSH wire layer.
//!
//! RUSH is a length-prefixed framed container. Every frame starts with an
//! 8-byte little-endian length (counting the bytes after it) and an 8-byte
//! frame id, followed by a type tag and type-specific fields.
//!
//! # Modules
//!
//! - `rescale` - Timestamp conversion from a packet timebase to a timescale
//! - `frame` - Connect/Audio/Video frame encoders and a frame reader
//! - `avc` - H.264 Annex-B to length-prefixed NAL conversion
//! - `sink` - Ordered byte sinks frames are appended to
//!
//! # Layout
//!
//! ```text
//! Connect 0x00: version(1) vts(2) ats(2) broadcast(8) payload "{}"
//! Video   0x0d: codec(1) pts(8) dts(8) track(1) offset(2) nal-framed payload
//! Audio   0x14: codec(1) dts(8) track(1) extradata_len(2) extradata payload
//! ```

pub mod avc;
pub mod error;
pub mod frame;
pub mod rescale;
pub mod sink;

pub use error::{Error, Result};
pub use frame::{Frame, FrameReader, FrameType};
pub use rescale::rescale;
pub use sink::{FileSink, FrameSink, MemorySink, SinkTarget};
