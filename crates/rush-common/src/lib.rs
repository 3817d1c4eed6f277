//! Rush-Common: shared vocabulary for the RUSH output.
//!
//! This crate provides the types that cross crate boundaries:
//!
//! - **Packets**: [`EncoderPacket`] as delivered by the host's encoders
//! - **Tracks**: [`MediaKind`] and the [`Track`] binding used by frame encoders
//! - **Time**: [`Timebase`] (source rational) and [`Timescales`] (session scales)
//! - **Error Handling**: Common error types and result aliases
//!
//! # Examples
//!
//! ```
//! use rush_common::{MediaKind, Timescales, Track};
//!
//! let scales = Timescales::resolve(Some(30), None);
//! assert_eq!(scales.video, 30);
//! assert_eq!(scales.audio, 44100);
//!
//! assert_eq!(Track::for_kind(MediaKind::Audio).id(), 1);
//! ```

pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::*;
