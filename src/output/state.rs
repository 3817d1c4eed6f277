use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of a [`RushOutput`](super::RushOutput).
///
/// ```text
/// Created ──start──▶ Capturing ──stop──▶ Stopping ──threshold reached──▶ Finalized
///                        └──────────────force_stop────────────────────────▶┘
/// ```
///
/// A finalized output may be started again, which opens a fresh session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputState {
    /// Constructed, never started.
    Created,
    /// Writing every delivered packet.
    Capturing,
    /// Stop requested; still writing until a packet reaches the threshold.
    Stopping,
    /// Sink closed. Late packets are ignored.
    Finalized,
}

impl OutputState {
    /// Whether packets are still written in this state.
    pub fn is_active(self) -> bool {
        matches!(self, Self::Capturing | Self::Stopping)
    }

    /// Whether `start` is accepted in this state.
    pub fn can_start(self) -> bool {
        matches!(self, Self::Created | Self::Finalized)
    }
}

impl fmt::Display for OutputState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created => write!(f, "created"),
            Self::Capturing => write!(f, "capturing"),
            Self::Stopping => write!(f, "stopping"),
            Self::Finalized => write!(f, "finalized"),
        }
    }
}
