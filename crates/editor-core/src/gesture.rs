//! Gesture events as delivered by the host's recognizers
//!
//! Events are serde-tagged so the CLI can replay scripted sessions from JSON.

use annotation_model::Point;
use serde::{Deserialize, Serialize};

/// Recognizer state for continuous gestures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GesturePhase {
    Began,
    Changed,
    Ended,
    Cancelled,
    Failed,
}

impl GesturePhase {
    /// Whether the gesture is over
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Ended | Self::Cancelled | Self::Failed)
    }
}

/// One recognizer callback, with locations in overlay space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GestureEvent {
    /// Single tap
    Tap { location: Point },
    /// Single-touch drag; `location` is the current touch position
    Pan { phase: GesturePhase, location: Point },
    /// Two-finger rotation; `rotation` is cumulative since `Began`, in radians
    Rotation { phase: GesturePhase, rotation: f32 },
    /// Two-finger pinch; `scale` is cumulative since `Began`
    Pinch { phase: GesturePhase, scale: f32 },
}
