//! Camera capture stage: `ready -> recording -> complete`.
//!
//! [`CaptureSession`] is the pure state machine advanced one tick per
//! second; [`CaptureController`] drives it from a timer and gates `start`
//! on the camera permission.

pub mod controller;
pub mod session;

pub use controller::CaptureController;
pub use session::CaptureSession;

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::services::PermissionStatus;

/// Length of a recording in seconds
pub const CAPTURE_DURATION_SECS: u32 = 30;

/// Interval between capture ticks
pub const CAPTURE_TICK: Duration = Duration::from_secs(1);

/// Stage of the capture screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptureStage {
    Ready,
    Recording,
    Complete,
}

/// User actions on the capture screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureAction {
    Start,
    Stop,
    Retake,
    Continue,
}

/// Observable capture state
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaptureState {
    pub stage: CaptureStage,

    /// Progress in `[0, 100]`, never decreasing within a recording
    pub progress_percent: f64,

    pub seconds_remaining: u32,

    /// Set when the last `start` was refused
    pub error: Option<CaptureError>,
}

/// Capture stage errors
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
pub enum CaptureError {
    #[error("Camera permission {0}. Please enable camera access.")]
    PermissionDenied(PermissionStatus),

    #[error("Cannot {action} while {from}")]
    InvalidTransition {
        from: CaptureStage,
        action: CaptureAction,
    },
}

impl std::fmt::Display for CaptureStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CaptureStage::Ready => write!(f, "ready"),
            CaptureStage::Recording => write!(f, "recording"),
            CaptureStage::Complete => write!(f, "complete"),
        }
    }
}

impl std::fmt::Display for CaptureAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CaptureAction::Start => write!(f, "start recording"),
            CaptureAction::Stop => write!(f, "stop recording"),
            CaptureAction::Retake => write!(f, "retake"),
            CaptureAction::Continue => write!(f, "continue"),
        }
    }
}

impl Serialize for CaptureAction {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_error_display() {
        assert_eq!(
            CaptureError::PermissionDenied(PermissionStatus::Denied).to_string(),
            "Camera permission denied. Please enable camera access."
        );
        assert_eq!(
            CaptureError::InvalidTransition {
                from: CaptureStage::Ready,
                action: CaptureAction::Stop,
            }
            .to_string(),
            "Cannot stop recording while ready"
        );
    }
}
