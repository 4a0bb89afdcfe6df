//! Top-level navigation: the auth sequence and the vitals sequence.
//!
//! Each sequence is a pure `(stage, event) -> stage` function plus a small
//! owner that tracks the current stage.

pub mod auth;
pub mod vitals;

pub use auth::{AuthEvent, AuthFlow, AuthStage, LOADING_DELAY};
pub use vitals::{VitalsEvent, VitalsFlow, VitalsStage};

use thiserror::Error;

use crate::models::ValidationError;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FlowError {
    #[error("Cannot {event} from the {stage} screen")]
    InvalidTransition { stage: String, event: String },

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl FlowError {
    pub(crate) fn invalid(stage: impl std::fmt::Display, event: impl std::fmt::Display) -> Self {
        FlowError::InvalidTransition {
            stage: stage.to_string(),
            event: event.to_string(),
        }
    }
}
