use thiserror::Error;

/// Input validation errors surfaced next to the offending field.
///
/// These never advance the flow; the stage that produced them stays put.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Required field is missing or blank
    #[error("Please enter your {0}")]
    RequiredField(String),

    /// Field format is invalid
    #[error("Invalid format for field '{field}': {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Field has the wrong number of characters
    #[error("Please enter the complete {expected}-digit {field}")]
    InvalidLength {
        field: String,
        expected: usize,
        actual: usize,
    },

    /// A complete code that does not match the accepted value
    #[error("Invalid verification code. Please try again.")]
    IncorrectCode,
}

impl ValidationError {
    /// Name of the field this error belongs to, if any
    pub fn field(&self) -> Option<&str> {
        match self {
            ValidationError::RequiredField(field) => Some(field),
            ValidationError::InvalidFormat { field, .. } => Some(field),
            ValidationError::InvalidLength { field, .. } => Some(field),
            ValidationError::IncorrectCode => None,
        }
    }
}
