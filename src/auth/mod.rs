//! Login input handling: phone number formatting and validation, one-time
//! code entry, verification and the resend cooldown.

pub mod otp;
pub mod phone;

pub use otp::{OtpEntry, OtpVerifier, ResendCooldown, ACCEPTED_DEMO_CODE, OTP_LENGTH, RESEND_COOLDOWN_SECS};
pub use phone::{format_phone_number, phone_digits, validate_phone_number, PhoneValidator};

use serde::{Deserialize, Serialize};

/// How strictly login input is checked.
///
/// `Strict` validates the phone number and only accepts the demo code;
/// `Permissive` lets any non-blank number and any complete code through.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strictness {
    #[default]
    Strict,
    Permissive,
}

impl std::fmt::Display for Strictness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Strictness::Strict => write!(f, "strict"),
            Strictness::Permissive => write!(f, "permissive"),
        }
    }
}
