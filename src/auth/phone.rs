use crate::auth::Strictness;
use crate::models::ValidationError;

const PHONE_DIGITS: usize = 10;
const PHONE_FIELD: &str = "phone number";

/// All ASCII digits of `raw`, in order
pub fn phone_digits(raw: &str) -> String {
    raw.chars().filter(char::is_ascii_digit).collect()
}

/// Render up to 10 digits of `raw` as `(DDD) DDD-DDDD`.
///
/// Fewer than 3 digits are returned bare, 3 to 5 digits get the area code
/// group, 6 or more add the exchange group. Never fails.
pub fn format_phone_number(raw: &str) -> String {
    let digits: String = phone_digits(raw).chars().take(PHONE_DIGITS).collect();

    match digits.len() {
        0..=2 => digits,
        3..=5 => format!("({}) {}", &digits[..3], &digits[3..]),
        _ => format!("({}) {}-{}", &digits[..3], &digits[3..6], &digits[6..]),
    }
}

/// True iff `raw` holds exactly 10 digits and the area code does not start
/// with 0 or 1
pub fn validate_phone_number(raw: &str) -> bool {
    let digits = phone_digits(raw);
    digits.len() == PHONE_DIGITS && !digits.starts_with(['0', '1'])
}

/// Login phone number check for a given strictness
#[derive(Debug, Clone, Copy, Default)]
pub struct PhoneValidator {
    strictness: Strictness,
}

impl PhoneValidator {
    pub fn new(strictness: Strictness) -> Self {
        Self { strictness }
    }

    /// Validate `raw` and return it formatted for the next stage
    pub fn check(&self, raw: &str) -> Result<String, ValidationError> {
        if raw.trim().is_empty() {
            return Err(ValidationError::RequiredField(PHONE_FIELD.to_string()));
        }

        if self.strictness == Strictness::Strict && !validate_phone_number(raw) {
            return Err(ValidationError::InvalidFormat {
                field: PHONE_FIELD.to_string(),
                reason: "Please enter a valid 10-digit phone number".to_string(),
            });
        }

        Ok(format_phone_number(raw))
    }
}
