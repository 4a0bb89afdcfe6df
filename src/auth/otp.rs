use crate::auth::Strictness;
use crate::models::ValidationError;

/// Number of cells in a one-time code
pub const OTP_LENGTH: usize = 6;

/// The only code strict mode accepts
pub const ACCEPTED_DEMO_CODE: &str = "123456";

/// Seconds before another code may be requested
pub const RESEND_COOLDOWN_SECS: u32 = 30;

const OTP_FIELD: &str = "code";

/// Six single-digit cells with a focused cell.
///
/// Typing a digit fills a cell and moves focus forward, backspace on an empty
/// cell moves focus back, and pasting exactly six digits fills every cell.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OtpEntry {
    cells: [Option<char>; OTP_LENGTH],
    focus: usize,
}

impl OtpEntry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index of the focused cell
    pub fn focus(&self) -> usize {
        self.focus
    }

    pub fn cells(&self) -> &[Option<char>; OTP_LENGTH] {
        &self.cells
    }

    /// Move focus to `index` (clamped to the last cell)
    pub fn focus_cell(&mut self, index: usize) {
        self.focus = index.min(OTP_LENGTH - 1);
    }

    /// Set cell `index` to `value`.
    ///
    /// `value` must be empty (clears the cell) or a single ASCII digit;
    /// anything else is ignored and `false` is returned.
    pub fn input(&mut self, index: usize, value: &str) -> bool {
        if index >= OTP_LENGTH {
            return false;
        }

        let mut chars = value.chars();
        let digit = match (chars.next(), chars.next()) {
            (None, _) => None,
            (Some(c), None) if c.is_ascii_digit() => Some(c),
            _ => return false,
        };

        self.cells[index] = digit;
        self.focus = index;
        if digit.is_some() && index < OTP_LENGTH - 1 {
            self.focus = index + 1;
        }
        true
    }

    /// Backspace on the focused cell
    pub fn backspace(&mut self) {
        if self.cells[self.focus].is_some() {
            self.cells[self.focus] = None;
        } else if self.focus > 0 {
            self.focus -= 1;
        }
    }

    /// Distribute a pasted code across all cells.
    ///
    /// Non-digits are dropped first; anything other than exactly six digits
    /// leaves the entry unchanged.
    pub fn paste(&mut self, text: &str) -> bool {
        let digits: Vec<char> = text.chars().filter(char::is_ascii_digit).collect();
        if digits.len() != OTP_LENGTH {
            return false;
        }

        for (cell, digit) in self.cells.iter_mut().zip(digits) {
            *cell = Some(digit);
        }
        self.focus = OTP_LENGTH - 1;
        true
    }

    pub fn is_complete(&self) -> bool {
        self.cells.iter().all(Option::is_some)
    }

    /// Number of filled cells
    pub fn filled(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }

    /// The concatenated code once every cell is filled
    pub fn code(&self) -> Option<String> {
        self.cells.iter().copied().collect()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Checks a submitted code for the configured strictness
#[derive(Debug, Clone, Copy, Default)]
pub struct OtpVerifier {
    strictness: Strictness,
}

impl OtpVerifier {
    pub fn new(strictness: Strictness) -> Self {
        Self { strictness }
    }

    pub fn verify_entry(&self, entry: &OtpEntry) -> Result<String, ValidationError> {
        match entry.code() {
            Some(code) => self.verify(&code).map(|_| code),
            None => Err(ValidationError::InvalidLength {
                field: OTP_FIELD.to_string(),
                expected: OTP_LENGTH,
                actual: entry.filled(),
            }),
        }
    }

    pub fn verify(&self, code: &str) -> Result<(), ValidationError> {
        let length = code.chars().count();
        if length != OTP_LENGTH || !code.chars().all(|c| c.is_ascii_digit()) {
            return Err(ValidationError::InvalidLength {
                field: OTP_FIELD.to_string(),
                expected: OTP_LENGTH,
                actual: code.chars().filter(char::is_ascii_digit).count(),
            });
        }

        match self.strictness {
            Strictness::Strict if code != ACCEPTED_DEMO_CODE => Err(ValidationError::IncorrectCode),
            _ => Ok(()),
        }
    }
}

/// Countdown gating the "resend code" action, ticked once per second
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResendCooldown {
    remaining: u32,
}

impl ResendCooldown {
    pub fn new() -> Self {
        Self {
            remaining: RESEND_COOLDOWN_SECS,
        }
    }

    pub fn remaining_secs(&self) -> u32 {
        self.remaining
    }

    pub fn can_resend(&self) -> bool {
        self.remaining == 0
    }

    /// One second elapsed
    pub fn tick(&mut self) {
        self.remaining = self.remaining.saturating_sub(1);
    }

    /// Restart the countdown; refused while still cooling down
    pub fn resend(&mut self) -> bool {
        if !self.can_resend() {
            return false;
        }
        self.remaining = RESEND_COOLDOWN_SECS;
        true
    }
}

impl Default for ResendCooldown {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn type_code(entry: &mut OtpEntry, code: &str) {
        for c in code.chars() {
            let focus = entry.focus();
            assert!(entry.input(focus, &c.to_string()));
        }
    }

    #[test]
    fn test_typing_advances_focus() {
        let mut entry = OtpEntry::new();
        assert!(entry.input(0, "1"));
        assert_eq!(entry.focus(), 1);
        assert!(entry.input(1, "2"));
        assert_eq!(entry.focus(), 2);
        assert!(!entry.is_complete());
        assert_eq!(entry.code(), None);
    }

    #[test]
    fn test_typing_last_cell_keeps_focus() {
        let mut entry = OtpEntry::new();
        type_code(&mut entry, "123456");
        assert_eq!(entry.focus(), 5);
        assert_eq!(entry.code().as_deref(), Some("123456"));
    }

    #[test]
    fn test_rejects_non_digits() {
        let mut entry = OtpEntry::new();
        assert!(!entry.input(0, "a"));
        assert!(!entry.input(0, "12"));
        assert!(!entry.input(6, "1"));
        assert_eq!(entry, OtpEntry::new());
    }

    #[test]
    fn test_backspace_on_empty_cell_moves_back() {
        let mut entry = OtpEntry::new();
        type_code(&mut entry, "12");
        assert_eq!(entry.focus(), 2);

        entry.backspace();
        assert_eq!(entry.focus(), 1);

        entry.backspace();
        assert_eq!(entry.focus(), 1);
        assert_eq!(entry.cells()[1], None);

        entry.backspace();
        assert_eq!(entry.focus(), 0);
        entry.backspace();
        entry.backspace();
        assert_eq!(entry.focus(), 0);
        assert_eq!(entry.filled(), 0);
    }

    #[test]
    fn test_paste_six_digits_fills_every_cell() {
        let mut entry = OtpEntry::new();
        assert!(entry.paste("12-34 56"));
        assert_eq!(entry.code().as_deref(), Some("123456"));
        assert_eq!(entry.focus(), 5);
    }

    #[test]
    fn test_paste_other_lengths_is_a_no_op() {
        let mut entry = OtpEntry::new();
        entry.input(0, "9");
        let before = entry.clone();

        assert!(!entry.paste("12345"));
        assert!(!entry.paste("1234567"));
        assert!(!entry.paste(""));
        assert_eq!(entry, before);
    }

    #[test]
    fn test_strict_verifier() {
        let verifier = OtpVerifier::new(Strictness::Strict);
        assert!(verifier.verify("123456").is_ok());
        assert_eq!(verifier.verify("654321"), Err(ValidationError::IncorrectCode));
        assert!(matches!(
            verifier.verify("1234"),
            Err(ValidationError::InvalidLength { actual: 4, .. })
        ));
    }

    #[test]
    fn test_permissive_verifier() {
        let verifier = OtpVerifier::new(Strictness::Permissive);
        assert!(verifier.verify("000000").is_ok());
        assert!(verifier.verify("12345").is_err());
    }

    #[test]
    fn test_verify_incomplete_entry() {
        let verifier = OtpVerifier::new(Strictness::Permissive);
        let mut entry = OtpEntry::new();
        type_code(&mut entry, "123");

        assert_eq!(
            verifier.verify_entry(&entry),
            Err(ValidationError::InvalidLength {
                field: "code".to_string(),
                expected: 6,
                actual: 3,
            })
        );

        type_code(&mut entry, "456");
        assert_eq!(verifier.verify_entry(&entry).unwrap(), "123456");
    }

    #[test]
    fn test_resend_cooldown() {
        let mut cooldown = ResendCooldown::new();
        assert!(!cooldown.can_resend());
        assert!(!cooldown.resend());

        for _ in 0..RESEND_COOLDOWN_SECS {
            cooldown.tick();
        }
        assert!(cooldown.can_resend());
        cooldown.tick();
        assert_eq!(cooldown.remaining_secs(), 0);

        assert!(cooldown.resend());
        assert_eq!(cooldown.remaining_secs(), RESEND_COOLDOWN_SECS);
    }
}
