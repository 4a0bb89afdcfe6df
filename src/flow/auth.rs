use std::fmt;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info};

use super::FlowError;
use crate::auth::{OtpEntry, OtpVerifier, PhoneValidator, Strictness};

/// How long the loading screen shows before the dashboard
pub const LOADING_DELAY: Duration = Duration::from_millis(2500);

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum AuthStage {
    Welcome,
    Login,
    Otp { phone_number: String },
    Loading,
    Dashboard,
}

impl AuthStage {
    pub fn name(&self) -> &'static str {
        match self {
            AuthStage::Welcome => "welcome",
            AuthStage::Login => "login",
            AuthStage::Otp { .. } => "otp",
            AuthStage::Loading => "loading",
            AuthStage::Dashboard => "dashboard",
        }
    }

    /// Position in the sequence, starting at 0 for `Welcome`
    pub fn position(&self) -> usize {
        match self {
            AuthStage::Welcome => 0,
            AuthStage::Login => 1,
            AuthStage::Otp { .. } => 2,
            AuthStage::Loading => 3,
            AuthStage::Dashboard => 4,
        }
    }
}

impl fmt::Display for AuthStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    GetStarted,
    /// Carries the already-validated, formatted phone number
    SubmitPhone(String),
    Verified,
    LoadingDone,
    Back,
    SignOut,
}

impl fmt::Display for AuthEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AuthEvent::GetStarted => "get started",
            AuthEvent::SubmitPhone(_) => "submit phone number",
            AuthEvent::Verified => "verify code",
            AuthEvent::LoadingDone => "finish loading",
            AuthEvent::Back => "go back",
            AuthEvent::SignOut => "sign out",
        };
        write!(f, "{}", name)
    }
}

/// Next auth stage for `event`, or `None` if the event is not allowed here
pub fn next_auth_stage(stage: &AuthStage, event: &AuthEvent) -> Option<AuthStage> {
    match (stage, event) {
        (AuthStage::Welcome, AuthEvent::GetStarted) => Some(AuthStage::Login),
        (AuthStage::Login, AuthEvent::SubmitPhone(phone)) => Some(AuthStage::Otp {
            phone_number: phone.clone(),
        }),
        (AuthStage::Login, AuthEvent::Back) => Some(AuthStage::Welcome),
        (AuthStage::Otp { .. }, AuthEvent::Verified) => Some(AuthStage::Loading),
        (AuthStage::Otp { .. }, AuthEvent::Back) => Some(AuthStage::Login),
        (AuthStage::Loading, AuthEvent::LoadingDone) => Some(AuthStage::Dashboard),
        (AuthStage::Dashboard, AuthEvent::SignOut) => Some(AuthStage::Welcome),
        _ => None,
    }
}

/// Owner of the auth sequence, validating input before advancing
#[derive(Debug, Clone)]
pub struct AuthFlow {
    stage: AuthStage,
    phone: PhoneValidator,
    otp: OtpVerifier,
}

impl AuthFlow {
    pub fn new(strictness: Strictness) -> Self {
        Self {
            stage: AuthStage::Welcome,
            phone: PhoneValidator::new(strictness),
            otp: OtpVerifier::new(strictness),
        }
    }

    pub fn stage(&self) -> &AuthStage {
        &self.stage
    }

    /// Phone number collected at login, while on the OTP screen
    pub fn phone_number(&self) -> Option<&str> {
        match &self.stage {
            AuthStage::Otp { phone_number } => Some(phone_number),
            _ => None,
        }
    }

    pub fn get_started(&mut self) -> Result<&AuthStage, FlowError> {
        self.apply(AuthEvent::GetStarted)
    }

    /// Validate `raw` and move to the OTP screen with the formatted number
    pub fn submit_phone(&mut self, raw: &str) -> Result<&AuthStage, FlowError> {
        self.expect_stage("login", &AuthEvent::SubmitPhone(String::new()))?;
        let formatted = self.phone.check(raw)?;
        self.apply(AuthEvent::SubmitPhone(formatted))
    }

    /// Verify the entered code and move to the loading screen
    pub fn submit_otp(&mut self, entry: &OtpEntry) -> Result<&AuthStage, FlowError> {
        self.expect_stage("otp", &AuthEvent::Verified)?;
        self.otp.verify_entry(entry)?;
        self.apply(AuthEvent::Verified)
    }

    pub fn finish_loading(&mut self) -> Result<&AuthStage, FlowError> {
        self.apply(AuthEvent::LoadingDone)
    }

    pub fn back(&mut self) -> Result<&AuthStage, FlowError> {
        self.apply(AuthEvent::Back)
    }

    pub fn sign_out(&mut self) -> Result<&AuthStage, FlowError> {
        self.apply(AuthEvent::SignOut)
    }

    fn expect_stage(&self, name: &str, event: &AuthEvent) -> Result<(), FlowError> {
        if self.stage.name() == name {
            Ok(())
        } else {
            Err(FlowError::invalid(&self.stage, event))
        }
    }

    fn apply(&mut self, event: AuthEvent) -> Result<&AuthStage, FlowError> {
        let next = next_auth_stage(&self.stage, &event)
            .ok_or_else(|| FlowError::invalid(&self.stage, &event))?;

        debug!(from = %self.stage, to = %next, %event, "auth transition");
        if next == AuthStage::Dashboard {
            info!("signed in");
        }
        self.stage = next;
        Ok(&self.stage)
    }
}

impl Default for AuthFlow {
    fn default() -> Self {
        Self::new(Strictness::default())
    }
}
