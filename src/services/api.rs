use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::models::{generate_id, VitalsResult};
use crate::processing::ProcessingFault;

/// Failures reported by the backend collaborators
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    #[error("Failed to upload recording")]
    Upload,

    #[error("Network request failed")]
    Network,

    #[error("Request timed out")]
    Timeout,

    #[error("Recording not found: {0}")]
    NotFound(String),
}

impl From<ProcessingFault> for ServiceError {
    fn from(fault: ProcessingFault) -> Self {
        match fault {
            ProcessingFault::UploadFailed => ServiceError::Upload,
            ProcessingFault::NetworkIssue => ServiceError::Network,
            ProcessingFault::ProcessingTimeout => ServiceError::Timeout,
        }
    }
}

/// Identifier the backend assigns to an uploaded recording
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordingId(String);

impl RecordingId {
    pub fn generate() -> Self {
        Self(format!("recording-{}", generate_id()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RecordingId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A captured video clip
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recording {
    pub data: Vec<u8>,
    pub duration_secs: u32,
    pub captured_at: DateTime<Utc>,
}

impl Recording {
    pub fn new(data: Vec<u8>, duration_secs: u32) -> Self {
        Self {
            data,
            duration_secs,
            captured_at: Utc::now(),
        }
    }
}

/// Signed-in patient
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub phone: String,
    pub name: String,
}

/// Result of a successful code verification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    pub token: String,
    pub user: UserProfile,
}

/// Backend that turns a recording into vitals
#[async_trait]
pub trait VitalsProcessingService: Send + Sync {
    async fn submit_recording(&self, recording: &Recording) -> Result<RecordingId, ServiceError>;

    async fn process_recording(&self, id: &RecordingId) -> Result<VitalsResult, ServiceError>;

    async fn history(&self, limit: usize) -> Result<Vec<VitalsResult>, ServiceError>;
}

/// Backend for phone login
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Send a one-time code, returning the confirmation message
    async fn send_otp(&self, phone_number: &str) -> Result<String, ServiceError>;

    async fn verify_otp(&self, phone_number: &str, code: &str) -> Result<AuthSession, ServiceError>;

    async fn logout(&self);
}

/// Artificial delays of the mock backends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockLatency {
    pub upload: Duration,
    pub process: Duration,
    pub history: Duration,
    pub auth: Duration,
}

impl MockLatency {
    /// Answer immediately
    pub fn none() -> Self {
        Self {
            upload: Duration::ZERO,
            process: Duration::ZERO,
            history: Duration::ZERO,
            auth: Duration::ZERO,
        }
    }
}

impl Default for MockLatency {
    fn default() -> Self {
        Self {
            upload: Duration::from_millis(2_000),
            process: Duration::from_millis(5_000),
            history: Duration::from_millis(1_000),
            auth: Duration::from_millis(1_000),
        }
    }
}

/// Vitals backend returning the canned reading
pub struct MockVitalsService {
    latency: MockLatency,
    failure: Option<ProcessingFault>,
    recordings: RwLock<HashSet<RecordingId>>,
}

impl MockVitalsService {
    pub fn new(latency: MockLatency) -> Self {
        Self {
            latency,
            failure: None,
            recordings: RwLock::new(HashSet::new()),
        }
    }

    /// Fail the call matching `fault`: uploads for an upload failure,
    /// processing for network issues and timeouts
    pub fn with_failure(mut self, fault: ProcessingFault) -> Self {
        self.failure = Some(fault);
        self
    }
}

impl Default for MockVitalsService {
    fn default() -> Self {
        Self::new(MockLatency::default())
    }
}

#[async_trait]
impl VitalsProcessingService for MockVitalsService {
    async fn submit_recording(&self, recording: &Recording) -> Result<RecordingId, ServiceError> {
        tokio::time::sleep(self.latency.upload).await;

        if self.failure == Some(ProcessingFault::UploadFailed) {
            return Err(ProcessingFault::UploadFailed.into());
        }

        let id = RecordingId::generate();
        self.recordings.write().await.insert(id.clone());
        debug!(%id, bytes = recording.data.len(), "recording submitted");
        Ok(id)
    }

    async fn process_recording(&self, id: &RecordingId) -> Result<VitalsResult, ServiceError> {
        tokio::time::sleep(self.latency.process).await;

        if let Some(fault) = self.failure {
            if fault != ProcessingFault::UploadFailed {
                return Err(fault.into());
            }
        }

        if !self.recordings.read().await.contains(id) {
            return Err(ServiceError::NotFound(id.to_string()));
        }

        Ok(VitalsResult::mock(Utc::now()))
    }

    async fn history(&self, limit: usize) -> Result<Vec<VitalsResult>, ServiceError> {
        tokio::time::sleep(self.latency.history).await;
        Ok(std::iter::once(VitalsResult::mock(Utc::now())).take(limit).collect())
    }
}

const MOCK_TOKEN: &str = "mock-jwt-token";
const MOCK_USER_ID: &str = "1";
const MOCK_USER_NAME: &str = "Sarah Johnson";

/// Auth backend that accepts every request
pub struct MockAuthService {
    latency: Duration,
    token: RwLock<Option<String>>,
}

impl MockAuthService {
    pub fn new(latency: Duration) -> Self {
        Self {
            latency,
            token: RwLock::new(None),
        }
    }

    /// Token held since the last successful verification
    pub async fn token(&self) -> Option<String> {
        self.token.read().await.clone()
    }
}

impl Default for MockAuthService {
    fn default() -> Self {
        Self::new(MockLatency::default().auth)
    }
}

#[async_trait]
impl AuthService for MockAuthService {
    async fn send_otp(&self, phone_number: &str) -> Result<String, ServiceError> {
        tokio::time::sleep(self.latency).await;
        info!(phone_number, "one-time code sent");
        Ok("OTP sent successfully".to_string())
    }

    async fn verify_otp(&self, phone_number: &str, _code: &str) -> Result<AuthSession, ServiceError> {
        tokio::time::sleep(self.latency).await;

        *self.token.write().await = Some(MOCK_TOKEN.to_string());
        Ok(AuthSession {
            token: MOCK_TOKEN.to_string(),
            user: UserProfile {
                id: MOCK_USER_ID.to_string(),
                phone: phone_number.to_string(),
                name: MOCK_USER_NAME.to_string(),
            },
        })
    }

    async fn logout(&self) {
        *self.token.write().await = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_submit_then_process() {
        let service = MockVitalsService::new(MockLatency::none());
        let id = service.submit_recording(&Recording::new(vec![1, 2, 3], 30)).await.unwrap();
        assert!(id.as_str().starts_with("recording-"));

        let vitals = service.process_recording(&id).await.unwrap();
        assert_eq!(vitals.heart_rate_bpm, 72);
        assert_eq!(vitals.spo2_percent, 98);
    }

    #[tokio::test]
    async fn test_unknown_recording() {
        let service = MockVitalsService::new(MockLatency::none());
        let result = service.process_recording(&RecordingId::generate()).await;
        assert!(matches!(result, Err(ServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_fault_hooks_map_to_service_errors() {
        let service = MockVitalsService::new(MockLatency::none()).with_failure(ProcessingFault::UploadFailed);
        assert_eq!(
            service.submit_recording(&Recording::new(vec![], 30)).await,
            Err(ServiceError::Upload)
        );

        let service =
            MockVitalsService::new(MockLatency::none()).with_failure(ProcessingFault::ProcessingTimeout);
        let id = service.submit_recording(&Recording::new(vec![], 30)).await.unwrap();
        assert_eq!(service.process_recording(&id).await, Err(ServiceError::Timeout));

        assert_eq!(ServiceError::from(ProcessingFault::NetworkIssue), ServiceError::Network);
    }

    #[tokio::test]
    async fn test_history_respects_limit() {
        let service = MockVitalsService::new(MockLatency::none());
        assert_eq!(service.history(10).await.unwrap().len(), 1);
        assert!(service.history(0).await.unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_mock_latency() {
        let service = MockVitalsService::default();
        let started = tokio::time::Instant::now();
        let id = service.submit_recording(&Recording::new(vec![], 30)).await.unwrap();
        assert_eq!(started.elapsed(), Duration::from_secs(2));

        service.process_recording(&id).await.unwrap();
        assert_eq!(started.elapsed(), Duration::from_secs(7));
    }

    #[tokio::test]
    async fn test_mock_auth_round_trip() {
        let auth = MockAuthService::new(Duration::ZERO);
        assert_eq!(auth.send_otp("(555) 123-4567").await.unwrap(), "OTP sent successfully");

        let session = auth.verify_otp("(555) 123-4567", "123456").await.unwrap();
        assert_eq!(session.token, "mock-jwt-token");
        assert_eq!(session.user.name, "Sarah Johnson");
        assert_eq!(session.user.phone, "(555) 123-4567");
        assert_eq!(auth.token().await.as_deref(), Some("mock-jwt-token"));

        auth.logout().await;
        assert_eq!(auth.token().await, None);
    }
}
