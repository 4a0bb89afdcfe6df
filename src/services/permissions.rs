use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Camera permission state reported by the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionStatus {
    Granted,
    Denied,
    NeverAskAgain,
    Unavailable,
}

impl std::fmt::Display for PermissionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PermissionStatus::Granted => write!(f, "granted"),
            PermissionStatus::Denied => write!(f, "denied"),
            PermissionStatus::NeverAskAgain => write!(f, "permanently denied"),
            PermissionStatus::Unavailable => write!(f, "unavailable"),
        }
    }
}

/// Source of camera permission decisions
#[async_trait]
pub trait PermissionProvider: Send + Sync {
    async fn check_camera_permission(&self) -> PermissionStatus;

    async fn request_camera_permission(&self) -> PermissionStatus;
}

/// Provider that answers with fixed statuses
#[derive(Debug)]
pub struct StaticPermissionProvider {
    check: PermissionStatus,
    request: PermissionStatus,
    requests: AtomicUsize,
}

impl StaticPermissionProvider {
    pub fn new(check: PermissionStatus, request: PermissionStatus) -> Self {
        Self {
            check,
            request,
            requests: AtomicUsize::new(0),
        }
    }

    /// Always granted
    pub fn granted() -> Self {
        Self::new(PermissionStatus::Granted, PermissionStatus::Granted)
    }

    /// Denied on check and on request
    pub fn denied() -> Self {
        Self::new(PermissionStatus::Denied, PermissionStatus::Denied)
    }

    /// How many times a permission request was made
    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PermissionProvider for StaticPermissionProvider {
    async fn check_camera_permission(&self) -> PermissionStatus {
        self.check
    }

    async fn request_camera_permission(&self) -> PermissionStatus {
        self.requests.fetch_add(1, Ordering::SeqCst);
        self.request
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_provider() {
        let provider = StaticPermissionProvider::new(PermissionStatus::Denied, PermissionStatus::Granted);
        assert_eq!(provider.check_camera_permission().await, PermissionStatus::Denied);
        assert_eq!(provider.request_count(), 0);

        assert_eq!(provider.request_camera_permission().await, PermissionStatus::Granted);
        assert_eq!(provider.request_count(), 1);
    }

    #[test]
    fn test_permission_status_display() {
        assert_eq!(PermissionStatus::Denied.to_string(), "denied");
        assert_eq!(PermissionStatus::NeverAskAgain.to_string(), "permanently denied");
    }
}
