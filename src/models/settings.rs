use serde::{Deserialize, Serialize};

/// Developer-panel switches that alter timing and inject failures.
///
/// All switches default to off. The record is never persisted; it lives for
/// the lifetime of the process that owns the settings store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoSettings {
    /// Scale processing step durations by 0.3
    pub fast_mode: bool,

    /// Refuse to start recording as if the camera permission were denied
    pub force_camera_permission_denied: bool,

    /// Fail processing once the upload step has elapsed
    pub force_upload_failure: bool,

    /// Fail processing with a timeout at 85% progress
    pub force_processing_timeout: bool,

    /// Fail processing with a network issue at 50% progress
    pub force_network_issue: bool,
}

/// Partial update for [`DemoSettings`]; `None` fields are left untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoSettingsPatch {
    pub fast_mode: Option<bool>,
    pub force_camera_permission_denied: Option<bool>,
    pub force_upload_failure: Option<bool>,
    pub force_processing_timeout: Option<bool>,
    pub force_network_issue: Option<bool>,
}

impl DemoSettings {
    /// Shallow-merge a patch into these settings
    pub fn apply(&mut self, patch: &DemoSettingsPatch) {
        if let Some(value) = patch.fast_mode {
            self.fast_mode = value;
        }
        if let Some(value) = patch.force_camera_permission_denied {
            self.force_camera_permission_denied = value;
        }
        if let Some(value) = patch.force_upload_failure {
            self.force_upload_failure = value;
        }
        if let Some(value) = patch.force_processing_timeout {
            self.force_processing_timeout = value;
        }
        if let Some(value) = patch.force_network_issue {
            self.force_network_issue = value;
        }
    }

    /// Whether any failure is being injected
    pub fn injects_faults(&self) -> bool {
        self.force_camera_permission_denied
            || self.force_upload_failure
            || self.force_processing_timeout
            || self.force_network_issue
    }
}

impl DemoSettingsPatch {
    pub fn fast_mode(mut self, value: bool) -> Self {
        self.fast_mode = Some(value);
        self
    }

    pub fn force_camera_permission_denied(mut self, value: bool) -> Self {
        self.force_camera_permission_denied = Some(value);
        self
    }

    pub fn force_upload_failure(mut self, value: bool) -> Self {
        self.force_upload_failure = Some(value);
        self
    }

    pub fn force_processing_timeout(mut self, value: bool) -> Self {
        self.force_processing_timeout = Some(value);
        self
    }

    pub fn force_network_issue(mut self, value: bool) -> Self {
        self.force_network_issue = Some(value);
        self
    }
}
