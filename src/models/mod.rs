//! Data models for HealthMonitor
//!
//! Plain value records shared by the stage controllers, the flow router and
//! the mock collaborators. None of them carry behaviour beyond formatting,
//! merging and classification.

pub mod settings;
pub mod validation;
pub mod vitals;

pub use settings::*;
pub use validation::*;
pub use vitals::*;

use uuid::Uuid;

/// Generate a new UUID string for model IDs
pub fn generate_id() -> String {
    Uuid::new_v4().to_string()
}
