//! External collaborators: vitals processing, authentication, camera
//! permission, key-value storage and results export.
//!
//! Each is a trait with an in-process mock. The mocks return canned data
//! after a fixed delay and stand in until real backends exist.

pub mod api;
pub mod export;
pub mod permissions;
pub mod storage;

pub use api::*;
pub use export::*;
pub use permissions::*;
pub use storage::*;
