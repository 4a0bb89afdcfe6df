//! Headless core of the HealthMonitor demo: login input checks, the capture
//! and processing stage controllers, the flow router and mock backends.

pub mod auth;
pub mod capture;
pub mod cli;
pub mod configuration;
pub mod flow;
pub mod models;
pub mod processing;
pub mod scheduler;
pub mod services;
