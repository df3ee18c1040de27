//! Refresh orchestration - one full months-and-sales pass per publisher

pub mod service;

pub use service::{RefreshService, RunReport};
