//! Scheduling infrastructure for the periodic sales refresh
//!
//! The scheduler follows explicit-lifecycle rules:
//! - Join handles for spawned tasks where callers need them
//! - Cancellation token support
//! - Timeout wrapping on start/stop and on every refresh run

pub mod error;
pub mod refresh_scheduler;
pub mod registry;

pub use error::{SchedulerError, SchedulerResult};
pub use refresh_scheduler::{RefreshScheduler, RefreshSchedulerConfig};
pub use registry::{SessionRegistry, UpsertOutcome};
