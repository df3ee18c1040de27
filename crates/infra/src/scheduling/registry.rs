//! Publisher session registry
//!
//! Owns the publisher-to-session map and its lifecycle. Per publisher the
//! state only moves forward: unregistered, then registered, then registered
//! with a newer session. Nothing ever deregisters a publisher; a session
//! proven dead by the upstream is marked stale and sits out ticks until the
//! next job for that publisher replaces it.
//!
//! The map itself never leaves this type; callers get snapshots and narrow
//! mutation methods only.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use storefront_domain::RefreshJob;
use tracing::{debug, warn};

struct RegisteredJob {
    job: RefreshJob,
    registered_at: DateTime<Utc>,
    stale: bool,
}

/// Outcome of registering a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpsertOutcome {
    /// True when the registry was empty before this upsert.
    pub first_registration: bool,
    /// True when an earlier session for the same publisher was replaced.
    pub replaced: bool,
}

/// Concurrency-safe registry of the last-known session per publisher.
#[derive(Default)]
pub struct SessionRegistry {
    inner: RwLock<HashMap<String, RegisteredJob>>,
}

impl SessionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or replace the session for the job's publisher.
    pub fn upsert(&self, job: RefreshJob) -> UpsertOutcome {
        let mut inner = self.inner.write();
        let first_registration = inner.is_empty();
        let publisher = job.publisher.clone();
        let replaced = inner
            .insert(
                publisher.clone(),
                RegisteredJob { job, registered_at: Utc::now(), stale: false },
            )
            .is_some();

        debug!(publisher = %publisher, replaced, "session registered");
        UpsertOutcome { first_registration, replaced }
    }

    /// All fresh jobs, for one tick's fan-out. Stale sessions sit out.
    pub fn snapshot(&self) -> Vec<RefreshJob> {
        self.inner
            .read()
            .values()
            .filter(|registered| !registered.stale)
            .map(|registered| registered.job.clone())
            .collect()
    }

    /// Look up the registered job for a publisher, stale or not.
    pub fn get(&self, publisher: &str) -> Option<RefreshJob> {
        self.inner.read().get(publisher).map(|registered| registered.job.clone())
    }

    /// Mark a publisher's session stale after the upstream rejected it.
    /// The publisher stays registered but is skipped until the next upsert.
    pub fn mark_stale(&self, publisher: &str) {
        let mut inner = self.inner.write();
        match inner.get_mut(publisher) {
            Some(registered) => {
                registered.stale = true;
                warn!(publisher, "session marked stale; waiting for a fresh refresh job");
            }
            None => debug!(publisher, "stale mark for unknown publisher ignored"),
        }
    }

    /// When the publisher's current session was registered.
    pub fn registered_at(&self, publisher: &str) -> Option<DateTime<Utc>> {
        self.inner.read().get(publisher).map(|registered| registered.registered_at)
    }

    /// Number of registered publishers, stale included.
    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    /// True when no publisher has registered yet.
    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(publisher: &str, session: &str) -> RefreshJob {
        RefreshJob {
            publisher: publisher.to_string(),
            kharma_session: session.to_string(),
            kharma_token: format!("{session}-token"),
            jwt: String::new(),
        }
    }

    #[test]
    fn first_upsert_is_flagged() {
        let registry = SessionRegistry::new();
        let first = registry.upsert(job("P1", "s1"));
        assert!(first.first_registration);
        assert!(!first.replaced);

        let second = registry.upsert(job("P2", "s2"));
        assert!(!second.first_registration);
        assert!(!second.replaced);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn second_job_for_same_publisher_replaces_the_first() {
        let registry = SessionRegistry::new();
        registry.upsert(job("P1", "old"));
        let outcome = registry.upsert(job("P1", "new"));

        assert!(outcome.replaced);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("P1").unwrap().kharma_session, "new");
    }

    #[test]
    fn stale_sessions_sit_out_snapshots() {
        let registry = SessionRegistry::new();
        registry.upsert(job("P1", "s1"));
        registry.upsert(job("P2", "s2"));

        registry.mark_stale("P1");
        let snapshot = registry.snapshot();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].publisher, "P2");

        // Still registered, just resting.
        assert_eq!(registry.len(), 2);
        assert!(registry.get("P1").is_some());
    }

    #[test]
    fn fresh_upsert_clears_staleness() {
        let registry = SessionRegistry::new();
        registry.upsert(job("P1", "dead"));
        registry.mark_stale("P1");
        assert!(registry.snapshot().is_empty());

        registry.upsert(job("P1", "alive"));
        let snapshot = registry.snapshot();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].kharma_session, "alive");
    }

    #[test]
    fn stale_mark_for_unknown_publisher_is_ignored() {
        let registry = SessionRegistry::new();
        registry.mark_stale("ghost");
        assert!(registry.is_empty());
    }
}
