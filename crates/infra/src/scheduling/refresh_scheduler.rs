//! Periodic sales refresh scheduler.
//!
//! Owns the session registry and drives one orchestrator run per registered
//! publisher on every tick. Ticking is lazy: the underlying cron scheduler is
//! only started once the first publisher registers, and that first
//! registration also triggers an immediate fan-out instead of waiting a full
//! interval.
//!
//! Ticks are fire-and-forget. A tick never waits for a previous tick's runs,
//! so a slow publisher can have two runs in flight; cache writes are atomic
//! per key and the last writer wins. A run that reports the upstream rejected
//! its session marks the publisher stale in the registry; stale publishers
//! sit out ticks until their next refresh job arrives.

use std::sync::Arc;
use std::time::Duration;

use storefront_core::RefreshService;
use storefront_domain::{RefreshJob, StorefrontError};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_cron_scheduler::{Job, JobScheduler};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::scheduling::error::{SchedulerError, SchedulerResult};
use crate::scheduling::registry::{SessionRegistry, UpsertOutcome};

/// Configuration for the refresh scheduler.
#[derive(Debug, Clone)]
pub struct RefreshSchedulerConfig {
    /// Cron expression describing the tick schedule.
    pub cron_expression: String,
    /// Timeout applied to a single publisher's refresh run.
    pub job_timeout: Duration,
    /// Timeout for starting the underlying scheduler.
    pub start_timeout: Duration,
    /// Timeout for stopping the scheduler.
    pub stop_timeout: Duration,
}

impl Default for RefreshSchedulerConfig {
    fn default() -> Self {
        Self {
            cron_expression: "0 */5 * * * *".into(), // every 5 minutes
            job_timeout: Duration::from_secs(300),
            start_timeout: Duration::from_secs(5),
            stop_timeout: Duration::from_secs(5),
        }
    }
}

/// Refresh scheduler with lazy start and explicit lifecycle management.
pub struct RefreshScheduler {
    inner: tokio::sync::Mutex<Option<JobScheduler>>,
    config: RefreshSchedulerConfig,
    registry: Arc<SessionRegistry>,
    service: Arc<RefreshService>,
    cancellation: CancellationToken,
}

impl RefreshScheduler {
    /// Create a scheduler over the given registry and orchestration service.
    pub fn new(
        config: RefreshSchedulerConfig,
        registry: Arc<SessionRegistry>,
        service: Arc<RefreshService>,
    ) -> Self {
        Self {
            inner: tokio::sync::Mutex::new(None),
            config,
            registry,
            service,
            cancellation: CancellationToken::new(),
        }
    }

    /// The registry this scheduler reads on each tick.
    pub fn registry(&self) -> Arc<SessionRegistry> {
        self.registry.clone()
    }

    /// Register or replace a publisher's session.
    ///
    /// Always upserts; never blocks on in-flight runs. The first registration
    /// overall starts the periodic ticking and fires an immediate first
    /// fan-out rather than waiting for the interval to elapse.
    #[instrument(skip(self, job), fields(publisher = %job.publisher))]
    pub async fn submit(&self, job: RefreshJob) -> SchedulerResult<()> {
        let outcome: UpsertOutcome = self.registry.upsert(job);
        debug!(
            replaced = outcome.replaced,
            registered = self.registry.len(),
            "refresh job accepted"
        );

        if outcome.first_registration {
            self.ensure_started().await?;
            info!("first publisher registered; running initial refresh now");
            Self::spawn_tick(
                self.registry.clone(),
                self.service.clone(),
                self.config.job_timeout,
            );
        }
        Ok(())
    }

    /// Stop the scheduler. In-flight refresh runs are not interrupted.
    #[instrument(skip(self))]
    pub async fn stop(&self) -> SchedulerResult<()> {
        self.cancellation.cancel();

        let mut guard = self.inner.lock().await;
        let mut scheduler = guard.take().ok_or(SchedulerError::NotRunning)?;

        let stop_timeout = self.config.stop_timeout;
        let stop_result =
            tokio::time::timeout(stop_timeout, async move { scheduler.shutdown().await })
                .await
                .map_err(|_| SchedulerError::Timeout { seconds: stop_timeout.as_secs() })?;
        stop_result.map_err(|source| SchedulerError::StopFailed(source.to_string()))?;

        info!(scheduler = "refresh", event = "stop", "refresh scheduler stopped");
        Ok(())
    }

    /// Returns true when the periodic ticking has begun.
    pub async fn is_running(&self) -> bool {
        self.inner.lock().await.is_some()
    }

    /// Pump refresh jobs from an inbound channel into `submit`.
    ///
    /// The transport feeding the channel is an external collaborator; jobs
    /// may arrive more than once and in any order, which upsert semantics
    /// absorb.
    pub fn spawn_intake(self: &Arc<Self>, mut rx: mpsc::Receiver<RefreshJob>) -> JoinHandle<()> {
        let scheduler = self.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = scheduler.cancellation.cancelled() => {
                        debug!("intake pump cancelled");
                        break;
                    }
                    received = rx.recv() => match received {
                        Some(job) => {
                            if let Err(err) = scheduler.submit(job).await {
                                error!(error = %err, "failed to submit refresh job");
                            }
                        }
                        None => {
                            debug!("intake channel closed");
                            break;
                        }
                    }
                }
            }
        })
    }

    /// Start the cron scheduler if it is not running yet.
    async fn ensure_started(&self) -> SchedulerResult<()> {
        let mut guard = self.inner.lock().await;
        if guard.is_some() {
            return Ok(());
        }

        let scheduler = JobScheduler::new()
            .await
            .map_err(|source| SchedulerError::CreationFailed(source.to_string()))?;

        let registry = self.registry.clone();
        let service = self.service.clone();
        let job_timeout = self.config.job_timeout;
        let job_definition =
            Job::new_async(self.config.cron_expression.as_str(), move |_id, _lock| {
                let registry = registry.clone();
                let service = service.clone();
                Box::pin(async move {
                    Self::spawn_tick(registry, service, job_timeout);
                })
            })
            .map_err(|source| SchedulerError::JobRegistrationFailed(source.to_string()))?;

        let job_id = job_definition.guid();
        scheduler
            .add(job_definition)
            .await
            .map_err(|source| SchedulerError::JobRegistrationFailed(source.to_string()))?;

        let start_timeout = self.config.start_timeout;
        let start_result = tokio::time::timeout(start_timeout, scheduler.start())
            .await
            .map_err(|_| SchedulerError::Timeout { seconds: start_timeout.as_secs() })?;
        start_result.map_err(|source| SchedulerError::StartFailed(source.to_string()))?;

        *guard = Some(scheduler);
        info!(
            cron = %self.config.cron_expression,
            job_id = %job_id,
            "refresh scheduler started"
        );
        Ok(())
    }

    /// Fan one tick out across all fresh publishers, fire-and-forget.
    fn spawn_tick(
        registry: Arc<SessionRegistry>,
        service: Arc<RefreshService>,
        job_timeout: Duration,
    ) {
        let jobs = registry.snapshot();
        debug!(publishers = jobs.len(), "refresh tick fan-out");

        for job in jobs {
            let service = service.clone();
            let registry = registry.clone();
            tokio::spawn(async move {
                Self::run_publisher(service, registry, job, job_timeout).await;
            });
        }
    }

    /// One publisher's refresh run, with the stale-session bookkeeping.
    async fn run_publisher(
        service: Arc<RefreshService>,
        registry: Arc<SessionRegistry>,
        job: RefreshJob,
        job_timeout: Duration,
    ) {
        let publisher = job.publisher.clone();
        match tokio::time::timeout(job_timeout, service.run(&job)).await {
            Ok(Ok(report)) => {
                if report.unauthorized {
                    registry.mark_stale(&publisher);
                }
            }
            Ok(Err(err)) => {
                if matches!(err, StorefrontError::Auth(_)) {
                    registry.mark_stale(&publisher);
                }
                warn!(publisher = %publisher, error = %err, "refresh run failed");
            }
            Err(_) => {
                warn!(
                    publisher = %publisher,
                    timeout_secs = job_timeout.as_secs(),
                    "refresh run timed out"
                );
            }
        }
    }
}

impl Drop for RefreshScheduler {
    fn drop(&mut self) {
        let running = self.inner.try_lock().map(|guard| guard.is_some()).unwrap_or(true);
        if running {
            warn!(
                scheduler = "refresh",
                event = "drop_cancel",
                "RefreshScheduler dropped while running; cancelling tasks"
            );
            self.cancellation.cancel();
        }
    }
}
