//! Refresh orchestration service - core business logic
//!
//! One run discovers the months available for a publisher, fans out one fetch
//! task per month, and writes each successful result into the sales store.
//! Month fetches are independent: a failed month is recorded and skipped, it
//! never cancels its siblings or the run. Every task reports a
//! `(month, result)` tuple back to the aggregation step so no failure vanishes
//! silently.

use std::sync::Arc;

use storefront_domain::{RefreshJob, Result, StorefrontError};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::sales_ports::{PublisherGateway, SalesStore};

/// Refresh orchestration service
pub struct RefreshService {
    gateway: Arc<dyn PublisherGateway>,
    store: Arc<dyn SalesStore>,
}

/// Outcome of one orchestrator run for one publisher.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub publisher_id: String,
    /// Correlation id tying this run's log lines together.
    pub run_id: Uuid,
    pub months_total: usize,
    /// Months whose sales were fetched and written to the store.
    pub refreshed: Vec<String>,
    /// Months that failed, with the error that stopped them.
    pub failed: Vec<(String, StorefrontError)>,
    /// True when the upstream rejected the session (401/403) at any point.
    /// The caller should consider the session stale and stop using it.
    pub unauthorized: bool,
}

impl RunReport {
    /// True when every discovered month was refreshed.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty() && self.refreshed.len() == self.months_total
    }
}

impl RefreshService {
    /// Create a new refresh service
    pub fn new(gateway: Arc<dyn PublisherGateway>, store: Arc<dyn SalesStore>) -> Self {
        Self { gateway, store }
    }

    /// Run one full refresh pass for the job's publisher.
    ///
    /// Month discovery failure aborts the run (no months means nothing to
    /// fetch) and surfaces as the returned error; callers decide whether the
    /// session went stale by inspecting the variant. Per-month failures are
    /// collected in the report instead of propagating.
    pub async fn run(&self, job: &RefreshJob) -> Result<RunReport> {
        let run_id = Uuid::new_v4();
        let publisher_id = job.publisher.clone();

        debug!(publisher = %publisher_id, %run_id, "discovering months");
        let months = self.gateway.fetch_months(job).await.map_err(|err| {
            warn!(publisher = %publisher_id, %run_id, error = %err, "month discovery failed");
            err
        })?;

        let months_total = months.len();
        let mut tasks: JoinSet<(String, Result<usize>)> = JoinSet::new();
        for month in months {
            let gateway = self.gateway.clone();
            let store = self.store.clone();
            let job = job.clone();
            tasks.spawn(async move {
                let result = Self::refresh_month(gateway, store, &job, &month.value).await;
                (month.value, result)
            });
        }

        let mut refreshed = Vec::new();
        let mut failed = Vec::new();
        let mut unauthorized = false;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((month, Ok(rows))) => {
                    debug!(publisher = %publisher_id, %run_id, month, rows, "month refreshed");
                    refreshed.push(month);
                }
                Ok((month, Err(err))) => {
                    warn!(publisher = %publisher_id, %run_id, month, error = %err, "month refresh failed");
                    if matches!(err, StorefrontError::Auth(_)) {
                        unauthorized = true;
                    }
                    failed.push((month, err));
                }
                Err(join_err) => {
                    warn!(publisher = %publisher_id, %run_id, error = %join_err, "month task aborted");
                    failed.push((
                        String::new(),
                        StorefrontError::Internal(format!("month task aborted: {join_err}")),
                    ));
                }
            }
        }

        info!(
            publisher = %publisher_id,
            %run_id,
            months = months_total,
            refreshed = refreshed.len(),
            failed = failed.len(),
            "refresh run finished"
        );

        Ok(RunReport { publisher_id, run_id, months_total, refreshed, failed, unauthorized })
    }

    async fn refresh_month(
        gateway: Arc<dyn PublisherGateway>,
        store: Arc<dyn SalesStore>,
        job: &RefreshJob,
        month: &str,
    ) -> Result<usize> {
        let sales = gateway.fetch_sales(job, month).await?;
        store.put_sales(&job.publisher, month, &sales).await?;
        Ok(sales.len())
    }
}
