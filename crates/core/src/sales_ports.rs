//! Port interfaces for sales retrieval and caching

use async_trait::async_trait;
use storefront_domain::{MonthDescriptor, PackageData, RefreshJob, Result, SalesData};

/// Trait for the upstream system serving publisher sales data.
///
/// Implementations authenticate each call with the credentials carried by the
/// job; they hold no per-publisher state of their own.
#[async_trait]
pub trait PublisherGateway: Send + Sync {
    /// Enumerate the months queryable for the job's publisher
    async fn fetch_months(&self, job: &RefreshJob) -> Result<Vec<MonthDescriptor>>;

    /// Fetch canonical sales rows for one month
    async fn fetch_sales(&self, job: &RefreshJob, month: &str) -> Result<Vec<SalesData>>;

    /// Fetch the publisher's package listing
    async fn fetch_packages(&self, job: &RefreshJob) -> Result<Vec<PackageData>>;
}

/// Trait for the store receiving refreshed sales data.
#[async_trait]
pub trait SalesStore: Send + Sync {
    /// Replace the entry for (publisher, month) with the given rows
    async fn put_sales(&self, publisher_id: &str, month: &str, sales: &[SalesData]) -> Result<()>;
}
