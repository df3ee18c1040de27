//! Direct portal gateway
//!
//! Fetches publisher data straight from the portal's `publisher-info` JSON
//! endpoints, authenticating every call with the `x-kharma-token` header plus
//! the two session cookies. Sales arrive in the portal's raw fixed-column
//! table shape and are transformed into the canonical rows here.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::COOKIE;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use storefront_core::PublisherGateway;
use storefront_domain::{
    MonthDescriptor, PackageData, RawSalesTable, RefreshJob, Result, SalesData, StorefrontError,
};
use tracing::debug;

use crate::errors::status_error;
use crate::http::HttpClient;

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Gateway calling the portal's publisher API directly.
pub struct PortalGateway {
    base_url: String,
    http_client: HttpClient,
}

#[derive(Deserialize)]
struct MonthsEnvelope {
    #[serde(default)]
    periods: Vec<MonthDescriptor>,
}

#[derive(Deserialize)]
struct PackagesEnvelope {
    #[serde(default)]
    packages: Vec<PackageData>,
}

impl PortalGateway {
    /// Create a gateway for the portal at `base_url`.
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let http_client = HttpClient::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .max_attempts(3)
            .build()?;
        Ok(Self { base_url: base_url.into(), http_client })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        job: &RefreshJob,
        context: &'static str,
    ) -> Result<T> {
        debug!(%url, publisher = %job.publisher, context, "portal fetch");
        let request = self
            .http_client
            .request(Method::GET, url)
            .header("x-kharma-token", &job.kharma_token)
            .header(
                COOKIE,
                format!(
                    "kharma_session={}; kharma_token={}",
                    job.kharma_session, job.kharma_token
                ),
            );

        let response = self.http_client.send(request).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(status_error(status, context));
        }

        response
            .json()
            .await
            .map_err(|err| StorefrontError::Internal(format!("failed to parse {context}: {err}")))
    }
}

#[async_trait]
impl PublisherGateway for PortalGateway {
    async fn fetch_months(&self, job: &RefreshJob) -> Result<Vec<MonthDescriptor>> {
        let url = format!(
            "{}/api/publisher-info/months/{}.json",
            self.base_url, job.publisher
        );
        let envelope: MonthsEnvelope = self.get_json(&url, job, "months fetch").await?;
        Ok(envelope.periods)
    }

    async fn fetch_sales(&self, job: &RefreshJob, month: &str) -> Result<Vec<SalesData>> {
        let url = format!(
            "{}/api/publisher-info/sales/{}/{}.json",
            self.base_url, job.publisher, month
        );
        let raw: RawSalesTable = self.get_json(&url, job, "sales fetch").await?;
        Ok(raw.into_sales())
    }

    async fn fetch_packages(&self, job: &RefreshJob) -> Result<Vec<PackageData>> {
        let url = format!("{}/api/publisher-info/packages.json", self.base_url);
        let envelope: PackagesEnvelope = self.get_json(&url, job, "packages fetch").await?;
        Ok(envelope.packages)
    }
}
