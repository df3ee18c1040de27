//! Intermediary API service gateway
//!
//! Alternate upstream collaborator: an API service that already speaks the
//! canonical JSON shapes. Calls are authenticated with the `kharma_token`,
//! `kharma_session` and `jwt` cookies.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::COOKIE;
use reqwest::Method;
use serde::de::DeserializeOwned;
use storefront_core::PublisherGateway;
use storefront_domain::{
    MonthDescriptor, PackageData, RefreshJob, Result, SalesData, StorefrontError,
};
use tracing::debug;

use crate::errors::status_error;
use crate::http::HttpClient;

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Gateway calling the intermediary API service.
pub struct ServiceGateway {
    base_url: String,
    http_client: HttpClient,
}

impl ServiceGateway {
    /// Create a gateway for the API service at `api_host` (`host:port` or a
    /// full URL).
    pub fn new(api_host: impl Into<String>) -> Result<Self> {
        let api_host = api_host.into();
        let base_url = if api_host.contains("://") {
            api_host
        } else {
            format!("http://{api_host}")
        };
        let http_client = HttpClient::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .max_attempts(3)
            .build()?;
        Ok(Self { base_url, http_client })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        job: &RefreshJob,
        context: &'static str,
    ) -> Result<T> {
        debug!(%url, publisher = %job.publisher, context, "service fetch");
        let request = self.http_client.request(Method::GET, url).header(
            COOKIE,
            format!(
                "kharma_token={}; kharma_session={}; jwt={}",
                job.kharma_token, job.kharma_session, job.jwt
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
impl PublisherGateway for ServiceGateway {
    async fn fetch_months(&self, job: &RefreshJob) -> Result<Vec<MonthDescriptor>> {
        let url = format!("{}/api/months/{}", self.base_url, job.publisher);
        self.get_json(&url, job, "months fetch").await
    }

    async fn fetch_sales(&self, job: &RefreshJob, month: &str) -> Result<Vec<SalesData>> {
        let url = format!("{}/api/sales/{}/{}", self.base_url, job.publisher, month);
        self.get_json(&url, job, "sales fetch").await
    }

    async fn fetch_packages(&self, job: &RefreshJob) -> Result<Vec<PackageData>> {
        let url = format!("{}/api/packages", self.base_url);
        self.get_json(&url, job, "packages fetch").await
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn job() -> RefreshJob {
        RefreshJob {
            publisher: "18076".to_string(),
            kharma_session: "sess-abc".to_string(),
            kharma_token: "tok-xyz".to_string(),
            jwt: "jwt-123".to_string(),
        }
    }

    #[tokio::test]
    async fn months_carry_all_three_cookies() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/months/18076"))
            .and(header(
                "cookie",
                "kharma_token=tok-xyz; kharma_session=sess-abc; jwt=jwt-123",
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                { "value": "202303", "name": "March 2023" }
            ])))
            .mount(&server)
            .await;

        let gateway = ServiceGateway::new(server.uri()).unwrap();
        let months = gateway.fetch_months(&job()).await.unwrap();
        assert_eq!(months, vec![MonthDescriptor {
            value: "202303".to_string(),
            name: "March 2023".to_string(),
        }]);
    }

    #[tokio::test]
    async fn sales_arrive_canonical() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/sales/18076/202303"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([{
                "package_name": "Foo Asset",
                "price": "$9.99",
                "sales": 3,
                "gross": "$29.97",
                "last_sale": "2023-03-28"
            }])))
            .mount(&server)
            .await;

        let gateway = ServiceGateway::new(server.uri()).unwrap();
        let sales = gateway.fetch_sales(&job(), "202303").await.unwrap();
        assert_eq!(sales[0].sales, 3);
    }

    #[tokio::test]
    async fn bare_host_gains_http_scheme() {
        let gateway = ServiceGateway::new("localhost:8081").unwrap();
        assert_eq!(gateway.base_url, "http://localhost:8081");
    }

    #[tokio::test]
    async fn rejected_jwt_maps_to_auth_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/sales/18076/202303"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let gateway = ServiceGateway::new(server.uri()).unwrap();
        let err = gateway.fetch_sales(&job(), "202303").await.unwrap_err();
        assert!(matches!(err, StorefrontError::Auth(_)));
    }
}
