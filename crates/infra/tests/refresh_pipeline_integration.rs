//! End-to-end refresh pipeline: scheduler -> portal gateway -> sales cache,
//! against a mocked portal.

use std::sync::Arc;
use std::time::Duration;

use storefront_core::RefreshService;
use storefront_domain::RefreshJob;
use storefront_infra::{
    PortalGateway, RefreshScheduler, RefreshSchedulerConfig, SalesCache, SessionRegistry,
};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn job() -> RefreshJob {
    RefreshJob {
        publisher: "18076".to_string(),
        kharma_session: "sess-abc".to_string(),
        kharma_token: "tok-xyz".to_string(),
        jwt: String::new(),
    }
}

fn scheduler_config() -> RefreshSchedulerConfig {
    RefreshSchedulerConfig {
        cron_expression: "0 0 0 1 1 *".into(), // only the immediate run fires
        job_timeout: Duration::from_secs(5),
        start_timeout: Duration::from_secs(2),
        stop_timeout: Duration::from_secs(2),
    }
}

async fn mount_months(server: &MockServer, months: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/api/publisher-info/months/18076.json"))
        .and(header("x-kharma-token", "tok-xyz"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "periods": months })),
        )
        .mount(server)
        .await;
}

#[tokio::test(flavor = "multi_thread")]
async fn submitted_job_populates_the_cache() {
    let server = MockServer::start().await;
    mount_months(&server, serde_json::json!([{ "value": "202303", "name": "March 2023" }])).await;
    Mock::given(method("GET"))
        .and(path("/api/publisher-info/sales/18076/202303.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "aaData": [["Foo Asset", "$9.99", "3", "0", "0", "$29.97", "$20.98", "2023-03-28"]]
        })))
        .mount(&server)
        .await;

    let cache = Arc::new(SalesCache::new());
    let gateway = Arc::new(PortalGateway::new(server.uri()).expect("gateway"));
    let service = Arc::new(RefreshService::new(gateway, cache.clone()));
    let scheduler = Arc::new(RefreshScheduler::new(
        scheduler_config(),
        Arc::new(SessionRegistry::new()),
        service,
    ));

    scheduler.submit(job()).await.expect("submit succeeds");
    tokio::time::sleep(Duration::from_millis(500)).await;

    let entry = cache.get("18076", "202303").expect("month cached");
    assert_eq!(entry.payload[0]["package_name"], serde_json::json!("Foo Asset"));
    assert_eq!(entry.payload[0]["sales"], serde_json::json!(3));
    assert!(cache.get("18076", "202304").is_none());

    scheduler.stop().await.expect("stop succeeds");
}

#[tokio::test(flavor = "multi_thread")]
async fn failed_month_leaves_sibling_months_cached() {
    let server = MockServer::start().await;
    mount_months(
        &server,
        serde_json::json!([
            { "value": "202303", "name": "March 2023" },
            { "value": "202304", "name": "April 2023" }
        ]),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/api/publisher-info/sales/18076/202303.json"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/publisher-info/sales/18076/202304.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "aaData": [["Bar Asset", "$4.99", "1", "0", "0", "$4.99", "$3.49", "2023-04-02"]]
        })))
        .mount(&server)
        .await;

    let cache = Arc::new(SalesCache::new());
    let gateway = Arc::new(PortalGateway::new(server.uri()).expect("gateway"));
    let service = Arc::new(RefreshService::new(gateway, cache.clone()));
    let scheduler = Arc::new(RefreshScheduler::new(
        scheduler_config(),
        Arc::new(SessionRegistry::new()),
        service,
    ));

    scheduler.submit(job()).await.expect("submit succeeds");
    tokio::time::sleep(Duration::from_millis(800)).await;

    assert!(cache.get("18076", "202303").is_none(), "failed month must not be cached");
    let entry = cache.get("18076", "202304").expect("sibling month cached");
    assert_eq!(entry.payload[0]["package_name"], serde_json::json!("Bar Asset"));

    scheduler.stop().await.expect("stop succeeds");
}
