//! Storefront publisher sales service
//!
//! Main entry point: wires the portal gateway, cache, scheduler and HTTP
//! routes together and serves them.

use std::sync::Arc;
use std::time::Duration;

use storefront_api::{router, AppState};
use storefront_core::{PublisherGateway, RefreshService};
use storefront_domain::GatewayMode;
use storefront_infra::{
    PortalGateway, RefreshScheduler, RefreshSchedulerConfig, SalesCache, ServiceGateway,
    SessionAcquirer, SessionRegistry,
};
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logging first so .env loading is visible.
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    match dotenvy::dotenv() {
        Ok(path) => info!(path = %path.display(), "loaded .env"),
        Err(_) => info!("no .env file found; relying on process environment"),
    }

    let config = storefront_infra::config::load()?;

    let cache = Arc::new(SalesCache::new());
    let gateway: Arc<dyn PublisherGateway> = match config.gateway.mode {
        GatewayMode::Portal => Arc::new(PortalGateway::new(config.portal.base_url.clone())?),
        GatewayMode::Service => Arc::new(ServiceGateway::new(config.gateway.api_host.clone())?),
    };

    let service = Arc::new(RefreshService::new(gateway.clone(), cache.clone()));
    let registry = Arc::new(SessionRegistry::new());
    let scheduler_config = RefreshSchedulerConfig {
        cron_expression: config.refresh.cron_expression.clone(),
        job_timeout: Duration::from_secs(config.refresh.job_timeout_seconds),
        ..Default::default()
    };
    let scheduler = Arc::new(RefreshScheduler::new(scheduler_config, registry, service));

    // The refresh-job transport: the authenticate route produces, the
    // scheduler consumes.
    let (jobs_tx, jobs_rx) = mpsc::channel(64);
    scheduler.spawn_intake(jobs_rx);

    let acquirer = Arc::new(SessionAcquirer::new(&config.portal));
    let state = AppState::new(cache, gateway, acquirer, jobs_tx);
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&config.server.bind_addr).await?;
    info!(addr = %config.server.bind_addr, "storefront api listening");
    axum::serve(listener, app).await?;

    Ok(())
}
