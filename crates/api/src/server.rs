//! Router and shared application state

use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use storefront_core::PublisherGateway;
use storefront_domain::RefreshJob;
use storefront_infra::{SalesCache, SessionAcquirer};
use tokio::sync::mpsc;

use crate::routes;

/// Shared state handed to every route handler.
#[derive(Clone)]
pub struct AppState {
    pub cache: Arc<SalesCache>,
    pub gateway: Arc<dyn PublisherGateway>,
    pub acquirer: Arc<SessionAcquirer>,
    /// Inbound end of the refresh-job transport; the scheduler consumes the
    /// other end.
    pub jobs_tx: mpsc::Sender<RefreshJob>,
}

impl AppState {
    pub fn new(
        cache: Arc<SalesCache>,
        gateway: Arc<dyn PublisherGateway>,
        acquirer: Arc<SessionAcquirer>,
        jobs_tx: mpsc::Sender<RefreshJob>,
    ) -> Self {
        Self { cache, gateway, acquirer, jobs_tx }
    }
}

/// Build the service router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/authenticate", axum::routing::post(routes::auth::authenticate))
        .route(
            "/sales/{publisher}/{month}",
            get(routes::sales::get_sales).post(routes::sales::put_sales),
        )
        .route("/months/{publisher}", get(routes::catalog::months))
        .route("/packages", get(routes::catalog::packages))
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}
