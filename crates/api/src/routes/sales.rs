//! Sales cache surface
//!
//! Reads consult the cache first; a hit always succeeds regardless of what
//! the background refresh is doing. A miss falls back to a synchronous fetch
//! with the caller's own session cookies and writes through to the cache.
//! Writes overwrite unconditionally.

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::Json;
use storefront_domain::StorefrontError;
use tracing::debug;

use crate::error::ApiError;
use crate::routes::job_from_cookies;
use crate::server::AppState;

pub async fn get_sales(
    State(state): State<AppState>,
    Path((publisher, month)): Path<(String, String)>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    if let Some(entry) = state.cache.get(&publisher, &month) {
        debug!(publisher, month, "serving sales from cache");
        return Ok(Json(entry.payload.clone()));
    }

    // Without session cookies a miss is simply "not cached": callers that
    // never authenticated get the plain cache surface, 404 included.
    let Ok(job) = job_from_cookies(&headers, &publisher) else {
        return Err(ApiError::Domain(StorefrontError::NotFound(format!(
            "no cached sales for {publisher}/{month}"
        ))));
    };

    debug!(publisher, month, "cache miss; fetching sales synchronously");
    let sales = state.gateway.fetch_sales(&job, &month).await?;
    let payload = serde_json::to_value(&sales).map_err(|err| {
        StorefrontError::Internal(format!("failed to serialize sales rows: {err}"))
    })?;

    state.cache.put_payload(&publisher, &month, payload.clone());
    Ok(Json(payload))
}

pub async fn put_sales(
    State(state): State<AppState>,
    Path((publisher, month)): Path<(String, String)>,
    Json(payload): Json<serde_json::Value>,
) -> impl IntoResponse {
    state.cache.put_payload(&publisher, &month, payload);
    "Sales cached"
}
