//! Catalog pass-throughs: months and packages
//!
//! Thin authenticated reads against the upstream gateway; nothing here is
//! cached, month lists and package listings are fetched on demand.

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::Json;

use crate::error::ApiError;
use crate::routes::job_from_cookies;
use crate::server::AppState;

pub async fn months(
    State(state): State<AppState>,
    Path(publisher): Path<String>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let job = job_from_cookies(&headers, &publisher)?;
    let months = state.gateway.fetch_months(&job).await?;
    Ok(Json(months))
}

pub async fn packages(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    // Packages are publisher-independent on the wire; the cookies alone
    // authenticate the call.
    let job = job_from_cookies(&headers, "")?;
    let packages = state.gateway.fetch_packages(&job).await?;
    Ok(Json(packages))
}
