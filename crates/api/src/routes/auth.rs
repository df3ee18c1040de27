//! Interactive login

use axum::extract::State;
use axum::http::header::SET_COOKIE;
use axum::http::HeaderMap;
use axum::response::{AppendHeaders, IntoResponse};
use axum::{Form, Json};
use serde::{Deserialize, Serialize};
use storefront_domain::{RefreshJob, StorefrontError};
use tracing::{info, warn};

use crate::error::ApiError;
use crate::routes::cookie_value;
use crate::server::AppState;

#[derive(Debug, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticatedResponse {
    pub email: String,
    pub publisher_id: String,
    pub kharma_session: String,
    pub kharma_token: String,
}

/// Drive the portal handshake for an interactive login.
///
/// On success the session secrets are handed back both as cookies and in the
/// body, and a refresh job is pushed at the scheduler so the background
/// refresh picks this publisher up. Handshake failures surface as 401 with
/// the phase-specific message; nothing retries them automatically.
pub async fn authenticate(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(credentials): Form<Credentials>,
) -> Result<impl IntoResponse, ApiError> {
    if credentials.email.is_empty() || credentials.password.is_empty() {
        return Err(ApiError::MissingCredentials);
    }

    let session = state
        .acquirer
        .acquire(&credentials.email, &credentials.password)
        .await
        .map_err(StorefrontError::from)?;

    info!(publisher = %session.publisher_id, "interactive login succeeded");

    // The jwt handed out by the token layer rides along opaquely if present.
    let jwt = cookie_value(&headers, "jwt").unwrap_or_default();
    let job = RefreshJob::from_session(&session, jwt);
    if state.jobs_tx.send(job).await.is_err() {
        warn!(
            publisher = %session.publisher_id,
            "failed to schedule sales refresh; scheduler intake is closed"
        );
    }

    let cookies = AppendHeaders([
        (
            SET_COOKIE,
            format!("kharma_token={}; Path=/; HttpOnly", session.kharma_token),
        ),
        (
            SET_COOKIE,
            format!("kharma_session={}; Path=/; HttpOnly", session.kharma_session),
        ),
    ]);

    let body = AuthenticatedResponse {
        email: credentials.email,
        publisher_id: session.publisher_id,
        kharma_session: session.kharma_session,
        kharma_token: session.kharma_token,
    };

    Ok((cookies, Json(body)))
}
