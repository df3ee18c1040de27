//! API error mapping

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use storefront_domain::StorefrontError;

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error("missing email or password")]
    MissingCredentials,

    #[error("missing session cookies")]
    MissingSession,

    #[error("{0}")]
    Domain(#[from] StorefrontError),
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::MissingCredentials => StatusCode::BAD_REQUEST,
            ApiError::MissingSession => StatusCode::UNAUTHORIZED,
            ApiError::Domain(err) => match err {
                StorefrontError::Auth(_) | StorefrontError::Handshake(_) => {
                    StatusCode::UNAUTHORIZED
                }
                StorefrontError::NotFound(_) => StatusCode::NOT_FOUND,
                StorefrontError::InvalidInput(_) => StatusCode::BAD_REQUEST,
                StorefrontError::Network(_) => StatusCode::BAD_GATEWAY,
                StorefrontError::Config(_) | StorefrontError::Internal(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let code = self.status_code();
        let body = ErrorBody { error: self.to_string() };
        (code, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_failures_map_to_unauthorized() {
        let err = ApiError::Domain(StorefrontError::Auth("HTTP 401 Unauthorized".into()));
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);

        let err = ApiError::Domain(StorefrontError::Handshake("login form not found".into()));
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn upstream_failures_map_to_bad_gateway() {
        let err = ApiError::Domain(StorefrontError::Network("HTTP 500".into()));
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn missing_cache_entry_maps_to_not_found() {
        let err = ApiError::Domain(StorefrontError::NotFound("no cached sales".into()));
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }
}
