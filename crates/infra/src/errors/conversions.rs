//! Conversions from external infrastructure errors into domain errors.

use reqwest::Error as HttpError;
use storefront_domain::StorefrontError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub StorefrontError);

impl From<InfraError> for StorefrontError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<StorefrontError> for InfraError {
    fn from(value: StorefrontError) -> Self {
        InfraError(value)
    }
}

/// Extension trait to make the conversion logic explicit in tests and within
/// this module.
trait IntoStorefrontError {
    fn into_storefront(self) -> StorefrontError;
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → StorefrontError */
/* -------------------------------------------------------------------------- */

impl IntoStorefrontError for HttpError {
    fn into_storefront(self) -> StorefrontError {
        if self.is_timeout() {
            return StorefrontError::Network("HTTP request timed out".into());
        }

        if self.is_connect() {
            return StorefrontError::Network("HTTP connection failure".into());
        }

        if let Some(status) = self.status() {
            let code = status.as_u16();
            let message =
                format!("HTTP {} {}", code, status.canonical_reason().unwrap_or("unknown status"));

            return match code {
                401 | 403 => StorefrontError::Auth(message),
                404 => StorefrontError::NotFound(message),
                429 => StorefrontError::Network(message),
                400..=499 => StorefrontError::InvalidInput(message),
                500..=599 => StorefrontError::Network(message),
                _ => StorefrontError::Network(message),
            };
        }

        StorefrontError::Network(self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        InfraError(value.into_storefront())
    }
}

/// Map a non-success response status to the domain error the callers branch
/// on: 401/403 is the stale-session signal, everything else is upstream
/// unavailability.
pub(crate) fn status_error(status: reqwest::StatusCode, context: &str) -> StorefrontError {
    let message = format!(
        "{context}: HTTP {} {}",
        status.as_u16(),
        status.canonical_reason().unwrap_or("unknown status")
    );
    match status.as_u16() {
        401 | 403 => StorefrontError::Auth(message),
        404 => StorefrontError::NotFound(message),
        _ => StorefrontError::Network(message),
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */
