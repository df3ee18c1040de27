//! Route handlers

pub mod auth;
pub mod catalog;
pub mod sales;

use axum::http::header::COOKIE;
use axum::http::HeaderMap;
use storefront_domain::RefreshJob;

use crate::error::ApiError;

/// Read one cookie value out of the request headers.
pub(crate) fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|header| header.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_string())
}

/// Build an on-demand fetch job from a request's session cookies.
///
/// Interactive callers authenticate with the same cookies the portal set at
/// login time; without both secrets there is nothing to fetch with.
pub(crate) fn job_from_cookies(
    headers: &HeaderMap,
    publisher: &str,
) -> Result<RefreshJob, ApiError> {
    let kharma_token = cookie_value(headers, "kharma_token").ok_or(ApiError::MissingSession)?;
    let kharma_session = cookie_value(headers, "kharma_session").ok_or(ApiError::MissingSession)?;
    let jwt = cookie_value(headers, "jwt").unwrap_or_default();

    Ok(RefreshJob { publisher: publisher.to_string(), kharma_session, kharma_token, jwt })
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn cookie_value_reads_from_combined_header() {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_static("kharma_token=tok; kharma_session=sess; jwt=j"),
        );

        assert_eq!(cookie_value(&headers, "kharma_token").unwrap(), "tok");
        assert_eq!(cookie_value(&headers, "jwt").unwrap(), "j");
        assert!(cookie_value(&headers, "missing").is_none());
    }

    #[test]
    fn job_requires_both_session_secrets() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("kharma_token=tok"));

        let err = job_from_cookies(&headers, "18076").unwrap_err();
        assert!(matches!(err, ApiError::MissingSession));
    }

    #[test]
    fn job_carries_cookies_through() {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_static("kharma_token=tok; kharma_session=sess"),
        );

        let job = job_from_cookies(&headers, "18076").unwrap();
        assert_eq!(job.publisher, "18076");
        assert_eq!(job.kharma_token, "tok");
        assert_eq!(job.kharma_session, "sess");
        assert!(job.jwt.is_empty());
    }
}
