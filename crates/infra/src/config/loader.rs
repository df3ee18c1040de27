//! Configuration loader
//!
//! Loads application configuration from environment variables, falling back
//! to the built-in defaults for anything unset.
//!
//! ## Environment Variables
//! - `STOREFRONT_PORTAL_LOGIN_URL`: portal login page
//! - `STOREFRONT_PORTAL_SALES_URL`: portal sales landing page
//! - `STOREFRONT_PORTAL_BASE_URL`: portal publisher API base
//! - `STOREFRONT_GATEWAY_MODE`: `portal` or `service`
//! - `STOREFRONT_API_HOST`: intermediary API service host (service mode)
//! - `STOREFRONT_REFRESH_CRON`: tick schedule cron expression
//! - `STOREFRONT_REFRESH_JOB_TIMEOUT`: per-run timeout in seconds
//! - `STOREFRONT_BIND_ADDR`: HTTP service bind address

use storefront_domain::{Config, GatewayMode, Result, StorefrontError};

/// Load configuration from the environment on top of defaults.
pub fn load() -> Result<Config> {
    let config = load_from_env()?;
    tracing::info!(
        gateway_mode = ?config.gateway.mode,
        cron = %config.refresh.cron_expression,
        bind = %config.server.bind_addr,
        "configuration loaded"
    );
    Ok(config)
}

/// Load configuration from environment variables.
///
/// Unset variables keep their defaults; set-but-invalid values are
/// configuration errors rather than silent fallbacks.
pub fn load_from_env() -> Result<Config> {
    let mut config = Config::default();

    if let Some(value) = env_var("STOREFRONT_PORTAL_LOGIN_URL") {
        config.portal.login_url = value;
    }
    if let Some(value) = env_var("STOREFRONT_PORTAL_SALES_URL") {
        config.portal.sales_landing_url = value;
    }
    if let Some(value) = env_var("STOREFRONT_PORTAL_BASE_URL") {
        config.portal.base_url = value;
    }
    if let Some(value) = env_var("STOREFRONT_GATEWAY_MODE") {
        config.gateway.mode = parse_gateway_mode(&value)?;
    }
    if let Some(value) = env_var("STOREFRONT_API_HOST") {
        config.gateway.api_host = value;
    }
    if let Some(value) = env_var("STOREFRONT_REFRESH_CRON") {
        config.refresh.cron_expression = value;
    }
    if let Some(value) = env_var("STOREFRONT_REFRESH_JOB_TIMEOUT") {
        config.refresh.job_timeout_seconds = value.parse::<u64>().map_err(|err| {
            StorefrontError::Config(format!("Invalid refresh job timeout: {err}"))
        })?;
    }
    if let Some(value) = env_var("STOREFRONT_BIND_ADDR") {
        config.server.bind_addr = value;
    }

    Ok(config)
}

fn parse_gateway_mode(value: &str) -> Result<GatewayMode> {
    match value.to_ascii_lowercase().as_str() {
        "portal" => Ok(GatewayMode::Portal),
        "service" => Ok(GatewayMode::Service),
        other => Err(StorefrontError::Config(format!(
            "Invalid gateway mode `{other}` (expected `portal` or `service`)"
        ))),
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use once_cell::sync::Lazy;
    use std::sync::Mutex;

    use super::*;

    // Environment mutation is process-global; serialize the tests that touch it.
    static ENV_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

    struct EnvGuard {
        name: &'static str,
    }

    impl EnvGuard {
        fn set(name: &'static str, value: &str) -> Self {
            std::env::set_var(name, value);
            Self { name }
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            std::env::remove_var(self.name);
        }
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let _lock = ENV_LOCK.lock().unwrap();
        let config = load_from_env().expect("config loads");
        assert_eq!(config.gateway.mode, GatewayMode::Portal);
        assert_eq!(config.refresh.cron_expression, "0 */5 * * * *");
    }

    #[test]
    fn env_overrides_defaults() {
        let _lock = ENV_LOCK.lock().unwrap();
        let _mode = EnvGuard::set("STOREFRONT_GATEWAY_MODE", "service");
        let _host = EnvGuard::set("STOREFRONT_API_HOST", "api.internal:9000");
        let _cron = EnvGuard::set("STOREFRONT_REFRESH_CRON", "0 */10 * * * *");

        let config = load_from_env().expect("config loads");
        assert_eq!(config.gateway.mode, GatewayMode::Service);
        assert_eq!(config.gateway.api_host, "api.internal:9000");
        assert_eq!(config.refresh.cron_expression, "0 */10 * * * *");
    }

    #[test]
    fn invalid_gateway_mode_is_a_config_error() {
        let _lock = ENV_LOCK.lock().unwrap();
        let _mode = EnvGuard::set("STOREFRONT_GATEWAY_MODE", "direct");

        let err = load_from_env().expect_err("load fails");
        assert!(matches!(err, StorefrontError::Config(_)));
    }

    #[test]
    fn invalid_timeout_is_a_config_error() {
        let _lock = ENV_LOCK.lock().unwrap();
        let _timeout = EnvGuard::set("STOREFRONT_REFRESH_JOB_TIMEOUT", "soon");

        let err = load_from_env().expect_err("load fails");
        assert!(matches!(err, StorefrontError::Config(_)));
    }
}
