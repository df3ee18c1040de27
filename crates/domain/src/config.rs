//! Configuration management

use serde::{Deserialize, Serialize};

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub portal: PortalConfig,
    pub gateway: GatewayConfig,
    pub refresh: RefreshConfig,
    pub server: ServerConfig,
}

/// Portal endpoints driven during the login handshake.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortalConfig {
    /// Login page carrying the HTML sign-in form.
    pub login_url: String,
    /// Sales landing page whose meta-refresh redirect mints the session
    /// cookies.
    pub sales_landing_url: String,
    /// Base URL of the portal's publisher JSON API.
    pub base_url: String,
}

/// Which upstream collaborator serves months/sales fetches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GatewayMode {
    /// Call the portal's publisher-info endpoints directly
    /// (`x-kharma-token` header plus session cookies).
    Portal,
    /// Call an intermediary API service (`kharma_token`/`kharma_session`/
    /// `jwt` cookies, canonical JSON shapes).
    Service,
}

/// Upstream gateway selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    pub mode: GatewayMode,
    /// Host of the intermediary API service; only used in `Service` mode.
    pub api_host: String,
}

/// Background refresh scheduling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshConfig {
    /// Cron expression for the periodic tick.
    pub cron_expression: String,
    /// Upper bound for a single publisher refresh run, in seconds.
    pub job_timeout_seconds: u64,
}

/// HTTP service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub bind_addr: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            portal: PortalConfig {
                login_url: "https://id.storefront.example/en/login".to_string(),
                sales_landing_url: "https://publisher.storefront.example/sales.html".to_string(),
                base_url: "https://publisher.storefront.example".to_string(),
            },
            gateway: GatewayConfig {
                mode: GatewayMode::Portal,
                api_host: "localhost:8081".to_string(),
            },
            refresh: RefreshConfig {
                // every 5 minutes
                cron_expression: "0 */5 * * * *".to_string(),
                job_timeout_seconds: 300,
            },
            server: ServerConfig { bind_addr: "0.0.0.0:8080".to_string() },
        }
    }
}
