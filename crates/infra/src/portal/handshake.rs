//! Portal login handshake
//!
//! Three sequential phases, each depending on cookies set by the previous
//! one, all sharing a single cookie jar:
//!
//! 1. GET the login page and scrape the sign-in form for its submission path
//!    and hidden anti-forgery token.
//! 2. POST the credentials plus that token as a url-encoded form.
//! 3. GET the sales landing page, which answers with a meta-refresh redirect
//!    instead of an HTTP redirect; following the embedded URL makes the
//!    portal set the two session-secret cookies.
//!
//! The markup-dependent parsing (form id, hidden input, meta-refresh `url=`
//! split) is deliberately confined to this module: when the portal's HTML
//! shifts, this is the only place that changes. Each phase has its own error
//! variant so a broken handshake is attributable from the log line alone.

use std::sync::Arc;
use std::time::Duration;

use reqwest::cookie::{CookieStore, Jar};
use reqwest::{Method, StatusCode};
use scraper::{Html, Selector};
use storefront_domain::{PortalConfig, PortalSession, PublisherOverview, StorefrontError};
use thiserror::Error;
use tracing::{debug, info};
use url::Url;

use crate::http::HttpClient;

const LOGIN_FORM_SELECTOR: &str = "#new_conversations_create_session_form";
const TOKEN_INPUT_SELECTOR: &str = "input[name=\"authenticity_token\"]";
const META_REFRESH_SELECTOR: &str = "meta[http-equiv=\"refresh\"]";

const SESSION_COOKIE: &str = "kharma_session";
const TOKEN_COOKIE: &str = "kharma_token";

const HANDSHAKE_TIMEOUT_SECS: u64 = 30;

/// Failure modes of one acquisition attempt.
///
/// Fatal to that attempt, surfaced to the caller, never retried
/// automatically.
#[derive(Debug, Error)]
pub enum HandshakeError {
    /// The login page no longer carries the expected sign-in form (or the
    /// form lost its action attribute).
    #[error("login form not found on portal login page")]
    FormNotFound,

    /// The sign-in form no longer carries the hidden anti-forgery token.
    #[error("anti-forgery token not found in login form")]
    TokenNotFound,

    /// The portal rejected the submitted credentials.
    #[error("portal rejected login with status {status}")]
    LoginRejected { status: StatusCode },

    /// The sales landing page did not contain the meta-refresh redirect that
    /// mints session cookies.
    #[error("meta refresh redirect missing from sales landing page")]
    RedirectMissing,

    /// The handshake completed but the portal never set both session
    /// cookies.
    #[error("session cookies missing after handshake")]
    SessionCookiesMissing,

    /// The scraped form action cannot be resolved against the login origin.
    #[error("form action `{action}` cannot be resolved into a URL")]
    ActionUnresolvable { action: String },

    /// A network failure in any phase.
    #[error("handshake transport failure: {0}")]
    Transport(#[from] StorefrontError),
}

impl From<HandshakeError> for StorefrontError {
    fn from(err: HandshakeError) -> Self {
        match err {
            HandshakeError::Transport(inner) => inner,
            other => StorefrontError::Handshake(other.to_string()),
        }
    }
}

/// Drives the portal login handshake and yields a [`PortalSession`].
///
/// Every acquisition builds a fresh HTTP client and cookie jar; nothing leaks
/// between attempts.
pub struct SessionAcquirer {
    login_url: String,
    sales_landing_url: String,
    base_url: String,
}

impl SessionAcquirer {
    /// Create an acquirer for the configured portal endpoints.
    pub fn new(config: &PortalConfig) -> Self {
        Self {
            login_url: config.login_url.clone(),
            sales_landing_url: config.sales_landing_url.clone(),
            base_url: config.base_url.clone(),
        }
    }

    /// Execute the full handshake with the given credentials.
    pub async fn acquire(
        &self,
        email: &str,
        password: &str,
    ) -> Result<PortalSession, HandshakeError> {
        let jar = Arc::new(Jar::default());
        let client = HttpClient::builder()
            .timeout(Duration::from_secs(HANDSHAKE_TIMEOUT_SECS))
            .max_attempts(1)
            .cookie_jar(jar.clone())
            .build()?;

        // Phase 1: scrape the form path and anti-forgery token.
        debug!("retrieving anti-forgery token from login page");
        let login_page = self.get_text(&client, &self.login_url).await?;
        let (action, token) = parse_login_form(&login_page)?;

        // Phase 2: submit credentials; cookies from phase 1 ride along.
        let submit_url = resolve_action(&self.login_url, &action)?;
        debug!(%submit_url, "submitting credentials");
        let form = [
            ("utf8", "\u{2713}"),
            ("_method", "put"),
            ("authenticity_token", token.as_str()),
            ("conversations_create_session_form[email]", email),
            ("conversations_create_session_form[password]", password),
            ("commit", "Sign in"),
        ];
        let login_response = client
            .send(client.request(Method::POST, submit_url).form(&form))
            .await?;
        let status = login_response.status();
        if !status.is_success() {
            return Err(HandshakeError::LoginRejected { status });
        }

        // Phase 3: the sales landing page replies with a meta-refresh
        // redirect; following it makes the portal set the session cookies.
        debug!("following meta refresh redirect to mint session cookies");
        let landing = self.get_text(&client, &self.sales_landing_url).await?;
        let redirect = parse_meta_refresh(&landing)?;
        let redirect_url = resolve_action(&self.sales_landing_url, &redirect)
            .map_err(|_| HandshakeError::RedirectMissing)?;
        let response = client.send(client.request(Method::GET, redirect_url)).await?;
        debug!(status = %response.status(), "redirect followed");

        let session = self.extract_session(&jar)?;
        let overview = self.fetch_overview(&client).await?;

        info!(publisher = %overview.id, "portal session acquired");
        Ok(PortalSession {
            publisher_id: overview.id,
            kharma_session: session.0,
            kharma_token: session.1,
        })
    }

    async fn get_text(&self, client: &HttpClient, url: &str) -> Result<String, HandshakeError> {
        let response = client.send(client.request(Method::GET, url)).await?;
        response
            .text()
            .await
            .map_err(|err| StorefrontError::Network(format!("failed to read {url}: {err}")).into())
    }

    /// Pull the two session secrets out of the shared jar.
    fn extract_session(&self, jar: &Jar) -> Result<(String, String), HandshakeError> {
        let portal_url = Url::parse(&self.base_url).map_err(|err| {
            StorefrontError::Config(format!("invalid portal base url {}: {err}", self.base_url))
        })?;

        let header = jar
            .cookies(&portal_url)
            .ok_or(HandshakeError::SessionCookiesMissing)?;
        let cookies = header.to_str().unwrap_or_default().to_string();

        let session = cookie_value(&cookies, SESSION_COOKIE);
        let token = cookie_value(&cookies, TOKEN_COOKIE);
        match (session, token) {
            (Some(session), Some(token)) => Ok((session, token)),
            _ => Err(HandshakeError::SessionCookiesMissing),
        }
    }

    /// Learn which publisher the fresh session belongs to.
    async fn fetch_overview(
        &self,
        client: &HttpClient,
    ) -> Result<PublisherOverview, HandshakeError> {
        #[derive(serde::Deserialize)]
        struct Envelope {
            overview: PublisherOverview,
        }

        let url = format!("{}/api/publisher/overview.json", self.base_url);
        let response = client.send(client.request(Method::GET, &url)).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(crate::errors::status_error(status, "overview fetch").into());
        }

        let envelope: Envelope = response.json().await.map_err(|err| {
            StorefrontError::Internal(format!("failed to parse publisher overview: {err}"))
        })?;
        Ok(envelope.overview)
    }
}

fn selector(css: &'static str) -> Result<Selector, HandshakeError> {
    Selector::parse(css)
        .map_err(|err| StorefrontError::Internal(format!("invalid selector {css}: {err}")).into())
}

/// Scrape the sign-in form's action path and hidden anti-forgery token.
fn parse_login_form(html: &str) -> Result<(String, String), HandshakeError> {
    let document = Html::parse_document(html);

    let form_selector = selector(LOGIN_FORM_SELECTOR)?;
    let form = document
        .select(&form_selector)
        .next()
        .ok_or(HandshakeError::FormNotFound)?;
    let action = form
        .value()
        .attr("action")
        .ok_or(HandshakeError::FormNotFound)?
        .to_string();

    let token_selector = selector(TOKEN_INPUT_SELECTOR)?;
    let token = form
        .select(&token_selector)
        .next()
        .and_then(|input| input.value().attr("value"))
        .ok_or(HandshakeError::TokenNotFound)?
        .to_string();

    Ok((action, token))
}

/// Pull the redirect target out of a `<meta http-equiv="refresh">` tag.
///
/// The content attribute looks like `0; url=https://...`; everything after
/// the last `url=` is the target.
fn parse_meta_refresh(html: &str) -> Result<String, HandshakeError> {
    let document = Html::parse_document(html);

    let meta_selector = selector(META_REFRESH_SELECTOR)?;
    let content = document
        .select(&meta_selector)
        .next()
        .and_then(|meta| meta.value().attr("content"))
        .ok_or(HandshakeError::RedirectMissing)?;

    match content.rsplit_once("url=") {
        Some((_, target)) if !target.trim().is_empty() => Ok(target.trim().to_string()),
        _ => Err(HandshakeError::RedirectMissing),
    }
}

/// Resolve a scraped path or absolute URL against the page it came from.
fn resolve_action(page_url: &str, action: &str) -> Result<Url, HandshakeError> {
    let base = Url::parse(page_url).map_err(|_| HandshakeError::ActionUnresolvable {
        action: action.to_string(),
    })?;
    base.join(action)
        .map_err(|_| HandshakeError::ActionUnresolvable { action: action.to_string() })
}

fn cookie_value(header: &str, name: &str) -> Option<String> {
    header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_string())
}
