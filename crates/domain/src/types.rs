//! Common data types used throughout the application

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Session secrets proving an authenticated publisher identity against the
/// storefront portal.
///
/// Produced by the session acquirer after the login handshake; immutable once
/// created. A later session for the same publisher supersedes this one, it is
/// never mutated in place. Validity is unknown until a downstream call fails
/// with 401/403 — the portal signals expiry only by rejecting use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortalSession {
    pub publisher_id: String,
    /// `kharma_session` cookie value set by the portal.
    pub kharma_session: String,
    /// `kharma_token` cookie value set by the portal.
    pub kharma_token: String,
}

/// Message carrying a publisher's freshly acquired session into the refresh
/// scheduler.
///
/// The wire shape is the flat camelCase payload emitted by the authentication
/// flow. Idempotent by publisher: a later job for the same publisher replaces
/// the earlier one. `jwt` is carried through to service-mode fetches but never
/// interpreted here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshJob {
    pub publisher: String,
    pub kharma_session: String,
    pub kharma_token: String,
    #[serde(default)]
    pub jwt: String,
}

impl RefreshJob {
    /// Build a job from an acquired session plus the opaque jwt handed to
    /// end users.
    pub fn from_session(session: &PortalSession, jwt: impl Into<String>) -> Self {
        Self {
            publisher: session.publisher_id.clone(),
            kharma_session: session.kharma_session.clone(),
            kharma_token: session.kharma_token.clone(),
            jwt: jwt.into(),
        }
    }

    /// View the job's credentials as a session.
    pub fn session(&self) -> PortalSession {
        PortalSession {
            publisher_id: self.publisher.clone(),
            kharma_session: self.kharma_session.clone(),
            kharma_token: self.kharma_token.clone(),
        }
    }
}

/// One month the upstream reports as queryable for a publisher.
///
/// Obtained at orchestration time and never cached; `value` is the canonical
/// `YYYYMM` key, `name` the human-readable label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthDescriptor {
    pub value: String,
    pub name: String,
}

/// Canonical per-package sales figures for one month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesData {
    pub package_name: String,
    pub price: String,
    pub sales: i64,
    pub gross: String,
    pub last_sale: String,
}

/// Raw tabular sales rows as the portal serves them.
///
/// Fixed-column layout per row: name, price, sales count, refunds, chargebacks,
/// gross, net, last sale date. Only the columns the canonical shape needs are
/// read.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawSalesTable {
    #[serde(rename = "aaData", default)]
    pub aa_data: Vec<Vec<String>>,
}

const COL_NAME: usize = 0;
const COL_PRICE: usize = 1;
const COL_SALES: usize = 2;
const COL_GROSS: usize = 5;
const COL_LAST_SALE: usize = 7;
const ROW_WIDTH: usize = 8;

impl RawSalesTable {
    /// Convert the raw table into canonical sales entries.
    ///
    /// Parsing is lenient: a sales-count cell that is not an integer counts as
    /// zero sales, and rows narrower than the expected layout are dropped.
    /// Partial sales data is more useful than none.
    pub fn into_sales(self) -> Vec<SalesData> {
        self.aa_data
            .into_iter()
            .filter(|row| row.len() >= ROW_WIDTH)
            .map(|row| SalesData {
                package_name: row[COL_NAME].clone(),
                price: row[COL_PRICE].clone(),
                sales: row[COL_SALES].trim().parse().unwrap_or(0),
                gross: row[COL_GROSS].clone(),
                last_sale: row[COL_LAST_SALE].clone(),
            })
            .collect()
    }
}

/// Key addressing one publisher-month slot in the sales cache.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub publisher_id: String,
    pub month: String,
}

impl CacheKey {
    pub fn new(publisher_id: impl Into<String>, month: impl Into<String>) -> Self {
        Self { publisher_id: publisher_id.into(), month: month.into() }
    }
}

/// One cached sales payload.
///
/// Entries are replaced whole on every write; readers never see a partially
/// written payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub payload: serde_json::Value,
    pub written_at: DateTime<Utc>,
}

impl CacheEntry {
    pub fn new(payload: serde_json::Value) -> Self {
        Self { payload, written_at: Utc::now() }
    }
}

/// Publisher account overview as served by the portal.
///
/// The session acquirer reads this to learn which publisher the freshly
/// minted session belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublisherOverview {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

/// Published package listing entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageData {
    pub id: String,
    pub name: String,
    #[serde(rename = "short_url")]
    pub url: String,
    pub average_rating: f64,
    #[serde(rename = "count_ratings")]
    pub num_ratings: i64,
}
