//! Source traits and wire records.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::decode::RawRegionRecord;
use crate::region::{Level, RegionCode};

/// Boxed future type for dyn-compatible async trait methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Errors from a boundary, count, or detail fetch.
///
/// Cloneable so a single failed in-flight fetch can be reported to every
/// coalesced waiter.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Non-success HTTP status.
    #[error("HTTP {status} from {url}")]
    Http { status: u16, url: String },

    /// Connection-level failure (DNS, TLS, refused, reset).
    #[error("transport error: {0}")]
    Transport(String),

    /// The request exceeded the configured timeout.
    #[error("request timed out after {0}s")]
    Timeout(u64),

    /// The response body was not the expected JSON shape.
    #[error("invalid response body: {0}")]
    InvalidBody(String),
}

/// One aggregate count entry from the count backend.
#[derive(Debug, Clone, Deserialize)]
pub struct CountRecord {
    /// Region code as the backend sent it (padding not yet normalized).
    pub code: String,
    /// Number of immediate children of the next level.
    pub count: u64,
}

/// Build a canonical-code count map from raw count records.
///
/// Codes are normalized here, so a zero-padded count feed joins an
/// unpadded boundary feed. Duplicate codes keep the last entry.
pub fn count_map(records: &[CountRecord]) -> HashMap<RegionCode, u64> {
    records
        .iter()
        .map(|r| (RegionCode::new(&r.code), r.count))
        .collect()
}

/// Detail record for one parcel, opened outside the drill-down flow.
#[derive(Debug, Clone, Deserialize)]
pub struct DetailRecord {
    /// Canonical parcel code.
    pub code: RegionCode,
    /// Backend-defined detail payload; the core passes it through opaquely.
    #[serde(default)]
    pub fields: Value,
}

/// Source of raw boundary records.
pub trait BoundarySource: Send + Sync {
    /// Fetch all boundary records for the children at `level` under the
    /// given ancestor chain (empty chain for the district level).
    fn fetch_boundaries<'a>(
        &'a self,
        level: Level,
        parents: &'a [RegionCode],
    ) -> BoxFuture<'a, Result<Vec<RawRegionRecord>, FetchError>>;
}

/// Source of aggregate child counts, independent from the boundary backend.
pub trait CountSource: Send + Sync {
    /// Fetch per-region child counts for the children at `level` under the
    /// given ancestor chain.
    fn fetch_counts<'a>(
        &'a self,
        level: Level,
        parents: &'a [RegionCode],
    ) -> BoxFuture<'a, Result<Vec<CountRecord>, FetchError>>;
}

/// Source of parcel detail records.
pub trait DetailSource: Send + Sync {
    /// Fetch the detail record for one parcel.
    fn fetch_leaf_detail<'a>(
        &'a self,
        parents: &'a [RegionCode],
        code: &'a RegionCode,
    ) -> BoxFuture<'a, Result<DetailRecord, FetchError>>;
}
