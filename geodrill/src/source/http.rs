//! HTTP-backed sources using reqwest.
//!
//! Boundary and count backends are deployed separately, so each source gets
//! its own base URL. Endpoints return JSON arrays:
//!
//! - `GET {base}/boundaries/{level}?parents=a,b` → `[RawRegionRecord]`
//! - `GET {base}/counts/{level}?parents=a,b` → `[CountRecord]`
//! - `GET {base}/details/{code}?parents=a,b` → `DetailRecord`

use std::time::Duration;

use serde::de::DeserializeOwned;
use tracing::debug;

use crate::decode::RawRegionRecord;
use crate::region::{Level, RegionCode};

use super::types::{
    BoundarySource, BoxFuture, CountRecord, CountSource, DetailRecord, DetailSource, FetchError,
};

/// Configuration for one HTTP source.
#[derive(Debug, Clone)]
pub struct HttpSourceConfig {
    /// Base URL without a trailing slash, e.g. `https://geo.example.com/api`.
    pub base_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl HttpSourceConfig {
    /// Create a config with the default 30 second timeout.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// Shared JSON GET plumbing for the three HTTP sources.
#[derive(Debug, Clone)]
struct JsonEndpoint {
    client: reqwest::Client,
    base_url: String,
    timeout_secs: u64,
}

impl JsonEndpoint {
    fn new(config: &HttpSourceConfig) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| FetchError::Transport(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout_secs: config.timeout.as_secs(),
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        parents: &[RegionCode],
    ) -> Result<T, FetchError> {
        let url = build_url(&self.base_url, path, parents);
        debug!(url = %url, "Fetching from backend");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| self.map_reqwest_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Http {
                status: status.as_u16(),
                url,
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| FetchError::InvalidBody(e.to_string()))
    }

    fn map_reqwest_error(&self, e: reqwest::Error) -> FetchError {
        if e.is_timeout() {
            FetchError::Timeout(self.timeout_secs)
        } else {
            FetchError::Transport(e.to_string())
        }
    }
}

/// Build a request URL with the ancestor chain as a query parameter.
fn build_url(base_url: &str, path: &str, parents: &[RegionCode]) -> String {
    if parents.is_empty() {
        format!("{base_url}/{path}")
    } else {
        let chain: Vec<&str> = parents.iter().map(RegionCode::as_str).collect();
        format!("{base_url}/{path}?parents={}", chain.join(","))
    }
}

/// Boundary backend over HTTP (the external geometry proxy).
pub struct HttpBoundarySource {
    endpoint: JsonEndpoint,
}

impl HttpBoundarySource {
    /// Create a boundary source for the given backend.
    pub fn new(config: &HttpSourceConfig) -> Result<Self, FetchError> {
        Ok(Self {
            endpoint: JsonEndpoint::new(config)?,
        })
    }
}

impl BoundarySource for HttpBoundarySource {
    fn fetch_boundaries<'a>(
        &'a self,
        level: Level,
        parents: &'a [RegionCode],
    ) -> BoxFuture<'a, Result<Vec<RawRegionRecord>, FetchError>> {
        Box::pin(async move {
            self.endpoint
                .get_json(&format!("boundaries/{level}"), parents)
                .await
        })
    }
}

/// Count backend over HTTP (the local aggregate store).
pub struct HttpCountSource {
    endpoint: JsonEndpoint,
}

impl HttpCountSource {
    /// Create a count source for the given backend.
    pub fn new(config: &HttpSourceConfig) -> Result<Self, FetchError> {
        Ok(Self {
            endpoint: JsonEndpoint::new(config)?,
        })
    }
}

impl CountSource for HttpCountSource {
    fn fetch_counts<'a>(
        &'a self,
        level: Level,
        parents: &'a [RegionCode],
    ) -> BoxFuture<'a, Result<Vec<CountRecord>, FetchError>> {
        Box::pin(async move {
            self.endpoint
                .get_json(&format!("counts/{level}"), parents)
                .await
        })
    }
}

/// Parcel detail backend over HTTP.
pub struct HttpDetailSource {
    endpoint: JsonEndpoint,
}

impl HttpDetailSource {
    /// Create a detail source for the given backend.
    pub fn new(config: &HttpSourceConfig) -> Result<Self, FetchError> {
        Ok(Self {
            endpoint: JsonEndpoint::new(config)?,
        })
    }
}

impl DetailSource for HttpDetailSource {
    fn fetch_leaf_detail<'a>(
        &'a self,
        parents: &'a [RegionCode],
        code: &'a RegionCode,
    ) -> BoxFuture<'a, Result<DetailRecord, FetchError>> {
        Box::pin(async move {
            self.endpoint
                .get_json(&format!("details/{code}"), parents)
                .await
        })
    }
}
