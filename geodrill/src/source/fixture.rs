//! File-backed fixture source for demos and integration testing.
//!
//! Reads one JSON file per (level, ancestor chain) from a fixture directory:
//!
//! ```text
//! fixtures/
//!   district.json
//!   subdistrict_10.json
//!   block_10_S1.json
//!   parcel_10_S1_B2.json
//! ```
//!
//! Each file holds the boundary records, count records, and detail payloads
//! for that scope:
//!
//! ```json
//! {
//!   "boundaries": [ { "code": "S1", "parent_code": "10", ... } ],
//!   "counts": [ { "code": "S1", "count": 120 } ],
//!   "details": { "P7": { "owner": "unknown" } }
//! }
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::Value;

use crate::decode::RawRegionRecord;
use crate::region::{Level, RegionCode};

use super::types::{
    BoundarySource, BoxFuture, CountRecord, CountSource, DetailRecord, DetailSource, FetchError,
};

/// Contents of one fixture file.
#[derive(Debug, Default, Deserialize)]
struct FixtureFile {
    #[serde(default)]
    boundaries: Vec<RawRegionRecord>,
    #[serde(default)]
    counts: Vec<CountRecord>,
    #[serde(default)]
    details: HashMap<String, Value>,
}

/// Fixture-directory source implementing all three source traits.
///
/// Missing files are reported as transport errors, mirroring an unreachable
/// backend.
pub struct FixtureSource {
    root: PathBuf,
}

impl FixtureSource {
    /// Create a fixture source rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Fixture filename for one (level, ancestor chain) scope.
    fn file_name(level: Level, parents: &[RegionCode]) -> String {
        if parents.is_empty() {
            format!("{level}.json")
        } else {
            let chain: Vec<&str> = parents.iter().map(RegionCode::as_str).collect();
            format!("{level}_{}.json", chain.join("_"))
        }
    }

    fn load(&self, level: Level, parents: &[RegionCode]) -> Result<FixtureFile, FetchError> {
        let path = self.root.join(Self::file_name(level, parents));
        let raw = std::fs::read_to_string(&path)
            .map_err(|e| FetchError::Transport(format!("{}: {e}", path.display())))?;
        serde_json::from_str(&raw)
            .map_err(|e| FetchError::InvalidBody(format!("{}: {e}", path.display())))
    }

    /// The fixture directory.
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl BoundarySource for FixtureSource {
    fn fetch_boundaries<'a>(
        &'a self,
        level: Level,
        parents: &'a [RegionCode],
    ) -> BoxFuture<'a, Result<Vec<RawRegionRecord>, FetchError>> {
        Box::pin(async move { self.load(level, parents).map(|f| f.boundaries) })
    }
}

impl CountSource for FixtureSource {
    fn fetch_counts<'a>(
        &'a self,
        level: Level,
        parents: &'a [RegionCode],
    ) -> BoxFuture<'a, Result<Vec<CountRecord>, FetchError>> {
        Box::pin(async move { self.load(level, parents).map(|f| f.counts) })
    }
}

impl DetailSource for FixtureSource {
    fn fetch_leaf_detail<'a>(
        &'a self,
        parents: &'a [RegionCode],
        code: &'a RegionCode,
    ) -> BoxFuture<'a, Result<DetailRecord, FetchError>> {
        Box::pin(async move {
            let file = self.load(Level::Parcel, parents)?;
            let fields = file
                .details
                .into_iter()
                .find(|(key, _)| &RegionCode::new(key) == code)
                .map(|(_, value)| value)
                .ok_or_else(|| {
                    FetchError::InvalidBody(format!("no detail entry for parcel '{code}'"))
                })?;
            Ok(DetailRecord {
                code: code.clone(),
                fields,
            })
        })
    }
}
