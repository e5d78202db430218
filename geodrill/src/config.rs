//! Drill-down configuration.
//!
//! One composed config struct passed to the controller at construction,
//! combining the choropleth thresholds, style palette, label behavior, and
//! cache sizing. Everything has a documented default; deployments override
//! selectively (the CLI maps flags onto these fields).

use serde::{Deserialize, Serialize};

use crate::cache::DEFAULT_MAX_ENTRIES;
use crate::merge::BucketThresholds;
use crate::render::{DimFactors, StylePalette};

/// Configuration for the drill-down controller and its collaborators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrillDownConfig {
    /// Lower bounds for the medium/high choropleth buckets.
    pub thresholds: BucketThresholds,

    /// Fill/border styles per bucket.
    pub palette: StylePalette,

    /// How far ancestor layers fade when a child layer is shown.
    pub dim: DimFactors,

    /// Whether permanent name/count labels are shown on render.
    pub labels_visible: bool,

    /// Maximum number of cached region sets.
    pub cache_max_entries: u64,
}

impl Default for DrillDownConfig {
    fn default() -> Self {
        Self {
            thresholds: BucketThresholds::default(),
            palette: StylePalette::default(),
            dim: DimFactors::default(),
            labels_visible: true,
            cache_max_entries: DEFAULT_MAX_ENTRIES,
        }
    }
}

impl DrillDownConfig {
    /// Validate cross-field invariants.
    ///
    /// Returns a human-readable description of the first problem found.
    pub fn validate(&self) -> Result<(), String> {
        if !self.thresholds.is_valid() {
            return Err(format!(
                "bucket thresholds must satisfy 1 <= medium <= high (got medium={}, high={})",
                self.thresholds.medium, self.thresholds.high
            ));
        }
        if self.cache_max_entries == 0 {
            return Err("cache_max_entries must be at least 1".to_string());
        }
        if !(0.0..=1.0).contains(&self.dim.opacity_factor) {
            return Err(format!(
                "dim opacity factor must be within 0..=1 (got {})",
                self.dim.opacity_factor
            ));
        }
        Ok(())
    }
}
