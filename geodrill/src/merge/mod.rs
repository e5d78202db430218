//! Two-source count merging and choropleth bucketing
//!
//! Boundaries and aggregate counts come from independent backends joined by
//! region code. This module performs that join and maps the resulting child
//! counts onto discrete choropleth buckets.
//!
//! # Merge Rules
//!
//! - Boundaries are authoritative: every boundary region appears in the
//!   output exactly once, in input order.
//! - A boundary with no matching count entry gets `child_count = 0`.
//! - Count entries with no matching boundary are dropped.
//!
//! Both functions here are pure: no hidden state, no I/O, deterministic.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::region::{Region, RegionCode};

/// Discrete style class for a region's child count.
///
/// Ordered from empty to dense; the renderer maps each bucket to a fill
/// style from the configured palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CountBucket {
    /// No children.
    None,
    /// At least one child, below the medium threshold.
    Low,
    /// At or above the medium threshold, below the high threshold.
    Medium,
    /// At or above the high threshold.
    High,
}

/// Lower bounds for the non-empty choropleth buckets.
///
/// A count of zero is always [`CountBucket::None`]; the thresholds only
/// partition positive counts. Invariant: `medium <= high`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketThresholds {
    /// Minimum count for [`CountBucket::Medium`].
    pub medium: u64,
    /// Minimum count for [`CountBucket::High`].
    pub high: u64,
}

impl Default for BucketThresholds {
    fn default() -> Self {
        // Defaults chosen for district-scale child counts; deployments
        // override via DrillDownConfig.
        Self {
            medium: 25,
            high: 100,
        }
    }
}

impl BucketThresholds {
    /// Whether the thresholds are ordered correctly.
    pub fn is_valid(&self) -> bool {
        self.medium >= 1 && self.medium <= self.high
    }
}

/// Map a child count onto its choropleth bucket.
pub fn bucket_for(count: u64, thresholds: &BucketThresholds) -> CountBucket {
    if count == 0 {
        CountBucket::None
    } else if count >= thresholds.high {
        CountBucket::High
    } else if count >= thresholds.medium {
        CountBucket::Medium
    } else {
        CountBucket::Low
    }
}

/// Join boundary regions with their aggregate child counts.
///
/// Consumes the boundary list and returns it enriched; see the module docs
/// for the join rules. Keys in `counts` must already be canonical
/// ([`RegionCode`] normalizes on construction, so any map built from
/// `RegionCode` keys qualifies).
pub fn merge(boundaries: Vec<Region>, counts: &HashMap<RegionCode, u64>) -> Vec<Region> {
    boundaries
        .into_iter()
        .map(|mut region| {
            region.child_count = counts.get(&region.code).copied().unwrap_or(0);
            region
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::region::{Geometry, Level};
    use proptest::prelude::*;

    fn boundary(code: &str) -> Region {
        Region {
            level: Level::Subdistrict,
            code: RegionCode::new(code),
            parent_code: Some(RegionCode::new("10")),
            name: format!("Region {code}"),
            geometry: Geometry::Polygon(vec![vec![
                [0.0, 0.0],
                [1.0, 0.0],
                [1.0, 1.0],
                [0.0, 0.0],
            ]]),
            child_count: 0,
            is_active: true,
        }
    }

    fn counts(entries: &[(&str, u64)]) -> HashMap<RegionCode, u64> {
        entries
            .iter()
            .map(|(code, count)| (RegionCode::new(code), *count))
            .collect()
    }

    #[test]
    fn test_merge_matches_counts_and_defaults_to_zero() {
        // District "010" scenario: three subdistricts, counts only for two.
        let boundaries = vec![boundary("S1"), boundary("S2"), boundary("S3")];
        let counts = counts(&[("S1", 120), ("S3", 0)]);

        let merged = merge(boundaries, &counts);

        assert_eq!(merged.len(), 3);
        assert_eq!(merged[0].child_count, 120);
        assert_eq!(merged[1].child_count, 0);
        assert_eq!(merged[2].child_count, 0);

        let t = BucketThresholds::default();
        assert_eq!(bucket_for(merged[0].child_count, &t), CountBucket::High);
        assert_eq!(bucket_for(merged[1].child_count, &t), CountBucket::None);
        assert_eq!(bucket_for(merged[2].child_count, &t), CountBucket::None);
    }

    #[test]
    fn test_merge_drops_counts_without_boundary() {
        let boundaries = vec![boundary("S1")];
        let counts = counts(&[("S1", 3), ("GHOST", 99)]);

        let merged = merge(boundaries, &counts);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].code, RegionCode::new("S1"));
    }

    #[test]
    fn test_merge_joins_across_code_padding() {
        // Boundary feed sends "10", count feed sends zero-padded "010".
        let boundaries = vec![boundary("10")];
        let counts = counts(&[("010", 7)]);

        let merged = merge(boundaries, &counts);
        assert_eq!(merged[0].child_count, 7);
    }

    #[test]
    fn test_merge_preserves_boundary_order() {
        let boundaries = vec![boundary("S3"), boundary("S1"), boundary("S2")];
        let merged = merge(boundaries, &counts(&[]));
        let codes: Vec<&str> = merged.iter().map(|r| r.code.as_str()).collect();
        assert_eq!(codes, vec!["S3", "S1", "S2"]);
    }

    #[test]
    fn test_bucket_thresholds_default_is_valid() {
        assert!(BucketThresholds::default().is_valid());
    }

    #[test]
    fn test_bucket_boundaries() {
        let t = BucketThresholds {
            medium: 25,
            high: 100,
        };
        assert_eq!(bucket_for(0, &t), CountBucket::None);
        assert_eq!(bucket_for(1, &t), CountBucket::Low);
        assert_eq!(bucket_for(24, &t), CountBucket::Low);
        assert_eq!(bucket_for(25, &t), CountBucket::Medium);
        assert_eq!(bucket_for(99, &t), CountBucket::Medium);
        assert_eq!(bucket_for(100, &t), CountBucket::High);
        assert_eq!(bucket_for(u64::MAX, &t), CountBucket::High);
    }

    proptest! {
        #[test]
        fn prop_bucket_is_monotonic_in_count(a in 0u64..10_000, b in 0u64..10_000) {
            let t = BucketThresholds::default();
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(bucket_for(lo, &t) <= bucket_for(hi, &t));
        }

        #[test]
        fn prop_merged_count_is_counts_or_zero(count in proptest::option::of(0u64..1_000)) {
            let boundaries = vec![boundary("S1")];
            let mut map = HashMap::new();
            if let Some(c) = count {
                map.insert(RegionCode::new("S1"), c);
            }
            let merged = merge(boundaries, &map);
            prop_assert_eq!(merged[0].child_count, count.unwrap_or(0));
        }
    }
}
