//! Core data types for regions and navigation.

use std::fmt;

use serde::{Deserialize, Serialize};

/// All levels in drill-down order, coarsest first.
pub const LEVELS: [Level; 4] = [
    Level::District,
    Level::Subdistrict,
    Level::Block,
    Level::Parcel,
];

/// One administrative/geospatial granularity in the drill-down hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    District,
    Subdistrict,
    Block,
    Parcel,
}

impl Level {
    /// Zero-based depth of this level (district = 0, parcel = 3).
    ///
    /// The breadcrumb stack length always equals the ordinal of the
    /// current level.
    pub fn ordinal(&self) -> usize {
        match self {
            Level::District => 0,
            Level::Subdistrict => 1,
            Level::Block => 2,
            Level::Parcel => 3,
        }
    }

    /// The next finer level, or `None` for parcels.
    pub fn child(&self) -> Option<Level> {
        match self {
            Level::District => Some(Level::Subdistrict),
            Level::Subdistrict => Some(Level::Block),
            Level::Block => Some(Level::Parcel),
            Level::Parcel => None,
        }
    }

    /// The next coarser level, or `None` for districts.
    pub fn parent(&self) -> Option<Level> {
        match self {
            Level::District => None,
            Level::Subdistrict => Some(Level::District),
            Level::Block => Some(Level::Subdistrict),
            Level::Parcel => Some(Level::Block),
        }
    }

    /// Whether regions at this level can have children (parcels cannot).
    pub fn has_children(&self) -> bool {
        self.child().is_some()
    }

    /// Lowercase name used in cache keys, URLs, and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::District => "district",
            Level::Subdistrict => "subdistrict",
            Level::Block => "block",
            Level::Parcel => "parcel",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A region code in canonical form.
///
/// The boundary and count feeds come from independent backends that do not
/// agree on code padding (`"010"` vs `"10"`). Every code entering the
/// pipeline is normalized through this type so the two feeds join correctly.
///
/// # Canonical Form
///
/// - ASCII whitespace trimmed
/// - Uppercased
/// - Leading `'0'`s stripped, keeping at least one character
///
/// `"010"`, `" 10 "`, and `"10"` all canonicalize to `"10"`; `"000"`
/// canonicalizes to `"0"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String")]
pub struct RegionCode(String);

impl RegionCode {
    /// Create a code, applying canonical normalization.
    pub fn new(raw: &str) -> Self {
        let trimmed = raw.trim();
        let stripped = trimmed.trim_start_matches('0');
        let canonical = if stripped.is_empty() && !trimmed.is_empty() {
            "0"
        } else {
            stripped
        };
        RegionCode(canonical.to_uppercase())
    }

    /// The canonical string form.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the raw input normalized to nothing.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<String> for RegionCode {
    fn from(raw: String) -> Self {
        RegionCode::new(&raw)
    }
}

impl From<&str> for RegionCode {
    fn from(raw: &str) -> Self {
        RegionCode::new(raw)
    }
}

impl fmt::Display for RegionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A closed ring of `[lon, lat]` positions.
pub type Ring = Vec<[f64; 2]>;

/// Boundary geometry in renderer-agnostic interchange form.
///
/// Parsed from GeoJSON-shaped payloads by the decoder. The renderer never
/// sees raw payloads; it consumes this validated form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Geometry {
    /// A single polygon: exterior ring first, holes after.
    Polygon(Vec<Ring>),
    /// Multiple polygons, each with its own ring list.
    MultiPolygon(Vec<Vec<Ring>>),
}

impl Geometry {
    /// Number of polygons in this geometry.
    pub fn polygon_count(&self) -> usize {
        match self {
            Geometry::Polygon(_) => 1,
            Geometry::MultiPolygon(polys) => polys.len(),
        }
    }

    /// Total number of positions across all rings.
    pub fn position_count(&self) -> usize {
        match self {
            Geometry::Polygon(rings) => rings.iter().map(Vec::len).sum(),
            Geometry::MultiPolygon(polys) => polys
                .iter()
                .flat_map(|rings| rings.iter().map(Vec::len))
                .sum(),
        }
    }
}

/// One geographic unit at a given level, decoded and ready to merge/render.
///
/// Regions are produced fresh on every fetch and never mutated in place;
/// a new drill-down replaces the prior set rather than patching it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    /// Granularity of this region.
    pub level: Level,
    /// Canonical code, unique within the parent scope (not globally).
    pub code: RegionCode,
    /// Canonical parent code; absent only at the district level.
    pub parent_code: Option<RegionCode>,
    /// Display name.
    pub name: String,
    /// Boundary geometry.
    pub geometry: Geometry,
    /// Count of immediate children at the next level.
    ///
    /// Meaningful for districts, subdistricts, and blocks; unused for
    /// parcels (parcels have no children).
    pub child_count: u64,
    /// Soft-delete / visibility flag from the source system.
    pub is_active: bool,
}

/// Cache key for one fetched region set.
///
/// The ordered ancestor chain runs from the district code down to and
/// including the requested level's parent code. Identical keys always map
/// to identical cached results; entries are immutable once written.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    level: Level,
    ancestors: Vec<RegionCode>,
}

impl CacheKey {
    /// Create a key for fetching all `level` children under `ancestors`.
    pub fn new(level: Level, ancestors: Vec<RegionCode>) -> Self {
        Self { level, ancestors }
    }

    /// Level of the regions stored under this key.
    pub fn level(&self) -> Level {
        self.level
    }

    /// The ancestor code chain, coarsest first.
    pub fn ancestors(&self) -> &[RegionCode] {
        &self.ancestors
    }

    /// Human-readable key for logs: `regions:{level}:{a}/{b}/...`.
    pub fn storage_key(&self) -> String {
        let chain: Vec<&str> = self.ancestors.iter().map(RegionCode::as_str).collect();
        format!("regions:{}:{}", self.level, chain.join("/"))
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.storage_key())
    }
}

/// One frame of the breadcrumb stack: the selection made at `level`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationEntry {
    /// Level at which this selection was made.
    pub level: Level,
    /// Canonical code of the selected region.
    pub code: RegionCode,
    /// Display name of the selected region.
    pub name: String,
}

impl NavigationEntry {
    /// Create a breadcrumb entry.
    pub fn new(level: Level, code: RegionCode, name: impl Into<String>) -> Self {
        Self {
            level,
            code,
            name: name.into(),
        }
    }
}

impl fmt::Display for NavigationEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} ({})", self.level, self.code, self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_ordinals_match_drill_order() {
        assert_eq!(Level::District.ordinal(), 0);
        assert_eq!(Level::Subdistrict.ordinal(), 1);
        assert_eq!(Level::Block.ordinal(), 2);
        assert_eq!(Level::Parcel.ordinal(), 3);
    }

    #[test]
    fn test_level_child_and_parent_are_inverse() {
        for level in LEVELS {
            if let Some(child) = level.child() {
                assert_eq!(child.parent(), Some(level));
            }
            if let Some(parent) = level.parent() {
                assert_eq!(parent.child(), Some(level));
            }
        }
    }

    #[test]
    fn test_parcel_has_no_children() {
        assert!(!Level::Parcel.has_children());
        assert!(Level::Block.has_children());
    }

    #[test]
    fn test_region_code_strips_leading_zeros() {
        assert_eq!(RegionCode::new("010").as_str(), "10");
        assert_eq!(RegionCode::new("10").as_str(), "10");
        assert_eq!(RegionCode::new(" 10 ").as_str(), "10");
    }

    #[test]
    fn test_region_code_all_zeros_keeps_one() {
        assert_eq!(RegionCode::new("000").as_str(), "0");
        assert_eq!(RegionCode::new("0").as_str(), "0");
    }

    #[test]
    fn test_region_code_uppercases() {
        assert_eq!(RegionCode::new("0a1b").as_str(), "A1B");
    }

    #[test]
    fn test_padded_and_unpadded_codes_are_equal() {
        assert_eq!(RegionCode::new("010"), RegionCode::new("10"));
    }

    #[test]
    fn test_cache_key_storage_format() {
        let key = CacheKey::new(
            Level::Block,
            vec![RegionCode::new("10"), RegionCode::new("42")],
        );
        assert_eq!(key.storage_key(), "regions:block:10/42");
    }

    #[test]
    fn test_cache_keys_with_same_chain_are_equal() {
        let a = CacheKey::new(Level::Subdistrict, vec![RegionCode::new("010")]);
        let b = CacheKey::new(Level::Subdistrict, vec![RegionCode::new("10")]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_geometry_counts() {
        let ring: Ring = vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 0.0]];
        let poly = Geometry::Polygon(vec![ring.clone()]);
        assert_eq!(poly.polygon_count(), 1);
        assert_eq!(poly.position_count(), 4);

        let multi = Geometry::MultiPolygon(vec![vec![ring.clone()], vec![ring]]);
        assert_eq!(multi.polygon_count(), 2);
        assert_eq!(multi.position_count(), 8);
    }
}
