//! Choropleth style computation.
//!
//! Pure functions from a region's child count to a concrete feature style,
//! independent of the rendering primitive. Colors here are data, not
//! behavior: deployments override the palette through
//! [`crate::config::DrillDownConfig`].

use serde::{Deserialize, Serialize};

use crate::merge::{bucket_for, BucketThresholds, CountBucket};
use crate::region::Region;

/// Fill and border style for one feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureStyle {
    /// Fill color (CSS color string).
    pub fill: String,
    /// Border color (CSS color string).
    pub border: String,
    /// Fill opacity, 0.0..=1.0.
    pub fill_opacity: f64,
    /// Border weight in pixels.
    pub border_weight: f64,
}

impl FeatureStyle {
    fn new(fill: &str, border: &str) -> Self {
        Self {
            fill: fill.to_string(),
            border: border.to_string(),
            fill_opacity: 0.65,
            border_weight: 1.5,
        }
    }
}

/// One style per choropleth bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StylePalette {
    pub none: FeatureStyle,
    pub low: FeatureStyle,
    pub medium: FeatureStyle,
    pub high: FeatureStyle,
}

impl Default for StylePalette {
    fn default() -> Self {
        // Sequential blues; any palette with four distinguishable steps works.
        Self {
            none: FeatureStyle::new("#f7fbff", "#9ecae1"),
            low: FeatureStyle::new("#c6dbef", "#6baed6"),
            medium: FeatureStyle::new("#6baed6", "#3182bd"),
            high: FeatureStyle::new("#2171b5", "#08306b"),
        }
    }
}

impl StylePalette {
    /// The style configured for one bucket.
    pub fn for_bucket(&self, bucket: CountBucket) -> &FeatureStyle {
        match bucket {
            CountBucket::None => &self.none,
            CountBucket::Low => &self.low,
            CountBucket::Medium => &self.medium,
            CountBucket::High => &self.high,
        }
    }
}

/// How much to fade a layer when its child layer is shown on top.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DimFactors {
    /// Multiplier applied to fill opacity.
    pub opacity_factor: f64,
    /// Multiplier applied to border weight.
    pub weight_factor: f64,
}

impl Default for DimFactors {
    fn default() -> Self {
        Self {
            opacity_factor: 0.3,
            weight_factor: 0.5,
        }
    }
}

/// Compute the choropleth style for one region.
pub fn style_for(
    region: &Region,
    palette: &StylePalette,
    thresholds: &BucketThresholds,
) -> FeatureStyle {
    palette
        .for_bucket(bucket_for(region.child_count, thresholds))
        .clone()
}

/// Compute the dimmed variant of a style.
pub fn dimmed(style: &FeatureStyle, factors: &DimFactors) -> FeatureStyle {
    FeatureStyle {
        fill: style.fill.clone(),
        border: style.border.clone(),
        fill_opacity: style.fill_opacity * factors.opacity_factor,
        border_weight: style.border_weight * factors.weight_factor,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::region::{Geometry, Level, RegionCode};

    fn region_with_count(count: u64) -> Region {
        Region {
            level: Level::Subdistrict,
            code: RegionCode::new("S1"),
            parent_code: Some(RegionCode::new("10")),
            name: "North".to_string(),
            geometry: Geometry::Polygon(vec![vec![
                [0.0, 0.0],
                [1.0, 0.0],
                [1.0, 1.0],
                [0.0, 0.0],
            ]]),
            child_count: count,
            is_active: true,
        }
    }

    #[test]
    fn test_style_follows_bucket() {
        let palette = StylePalette::default();
        let thresholds = BucketThresholds::default();

        assert_eq!(
            style_for(&region_with_count(0), &palette, &thresholds),
            palette.none
        );
        assert_eq!(
            style_for(&region_with_count(5), &palette, &thresholds),
            palette.low
        );
        assert_eq!(
            style_for(&region_with_count(120), &palette, &thresholds),
            palette.high
        );
    }

    #[test]
    fn test_dimmed_scales_opacity_and_weight_only() {
        let style = FeatureStyle::new("#2171b5", "#08306b");
        let factors = DimFactors::default();
        let dim = dimmed(&style, &factors);

        assert_eq!(dim.fill, style.fill);
        assert_eq!(dim.border, style.border);
        assert!((dim.fill_opacity - style.fill_opacity * 0.3).abs() < 1e-9);
        assert!((dim.border_weight - style.border_weight * 0.5).abs() < 1e-9);
    }
}
