//! Boundary record decoding
//!
//! Converts raw per-region payloads from the boundary backend into validated
//! [`Region`] values. Payloads arrive in geometry-interchange (GeoJSON-shaped)
//! form; this module's job is validation and shaping, never network I/O.
//!
//! # Batch Semantics
//!
//! A single malformed record never aborts a fetch. [`decode_batch`] skips
//! records that fail validation, logging one warning per skipped record with
//! the record's code, and returns the regions that decoded cleanly.
//!
//! # Purity
//!
//! [`decode`] is a pure transform: same input, same output, no side effects.
//! Only [`decode_batch`] logs.

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

use crate::region::{Geometry, Level, Region, RegionCode, Ring};

/// Minimum positions for a closed ring (triangle plus the closing point).
const MIN_RING_POSITIONS: usize = 4;

/// Errors produced while decoding a single raw boundary record.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DecodeError {
    /// The record has no geometry payload.
    #[error("record '{code}' has no geometry payload")]
    MissingGeometry { code: String },

    /// The geometry type is not Polygon or MultiPolygon.
    #[error("record '{code}' has unsupported geometry type '{kind}'")]
    UnsupportedGeometryType { code: String, kind: String },

    /// The coordinate array does not have the expected nesting or values.
    #[error("record '{code}' has malformed coordinates: {reason}")]
    MalformedCoordinates { code: String, reason: String },

    /// A ring has fewer than the minimum number of positions.
    #[error("record '{code}' has a ring with {positions} positions (min {MIN_RING_POSITIONS})")]
    ShortRing { code: String, positions: usize },

    /// The record's identifying code is missing or empty after normalization.
    #[error("record at level {level} is missing its region code")]
    MissingCode { level: Level },

    /// A non-district record is missing its parent code.
    #[error("record '{code}' at level {level} is missing its parent code")]
    MissingParentCode { code: String, level: Level },
}

/// One raw boundary record as returned by the boundary backend.
///
/// Geometry is kept as an untyped JSON value until validation; identifying
/// codes are kept as raw strings and normalized during decode.
#[derive(Debug, Clone, Deserialize)]
pub struct RawRegionRecord {
    /// Region code as the backend sent it (padding not yet normalized).
    pub code: String,
    /// Parent region code, absent for district records.
    #[serde(default)]
    pub parent_code: Option<String>,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// GeoJSON-shaped geometry payload.
    #[serde(default)]
    pub geometry: Option<Value>,
    /// Visibility flag from the source system; missing means active.
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

/// Decode one raw record into a validated [`Region`] at `level`.
///
/// # Errors
///
/// Returns a [`DecodeError`] describing the first validation failure. The
/// caller decides whether to skip the record ([`decode_batch`] does) or
/// surface the error.
pub fn decode(level: Level, raw: &RawRegionRecord) -> Result<Region, DecodeError> {
    let code = RegionCode::new(&raw.code);
    if code.is_empty() {
        return Err(DecodeError::MissingCode { level });
    }

    let parent_code = match (&raw.parent_code, level) {
        (_, Level::District) => None,
        (Some(parent), _) => {
            let parent = RegionCode::new(parent);
            if parent.is_empty() {
                return Err(DecodeError::MissingParentCode {
                    code: code.as_str().to_string(),
                    level,
                });
            }
            Some(parent)
        }
        (None, _) => {
            return Err(DecodeError::MissingParentCode {
                code: code.as_str().to_string(),
                level,
            })
        }
    };

    let geometry = match &raw.geometry {
        Some(value) if !value.is_null() => decode_geometry(code.as_str(), value)?,
        _ => {
            return Err(DecodeError::MissingGeometry {
                code: code.as_str().to_string(),
            })
        }
    };

    Ok(Region {
        level,
        code,
        parent_code,
        name: raw.name.clone(),
        geometry,
        child_count: 0,
        is_active: raw.is_active,
    })
}

/// Decode a batch of raw records, skipping malformed entries.
///
/// Logs one warning per skipped record and returns the regions that decoded
/// cleanly, in input order.
pub fn decode_batch(level: Level, raw: &[RawRegionRecord]) -> Vec<Region> {
    let mut regions = Vec::with_capacity(raw.len());
    for record in raw {
        match decode(level, record) {
            Ok(region) => regions.push(region),
            Err(e) => {
                warn!(code = %record.code, level = %level, error = %e, "Skipping malformed boundary record");
            }
        }
    }
    regions
}

/// Validate and shape a GeoJSON-style geometry value.
fn decode_geometry(code: &str, value: &Value) -> Result<Geometry, DecodeError> {
    let kind = value
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| DecodeError::MalformedCoordinates {
            code: code.to_string(),
            reason: "geometry has no 'type' field".to_string(),
        })?;

    let coordinates = value.get("coordinates").ok_or_else(|| {
        DecodeError::MalformedCoordinates {
            code: code.to_string(),
            reason: "geometry has no 'coordinates' field".to_string(),
        }
    })?;

    match kind {
        "Polygon" => Ok(Geometry::Polygon(decode_rings(code, coordinates)?)),
        "MultiPolygon" => {
            let polys = coordinates
                .as_array()
                .ok_or_else(|| malformed(code, "MultiPolygon coordinates is not an array"))?;
            if polys.is_empty() {
                return Err(malformed(code, "MultiPolygon has no polygons"));
            }
            let mut result = Vec::with_capacity(polys.len());
            for poly in polys {
                result.push(decode_rings(code, poly)?);
            }
            Ok(Geometry::MultiPolygon(result))
        }
        other => Err(DecodeError::UnsupportedGeometryType {
            code: code.to_string(),
            kind: other.to_string(),
        }),
    }
}

/// Decode one polygon's ring list.
fn decode_rings(code: &str, value: &Value) -> Result<Vec<Ring>, DecodeError> {
    let rings = value
        .as_array()
        .ok_or_else(|| malformed(code, "polygon coordinates is not an array of rings"))?;
    if rings.is_empty() {
        return Err(malformed(code, "polygon has no rings"));
    }

    let mut result = Vec::with_capacity(rings.len());
    for ring in rings {
        let positions = ring
            .as_array()
            .ok_or_else(|| malformed(code, "ring is not an array of positions"))?;
        if positions.len() < MIN_RING_POSITIONS {
            return Err(DecodeError::ShortRing {
                code: code.to_string(),
                positions: positions.len(),
            });
        }
        let mut shaped: Ring = Vec::with_capacity(positions.len());
        for position in positions {
            shaped.push(decode_position(code, position)?);
        }
        result.push(shaped);
    }
    Ok(result)
}

/// Decode one `[lon, lat]` position.
fn decode_position(code: &str, value: &Value) -> Result<[f64; 2], DecodeError> {
    let pair = value
        .as_array()
        .ok_or_else(|| malformed(code, "position is not an array"))?;
    if pair.len() < 2 {
        return Err(malformed(code, "position has fewer than 2 components"));
    }
    let lon = pair[0].as_f64();
    let lat = pair[1].as_f64();
    match (lon, lat) {
        (Some(lon), Some(lat)) if lon.is_finite() && lat.is_finite() => Ok([lon, lat]),
        _ => Err(malformed(code, "position components are not finite numbers")),
    }
}

fn malformed(code: &str, reason: &str) -> DecodeError {
    DecodeError::MalformedCoordinates {
        code: code.to_string(),
        reason: reason.to_string(),
    }
}
