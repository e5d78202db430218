//! Region data model
//!
//! Core types shared by every stage of the drill-down pipeline: the four
//! administrative levels, canonical region codes, decoded regions with their
//! boundary geometry, cache keys, and breadcrumb entries.
//!
//! # Level Hierarchy
//!
//! Levels are ordered coarsest to finest:
//!
//! ```text
//! District (0) → Subdistrict (1) → Block (2) → Parcel (3)
//! ```
//!
//! A region's ancestry is always a chain of codes, one per level above it.
//! Types here carry no rendering or fetching behavior; they are plain data
//! handed between the decoder, cache, merger, renderer, and controller.

mod types;

pub use types::{
    CacheKey, Geometry, Level, NavigationEntry, Region, RegionCode, Ring, LEVELS,
};
