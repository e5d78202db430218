//! Geodrill - Hierarchical geospatial drill-down map controller
//!
//! This library implements interactive drill-down navigation over a four
//! level administrative hierarchy (district → subdistrict → block → parcel),
//! rendering each level as a styled choropleth layer on a pluggable map
//! backend.
//!
//! Boundary geometry and aggregate child counts come from two independent
//! backends and are joined by canonical region code before rendering. A
//! session cache guarantees at most one backend round-trip per distinct
//! (level, ancestor chain) scope, with concurrent requests coalesced into a
//! single in-flight fetch.
//!
//! # Architecture
//!
//! ```text
//! user input ──► DrillDownController ──► RegionCache ──► fetch (fork-join)
//!                     │                                   │
//!                     │                        decode ──► merge
//!                     ▼                                   │
//!               NavigationStateMachine ◄── commit ◄── LayerRenderer
//! ```
//!
//! Decode and merge are pure; fetch and render are effectful; the
//! controller composes them and owns all mutable navigation state.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use geodrill::{DrillDownConfig, DrillDownController, FixtureSource};
//!
//! let source = Arc::new(FixtureSource::new("fixtures/"));
//! let (controller, mut events) = DrillDownController::new(
//!     backend,
//!     source.clone(),
//!     source.clone(),
//!     source,
//!     DrillDownConfig::default(),
//! );
//!
//! controller.initialize().await?;
//! controller.drill_into("10", "District Ten").await?;
//! println!("{:?}", controller.current_breadcrumb());
//! ```

pub mod cache;
pub mod config;
pub mod controller;
pub mod decode;
pub mod merge;
pub mod nav;
pub mod region;
pub mod render;
pub mod source;
pub mod telemetry;

pub use cache::{CacheStats, RegionCache};
pub use config::DrillDownConfig;
pub use controller::{ControllerEvent, DrillDownController, DrillDownError, Outcome};
pub use decode::{decode, decode_batch, DecodeError, RawRegionRecord};
pub use merge::{bucket_for, merge, BucketThresholds, CountBucket};
pub use nav::{InvalidTransition, NavState, NavigationStateMachine};
pub use region::{CacheKey, Geometry, Level, NavigationEntry, Region, RegionCode};
pub use render::{
    FeatureCallbacks, FeatureStyle, LayerRenderer, LayerSpec, MapBackend, RenderError,
    RenderedLayerHandle, StylePalette,
};
pub use source::{
    BoundarySource, CountRecord, CountSource, DetailRecord, DetailSource, FetchError,
    FixtureSource, HttpBoundarySource, HttpCountSource, HttpDetailSource, HttpSourceConfig,
};
pub use telemetry::{NavMetrics, NavTelemetrySnapshot};
