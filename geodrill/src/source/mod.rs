//! Data source abstraction
//!
//! The drill-down core never talks to a backend directly. Boundaries,
//! aggregate counts, and parcel detail records each come through a narrow
//! trait, allowing dependency injection and mock sources in tests.
//!
//! Boundaries and counts are *independent* backends in production (a
//! geometry proxy and a local aggregate store), which is why they are
//! separate traits rather than one fat interface.
//!
//! # Implementations
//!
//! - [`HttpBoundarySource`] / [`HttpCountSource`] / [`HttpDetailSource`] —
//!   reqwest-backed JSON endpoints.
//! - [`FixtureSource`] — directory of JSON fixture files, used by the CLI
//!   demo and integration tests.

mod fixture;
mod http;
mod types;

pub use fixture::FixtureSource;
pub use http::{HttpBoundarySource, HttpCountSource, HttpDetailSource, HttpSourceConfig};
pub use types::{
    count_map, BoundarySource, BoxFuture, CountRecord, CountSource, DetailRecord, DetailSource,
    FetchError,
};
