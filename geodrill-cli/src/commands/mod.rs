//! CLI command implementations.

pub mod drill;
pub mod inspect;
