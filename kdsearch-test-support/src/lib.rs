//! Shared test utilities used across kdsearch crates.
//!
//! - [`tracing`]: a recording layer for asserting spans and events.
//! - [`fixtures`]: seeded point clouds and a brute-force neighbour oracle.
//! - [`ci`]: environment-driven tuning for property suites.

pub mod ci;
pub mod fixtures;
pub mod tracing;
