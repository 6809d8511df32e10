//! Benchmark support crate for kdsearch.
//!
//! Provides seeded synthetic point sets and parameter types used by the
//! Criterion benchmarks for tree construction, insertion, and queries.

pub mod error;
pub mod params;
pub mod source;
