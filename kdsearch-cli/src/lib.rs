//! Support library for the kdsearch CLI binary.
//!
//! Exposes the record reader, logging setup, and command pipeline so
//! doctests and integration tests can drive them without a subprocess.

pub mod cli;
pub mod logging;
pub mod records;
