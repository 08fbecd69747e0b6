//! Support library for the trackbuild CLI binary.
//!
//! Exposes the command pipeline, configuration, logging, and graph storage so
//! doctests and integration tests can exercise them without forking a
//! subprocess.

pub mod cli;
pub mod config;
pub mod logging;
pub mod store;
