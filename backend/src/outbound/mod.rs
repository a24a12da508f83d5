//! Outbound adapters implementing domain ports.
//!
//! - [`persistence`]: PostgreSQL via Diesel and `diesel-async`.
//! - [`memory`]: in-process storage for tests and local runs.

pub mod memory;
pub mod persistence;
