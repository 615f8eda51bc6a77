//! `sda-worker` library crate.
//!
//! Re-exports the worker's modules for integration testing. The binary
//! entrypoint lives in `main.rs`.

pub mod config;
pub mod error;
pub mod report;
pub mod snapshot_file;
pub mod sweep;
