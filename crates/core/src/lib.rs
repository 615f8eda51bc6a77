//! `sda-core` -- derived-state and aggregation logic for SDA property
//! management.
//!
//! Everything here is pure: callers fetch entity snapshots and supply
//! "today" through a [`clock::Clock`]. Apart from
//! [`clock::SystemClock`], nothing in this crate touches the system clock
//! or storage.

pub mod clock;
pub mod compliance;
pub mod dates;
pub mod distribution;
pub mod entities;
pub mod error;
pub mod money;
pub mod occupancy;
pub mod plans;
pub mod recurrence;
pub mod snapshot;
pub mod types;
