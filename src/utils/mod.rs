//! Utility modules for probekeeper
//!
//! Common helpers shared by the refresh and execute loops.

pub mod fs;

pub use fs::{DocumentError, read_json, write_atomic, write_json_atomic};
