//! probekeeper - synthetic API monitoring
//!
//! Periodically runs a Postman-format collection against an API and exposes
//! the results as Prometheus metrics and a JSON status document.
//!
//! ## Architecture
//!
//! Two loops run side by side:
//! - the refresh loop regenerates the collection from OpenAPI sources and
//!   re-resolves the collection/environment files or URLs
//! - the execute loop runs the current collection and feeds the aggregator
//!
//! ## Modules
//!
//! - [`config`] - Settings and run variables
//! - [`source`] - Collection/environment resolution
//! - [`transform`] - OpenAPI to collection generation
//! - [`collection`] - Collection documents and the combiner
//! - [`runner`] - Run engine and run summaries
//! - [`aggregator`] - Lifetime counters, metrics and status views
//! - [`scheduler`] - The refresh and execute loops
//! - [`api`] - HTTP endpoints

pub mod aggregator;
pub mod api;
pub mod collection;
pub mod config;
pub mod runner;
pub mod scheduler;
pub mod source;
pub mod transform;
pub mod utils;
