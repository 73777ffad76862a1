//! Probekeeper Test Kit
//!
//! Fixture builders for probekeeper tests.
//!
//! This crate provides builders for the JSON documents probekeeper consumes:
//! - Postman collections and environments
//! - newman run summaries (the JSON reporter export)
//!
//! Builders produce plain `serde_json::Value`s so the kit does not depend on
//! probekeeper's own types.
//!
//! # Example
//!
//! ```rust
//! use probekeeper_testkit::fixtures::{CollectionBuilder, ExecutionBuilder, SummaryBuilder};
//!
//! let collection = CollectionBuilder::new("Pets")
//!     .get("List pets", "https://api.test/pets")
//!     .build();
//! assert_eq!(collection["item"].as_array().unwrap().len(), 1);
//!
//! let summary = SummaryBuilder::new("Pets")
//!     .execution(ExecutionBuilder::new("List pets").response(200, "OK", 42, 512))
//!     .build();
//! assert_eq!(summary["run"]["stats"]["requests"]["total"], 1);
//! ```

pub mod fixtures;

pub use fixtures::{
    CollectionBuilder, EnvironmentBuilder, ExecutionBuilder, SummaryBuilder, write_json,
};
