//! Collection execution
//!
//! The [`RunEngine`] trait is the seam to whatever actually sends the
//! requests. [`NewmanCli`] drives the `newman` command-line runner and parses
//! its JSON export into a [`RunSummary`].

mod engine;
mod newman;
pub mod summary;

pub use engine::{RunConfig, RunEngine, RunError, RunOutcome, RunRequest};
pub use newman::{NewmanCli, newman_args};
pub use summary::{Execution, REDACTED, RunSummary};
