//! Collection documents
//!
//! Types for Postman-format collections and environments, the file naming
//! scheme for generated collections, and the combiner that merges several
//! generated collections into one.
//!
//! ## Combined collection layout
//!
//! ```text
//! base.info (renamed)     base.item[..] ++ second.item[..] ++ third.item[..]
//! ```

mod combiner;
pub mod paths;
mod types;

pub use combiner::{CombineError, Combiner};
pub use paths::{DerivedPaths, derive_paths};
pub use types::{
    CollectionDocument, CollectionInfo, CollectionItem, EnvironmentDocument, EnvironmentValue,
};
