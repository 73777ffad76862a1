//! Collection generator trait and supporting types
//!
//! A `CollectionGenerator` wraps the external tool that turns one OpenAPI
//! description into a collection file. Implementations write their output to
//! the paths they are given; the adapter takes care of loading the result.

use async_trait::async_trait;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::collection::DerivedPaths;
use crate::source::SourceLocation;
use crate::utils::DocumentError;

/// Errors that can occur while generating a collection
#[derive(Debug, Error)]
pub enum TransformError {
    #[error("Invalid state: {0}")]
    InvalidState(&'static str),

    #[error("Failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("Generator failed for {identifier} (exit code {status:?}): {stderr}")]
    GeneratorFailed {
        identifier: String,
        status: Option<i32>,
        stderr: String,
    },

    #[error("Generated collection unusable: {0}")]
    Output(#[from] DocumentError),

    #[error("Failed to save collection to {}: {source}", path.display())]
    Save {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// External OpenAPI to collection transformation
///
/// ## Example Implementation
///
/// ```ignore
/// use async_trait::async_trait;
/// use probekeeper::transform::{CollectionGenerator, TransformError};
///
/// pub struct CopyGenerator;
///
/// #[async_trait]
/// impl CollectionGenerator for CopyGenerator {
///     fn name(&self) -> &'static str { "copy" }
///
///     async fn generate(&self, source: &SourceLocation, paths: &DerivedPaths) -> Result<(), TransformError> {
///         // Write a collection to `paths.collection`
///         todo!()
///     }
/// }
/// ```
#[async_trait]
pub trait CollectionGenerator: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &'static str;

    /// Generate the collection for `source` into `paths.collection`
    async fn generate(
        &self,
        source: &SourceLocation,
        paths: &DerivedPaths,
    ) -> Result<(), TransformError>;
}
