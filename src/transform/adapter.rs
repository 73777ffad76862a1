//! Spec transformer adapter
//!
//! Drives one generator call per OpenAPI source:
//!
//! 1. `initialize(source)` - pick the source and derive its output paths
//! 2. `generate_collection()` - run the generator and load its output
//! 3. `save_collection(path)` - write the loaded collection elsewhere
//!
//! Calling a step before its prerequisite fails with
//! [`TransformError::InvalidState`].

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

use super::traits::{CollectionGenerator, TransformError};
use crate::collection::{CollectionDocument, DerivedPaths, derive_paths};
use crate::source::SourceLocation;
use crate::utils::write_json_atomic;

#[derive(Debug, Clone)]
struct Target {
    identifier: String,
    location: SourceLocation,
    paths: DerivedPaths,
}

/// Stateful wrapper around a [`CollectionGenerator`]
pub struct SpecTransformer {
    generator: Arc<dyn CollectionGenerator>,
    work_dir: PathBuf,
    target: Option<Target>,
    generated: Option<CollectionDocument>,
}

impl SpecTransformer {
    pub fn new(generator: Arc<dyn CollectionGenerator>, work_dir: impl Into<PathBuf>) -> Self {
        Self {
            generator,
            work_dir: work_dir.into(),
            target: None,
            generated: None,
        }
    }

    /// Select the source for the next generation
    ///
    /// Drops any collection generated for a previous source.
    pub fn initialize(&mut self, source: &str) -> &DerivedPaths {
        let target = Target {
            identifier: source.to_string(),
            location: SourceLocation::parse(source),
            paths: derive_paths(&self.work_dir, source),
        };
        debug!(
            source = %source,
            generator = self.generator.name(),
            output = %target.paths.collection.display(),
            "Transformer initialized"
        );

        self.generated = None;
        &self.target.insert(target).paths
    }

    /// Run the generator for the initialized source and load its output
    pub async fn generate_collection(&mut self) -> Result<&CollectionDocument, TransformError> {
        let target = self.target.as_ref().ok_or(TransformError::InvalidState(
            "transformer not initialized, call initialize() first",
        ))?;

        self.generator
            .generate(&target.location, &target.paths)
            .await?;
        let collection = CollectionDocument::from_file(&target.paths.collection)?;

        info!(
            source = %target.identifier,
            collection = %collection.name(),
            items = collection.len(),
            "Generated collection from OpenAPI source"
        );

        Ok(self.generated.insert(collection))
    }

    /// Write the generated collection to `path`
    pub fn save_collection(&self, path: &Path) -> Result<(), TransformError> {
        let collection = self.generated.as_ref().ok_or(TransformError::InvalidState(
            "no collection generated, call generate_collection() first",
        ))?;

        write_json_atomic(path, collection).map_err(|source| TransformError::Save {
            path: path.to_path_buf(),
            source,
        })?;

        info!(path = %path.display(), "Collection saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use probekeeper_testkit::fixtures::CollectionBuilder;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    /// Writes a one-item collection named after the source
    struct FakeGenerator {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl CollectionGenerator for FakeGenerator {
        fn name(&self) -> &'static str {
            "fake"
        }

        async fn generate(
            &self,
            source: &SourceLocation,
            paths: &DerivedPaths,
        ) -> Result<(), TransformError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let collection = CollectionBuilder::new(source.to_string())
                .get("ping", "https://api.test/ping")
                .build();
            std::fs::write(&paths.collection, collection.to_string()).unwrap();
            Ok(())
        }
    }

    /// Claims success without writing anything
    struct SilentGenerator;

    #[async_trait]
    impl CollectionGenerator for SilentGenerator {
        fn name(&self) -> &'static str {
            "silent"
        }

        async fn generate(
            &self,
            _source: &SourceLocation,
            _paths: &DerivedPaths,
        ) -> Result<(), TransformError> {
            Ok(())
        }
    }

    fn fake() -> Arc<FakeGenerator> {
        Arc::new(FakeGenerator {
            calls: AtomicUsize::new(0),
        })
    }

    #[tokio::test]
    async fn test_generate_requires_initialize() {
        let dir = TempDir::new().unwrap();
        let generator = fake();
        let mut transformer = SpecTransformer::new(generator.clone(), dir.path());

        let err = transformer.generate_collection().await.unwrap_err();
        assert!(matches!(err, TransformError::InvalidState(_)));
        assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_save_requires_generate() {
        let dir = TempDir::new().unwrap();
        let mut transformer = SpecTransformer::new(fake(), dir.path());
        transformer.initialize("./openapi.json");

        let err = transformer
            .save_collection(&dir.path().join("out.json"))
            .unwrap_err();
        assert!(matches!(err, TransformError::InvalidState(_)));
    }

    #[tokio::test]
    async fn test_generate_and_save() {
        let dir = TempDir::new().unwrap();
        let mut transformer = SpecTransformer::new(fake(), dir.path());
        let source = "https://api.test/openapi.json";

        let paths = transformer.initialize(source).clone();
        assert_eq!(paths, derive_paths(dir.path(), source));

        let collection = transformer.generate_collection().await.unwrap();
        assert_eq!(collection.name(), source);
        assert!(paths.collection.exists());

        let out = dir.path().join("collection.json");
        transformer.save_collection(&out).unwrap();
        assert_eq!(CollectionDocument::from_file(&out).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_reinitialize_clears_generated() {
        let dir = TempDir::new().unwrap();
        let mut transformer = SpecTransformer::new(fake(), dir.path());

        transformer.initialize("a.json");
        transformer.generate_collection().await.unwrap();
        transformer.initialize("b.json");

        let err = transformer
            .save_collection(&dir.path().join("out.json"))
            .unwrap_err();
        assert!(matches!(err, TransformError::InvalidState(_)));
    }

    #[tokio::test]
    async fn test_missing_output_is_reported() {
        let dir = TempDir::new().unwrap();
        let mut transformer = SpecTransformer::new(Arc::new(SilentGenerator), dir.path());
        transformer.initialize("a.json");

        let err = transformer.generate_collection().await.unwrap_err();
        assert!(matches!(err, TransformError::Output(_)));
    }
}
