//! Collection combiner
//!
//! Merges the collections generated for several OpenAPI sources into one.
//! The first added collection is the structural base (its `info`, auth,
//! variables and so on are kept); the items of every later collection are
//! appended after the base items, in the order the collections were added.
//!
//! A combiner accumulates state across calls. Call [`Combiner::reset`] before
//! starting a new combination cycle, otherwise the previous cycle's
//! collections are carried into the next result.

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

use super::paths::derive_paths;
use super::types::CollectionDocument;
use crate::utils::{DocumentError, write_json_atomic};

/// Errors that can occur while combining collections
#[derive(Debug, Error)]
pub enum CombineError {
    #[error("Failed to load collection: {0}")]
    Load(#[from] DocumentError),

    #[error("No collections added to combine")]
    Empty,

    #[error("No combined collection available, call combine() first")]
    NotCombined,

    #[error("Failed to save combined collection to {}: {source}", path.display())]
    Save {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Accumulates collections and merges them into one
#[derive(Debug)]
pub struct Combiner {
    work_dir: PathBuf,
    collections: Vec<CollectionDocument>,
    combined: Option<CollectionDocument>,
}

impl Combiner {
    /// Create a combiner that looks up generated collections in `work_dir`
    pub fn new(work_dir: impl Into<PathBuf>) -> Self {
        Self {
            work_dir: work_dir.into(),
            collections: Vec::new(),
            combined: None,
        }
    }

    /// Load the collection generated for `source` and queue it
    pub fn add_collection(&mut self, source: &str) -> Result<(), CombineError> {
        let path = derive_paths(&self.work_dir, source).collection;
        let collection = CollectionDocument::from_file(&path)?;

        info!(
            source = %source,
            collection = %collection.name(),
            items = collection.len(),
            "Added collection"
        );
        self.add_document(collection);
        Ok(())
    }

    /// Queue an already loaded collection
    pub fn add_document(&mut self, collection: CollectionDocument) {
        self.collections.push(collection);
    }

    /// Number of queued collections
    pub fn len(&self) -> usize {
        self.collections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collections.is_empty()
    }

    /// Merge all queued collections under `name`
    pub fn combine(&mut self, name: &str) -> Result<&CollectionDocument, CombineError> {
        let (base, rest) = self.collections.split_first().ok_or(CombineError::Empty)?;

        let mut combined = base.clone();
        combined.info.name = name.to_string();
        for collection in rest {
            combined.item.extend(collection.item.iter().cloned());
        }

        info!(
            collections = self.collections.len(),
            items = combined.len(),
            name = %name,
            "Combined collections"
        );

        Ok(self.combined.insert(combined))
    }

    /// The result of the last `combine()`, if any
    pub fn combined(&self) -> Option<&CollectionDocument> {
        self.combined.as_ref()
    }

    /// Write the combined collection to `path`
    pub fn save_collection(&self, path: &Path) -> Result<(), CombineError> {
        let combined = self.combined.as_ref().ok_or(CombineError::NotCombined)?;

        write_json_atomic(path, combined).map_err(|source| CombineError::Save {
            path: path.to_path_buf(),
            source,
        })?;

        info!(path = %path.display(), "Combined collection saved");
        Ok(())
    }

    /// Drop all queued collections and the combined result
    pub fn reset(&mut self) {
        self.collections.clear();
        self.combined = None;
        debug!("Collection combiner reset");
    }
}
