//! Collection/environment resolver
//!
//! Turns the configured sources into local paths. Downloads are written to
//! fixed cache files via write-to-temp-then-rename, so a run that reads the
//! cache while a refresh is downloading still sees a complete document.

use reqwest::Client;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};
use url::Url;

use crate::config::Settings;
use crate::utils::write_atomic;

/// Cache file for a downloaded collection
pub const DOWNLOADED_COLLECTION: &str = "downloaded-collection.tmp.json";

/// Cache file for a downloaded environment
pub const DOWNLOADED_ENVIRONMENT: &str = "downloaded-env.tmp.json";

/// Kind of document being resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Collection,
    Environment,
}

impl DocumentKind {
    fn cache_file(self) -> &'static str {
        match self {
            DocumentKind::Collection => DOWNLOADED_COLLECTION,
            DocumentKind::Environment => DOWNLOADED_ENVIRONMENT,
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentKind::Collection => write!(f, "collection"),
            DocumentKind::Environment => write!(f, "environment"),
        }
    }
}

/// Errors that can occur while resolving sources
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("Invalid {kind} URL '{url}': {source}")]
    InvalidUrl {
        kind: DocumentKind,
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Failed to download {kind} from {url}: {source}")]
    Download {
        kind: DocumentKind,
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to cache {kind} at {}: {source}", path.display())]
    Cache {
        kind: DocumentKind,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Collection file '{}' not found", .0.display())]
    CollectionMissing(PathBuf),
}

/// Effective local paths for the next runs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSources {
    pub collection: PathBuf,
    pub environment: Option<PathBuf>,
}

/// Resolves configured sources to local files
#[derive(Debug, Clone)]
pub struct Resolver {
    client: Client,
    work_dir: PathBuf,
}

impl Resolver {
    /// Create a resolver that caches downloads in `work_dir`
    pub fn new(work_dir: impl Into<PathBuf>) -> Self {
        Self::with_client(Client::new(), work_dir)
    }

    /// Create a resolver with a custom HTTP client
    pub fn with_client(client: Client, work_dir: impl Into<PathBuf>) -> Self {
        Self {
            client,
            work_dir: work_dir.into(),
        }
    }

    /// Resolve the sources named in `settings`
    pub async fn resolve_settings(
        &self,
        settings: &Settings,
    ) -> Result<ResolvedSources, ResolveError> {
        self.resolve(
            settings.collection_url(),
            settings.environment_url(),
            &settings.collection_file,
            settings.environment_file(),
        )
        .await
    }

    /// Resolve collection and environment paths
    ///
    /// A URL overrides the corresponding file. The effective collection must
    /// exist locally afterwards.
    pub async fn resolve(
        &self,
        collection_url: Option<&str>,
        environment_url: Option<&str>,
        collection_file: &Path,
        environment_file: Option<&Path>,
    ) -> Result<ResolvedSources, ResolveError> {
        info!("Refreshing collection and environment sources");

        let collection = match collection_url {
            Some(url) => {
                info!(url = %url, "Collection URL will be fetched and used");
                self.download(DocumentKind::Collection, url).await?
            }
            None => collection_file.to_path_buf(),
        };

        let environment = match environment_url {
            Some(url) => {
                info!(url = %url, "Environment URL will be fetched and used");
                Some(self.download(DocumentKind::Environment, url).await?)
            }
            None => environment_file.map(Path::to_path_buf),
        };

        if !collection.exists() {
            return Err(ResolveError::CollectionMissing(collection));
        }

        debug!(
            collection = %collection.display(),
            environment = ?environment,
            "Sources resolved"
        );

        Ok(ResolvedSources {
            collection,
            environment,
        })
    }

    async fn download(&self, kind: DocumentKind, url: &str) -> Result<PathBuf, ResolveError> {
        let parsed = Url::parse(url).map_err(|source| ResolveError::InvalidUrl {
            kind,
            url: url.to_string(),
            source,
        })?;

        let body = self.fetch(parsed).await.map_err(|source| ResolveError::Download {
            kind,
            url: url.to_string(),
            source,
        })?;

        let path = self.work_dir.join(kind.cache_file());
        write_atomic(&path, &body).map_err(|source| ResolveError::Cache {
            kind,
            path: path.clone(),
            source,
        })?;

        debug!(kind = %kind, path = %path.display(), bytes = body.len(), "Download cached");
        Ok(path)
    }

    async fn fetch(&self, url: Url) -> Result<Vec<u8>, reqwest::Error> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        Ok(response.bytes().await?.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Router, http::StatusCode, routing::get};
    use tempfile::TempDir;
    use tokio::net::TcpListener;

    async fn serve(status: StatusCode, body: &'static str) -> String {
        let app = Router::new().route("/doc.json", get(move || async move { (status, body) }));
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}/doc.json")
    }

    fn resolver(dir: &TempDir) -> Resolver {
        let client = Client::builder().no_proxy().build().unwrap();
        Resolver::with_client(client, dir.path())
    }

    #[tokio::test]
    async fn test_file_used_without_url() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("collection.json");
        std::fs::write(&file, "{}").unwrap();
        let env = dir.path().join("env.json");

        let resolved = resolver(&dir)
            .resolve(None, None, &file, Some(env.as_path()))
            .await
            .unwrap();

        assert_eq!(resolved.collection, file);
        assert_eq!(resolved.environment, Some(env));
    }

    #[tokio::test]
    async fn test_missing_collection_file() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("nope.json");

        let err = resolver(&dir)
            .resolve(None, None, &file, None)
            .await
            .unwrap_err();
        assert!(matches!(err, ResolveError::CollectionMissing(p) if p == file));
    }

    #[tokio::test]
    async fn test_url_overrides_file() {
        let dir = TempDir::new().unwrap();
        let url = serve(StatusCode::OK, r#"{"info":{"name":"Remote"},"item":[]}"#).await;
        // The file setting does not even need to exist
        let file = dir.path().join("local.json");

        let resolved = resolver(&dir)
            .resolve(Some(&url), None, &file, None)
            .await
            .unwrap();

        assert_eq!(resolved.collection, dir.path().join(DOWNLOADED_COLLECTION));
        assert_eq!(
            std::fs::read_to_string(&resolved.collection).unwrap(),
            r#"{"info":{"name":"Remote"},"item":[]}"#
        );
        assert!(resolved.environment.is_none());
    }

    #[tokio::test]
    async fn test_environment_resolved_independently() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("collection.json");
        std::fs::write(&file, "{}").unwrap();
        let url = serve(StatusCode::OK, r#"{"values":[]}"#).await;

        let resolved = resolver(&dir)
            .resolve(None, Some(&url), &file, Some(Path::new("ignored.json")))
            .await
            .unwrap();

        assert_eq!(resolved.collection, file);
        assert_eq!(
            resolved.environment,
            Some(dir.path().join(DOWNLOADED_ENVIRONMENT))
        );
    }

    #[tokio::test]
    async fn test_http_error_status() {
        let dir = TempDir::new().unwrap();
        let url = serve(StatusCode::NOT_FOUND, "missing").await;

        let err = resolver(&dir)
            .resolve(Some(&url), None, Path::new("x.json"), None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ResolveError::Download {
                kind: DocumentKind::Collection,
                ..
            }
        ));
        assert!(!dir.path().join(DOWNLOADED_COLLECTION).exists());
    }

    #[tokio::test]
    async fn test_unreachable_host() {
        let dir = TempDir::new().unwrap();
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = resolver(&dir)
            .resolve(
                Some(&format!("http://{addr}/collection.json")),
                None,
                Path::new("x.json"),
                None,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ResolveError::Download { .. }));
    }

    #[tokio::test]
    async fn test_invalid_url() {
        let dir = TempDir::new().unwrap();
        let err = resolver(&dir)
            .resolve(Some("not a url"), None, Path::new("x.json"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, ResolveError::InvalidUrl { .. }));
    }
}
