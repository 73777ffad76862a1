//! Source resolution
//!
//! Decides which local files a run uses. A configured URL always wins over
//! the file setting: it is downloaded into a fixed cache file in the work
//! directory and that cache file becomes the effective path.

mod resolver;

pub use resolver::{
    DOWNLOADED_COLLECTION, DOWNLOADED_ENVIRONMENT, DocumentKind, ResolveError, ResolvedSources,
    Resolver,
};

use std::fmt;
use std::path::PathBuf;
use url::Url;

/// Where a document comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceLocation {
    /// Remote document fetched over HTTP(S)
    Url(Url),
    /// Local file
    File(PathBuf),
}

impl SourceLocation {
    /// Interpret an identifier: `http(s)://` URLs are remote, anything else is a path
    pub fn parse(identifier: &str) -> Self {
        match Url::parse(identifier) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => SourceLocation::Url(url),
            _ => SourceLocation::File(PathBuf::from(identifier)),
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceLocation::Url(url) => write!(f, "{url}"),
            SourceLocation::File(path) => write!(f, "{}", path.display()),
        }
    }
}
