//! Derived file locations
//!
//! Each OpenAPI source gets its own generated files in the work directory.
//! The names are a pure function of the source identifier: the identifier with
//! every non-alphanumeric character replaced by `_`, followed by a short
//! SHA3 digest of the raw identifier. The sanitized part keeps the names
//! readable and is cut to `MAX_SANITIZED_LEN` characters so long URLs stay
//! under file system name limits; the digest keeps `a/b` and `a_b` apart.

use sha3::{Digest, Sha3_256};
use std::path::{Path, PathBuf};

/// Number of hex characters of the digest used in file names
const DIGEST_LEN: usize = 8;

/// Longest sanitized prefix kept in file names
const MAX_SANITIZED_LEN: usize = 100;

/// Files derived from one source identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedPaths {
    /// Generated collection for this source
    pub collection: PathBuf,
    /// Copy of the OpenAPI document as seen by the transformer
    pub openapi: PathBuf,
}

/// Replace every character that is not ASCII alphanumeric with `_`
pub fn sanitize(identifier: &str) -> String {
    identifier
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

/// File name stem for a source identifier
pub fn file_stem(identifier: &str) -> String {
    let digest = hex::encode(Sha3_256::digest(identifier.as_bytes()));
    let mut readable = sanitize(identifier);
    readable.truncate(MAX_SANITIZED_LEN);
    format!("{readable}-{}", &digest[..DIGEST_LEN])
}

/// Derive the generated-file locations for a source
pub fn derive_paths(work_dir: &Path, identifier: &str) -> DerivedPaths {
    let stem = file_stem(identifier);
    DerivedPaths {
        collection: work_dir.join(format!("{stem}-collection.json")),
        openapi: work_dir.join(format!("{stem}-openapi.json")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize() {
        assert_eq!(
            sanitize("https://api.test/v1/openapi.json"),
            "https___api_test_v1_openapi_json"
        );
        assert_eq!(sanitize("abc123"), "abc123");
    }

    #[test]
    fn test_deterministic() {
        let dir = Path::new("/work");
        let a = derive_paths(dir, "https://api.test/openapi.json");
        let b = derive_paths(dir, "https://api.test/openapi.json");
        assert_eq!(a, b);
    }

    #[test]
    fn test_sanitization_collisions_are_distinct() {
        let dir = Path::new("/work");
        let slash = derive_paths(dir, "a/b");
        let underscore = derive_paths(dir, "a_b");
        assert_eq!(sanitize("a/b"), sanitize("a_b"));
        assert_ne!(slash.collection, underscore.collection);
        assert_ne!(slash.openapi, underscore.openapi);
    }

    #[test]
    fn test_long_identifier_is_writable() {
        let dir = tempfile::TempDir::new().unwrap();
        let url = format!(
            "https://bucket.s3.amazonaws.com/openapi.json?X-Amz-Signature={}",
            "a".repeat(340)
        );
        let paths = derive_paths(dir.path(), &url);

        let name = paths.collection.file_name().unwrap().to_str().unwrap();
        assert!(name.len() < 255, "{} bytes", name.len());
        std::fs::write(&paths.collection, b"{}").unwrap();
        std::fs::write(&paths.openapi, b"{}").unwrap();

        // Same prefix, different tail: still distinct
        let other = derive_paths(dir.path(), &format!("{url}b"));
        assert_ne!(paths.collection, other.collection);
    }

    #[test]
    fn test_layout() {
        let paths = derive_paths(Path::new("/work"), "./specs/pets.json");
        let name = paths.collection.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("__specs_pets_json-"));
        assert!(name.ends_with("-collection.json"));
        assert_eq!(paths.collection.parent(), Some(Path::new("/work")));
        assert_ne!(paths.collection, paths.openapi);
    }
}
