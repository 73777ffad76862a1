//! `portman` command-line generator

use async_trait::async_trait;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

use super::traits::{CollectionGenerator, TransformError};
use crate::collection::DerivedPaths;
use crate::source::SourceLocation;

/// Generates collections by shelling out to `portman`
#[derive(Debug, Clone)]
pub struct PortmanCli {
    binary: PathBuf,
    config_file: PathBuf,
}

impl PortmanCli {
    pub fn new(binary: impl Into<PathBuf>, config_file: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            config_file: config_file.into(),
        }
    }

    /// Arguments for one invocation
    ///
    /// The config file is only passed when it exists, so a missing default
    /// `./portman.json` falls back to portman's built-in behaviour.
    pub fn build_args(&self, source: &SourceLocation, paths: &DerivedPaths) -> Vec<OsString> {
        let mut args: Vec<OsString> = Vec::with_capacity(8);

        match source {
            SourceLocation::Url(url) => {
                args.push("-u".into());
                args.push(url.as_str().into());
            }
            SourceLocation::File(path) => {
                args.push("-l".into());
                args.push(path.into());
            }
        }

        args.push("-o".into());
        args.push(paths.collection.as_os_str().into());
        args.push("--oaOutput".into());
        args.push(paths.openapi.as_os_str().into());

        if self.config_file.exists() {
            args.push("-c".into());
            args.push(self.config_file.as_os_str().into());
        }

        args
    }

    fn program(&self) -> &Path {
        &self.binary
    }
}

#[async_trait]
impl CollectionGenerator for PortmanCli {
    fn name(&self) -> &'static str {
        "portman"
    }

    async fn generate(
        &self,
        source: &SourceLocation,
        paths: &DerivedPaths,
    ) -> Result<(), TransformError> {
        let args = self.build_args(source, paths);
        debug!(program = %self.program().display(), args = ?args, "Running portman");

        let output = Command::new(self.program())
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| TransformError::Spawn {
                program: self.program().display().to_string(),
                source,
            })?;

        if !output.status.success() {
            return Err(TransformError::GeneratorFailed {
                identifier: source.to_string(),
                status: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::derive_paths;
    use tempfile::TempDir;

    fn strings(args: Vec<OsString>) -> Vec<String> {
        args.into_iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_args_for_url_without_config() {
        let dir = TempDir::new().unwrap();
        let cli = PortmanCli::new("portman", dir.path().join("missing.json"));
        let source = SourceLocation::parse("https://api.test/openapi.json");
        let paths = derive_paths(dir.path(), "https://api.test/openapi.json");

        let args = strings(cli.build_args(&source, &paths));
        assert_eq!(args[..2], ["-u", "https://api.test/openapi.json"]);
        assert_eq!(args[2], "-o");
        assert_eq!(args[3], paths.collection.to_string_lossy());
        assert_eq!(args[4], "--oaOutput");
        assert!(!args.contains(&"-c".to_string()));
    }

    #[test]
    fn test_args_for_file_with_config() {
        let dir = TempDir::new().unwrap();
        let config = dir.path().join("portman.json");
        std::fs::write(&config, "{}").unwrap();
        let cli = PortmanCli::new("portman", &config);
        let paths = derive_paths(dir.path(), "specs/api.json");

        let args = strings(cli.build_args(&SourceLocation::parse("specs/api.json"), &paths));
        assert_eq!(args[..2], ["-l", "specs/api.json"]);
        assert_eq!(args[args.len() - 2], "-c");
        assert_eq!(args[args.len() - 1], config.to_string_lossy());
    }

    #[tokio::test]
    async fn test_missing_binary() {
        let dir = TempDir::new().unwrap();
        let cli = PortmanCli::new(dir.path().join("no-such-portman"), "portman.json");
        let paths = derive_paths(dir.path(), "api.json");

        let err = cli
            .generate(&SourceLocation::parse("api.json"), &paths)
            .await
            .unwrap_err();
        assert!(matches!(err, TransformError::Spawn { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failed_exit_reports_stderr() {
        let dir = TempDir::new().unwrap();
        // `false` exits 1 regardless of arguments
        let cli = PortmanCli::new("false", "portman.json");
        let paths = derive_paths(dir.path(), "api.json");

        let err = cli
            .generate(&SourceLocation::parse("api.json"), &paths)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            TransformError::GeneratorFailed { status: Some(1), .. }
        ));
    }
}
