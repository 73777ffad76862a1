//! `newman` command-line run engine
//!
//! Each run gets a scratch directory holding the collection, the optional
//! environment and the JSON report newman exports. The report is read back as
//! the [`RunSummary`].

use async_trait::async_trait;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tempfile::TempDir;
use tokio::process::Command;
use tracing::debug;

use super::engine::{RunConfig, RunEngine, RunError, RunOutcome, RunRequest};
use super::summary::RunSummary;
use crate::utils::{read_json, write_json_atomic};

const COLLECTION_FILE: &str = "collection.json";
const ENVIRONMENT_FILE: &str = "environment.json";
const REPORT_FILE: &str = "report.json";

/// Runs collections by shelling out to `newman`
#[derive(Debug, Clone)]
pub struct NewmanCli {
    binary: PathBuf,
}

impl NewmanCli {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    async fn execute(&self, request: &RunRequest) -> Result<RunOutcome, RunError> {
        let workspace = TempDir::new().map_err(RunError::Workspace)?;
        let collection = workspace.path().join(COLLECTION_FILE);
        let report = workspace.path().join(REPORT_FILE);

        write_json_atomic(&collection, &request.collection).map_err(RunError::Workspace)?;
        let environment = match &request.environment {
            Some(env) => {
                let path = workspace.path().join(ENVIRONMENT_FILE);
                write_json_atomic(&path, env).map_err(RunError::Workspace)?;
                Some(path)
            }
            None => None,
        };

        let args = newman_args(&collection, environment.as_deref(), &report, &request.config);
        debug!(program = %self.binary.display(), args = ?args, "Running newman");

        let output = Command::new(&self.binary)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| RunError::Spawn {
                program: self.binary.display().to_string(),
                source,
            })?;

        let exited = || RunError::Exited {
            status: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        };

        let summary: RunSummary = match read_json(&report) {
            Ok(summary) => summary,
            // No report at all: the exit status says more than the missing file
            Err(_) if !output.status.success() => return Err(exited()),
            Err(e) => return Err(e.into()),
        };

        // newman exits non-zero whenever a request or assertion failed; that is
        // already in the summary. Only an unexplained failure is an error.
        let error = (!output.status.success() && summary.run.failures.is_empty()).then(exited);

        Ok(RunOutcome {
            error,
            summary: Some(summary),
        })
    }
}

/// Command line for one run
pub fn newman_args(
    collection: &Path,
    environment: Option<&Path>,
    report: &Path,
    config: &RunConfig,
) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec![
        "run".into(),
        collection.into(),
        "--reporters".into(),
        "json".into(),
        "--reporter-json-export".into(),
        report.into(),
        "-n".into(),
        config.iteration_count.to_string().into(),
    ];

    if config.bail_on_failure {
        args.push("--bail".into());
    }

    if let Some(environment) = environment {
        args.push("-e".into());
        args.push(environment.into());
    }

    for (name, value) in config.variables.iter() {
        args.push("--env-var".into());
        args.push(format!("{name}={value}").into());
    }

    args
}

#[async_trait]
impl RunEngine for NewmanCli {
    fn name(&self) -> &'static str {
        "newman"
    }

    async fn run(&self, request: RunRequest) -> RunOutcome {
        self.execute(&request)
            .await
            .unwrap_or_else(RunOutcome::failed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::CollectionDocument;
    use crate::config::RunVariables;
    use std::sync::Arc;

    fn config(bail: bool) -> RunConfig {
        RunConfig {
            iteration_count: 3,
            bail_on_failure: bail,
            variables: Arc::new(RunVariables::from_vars([
                ("POSTMAN_token".to_string(), "abc".to_string()),
                ("POSTMAN_host".to_string(), "api.test".to_string()),
            ])),
        }
    }

    fn strings(args: Vec<OsString>) -> Vec<String> {
        args.into_iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_args_minimal() {
        let mut cfg = config(false);
        cfg.variables = Arc::new(RunVariables::default());
        let args = strings(newman_args(
            Path::new("c.json"),
            None,
            Path::new("r.json"),
            &cfg,
        ));
        assert_eq!(
            args,
            [
                "run",
                "c.json",
                "--reporters",
                "json",
                "--reporter-json-export",
                "r.json",
                "-n",
                "3"
            ]
        );
    }

    #[test]
    fn test_args_full() {
        let args = strings(newman_args(
            Path::new("c.json"),
            Some(Path::new("e.json")),
            Path::new("r.json"),
            &config(true),
        ));
        assert!(args.contains(&"--bail".to_string()));
        let env = args.iter().position(|a| a == "-e").unwrap();
        assert_eq!(args[env + 1], "e.json");
        // BTreeMap order
        let vars: Vec<_> = args
            .windows(2)
            .filter(|w| w[0] == "--env-var")
            .map(|w| w[1].as_str())
            .collect();
        assert_eq!(vars, ["host=api.test", "token=abc"]);
    }

    #[tokio::test]
    async fn test_missing_binary_yields_error_without_summary() {
        let engine = NewmanCli::new("/nonexistent/newman");
        let outcome = engine
            .run(RunRequest {
                collection: CollectionDocument::default(),
                environment: None,
                config: config(false),
            })
            .await;
        assert!(matches!(outcome.error, Some(RunError::Spawn { .. })));
        assert!(outcome.summary.is_none());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failed_exit_without_report() {
        let engine = NewmanCli::new("false");
        let outcome = engine
            .run(RunRequest {
                collection: CollectionDocument::default(),
                environment: None,
                config: config(false),
            })
            .await;
        assert!(matches!(
            outcome.error,
            Some(RunError::Exited { status: Some(1), .. })
        ));
    }
}
