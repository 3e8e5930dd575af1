//! Script execution engine.
//!
//! Each `run` executes caller-supplied Python in a fresh interpreter process:
//!
//! 1. snapshot the registry and export it, with the library handle table, to
//!    a private temporary directory (on the blocking pool);
//! 2. spawn the interpreter with a bootstrap that builds the namespace and
//!    executes the script read from stdin;
//! 3. capture stdout and stderr through pipes and render them.
//!
//! Capture is scoped to the child process, so the host's own streams are
//! never redirected and nothing has to be restored afterwards. The temporary
//! directory is removed on every exit path when its guard drops.
//!
//! Nothing the script does to its namespace flows back into the registry.
//! The script runs with the host user's privileges; there is no resource or
//! syscall sandbox, and no deadline unless one is configured.

pub mod namespace;
pub mod output;

pub use output::CapturedOutput;

use crate::config::ExplorerConfig;
use crate::error::{ExplorerError, Result};
use crate::logging::log_event;
use crate::registry::DatasetRegistry;
use crate::utils::{TempDirGuard, run_blocking};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt as _;
use tokio::process::Command;
use tokio::time::timeout;

const LOG_TAG: &str = "Script";
const BOOTSTRAP: &str = include_str!("script/bootstrap.py");

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptOptions {
    pub python_executable: String,
    pub timeout: Option<Duration>,
}

impl Default for ScriptOptions {
    fn default() -> Self {
        Self::from(&ExplorerConfig::default())
    }
}

impl From<&ExplorerConfig> for ScriptOptions {
    fn from(config: &ExplorerConfig) -> Self {
        Self {
            python_executable: config.python_executable.clone(),
            timeout: config.script_timeout(),
        }
    }
}

#[derive(Clone)]
pub struct ScriptEngine {
    registry: DatasetRegistry,
    options: ScriptOptions,
}

impl ScriptEngine {
    pub fn new(registry: DatasetRegistry, options: ScriptOptions) -> Self {
        Self { registry, options }
    }

    /// Runs `script` and returns the rendered output text.
    ///
    /// # Errors
    ///
    /// [`ExplorerError::Execution`] if the script raised, exited non-zero,
    /// timed out, or the interpreter could not be started.
    pub async fn run(&self, script: &str) -> Result<String> {
        self.run_captured(script).await.map(|out| out.render())
    }

    /// Runs `script` and returns its raw captured streams.
    ///
    /// # Errors
    ///
    /// See [`Self::run`].
    pub async fn run_captured(&self, script: &str) -> Result<CapturedOutput> {
        let snapshot = self.registry.all();
        let workspace = TempDirGuard::create("data_explorer_run")?;
        let dir = workspace.path().to_path_buf();

        log_event(
            LOG_TAG,
            &format!(
                "Preparing namespace with {} dataset(s), script length: {} chars",
                snapshot.len(),
                script.len()
            ),
        );

        let manifest_path = run_blocking("namespace-export", move || {
            let manifest = namespace::export_snapshot(&snapshot, &dir)?;
            namespace::write_manifest(&manifest, &dir)
        })
        .await?;

        let python = &self.options.python_executable;
        let mut child = Command::new(python)
            .arg("-c")
            .arg(BOOTSTRAP)
            .env("EXPLORER_MANIFEST", &manifest_path)
            .env("PYTHONIOENCODING", "utf-8")
            .env("MPLBACKEND", "Agg")
            .current_dir(workspace.path())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ExplorerError::Execution {
                message: format!("Failed to start {python}: {e}"),
                trace: String::new(),
            })?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| ExplorerError::Other("Failed to open interpreter stdin".to_owned()))?;
        let source = script.to_owned();
        let feeder = tokio::spawn(async move {
            if let Err(e) = stdin.write_all(source.as_bytes()).await {
                tracing::debug!("Interpreter closed stdin early: {e}");
            }
        });

        let waited = match self.options.timeout {
            Some(limit) => match timeout(limit, child.wait_with_output()).await {
                Ok(result) => result,
                Err(_) => {
                    feeder.abort();
                    return Err(ExplorerError::Execution {
                        message: format!(
                            "Script execution timed out after {} seconds",
                            limit.as_secs()
                        ),
                        trace: String::new(),
                    });
                }
            },
            None => child.wait_with_output().await,
        };
        let out = waited?;
        if let Err(e) = feeder.await {
            tracing::debug!("stdin feeder task ended abnormally: {e}");
        }

        log_event(
            LOG_TAG,
            &format!("Interpreter exited with code {:?}", out.status.code()),
        );

        let captured = CapturedOutput::from_bytes(&out.stdout, &out.stderr);
        drop(workspace);

        if out.status.success() {
            Ok(captured)
        } else {
            if !captured.stdout.is_empty() {
                tracing::debug!("Output before fault:\n{}", captured.stdout);
            }
            Err(captured.into_fault(out.status))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_interpreter_is_execution_error() {
        let engine = ScriptEngine::new(
            DatasetRegistry::new(),
            ScriptOptions {
                python_executable: "definitely-not-a-python-binary".to_owned(),
                timeout: None,
            },
        );
        let err = engine.run("print(1)").await.unwrap_err();
        match err {
            ExplorerError::Execution { message, .. } => {
                assert!(message.starts_with("Failed to start"), "got {message}");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_bootstrap_reads_manifest_env() {
        assert!(BOOTSTRAP.contains("EXPLORER_MANIFEST"));
        assert!(BOOTSTRAP.contains("\"<script>\""));
    }
}
