use std::ffi::OsString;
use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;

use crate::canonical;
use crate::config::{InterpretedToolchain, JudgeConfig};
use crate::error::ExecutionError;

use super::harness::{self, HarnessError, HarnessOutput};
use super::process::{ProcessOutcome, run_with_timeout};
use super::workspace::{Workspace, locate_executable};
use super::{ExecutionResult, LanguageId, LanguageRunner};

const SCRIPT_NAME: &str = "solution.py";

fn interpreter_not_found() -> ExecutionError {
    ExecutionError::toolchain_not_found("Python interpreter", "Python 3")
}

/// Runner for Python submissions defining a single function
///
/// There is no build step: the source is scanned for its function, a harness
/// calling it with the test input is appended, and the result is read back
/// from the script's stdout.
pub struct InterpretedRunner {
    toolchain: InterpretedToolchain,
    search_path: Option<OsString>,
    workspace_root: PathBuf,
    run_timeout: Duration,
}

impl InterpretedRunner {
    pub fn new(config: &JudgeConfig) -> Self {
        Self {
            toolchain: config.toolchains.interpreted.clone(),
            search_path: config.search_path(),
            workspace_root: config.workspace_root(),
            run_timeout: config.run_timeout.into(),
        }
    }

    pub fn locate_interpreter(&self) -> Option<PathBuf> {
        locate_executable(&self.toolchain.interpreter, self.search_path.as_deref())
    }

    async fn try_execute(&self, code: &str, input: &str) -> Result<String, ExecutionError> {
        let interpreter = self.locate_interpreter().ok_or_else(interpreter_not_found)?;

        let entry = harness::find_entry_point(code).ok_or(HarnessError::NoFunction)?;
        let bindings = canonical::to_bindings(input)?;
        let script = harness::compose_harness(code, &entry, &bindings)?;
        log::debug!(
            "Calling {}({}) from harness",
            entry.name,
            entry.params.join(", ")
        );

        let workspace = Workspace::create(&self.workspace_root)?;
        let script_path = workspace.write_source(SCRIPT_NAME, &script)?;

        let mut cmd = Command::new(&interpreter);
        cmd.arg(&script_path).current_dir(workspace.path());
        let outcome = run_with_timeout(&mut cmd, None, self.run_timeout)
            .await
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => interpreter_not_found(),
                _ => ExecutionError::System(format!("failed to start interpreter: {e}")),
            })?;

        let output = match outcome {
            ProcessOutcome::TimedOut => return Err(ExecutionError::TimeLimitExceeded),
            ProcessOutcome::Finished(output) => output,
        };

        match harness::split_output(&output.stdout) {
            HarnessOutput::Result(payload) => Ok(payload),
            HarnessOutput::Error(message) => Err(ExecutionError::Runtime(message)),
            HarnessOutput::Missing if !output.stderr.trim().is_empty() => {
                Err(ExecutionError::Runtime(output.stderr))
            }
            HarnessOutput::Missing => Err(ExecutionError::System(
                "No output returned".to_string(),
            )),
        }
    }
}

#[async_trait]
impl LanguageRunner for InterpretedRunner {
    fn language(&self) -> LanguageId {
        LanguageId::Interpreted
    }

    async fn execute(&self, code: &str, input: &str) -> ExecutionResult {
        let result = self.try_execute(code, input).await;
        if let Err(e) = &result {
            log::debug!("Python execution failed: {}", e.kind());
        }
        result.into()
    }
}
