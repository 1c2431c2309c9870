use std::ffi::OsString;
use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;

use crate::canonical;
use crate::config::{JudgeConfig, NativeToolchain};
use crate::error::ExecutionError;

use super::process::{compile_step, run_step};
use super::workspace::{Workspace, locate_executable, prepend_to_path};
use super::{ExecutionResult, LanguageId, LanguageRunner};

const SOURCE_NAME: &str = "solution.cpp";

fn compiler_not_found() -> ExecutionError {
    ExecutionError::toolchain_not_found("g++ compiler", "MinGW or G++")
}

/// Runner for C++ submissions reading their input from stdin
///
/// The compiler is looked up on the search path first, then at the portable
/// installation configured as fallback.
pub struct NativeRunner {
    toolchain: NativeToolchain,
    search_path: Option<OsString>,
    workspace_root: PathBuf,
    compile_timeout: Duration,
    run_timeout: Duration,
}

impl NativeRunner {
    pub fn new(config: &JudgeConfig) -> Self {
        Self {
            toolchain: config.toolchains.native.clone(),
            search_path: config.search_path(),
            workspace_root: config.workspace_root(),
            compile_timeout: config.compile_timeout.into(),
            run_timeout: config.run_timeout.into(),
        }
    }

    pub fn locate_compiler(&self) -> Option<PathBuf> {
        locate_executable(&self.toolchain.compiler, self.search_path.as_deref()).or_else(|| {
            self.toolchain
                .fallback_path()
                .filter(|path| path.is_file())
        })
    }

    async fn try_execute(&self, code: &str, input: &str) -> Result<String, ExecutionError> {
        let compiler = self.locate_compiler().ok_or_else(compiler_not_found)?;
        log::debug!("Using C++ compiler at {}", compiler.display());
        let stdin = canonical::to_stdin_tokens(input)?;

        let workspace = Workspace::create(&self.workspace_root)?;
        let source = workspace.write_source(SOURCE_NAME, code)?;
        let binary_name = if cfg!(windows) { "solution.exe" } else { "solution" };
        let executable = workspace.path().join(binary_name);

        let mut compile = Command::new(&compiler);
        compile
            .arg(&source)
            .arg("-o")
            .arg(&executable)
            .current_dir(workspace.path());
        // A portable toolchain needs its own directory on PATH to find `as` and `ld`
        if let Some(path) = compiler
            .parent()
            .and_then(|dir| prepend_to_path(dir, self.search_path.as_deref()))
        {
            compile.env("PATH", path);
        }
        compile_step(&mut compile, self.compile_timeout, compiler_not_found).await?;

        let mut run = Command::new(&executable);
        run.current_dir(workspace.path());
        run_step(&mut run, &stdin, self.run_timeout, || {
            ExecutionError::System("compiled program is missing".to_string())
        })
        .await
    }
}

#[async_trait]
impl LanguageRunner for NativeRunner {
    fn language(&self) -> LanguageId {
        LanguageId::CompiledNative
    }

    async fn execute(&self, code: &str, input: &str) -> ExecutionResult {
        let result = self.try_execute(code, input).await;
        if let Err(e) = &result {
            log::debug!("C++ execution failed: {}", e.kind());
        }
        result.into()
    }
}
