pub mod harness;
mod interpreted;
mod managed;
mod mock;
mod native;
mod process;
mod runner;
mod workspace;

// Re-export the trait and the runners
pub use interpreted::InterpretedRunner;
pub use managed::{ManagedRunner, class_name};
pub use mock::MockRunner;
pub use native::NativeRunner;
pub use runner::LanguageRunner;

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize, Serializer};

use crate::config::JudgeConfig;
use crate::error::ExecutionError;

/// Submission language as named by callers
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(from = "String")]
pub enum LanguageId {
    /// Python, run directly through the generated harness
    Interpreted,
    /// C++, built with g++
    CompiledNative,
    /// Java, built with javac and run on the JVM
    CompiledManaged,
    /// Anything else, handled by [`MockRunner`]
    Unsupported(String),
}

impl LanguageId {
    pub fn name(&self) -> &str {
        match self {
            LanguageId::Interpreted => "python",
            LanguageId::CompiledNative => "cpp",
            LanguageId::CompiledManaged => "java",
            LanguageId::Unsupported(name) => name,
        }
    }
}

impl From<&str> for LanguageId {
    fn from(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "python" | "python3" | "py" | "interpreted" => LanguageId::Interpreted,
            "cpp" | "c++" | "cxx" | "compiled_native" => LanguageId::CompiledNative,
            "java" | "compiled_managed" => LanguageId::CompiledManaged,
            _ => LanguageId::Unsupported(name.to_string()),
        }
    }
}

impl From<String> for LanguageId {
    fn from(name: String) -> Self {
        LanguageId::from(name.as_str())
    }
}

impl fmt::Display for LanguageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for LanguageId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

/// Result of running a submission on one test input
///
/// Exactly one of `output` or `error` is meaningful: a failed run always has
/// an empty `output`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResult {
    pub output: String,
    pub error: Option<ExecutionError>,
}

impl ExecutionResult {
    pub fn success(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            error: None,
        }
    }

    pub fn failure(error: ExecutionError) -> Self {
        Self {
            output: String::new(),
            error: Some(error),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

impl From<Result<String, ExecutionError>> for ExecutionResult {
    fn from(result: Result<String, ExecutionError>) -> Self {
        match result {
            Ok(output) => ExecutionResult::success(output),
            Err(error) => ExecutionResult::failure(error),
        }
    }
}

/// Creates the runner for a language
///
/// Languages without a toolchain get a [`MockRunner`].
pub fn create_runner(language: &LanguageId, config: &JudgeConfig) -> Arc<dyn LanguageRunner> {
    match language {
        LanguageId::Interpreted => Arc::new(InterpretedRunner::new(config)),
        LanguageId::CompiledNative => Arc::new(NativeRunner::new(config)),
        LanguageId::CompiledManaged => Arc::new(ManagedRunner::new(config)),
        LanguageId::Unsupported(_) => {
            log::warn!("No toolchain for language {language}, using mock runner");
            Arc::new(MockRunner::new(language.clone()))
        }
    }
}

/// Where one toolchain binary was found, if anywhere
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolchainStatus {
    pub language: LanguageId,
    pub tool: String,
    pub path: Option<PathBuf>,
}

/// Resolves every configured toolchain once, for startup diagnostics
///
/// Runners resolve their toolchains again on every call; this result is
/// only reported, never cached.
pub fn probe_toolchains(config: &JudgeConfig) -> Vec<ToolchainStatus> {
    let native = NativeRunner::new(config);
    let managed = ManagedRunner::new(config);
    let interpreted = InterpretedRunner::new(config);
    let toolchains = &config.toolchains;

    vec![
        ToolchainStatus {
            language: LanguageId::CompiledNative,
            tool: toolchains.native.compiler.clone(),
            path: native.locate_compiler(),
        },
        ToolchainStatus {
            language: LanguageId::CompiledManaged,
            tool: toolchains.managed.compiler.clone(),
            path: managed.locate_compiler(),
        },
        ToolchainStatus {
            language: LanguageId::CompiledManaged,
            tool: toolchains.managed.launcher.clone(),
            path: managed.locate_launcher(),
        },
        ToolchainStatus {
            language: LanguageId::Interpreted,
            tool: toolchains.interpreted.interpreter.clone(),
            path: interpreted.locate_interpreter(),
        },
    ]
}
