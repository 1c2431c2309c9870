use thiserror::Error;

/// Classified failure of a single execution
///
/// The `Display` form is what callers see as diagnostic text; every variant
/// starts with its category so it can be matched by prefix.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExecutionError {
    #[error("{tool} not found. Please install {install_hint}.")]
    ToolchainNotFound { tool: String, install_hint: String },
    #[error("Compilation Error:\n{0}")]
    Compilation(String),
    #[error("Runtime Error:\n{0}")]
    Runtime(String),
    #[error("Time Limit Exceeded")]
    TimeLimitExceeded,
    #[error("Parse Error: {0}")]
    Parse(String),
    #[error("Execution Error: {0}")]
    System(String),
    /// Pass-through runner refusing the code; shown without a prefix
    #[error("{0}")]
    Rejected(String),
}

impl ExecutionError {
    pub fn toolchain_not_found(tool: impl Into<String>, install_hint: impl Into<String>) -> Self {
        Self::ToolchainNotFound {
            tool: tool.into(),
            install_hint: install_hint.into(),
        }
    }

    /// Short category name, stable across message changes
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ToolchainNotFound { .. } => "Toolchain Not Found",
            Self::Compilation(_) => "Compilation Error",
            Self::Runtime(_) => "Runtime Error",
            Self::TimeLimitExceeded => "Time Limit Exceeded",
            Self::Parse(_) => "Parse Error",
            Self::System(_) => "System Error",
            Self::Rejected(_) => "Rejected",
        }
    }
}

impl From<std::io::Error> for ExecutionError {
    fn from(err: std::io::Error) -> Self {
        ExecutionError::System(err.to_string())
    }
}

impl From<crate::canonical::CanonicalError> for ExecutionError {
    fn from(err: crate::canonical::CanonicalError) -> Self {
        ExecutionError::Parse(err.to_string())
    }
}
