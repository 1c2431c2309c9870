use async_trait::async_trait;

use super::{ExecutionResult, LanguageId};

/// Trait for the per-language execution backends
///
/// A runner takes one submission and one raw test input, and produces either
/// the program's trimmed output or a classified error. Failures are returned
/// as data, never raised, so the caller can treat every outcome uniformly.
#[async_trait]
pub trait LanguageRunner: Send + Sync {
    /// Language this runner executes
    fn language(&self) -> LanguageId;

    /// Builds (if needed) and runs `code` against one test input
    ///
    /// Every call works in a fresh workspace that is gone when this returns.
    async fn execute(&self, code: &str, input: &str) -> ExecutionResult;
}
