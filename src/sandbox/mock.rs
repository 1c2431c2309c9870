use async_trait::async_trait;

use crate::error::ExecutionError;

use super::{ExecutionResult, LanguageId, LanguageRunner};

/// Stand-in for languages without a toolchain
///
/// Code containing `error` fails, anything else echoes the trimmed input.
/// This exists so unconnected languages can be demoed; it judges nothing.
pub struct MockRunner {
    language: LanguageId,
}

impl MockRunner {
    pub fn new(language: LanguageId) -> Self {
        Self { language }
    }
}

#[async_trait]
impl LanguageRunner for MockRunner {
    fn language(&self) -> LanguageId {
        self.language.clone()
    }

    async fn execute(&self, code: &str, input: &str) -> ExecutionResult {
        if code.contains("error") {
            return ExecutionResult::failure(ExecutionError::Rejected("Syntax Error".to_string()));
        }
        ExecutionResult::success(input.trim())
    }
}
