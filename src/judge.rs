use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;

use crate::compare::outputs_match;
use crate::config::JudgeConfig;
use crate::error::ExecutionError;
use crate::sandbox::{ExecutionResult, LanguageId, LanguageRunner, create_runner};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct TestCase {
    /// Human-readable input, e.g. `nums = [2,7,11,15], target = 9`
    pub input: String,
    #[serde(alias = "output")]
    pub expected_output: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

impl TestCase {
    pub fn new(input: impl Into<String>, expected_output: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            expected_output: expected_output.into(),
            explanation: None,
        }
    }
}

/// The two test sets a problem owns
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct ProblemTestSets {
    #[serde(default, alias = "hidden_test_cases")]
    pub hidden: Vec<TestCase>,
    #[serde(default, alias = "sample_test_cases")]
    pub samples: Vec<TestCase>,
}

impl ProblemTestSets {
    /// Hidden cases when there are any, the samples otherwise; never a mix
    pub fn select(&self) -> &[TestCase] {
        if self.hidden.is_empty() {
            &self.samples
        } else {
            &self.hidden
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct Submission {
    pub code: String,
    pub language: LanguageId,
    pub test_cases: Vec<TestCase>,
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerdictStatus {
    Accepted,
    #[serde(rename = "Wrong Answer")]
    WrongAnswer,
}

/// What went wrong on the first failing test case
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct FailureDetail {
    pub actual_output: String,
    pub expected_output: String,
    pub message: String,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub status: VerdictStatus,
    #[serde(flatten)]
    pub failure: Option<FailureDetail>,
}

impl Verdict {
    pub fn accepted() -> Self {
        Self {
            status: VerdictStatus::Accepted,
            failure: None,
        }
    }

    pub fn wrong_answer(
        actual_output: impl Into<String>,
        expected_output: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            status: VerdictStatus::WrongAnswer,
            failure: Some(FailureDetail {
                actual_output: actual_output.into(),
                expected_output: expected_output.into(),
                message: message.into(),
            }),
        }
    }

    pub fn is_accepted(&self) -> bool {
        self.status == VerdictStatus::Accepted
    }
}

/// Judges submissions against ordered test cases, stopping at the first failure
///
/// Holds no state between calls, so one `Judge` can serve many concurrent
/// submissions.
pub struct Judge {
    config: JudgeConfig,
    runners: HashMap<LanguageId, Arc<dyn LanguageRunner>>,
}

impl Judge {
    pub fn new(config: JudgeConfig) -> Self {
        let runners = [
            LanguageId::Interpreted,
            LanguageId::CompiledNative,
            LanguageId::CompiledManaged,
        ]
        .into_iter()
        .map(|language| {
            let runner = create_runner(&language, &config);
            (language, runner)
        })
        .collect();

        Self { config, runners }
    }

    /// Replaces the runner used for the runner's language
    pub fn with_runner(mut self, runner: Arc<dyn LanguageRunner>) -> Self {
        self.runners.insert(runner.language(), runner);
        self
    }

    fn runner_for(&self, language: &LanguageId) -> Arc<dyn LanguageRunner> {
        self.runners
            .get(language)
            .cloned()
            .unwrap_or_else(|| create_runner(language, &self.config))
    }

    pub async fn judge(
        &self,
        code: &str,
        language: &LanguageId,
        test_cases: &[TestCase],
    ) -> Verdict {
        let runner = self.runner_for(language);
        let code: Arc<str> = Arc::from(code);

        for (idx, case) in test_cases.iter().enumerate() {
            log::debug!(
                "Running {language} test case {}/{}",
                idx + 1,
                test_cases.len()
            );
            let expected_output = case.expected_output.trim();
            let result = execute_isolated(runner.clone(), code.clone(), case.input.clone()).await;

            if let Some(error) = result.error {
                log::info!(
                    "{language} submission failed test case {} with {}",
                    idx + 1,
                    error.kind()
                );
                return Verdict::wrong_answer(
                    error.to_string(),
                    expected_output,
                    format!("Error at input: {}", case.input),
                );
            }

            if !outputs_match(&result.output, expected_output) {
                log::info!("{language} submission gave a wrong answer on test case {}", idx + 1);
                return Verdict::wrong_answer(
                    result.output,
                    expected_output,
                    format!("Failed at input: {}", case.input),
                );
            }
        }

        log::info!(
            "{language} submission accepted on {} test cases",
            test_cases.len()
        );
        Verdict::accepted()
    }

    pub async fn judge_submission(&self, submission: &Submission) -> Verdict {
        self.judge(&submission.code, &submission.language, &submission.test_cases)
            .await
    }

    /// Judges against a problem's hidden cases, or its samples when it has none
    pub async fn judge_problem(
        &self,
        code: &str,
        language: &LanguageId,
        tests: &ProblemTestSets,
    ) -> Verdict {
        self.judge(code, language, tests.select()).await
    }
}

/// Aborts the execution task if the judging future is dropped first
struct AbortOnDrop(JoinHandle<ExecutionResult>);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Runs one execution on its own task so a panicking runner cannot take the judge down
async fn execute_isolated(
    runner: Arc<dyn LanguageRunner>,
    code: Arc<str>,
    input: String,
) -> ExecutionResult {
    let mut task = AbortOnDrop(tokio::spawn(async move {
        runner.execute(&code, &input).await
    }));

    match (&mut task.0).await {
        Ok(result) => result,
        Err(e) => {
            log::error!("Execution task failed: {e}");
            ExecutionResult::failure(ExecutionError::System(format!(
                "execution task failed: {e}"
            )))
        }
    }
}
