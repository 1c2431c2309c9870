use std::ffi::OsString;
use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;

use crate::canonical;
use crate::config::{JudgeConfig, ManagedToolchain};
use crate::error::ExecutionError;

use super::process::{compile_step, run_step};
use super::workspace::{Workspace, locate_executable};
use super::{ExecutionResult, LanguageId, LanguageRunner};

const DEFAULT_CLASS: &str = "Solution";
const MAIN_CLASS: &str = "Main";

fn compiler_not_found() -> ExecutionError {
    ExecutionError::toolchain_not_found("Java compiler (javac)", "JDK")
}

fn launcher_not_found() -> ExecutionError {
    ExecutionError::toolchain_not_found("Java runtime (java)", "JDK")
}

/// A type declared at the top level of a Java compilation unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopLevelType {
    pub name: String,
    pub is_public: bool,
}

/// Lists top-level `class`/`interface`/`enum`/`record` declarations
///
/// Comments, string and char literals are skipped, and only declarations at
/// brace depth zero count, so nested or commented-out types are ignored.
pub fn top_level_types(source: &str) -> Vec<TopLevelType> {
    let chars: Vec<char> = source.chars().collect();
    let mut types = Vec::new();
    let mut modifiers: Vec<String> = Vec::new();
    let mut expect_name = false;
    let mut depth = 0usize;
    let mut idx = 0;

    while idx < chars.len() {
        let c = chars[idx];
        match c {
            '/' if chars.get(idx + 1) == Some(&'/') => {
                while idx < chars.len() && chars[idx] != '\n' {
                    idx += 1;
                }
            }
            '/' if chars.get(idx + 1) == Some(&'*') => {
                idx += 2;
                while idx < chars.len()
                    && !(chars[idx] == '*' && chars.get(idx + 1) == Some(&'/'))
                {
                    idx += 1;
                }
                idx += 2;
            }
            '"' | '\'' => {
                idx += 1;
                while idx < chars.len() && chars[idx] != c {
                    if chars[idx] == '\\' {
                        idx += 1;
                    }
                    idx += 1;
                }
                idx += 1;
            }
            '{' => {
                depth += 1;
                modifiers.clear();
                expect_name = false;
                idx += 1;
            }
            '}' => {
                depth = depth.saturating_sub(1);
                modifiers.clear();
                idx += 1;
            }
            ';' => {
                modifiers.clear();
                idx += 1;
            }
            c if c.is_alphabetic() || c == '_' || c == '$' => {
                let start = idx;
                while idx < chars.len()
                    && (chars[idx].is_alphanumeric() || chars[idx] == '_' || chars[idx] == '$')
                {
                    idx += 1;
                }
                let word: String = chars[start..idx].iter().collect();
                if depth != 0 {
                    continue;
                }
                if expect_name {
                    types.push(TopLevelType {
                        name: word,
                        is_public: modifiers.iter().any(|m| m == "public"),
                    });
                    expect_name = false;
                } else if matches!(word.as_str(), "class" | "interface" | "enum" | "record") {
                    expect_name = true;
                } else {
                    modifiers.push(word);
                }
            }
            _ => idx += 1,
        }
    }

    types
}

/// Name the source file and compiled class must share
///
/// `Main` when the submission declares a top-level `Main` that is public, or
/// when it declares no public type at all; otherwise `Solution`.
pub fn class_name(source: &str) -> &'static str {
    let types = top_level_types(source);
    let has_public = types.iter().any(|t| t.is_public);
    let main_declared = types
        .iter()
        .any(|t| t.name == MAIN_CLASS && (t.is_public || !has_public));
    if main_declared {
        MAIN_CLASS
    } else {
        DEFAULT_CLASS
    }
}

/// Runner for Java submissions reading their input from stdin
pub struct ManagedRunner {
    toolchain: ManagedToolchain,
    search_path: Option<OsString>,
    workspace_root: PathBuf,
    compile_timeout: Duration,
    run_timeout: Duration,
}

impl ManagedRunner {
    pub fn new(config: &JudgeConfig) -> Self {
        Self {
            toolchain: config.toolchains.managed.clone(),
            search_path: config.search_path(),
            workspace_root: config.workspace_root(),
            compile_timeout: config.compile_timeout.into(),
            run_timeout: config.run_timeout.into(),
        }
    }

    pub fn locate_compiler(&self) -> Option<PathBuf> {
        locate_executable(&self.toolchain.compiler, self.search_path.as_deref())
    }

    pub fn locate_launcher(&self) -> Option<PathBuf> {
        locate_executable(&self.toolchain.launcher, self.search_path.as_deref())
    }

    async fn try_execute(&self, code: &str, input: &str) -> Result<String, ExecutionError> {
        let compiler = self.locate_compiler().ok_or_else(compiler_not_found)?;
        let launcher = self.locate_launcher().ok_or_else(launcher_not_found)?;
        let stdin = canonical::to_stdin_tokens(input)?;

        let class = class_name(code);
        log::debug!("Compiling Java submission as class {class}");

        let workspace = Workspace::create(&self.workspace_root)?;
        let source = workspace.write_source(&format!("{class}.java"), code)?;

        let mut compile = Command::new(&compiler);
        compile
            .args(["-encoding", "UTF-8"])
            .arg(&source)
            .current_dir(workspace.path());
        compile_step(&mut compile, self.compile_timeout, compiler_not_found).await?;

        let mut run = Command::new(&launcher);
        run.arg("-cp")
            .arg(workspace.path())
            .arg(class)
            .current_dir(workspace.path());
        run_step(&mut run, &stdin, self.run_timeout, launcher_not_found).await
    }
}

#[async_trait]
impl LanguageRunner for ManagedRunner {
    fn language(&self) -> LanguageId {
        LanguageId::CompiledManaged
    }

    async fn execute(&self, code: &str, input: &str) -> ExecutionResult {
        let result = self.try_execute(code, input).await;
        if let Err(e) = &result {
            log::debug!("Java execution failed: {}", e.kind());
        }
        result.into()
    }
}
