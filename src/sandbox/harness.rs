//! Harness composition for the interpreted runner
//!
//! The submission is expected to define one top-level function. The harness
//! appended to it binds the test input to that function's parameter names,
//! calls it, and prints the JSON encoded result after [`RESULT_SENTINEL`], or
//! the exception message after [`ERROR_SENTINEL`]. Nothing here touches the
//! filesystem or spawns processes.

use thiserror::Error;

use crate::canonical::Binding;
use crate::error::ExecutionError;

pub const RESULT_SENTINEL: &str = "###RESULT###";
pub const ERROR_SENTINEL: &str = "###ERROR###";

const TEMPLATE: &str = r#"
# --- judge harness ---
import json as __judge_json

try:
{{BINDINGS}}
    __judge_args = [{{ARGS}}]
    __judge_result = {{FUNCTION}}(*__judge_args)
    if __judge_result is None and __judge_args and isinstance(__judge_args[0], list):
        __judge_result = __judge_args[0]
    __judge_payload = __judge_json.dumps(__judge_result, separators=(",", ":"))
    print("{{RESULT_SENTINEL}}")
    print(__judge_payload)
except Exception as __judge_exc:
    print("{{ERROR_SENTINEL}}")
    print(str(__judge_exc))
"#;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HarnessError {
    #[error("No function definition found")]
    NoFunction,
    #[error("missing value for parameter `{0}`")]
    MissingParameter(String),
    #[error("expected {expected} values but the input has {found}")]
    ArgumentCount { expected: usize, found: usize },
    #[error("cannot mix named and unnamed values in the input")]
    MixedBindings,
}

impl From<HarnessError> for ExecutionError {
    fn from(err: HarnessError) -> Self {
        ExecutionError::Parse(err.to_string())
    }
}

/// Name and parameter names of the submitted function
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryPoint {
    pub name: String,
    pub params: Vec<String>,
}

/// Finds the first top-level `def` in Python source without running it
///
/// Comments and string literals are blanked out first, so a `def` inside a
/// docstring or after `#` is never picked up.
pub fn find_entry_point(source: &str) -> Option<EntryPoint> {
    let clean = blank_comments_and_strings(source);
    let mut depth = 0usize;
    let mut continued = false;
    let mut offset = 0;

    for line in clean.split_inclusive('\n') {
        let starts_statement = depth == 0 && !continued;
        if starts_statement {
            if let Some(rest) = line.strip_prefix("def") {
                if rest.starts_with(char::is_whitespace) {
                    if let Some(entry) = parse_signature(&clean[offset + 3..]) {
                        return Some(entry);
                    }
                }
            }
        }

        for c in line.chars() {
            match c {
                '(' | '[' | '{' => depth += 1,
                ')' | ']' | '}' => depth = depth.saturating_sub(1),
                _ => {}
            }
        }
        continued = line.trim_end().ends_with('\\');
        offset += line.len();
    }

    None
}

/// Parses `name(params)` following a `def` keyword
fn parse_signature(text: &str) -> Option<EntryPoint> {
    let text = text.trim_start();
    let name_len = text
        .find(|c: char| !(c.is_alphanumeric() || c == '_'))
        .unwrap_or(text.len());
    let name = &text[..name_len];
    if name.is_empty() || name.starts_with(|c: char| c.is_ascii_digit()) {
        return None;
    }

    let rest = text[name_len..].trim_start().strip_prefix('(')?;
    let mut depth = 0usize;
    let mut params = Vec::new();
    let mut current = String::new();
    for c in rest.chars() {
        match c {
            '(' | '[' | '{' => depth += 1,
            ')' if depth == 0 => {
                params.extend(param_name(&current));
                return Some(EntryPoint {
                    name: name.to_string(),
                    params,
                });
            }
            ')' | ']' | '}' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                params.extend(param_name(&current));
                current.clear();
                continue;
            }
            _ => {}
        }
        current.push(c);
    }
    None
}

/// Bindable name of one parameter, dropping annotation and default
fn param_name(param: &str) -> Option<String> {
    let param = param.trim();
    if param.is_empty() || param.starts_with('*') || param == "/" {
        return None;
    }
    let end = param.find([':', '=']).unwrap_or(param.len());
    Some(param[..end].trim().to_string())
}

/// Replaces comment and string literal contents with spaces, keeping newlines
fn blank_comments_and_strings(source: &str) -> String {
    let chars: Vec<char> = source.chars().collect();
    let mut out = String::with_capacity(source.len());
    let mut idx = 0;

    while idx < chars.len() {
        let c = chars[idx];
        match c {
            '#' => {
                while idx < chars.len() && chars[idx] != '\n' {
                    out.push(' ');
                    idx += 1;
                }
            }
            '\'' | '"' => {
                let triple = chars.get(idx + 1) == Some(&c) && chars.get(idx + 2) == Some(&c);
                let quote_len = if triple { 3 } else { 1 };
                out.extend(std::iter::repeat_n(c, quote_len));
                idx += quote_len;

                while idx < chars.len() {
                    let ch = chars[idx];
                    if ch == '\\' {
                        out.push(' ');
                        idx += 1;
                        if idx < chars.len() {
                            out.push(if chars[idx] == '\n' { '\n' } else { ' ' });
                            idx += 1;
                        }
                        continue;
                    }
                    if !triple && ch == '\n' {
                        // unterminated single-line string ends at the newline
                        break;
                    }
                    let closes = ch == c
                        && (!triple
                            || (chars.get(idx + 1) == Some(&c) && chars.get(idx + 2) == Some(&c)));
                    if closes {
                        out.extend(std::iter::repeat_n(c, quote_len));
                        idx += quote_len;
                        break;
                    }
                    out.push(if ch == '\n' { '\n' } else { ' ' });
                    idx += 1;
                }
            }
            _ => {
                out.push(c);
                idx += 1;
            }
        }
    }

    out
}

/// Matches the input's bindings to the function's parameters
///
/// Named values bind by name. When no value is named they bind positionally.
pub fn bind_arguments(
    entry: &EntryPoint,
    bindings: &[Binding],
) -> Result<Vec<Binding>, HarnessError> {
    let named = bindings.iter().filter(|b| b.name.is_some()).count();

    if named == 0 && !bindings.is_empty() {
        if bindings.len() != entry.params.len() {
            return Err(HarnessError::ArgumentCount {
                expected: entry.params.len(),
                found: bindings.len(),
            });
        }
        return Ok(entry
            .params
            .iter()
            .zip(bindings)
            .map(|(param, binding)| Binding {
                name: Some(param.clone()),
                value: binding.value.clone(),
            })
            .collect());
    }
    if named != bindings.len() {
        return Err(HarnessError::MixedBindings);
    }

    for param in &entry.params {
        if !bindings.iter().any(|b| b.name.as_deref() == Some(param.as_str())) {
            return Err(HarnessError::MissingParameter(param.clone()));
        }
    }
    Ok(bindings.to_vec())
}

/// Appends the harness to the submission, ready to be run as one script
pub fn compose_harness(
    code: &str,
    entry: &EntryPoint,
    bindings: &[Binding],
) -> Result<String, HarnessError> {
    let bound = bind_arguments(entry, bindings)?;
    let statements: Vec<String> = bound
        .iter()
        .map(|binding| indent(&binding.to_string(), "    "))
        .collect();

    // Bindings last: submitted values may contain placeholder text
    let harness = TEMPLATE
        .replace("{{ARGS}}", &entry.params.join(", "))
        .replace("{{FUNCTION}}", &entry.name)
        .replace("{{RESULT_SENTINEL}}", RESULT_SENTINEL)
        .replace("{{ERROR_SENTINEL}}", ERROR_SENTINEL)
        .replace("{{BINDINGS}}", &statements.join("\n"));

    Ok(format!("{code}\n{harness}"))
}

fn indent(text: &str, prefix: &str) -> String {
    text.lines()
        .map(|line| format!("{prefix}{line}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// What the harness printed, recovered from the script's stdout
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HarnessOutput {
    Result(String),
    Error(String),
    Missing,
}

/// Splits stdout on the last sentinel printed
///
/// Text the submission printed before the harness ran is ignored.
pub fn split_output(stdout: &str) -> HarnessOutput {
    let result = stdout.rfind(RESULT_SENTINEL);
    let error = stdout.rfind(ERROR_SENTINEL);

    let result_after = |r: usize| stdout[r + RESULT_SENTINEL.len()..].trim().to_string();
    let error_after = |e: usize| stdout[e + ERROR_SENTINEL.len()..].trim().to_string();

    match (result, error) {
        (Some(r), Some(e)) if r > e => HarnessOutput::Result(result_after(r)),
        (Some(r), None) => HarnessOutput::Result(result_after(r)),
        (_, Some(e)) => HarnessOutput::Error(error_after(e)),
        (None, None) => HarnessOutput::Missing,
    }
}
