use std::io;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, Command};
use tokio::time::timeout;

use crate::error::ExecutionError;

/// Cap on captured stdout and stderr, each
const MAX_OUTPUT_BYTES: u64 = 10 * 1024 * 1024;

#[derive(Debug)]
pub struct ProcessOutput {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

#[derive(Debug)]
pub enum ProcessOutcome {
    Finished(ProcessOutput),
    TimedOut,
}

/// Runs `cmd` to completion or until `limit` elapses
///
/// The child gets its own process group. On timeout the whole group is
/// killed and the child is reaped before returning.
pub async fn run_with_timeout(
    cmd: &mut Command,
    stdin_data: Option<&str>,
    limit: Duration,
) -> io::Result<ProcessOutcome> {
    cmd.stdin(if stdin_data.is_some() {
        Stdio::piped()
    } else {
        Stdio::null()
    })
    .stdout(Stdio::piped())
    .stderr(Stdio::piped())
    .kill_on_drop(true);
    #[cfg(unix)]
    cmd.process_group(0);

    let mut child = cmd.spawn()?;

    let stdin = child.stdin.take();
    let stdout = child.stdout.take();
    let stderr = child.stderr.take();
    let input = stdin_data.unwrap_or_default().as_bytes().to_vec();

    let feed = async move {
        if let Some(mut pipe) = stdin {
            // A program that never reads its input closes the pipe early
            if let Err(e) = pipe.write_all(&input).await {
                if e.kind() != io::ErrorKind::BrokenPipe {
                    return Err(e);
                }
            }
        }
        Ok(())
    };

    let execution = async {
        let (fed, stdout, stderr) = tokio::join!(feed, read_stream(stdout), read_stream(stderr));
        fed?;
        let status = child.wait().await?;
        Ok::<_, io::Error>(ProcessOutput {
            status,
            stdout: String::from_utf8_lossy(&stdout).into_owned(),
            stderr: String::from_utf8_lossy(&stderr).into_owned(),
        })
    };

    match timeout(limit, execution).await {
        Ok(output) => output.map(ProcessOutcome::Finished),
        Err(_) => {
            terminate(&mut child).await;
            Ok(ProcessOutcome::TimedOut)
        }
    }
}

async fn read_stream<R: AsyncRead + Unpin>(handle: Option<R>) -> Vec<u8> {
    let mut buf = Vec::new();
    if let Some(h) = handle {
        let _ = h.take(MAX_OUTPUT_BYTES).read_to_end(&mut buf).await;
    }
    buf
}

/// Kills the child's process group and reaps the child
async fn terminate(child: &mut Child) {
    #[cfg(unix)]
    {
        if let Some(pid) = child.id() {
            // SAFETY: plain syscall on a process group we created at spawn time
            unsafe {
                libc::killpg(pid as libc::pid_t, libc::SIGKILL);
            }
        }
    }
    if let Err(e) = child.kill().await {
        log::debug!("Failed to kill timed out process: {e}");
    }
}

fn spawn_error(err: io::Error, missing: impl FnOnce() -> ExecutionError) -> ExecutionError {
    if err.kind() == io::ErrorKind::NotFound {
        missing()
    } else {
        ExecutionError::System(format!("failed to start process: {err}"))
    }
}

/// Runs a build step; any non-zero exit is a compilation error
pub async fn compile_step(
    cmd: &mut Command,
    limit: Duration,
    missing: impl FnOnce() -> ExecutionError,
) -> Result<(), ExecutionError> {
    let outcome = run_with_timeout(cmd, None, limit)
        .await
        .map_err(|e| spawn_error(e, missing))?;

    match outcome {
        ProcessOutcome::TimedOut => Err(ExecutionError::Compilation(format!(
            "Compilation timed out after {}s",
            limit.as_secs_f64()
        ))),
        ProcessOutcome::Finished(output) if !output.status.success() => {
            let diagnostic = if output.stderr.trim().is_empty() {
                output.stdout
            } else {
                output.stderr
            };
            Err(ExecutionError::Compilation(diagnostic))
        }
        ProcessOutcome::Finished(_) => Ok(()),
    }
}

/// Runs a built program on `stdin`, returning its trimmed stdout
pub async fn run_step(
    cmd: &mut Command,
    stdin: &str,
    limit: Duration,
    missing: impl FnOnce() -> ExecutionError,
) -> Result<String, ExecutionError> {
    let outcome = run_with_timeout(cmd, Some(stdin), limit)
        .await
        .map_err(|e| spawn_error(e, missing))?;

    match outcome {
        ProcessOutcome::TimedOut => Err(ExecutionError::TimeLimitExceeded),
        ProcessOutcome::Finished(output) if !output.status.success() => {
            let diagnostic = if output.stderr.trim().is_empty() {
                format!("Process exited with {}", output.status)
            } else {
                output.stderr
            };
            Err(ExecutionError::Runtime(diagnostic))
        }
        ProcessOutcome::Finished(output) => Ok(output.stdout.trim().to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    fn sh(script: &str) -> Command {
        let mut cmd = Command::new("/bin/sh");
        cmd.arg("-c").arg(script);
        cmd
    }

    #[tokio::test]
    async fn test_stdin_is_fed_and_stdout_trimmed() {
        let output = run_step(
            &mut sh("read a b; echo \"  $((a + b))  \""),
            "2 3",
            Duration::from_secs(5),
            || ExecutionError::System("no shell".into()),
        )
        .await;
        assert_eq!(output, Ok("5".to_string()));
    }

    #[tokio::test]
    async fn test_non_zero_exit_is_runtime_error() {
        let output = run_step(
            &mut sh("echo oops >&2; exit 3"),
            "",
            Duration::from_secs(5),
            || ExecutionError::System("no shell".into()),
        )
        .await;
        assert_eq!(output, Err(ExecutionError::Runtime("oops\n".to_string())));
    }

    #[tokio::test]
    async fn test_timeout_kills_process_group() {
        let start = Instant::now();
        let outcome = run_with_timeout(
            &mut sh("sleep 30 & sleep 30; wait"),
            None,
            Duration::from_millis(300),
        )
        .await
        .unwrap();
        assert!(matches!(outcome, ProcessOutcome::TimedOut));
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_unread_stdin_is_not_an_error() {
        let big_input = "1 ".repeat(1 << 20);
        let output = run_step(
            &mut sh("echo done"),
            &big_input,
            Duration::from_secs(5),
            || ExecutionError::System("no shell".into()),
        )
        .await;
        assert_eq!(output, Ok("done".to_string()));
    }

    #[tokio::test]
    async fn test_missing_program_uses_missing_error() {
        let mut cmd = Command::new("/definitely/not/a/compiler");
        let result = compile_step(&mut cmd, Duration::from_secs(1), || {
            ExecutionError::toolchain_not_found("fake compiler", "nothing")
        })
        .await;
        assert_eq!(
            result,
            Err(ExecutionError::toolchain_not_found("fake compiler", "nothing"))
        );
    }

    #[tokio::test]
    async fn test_compile_failure_reports_stderr() {
        let result = compile_step(
            &mut sh("echo 'main.cpp:1: error: expected' >&2; exit 1"),
            Duration::from_secs(5),
            || ExecutionError::System("no shell".into()),
        )
        .await;
        assert_eq!(
            result,
            Err(ExecutionError::Compilation(
                "main.cpp:1: error: expected\n".to_string()
            ))
        );
    }
}
