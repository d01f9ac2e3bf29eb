//! Subprocess execution: spawns the external tool in captured or inherited
//! mode and enforces the non-zero-exit contract.
//!
//! `CommandRunner` is the process-execution seam: `ProcessRunner` drives real
//! subprocesses through `tokio::process::Command` (argument vectors, never a
//! shell). `CommandInvoker` sits on top of any runner, logs every invocation,
//! and turns non-zero exits into `StudioError::CommandFailed`.

use std::collections::HashMap;
use std::future::Future;
use std::process::Stdio;
use std::time::Instant;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;

use crate::error::StudioError;

/// How the subprocess's stdio is wired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// stdout/stderr are buffered (each up to `limit` bytes) and returned.
    Captured { limit: usize },
    /// stdin/stdout/stderr are connected to this process's console.
    Inherited,
}

/// Outcome of one subprocess run. Inherited runs carry only the exit code.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandResult {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

impl CommandResult {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Process-execution capability.
///
/// Implementations return `Ok` for any process that ran to completion,
/// whatever its exit code. `Err` is reserved for launch and I/O failures:
/// `ToolNotFound` when the program is missing or not executable.
pub trait CommandRunner: Send + Sync {
    fn execute(
        &self,
        program: &str,
        args: &[String],
        mode: OutputMode,
    ) -> impl Future<Output = crate::Result<CommandResult>> + Send;
}

/// Runs real subprocesses via `tokio::process::Command`.
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner {
    /// Resolved env vars injected into every subprocess.
    env: HashMap<String, String>,
}

impl ProcessRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_env(env: HashMap<String, String>) -> Self {
        Self { env }
    }
}

impl CommandRunner for ProcessRunner {
    async fn execute(
        &self,
        program: &str,
        args: &[String],
        mode: OutputMode,
    ) -> crate::Result<CommandResult> {
        let mut cmd = Command::new(program);
        cmd.args(args);
        for (k, v) in &self.env {
            cmd.env(k, v);
        }

        match mode {
            OutputMode::Inherited => {
                cmd.stdin(Stdio::inherit())
                    .stdout(Stdio::inherit())
                    .stderr(Stdio::inherit());
                let status = cmd.status().await.map_err(|e| launch_error(program, e))?;
                Ok(CommandResult {
                    exit_code: status.code().unwrap_or(-1),
                    ..Default::default()
                })
            }
            OutputMode::Captured { limit } => {
                cmd.stdin(Stdio::null())
                    .stdout(Stdio::piped())
                    .stderr(Stdio::piped());
                let mut child = cmd.spawn().map_err(|e| launch_error(program, e))?;

                let stdout_pipe = child.stdout.take();
                let stderr_pipe = child.stderr.take();

                // Drain both pipes concurrently so neither can fill up and block the child.
                let (stdout, stderr) = futures::future::try_join(
                    drain_capped(stdout_pipe, limit),
                    drain_capped(stderr_pipe, limit),
                )
                .await
                .map_err(|e| StudioError::Io(program.to_string(), e.to_string()))?;

                let status = child
                    .wait()
                    .await
                    .map_err(|e| StudioError::Io(program.to_string(), e.to_string()))?;

                if stdout.overflowed || stderr.overflowed {
                    return Err(StudioError::OutputLimitExceeded(program.to_string(), limit));
                }

                Ok(CommandResult {
                    stdout: String::from_utf8_lossy(&stdout.kept).into_owned(),
                    stderr: String::from_utf8_lossy(&stderr.kept).into_owned(),
                    exit_code: status.code().unwrap_or(-1),
                })
            }
        }
    }
}

fn launch_error(program: &str, e: std::io::Error) -> StudioError {
    match e.kind() {
        std::io::ErrorKind::NotFound | std::io::ErrorKind::PermissionDenied => {
            StudioError::ToolNotFound(program.to_string())
        }
        _ => StudioError::Io(program.to_string(), format!("failed to spawn: {}", e)),
    }
}

struct Drained {
    kept: Vec<u8>,
    overflowed: bool,
}

/// Read a pipe to EOF, keeping at most `limit` bytes and discarding the rest.
async fn drain_capped<R: AsyncRead + Unpin>(
    pipe: Option<R>,
    limit: usize,
) -> std::io::Result<Drained> {
    let mut kept = Vec::new();
    let Some(mut pipe) = pipe else {
        return Ok(Drained {
            kept,
            overflowed: false,
        });
    };

    (&mut pipe).take(limit as u64).read_to_end(&mut kept).await?;
    let discarded = tokio::io::copy(&mut pipe, &mut tokio::io::sink()).await?;

    Ok(Drained {
        kept,
        overflowed: discarded > 0,
    })
}

/// Invokes one external program through a `CommandRunner`.
///
/// Holds no mutable state; share it by reference between concurrent callers.
#[derive(Debug, Clone)]
pub struct CommandInvoker<R> {
    runner: R,
    program: String,
}

impl<R: CommandRunner> CommandInvoker<R> {
    pub fn new(runner: R, program: impl Into<String>) -> Self {
        Self {
            runner,
            program: program.into(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Run the program with `args`, failing with `CommandFailed` on a non-zero exit.
    ///
    /// stderr content is never interpreted here; callers decide what it means.
    pub async fn run(&self, args: &[String], mode: OutputMode) -> crate::Result<CommandResult> {
        let start = Instant::now();
        let result = self.runner.execute(&self.program, args, mode).await?;
        let elapsed = start.elapsed().as_millis();

        tracing::info!(
            command = %self.program,
            args = ?args,
            exit_code = %result.exit_code,
            duration_ms = %elapsed,
            "external tool invocation"
        );

        if !result.stdout.is_empty() {
            tracing::debug!(command = %self.program, stdout = %result.stdout, "tool stdout");
        }
        if !result.stderr.is_empty() {
            tracing::debug!(command = %self.program, stderr = %result.stderr, "tool stderr");
        }

        if !result.success() {
            return Err(StudioError::CommandFailed {
                exit_code: result.exit_code,
                stderr: result.stderr,
            });
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pac::testing::{FakeRunner, Scripted};

    fn strings(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_invoker_returns_output_on_zero_exit() {
        let runner = FakeRunner::new(vec![Scripted::ok("hello\n")]);
        let invoker = CommandInvoker::new(runner, "pac");

        let result = invoker
            .run(&strings(&["auth", "list"]), OutputMode::Captured { limit: 1024 })
            .await
            .unwrap();
        assert_eq!(result.stdout, "hello\n");
        assert!(result.success());

        let calls = invoker.runner().calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].program, "pac");
        assert_eq!(calls[0].args, vec!["auth", "list"]);
    }

    #[tokio::test]
    async fn test_invoker_maps_non_zero_exit_to_command_failed() {
        let runner = FakeRunner::new(vec![Scripted::exit(3, "Error: not authenticated")]);
        let invoker = CommandInvoker::new(runner, "pac");

        let result = invoker
            .run(&strings(&["admin", "list"]), OutputMode::Captured { limit: 1024 })
            .await;
        assert!(
            matches!(
                result,
                Err(StudioError::CommandFailed { exit_code: 3, ref stderr }) if stderr == "Error: not authenticated"
            ),
            "non-zero exit must raise CommandFailed: {:?}",
            result
        );
    }

    #[tokio::test]
    async fn test_invoker_fails_inherited_mode_too() {
        let runner = FakeRunner::new(vec![Scripted::exit(1, "")]);
        let invoker = CommandInvoker::new(runner, "pac");

        let result = invoker
            .run(&strings(&["auth", "select", "--name", "x"]), OutputMode::Inherited)
            .await;
        assert!(matches!(
            result,
            Err(StudioError::CommandFailed { exit_code: 1, .. })
        ));
        assert_eq!(invoker.runner().calls()[0].mode, OutputMode::Inherited);
    }

    #[tokio::test]
    async fn test_invoker_passes_launch_errors_through() {
        let runner = FakeRunner::new(vec![Scripted::not_found()]);
        let invoker = CommandInvoker::new(runner, "pac");

        let result = invoker
            .run(&strings(&["--version"]), OutputMode::Captured { limit: 1024 })
            .await;
        assert!(matches!(result, Err(StudioError::ToolNotFound(ref p)) if p == "pac"));
    }

    #[tokio::test]
    async fn test_process_runner_missing_binary_is_tool_not_found() {
        let runner = ProcessRunner::new();
        let result = runner
            .execute(
                "agent-studio-definitely-missing-binary",
                &[],
                OutputMode::Captured { limit: 1024 },
            )
            .await;
        assert!(
            matches!(result, Err(StudioError::ToolNotFound(_))),
            "missing binary must map to ToolNotFound: {:?}",
            result
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_process_runner_captures_stdout_stderr_and_exit_code() {
        let runner = ProcessRunner::new();
        let result = runner
            .execute(
                "sh",
                &strings(&["-c", "printf out; printf err >&2; exit 4"]),
                OutputMode::Captured { limit: 1024 },
            )
            .await
            .unwrap();
        assert_eq!(result.stdout, "out");
        assert_eq!(result.stderr, "err");
        assert_eq!(result.exit_code, 4);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_process_runner_enforces_capture_limit() {
        let runner = ProcessRunner::new();
        let result = runner
            .execute(
                "sh",
                &strings(&["-c", "head -c 4096 /dev/zero"]),
                OutputMode::Captured { limit: 1024 },
            )
            .await;
        assert!(
            matches!(result, Err(StudioError::OutputLimitExceeded(_, 1024))),
            "output past the limit must fail: {:?}",
            result
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_process_runner_output_at_limit_is_kept() {
        let runner = ProcessRunner::new();
        let result = runner
            .execute(
                "sh",
                &strings(&["-c", "printf 0123456789"]),
                OutputMode::Captured { limit: 10 },
            )
            .await
            .unwrap();
        assert_eq!(result.stdout, "0123456789");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_process_runner_injects_env() {
        let mut env = HashMap::new();
        env.insert("AGENT_STUDIO_PROBE".to_string(), "present".to_string());
        let runner = ProcessRunner::with_env(env);
        let result = runner
            .execute(
                "sh",
                &strings(&["-c", "printf \"$AGENT_STUDIO_PROBE\""]),
                OutputMode::Captured { limit: 1024 },
            )
            .await
            .unwrap();
        assert_eq!(result.stdout, "present");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_process_runner_inherited_returns_exit_code_only() {
        let runner = ProcessRunner::new();
        let result = runner
            .execute("sh", &strings(&["-c", "exit 7"]), OutputMode::Inherited)
            .await
            .unwrap();
        assert_eq!(result.exit_code, 7);
        assert!(result.stdout.is_empty());
    }
}
