//! Presence and version probing for the external tool via `<tool> --version`.

use crate::error::StudioError;
use crate::pac::command::PacCommand;
use crate::pac::runner::{CommandRunner, OutputMode};

/// Version output is tiny; anything bigger is not a version string.
const VERSION_CAPTURE_LIMIT: usize = 64 * 1024;

pub struct ToolLocator<'a, R> {
    runner: &'a R,
    program: &'a str,
}

impl<'a, R: CommandRunner> ToolLocator<'a, R> {
    pub fn new(runner: &'a R, program: &'a str) -> Self {
        Self { runner, program }
    }

    /// True iff `--version` launches and exits zero. Never fails.
    pub async fn is_installed(&self) -> bool {
        match self.probe().await {
            Ok(_) => true,
            Err(e) => {
                tracing::debug!(command = %self.program, error = %e, "tool probe failed");
                false
            }
        }
    }

    /// Trimmed stdout of `--version`.
    ///
    /// Returns `ToolNotFound` if the binary is missing or the probe exits non-zero.
    pub async fn version(&self) -> crate::Result<String> {
        self.probe().await
    }

    async fn probe(&self) -> crate::Result<String> {
        let result = self
            .runner
            .execute(
                self.program,
                &PacCommand::Version.args(),
                OutputMode::Captured {
                    limit: VERSION_CAPTURE_LIMIT,
                },
            )
            .await?;

        if !result.success() {
            return Err(StudioError::ToolNotFound(self.program.to_string()));
        }

        Ok(result.stdout.trim().to_string())
    }
}
