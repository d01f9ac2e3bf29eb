//! PacFacade: the operations both front ends call.
//!
//! Composes `CommandInvoker`, `Sanitizer`, and the output parsers. Holds no
//! mutable state and no cache: every list call re-runs the tool, and a single
//! facade value can be shared by reference between concurrent callers.
//!
//! Error policy: `list_auth_profiles` and `list_solutions` recover locally
//! (any failure becomes an empty list, logged at warn). Every other operation
//! propagates its error to the caller. Nothing is retried.

use crate::config::{StudioConfig, resolve_env_vars};
use crate::error::StudioError;
use crate::pac::command::PacCommand;
use crate::pac::locator::ToolLocator;
use crate::pac::parser::{
    AuthProfile, Environment, Solution, parse_auth_profiles, parse_environments,
    parse_solutions,
};
use crate::pac::runner::{CommandInvoker, CommandResult, CommandRunner, OutputMode, ProcessRunner};
use crate::pac::sanitize::Sanitizer;

/// Profile name used when `authenticate` is called without one.
pub const DEFAULT_PROFILE_NAME: &str = "default";

pub struct PacFacade<R = ProcessRunner> {
    invoker: CommandInvoker<R>,
    sanitizer: Sanitizer,
    capture_limit: usize,
    large_output_limit: usize,
    stream_actions: bool,
}

impl PacFacade<ProcessRunner> {
    /// Build a facade that runs real subprocesses, with `[tool.env]` resolved once.
    pub fn from_config(config: &StudioConfig) -> crate::Result<Self> {
        let runner = ProcessRunner::with_env(resolve_env_vars(&config.tool.env));
        Self::with_runner(runner, config)
    }
}

impl<R: CommandRunner> PacFacade<R> {
    pub fn with_runner(runner: R, config: &StudioConfig) -> crate::Result<Self> {
        config.validate()?;
        Ok(Self {
            invoker: CommandInvoker::new(runner, config.tool.command.clone()),
            sanitizer: Sanitizer::new(config.sanitize.policy),
            capture_limit: config.tool.capture_limit_bytes,
            large_output_limit: config.tool.large_output_limit_bytes,
            stream_actions: config.tool.stream_actions,
        })
    }

    pub fn runner(&self) -> &R {
        self.invoker.runner()
    }

    pub fn program(&self) -> &str {
        self.invoker.program()
    }

    pub fn locator(&self) -> ToolLocator<'_, R> {
        ToolLocator::new(self.invoker.runner(), self.invoker.program())
    }

    pub async fn is_installed(&self) -> bool {
        self.locator().is_installed().await
    }

    pub async fn version(&self) -> crate::Result<String> {
        self.locator().version().await
    }

    /// Create an auth profile for `url` (interactive; stdio is inherited).
    pub async fn authenticate(&self, url: &str, name: Option<&str>) -> crate::Result<()> {
        if !url.starts_with("https://") {
            return Err(StudioError::InvalidInput(
                "url".to_string(),
                "must start with https://".to_string(),
            ));
        }
        let url = self.sanitizer.clean("url", url)?;
        let name = self
            .sanitizer
            .clean("name", name.unwrap_or(DEFAULT_PROFILE_NAME))?;

        tracing::info!(url = %url, name = %name, "authenticating");
        let command = PacCommand::AuthCreate {
            url,
            name: Some(name),
        };
        self.run(&command, OutputMode::Inherited).await?;
        Ok(())
    }

    /// Registered auth profiles; empty on any failure.
    pub async fn list_auth_profiles(&self) -> Vec<AuthProfile> {
        match self.run(&PacCommand::AuthList, self.list_mode()).await {
            Ok(result) => parse_auth_profiles(&result.stdout),
            Err(e) => {
                tracing::warn!(error = %e, "listing auth profiles failed");
                Vec::new()
            }
        }
    }

    /// Make `name_or_index` the active profile (stdio is inherited).
    pub async fn select_auth_profile(&self, name_or_index: &str) -> crate::Result<()> {
        let name = require("name", name_or_index)?;
        let command = PacCommand::AuthSelect {
            name: name.to_string(),
        };
        self.run(&command, OutputMode::Inherited).await?;
        Ok(())
    }

    /// Environments visible to the active profile.
    ///
    /// Fails with `CommandFailed` on a non-zero exit and `MalformedOutput` when
    /// the output is not a JSON array.
    pub async fn list_environments(&self) -> crate::Result<Vec<Environment>> {
        let result = self.run(&PacCommand::AdminList, self.list_mode()).await?;
        parse_environments(&result.stdout)
    }

    /// Solutions in the active environment; empty on any failure.
    pub async fn list_solutions(&self) -> Vec<Solution> {
        match self.run(&PacCommand::SolutionList, self.list_mode()).await {
            Ok(result) => parse_solutions(&result.stdout),
            Err(e) => {
                tracing::warn!(error = %e, "listing solutions failed");
                Vec::new()
            }
        }
    }

    /// Export solution `name` to the zip file at `output_path`.
    pub async fn export_solution(
        &self,
        name: &str,
        output_path: &str,
        managed: bool,
    ) -> crate::Result<()> {
        let command = PacCommand::SolutionExport {
            name: self.sanitizer.clean("name", require("name", name)?)?,
            path: self
                .sanitizer
                .clean("output path", require("output path", output_path)?)?,
            managed,
        };
        tracing::info!(solution = %name, managed = %managed, "exporting solution");
        self.run(&command, self.action_mode()).await?;
        Ok(())
    }

    /// Import the solution zip at `path`.
    pub async fn import_solution(&self, path: &str, activate_plugins: bool) -> crate::Result<()> {
        let command = PacCommand::SolutionImport {
            path: self.sanitizer.clean("path", require("path", path)?)?,
            activate_plugins,
        };
        tracing::info!(path = %path, activate_plugins = %activate_plugins, "importing solution");
        self.run(&command, self.action_mode()).await?;
        Ok(())
    }

    /// Clone solution `name` into the directory `output_path`.
    pub async fn clone_solution(&self, name: &str, output_path: &str) -> crate::Result<()> {
        let command = PacCommand::SolutionClone {
            name: self.sanitizer.clean("name", require("name", name)?)?,
            output_directory: self
                .sanitizer
                .clean("output path", require("output path", output_path)?)?,
        };
        tracing::info!(solution = %name, "cloning solution");
        self.run(&command, self.action_mode()).await?;
        Ok(())
    }

    fn list_mode(&self) -> OutputMode {
        OutputMode::Captured {
            limit: self.capture_limit,
        }
    }

    /// export/import/clone: large captured buffer, or live output when streaming.
    fn action_mode(&self) -> OutputMode {
        if self.stream_actions {
            OutputMode::Inherited
        } else {
            OutputMode::Captured {
                limit: self.large_output_limit,
            }
        }
    }

    async fn run(&self, command: &PacCommand, mode: OutputMode) -> crate::Result<CommandResult> {
        tracing::debug!(
            command_line = %command.command_line(self.invoker.program()),
            mode = ?mode,
            "dispatching {}",
            command.label()
        );
        self.invoker.run(&command.args(), mode).await
    }
}

fn require<'a>(field: &str, value: &'a str) -> crate::Result<&'a str> {
    if value.trim().is_empty() {
        return Err(StudioError::InvalidInput(
            field.to_string(),
            "must not be empty".to_string(),
        ));
    }
    Ok(value)
}
