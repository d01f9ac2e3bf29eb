//! Agent Studio: typed wrapper around the Power Platform CLI.
//! Builds safe `pac` invocations, probes its presence and version, and parses
//! its line-oriented output into auth profiles, environments, and solutions.

pub mod config;
pub mod error;
pub mod pac;
pub mod state;

pub use config::{SanitizeConfig, StudioConfig, ToolConfig, parse_env_ref, resolve_env_vars};
pub use error::{Result, StudioError};
pub use pac::command::PacCommand;
pub use pac::facade::{DEFAULT_PROFILE_NAME, PacFacade};
pub use pac::locator::ToolLocator;
pub use pac::parser::{
    AuthProfile, Environment, Solution, parse_auth_profiles, parse_environments, parse_solutions,
};
pub use pac::runner::{CommandInvoker, CommandResult, CommandRunner, OutputMode, ProcessRunner};
pub use pac::sanitize::{SanitizePolicy, Sanitizer, sanitize};
pub use state::LocalState;
