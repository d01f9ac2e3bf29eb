//! Error types for Agent Studio operations against the Power Platform CLI.

use thiserror::Error;

/// Main error type for Agent Studio operations
#[derive(Error, Debug)]
pub enum StudioError {
    /// The external binary is not on PATH or is not executable
    #[error("'{0}' was not found on PATH or is not executable")]
    ToolNotFound(String),

    /// The subprocess ran but exited non-zero
    #[error("command failed with exit code {exit_code}: {stderr}")]
    CommandFailed { exit_code: i32, stderr: String },

    /// Structured output from a named command could not be decoded
    #[error("malformed output from '{0}': {1}")]
    MalformedOutput(String, String),

    /// A caller-supplied value was rejected before invocation
    #[error("invalid {0}: {1}")]
    InvalidInput(String, String),

    /// Captured output from a named command exceeded the capture limit
    #[error("output of '{0}' exceeded the {1} byte capture limit")]
    OutputLimitExceeded(String, usize),

    /// Spawn, pipe, or wait failure for a named command
    #[error("process I/O error for '{0}': {1}")]
    Io(String, String),

    /// Configuration failed validation or could not be parsed
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// Local state could not be read or written
    #[error("state store error: {0}")]
    State(String),
}

/// Result type alias for Agent Studio operations
pub type Result<T> = std::result::Result<T, StudioError>;
