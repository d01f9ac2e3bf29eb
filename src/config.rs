//! Agent Studio configuration: deserialization and validation.

use crate::error::StudioError;
use crate::pac::sanitize::SanitizePolicy;
use serde::Deserialize;
use std::collections::HashMap;

/// Smallest capture limit accepted for export/import/clone output.
pub const MIN_LARGE_OUTPUT_LIMIT: usize = 10 * 1024 * 1024;

/// Strip an env var reference to its variable name.
///
/// Accepts `${VAR_NAME}` syntax only. Returns `None` if the value is not a
/// valid env-var reference.
pub fn parse_env_ref(value: &str) -> Option<&str> {
    value.strip_prefix("${").and_then(|s| s.strip_suffix('}'))
}

/// Resolve a map of env-var references to their actual values.
///
/// Unknown variables resolve to the empty string (same as shell `${UNSET-}`).
pub fn resolve_env_vars(env: &HashMap<String, String>) -> HashMap<String, String> {
    env.iter()
        .map(|(k, v)| {
            let resolved = match parse_env_ref(v) {
                Some(var_name) => std::env::var(var_name).unwrap_or_default(),
                None => v.clone(), // caught by validate(), but handle gracefully
            };
            (k.clone(), resolved)
        })
        .collect()
}

/// Top-level Agent Studio configuration, parsed from TOML.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StudioConfig {
    #[serde(default)]
    pub tool: ToolConfig,
    #[serde(default)]
    pub sanitize: SanitizeConfig,
}

/// How the external Power Platform CLI is located and invoked.
#[derive(Debug, Clone, Deserialize)]
pub struct ToolConfig {
    /// The executable to run.
    #[serde(default = "default_command")]
    pub command: String,
    /// Captured-mode limit for ordinary commands (list, version).
    #[serde(default = "default_capture_limit_bytes")]
    pub capture_limit_bytes: usize,
    /// Captured-mode limit for export/import/clone.
    #[serde(default = "default_large_output_limit_bytes")]
    pub large_output_limit_bytes: usize,
    /// Run export/import/clone with inherited stdio so progress streams live.
    #[serde(default)]
    pub stream_actions: bool,
    /// Env var references (`${VAR}`), resolved for every invocation.
    #[serde(default)]
    pub env: HashMap<String, String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SanitizeConfig {
    #[serde(default)]
    pub policy: SanitizePolicy,
}

fn default_command() -> String {
    "pac".to_string()
}

fn default_capture_limit_bytes() -> usize {
    1024 * 1024
}

fn default_large_output_limit_bytes() -> usize {
    MIN_LARGE_OUTPUT_LIMIT
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            command: default_command(),
            capture_limit_bytes: default_capture_limit_bytes(),
            large_output_limit_bytes: default_large_output_limit_bytes(),
            stream_actions: false,
            env: HashMap::new(),
        }
    }
}

impl StudioConfig {
    /// Validate the config, failing fast before any subprocess is launched.
    pub fn validate(&self) -> crate::Result<()> {
        let tool = &self.tool;

        if tool.command.trim().is_empty() {
            return Err(StudioError::InvalidConfig(
                "tool.command must not be empty".to_string(),
            ));
        }

        if tool.capture_limit_bytes == 0 {
            return Err(StudioError::InvalidConfig(
                "tool.capture_limit_bytes must be > 0".to_string(),
            ));
        }

        if tool.large_output_limit_bytes < MIN_LARGE_OUTPUT_LIMIT {
            return Err(StudioError::InvalidConfig(format!(
                "tool.large_output_limit_bytes {} is below the minimum of {}",
                tool.large_output_limit_bytes, MIN_LARGE_OUTPUT_LIMIT
            )));
        }

        for (key, value) in &tool.env {
            if parse_env_ref(value).is_none() {
                return Err(StudioError::InvalidConfig(format!(
                    "env value for key '{}' must be a ${{VAR}} reference, got '{}'",
                    key, value
                )));
            }
        }

        Ok(())
    }
}
