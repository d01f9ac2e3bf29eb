//! Local state remembered between CLI runs (last-used profile, default
//! environment, recently used solutions), persisted as TOML.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::StudioError;

/// Maximum number of entries kept in `recent_solutions`.
pub const MAX_RECENT_SOLUTIONS: usize = 10;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_environment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_used_profile: Option<String>,
    /// Most recent first, no duplicates.
    #[serde(default)]
    pub recent_solutions: Vec<String>,
}

impl LocalState {
    /// Load state from `path`. A missing file yields the default state.
    pub async fn load(path: &Path) -> crate::Result<Self> {
        let content = match tokio::fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => {
                return Err(StudioError::State(format!(
                    "failed to read {}: {}",
                    path.display(),
                    e
                )));
            }
        };
        toml::from_str(&content)
            .map_err(|e| StudioError::State(format!("failed to parse {}: {}", path.display(), e)))
    }

    /// Write state to `path`, creating parent directories as needed.
    pub async fn save(&self, path: &Path) -> crate::Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                StudioError::State(format!("failed to create {}: {}", parent.display(), e))
            })?;
        }
        let content = toml::to_string(self)
            .map_err(|e| StudioError::State(format!("failed to serialize state: {}", e)))?;
        tokio::fs::write(path, content)
            .await
            .map_err(|e| StudioError::State(format!("failed to write {}: {}", path.display(), e)))
    }

    pub fn set_last_used_profile(&mut self, name: impl Into<String>) {
        self.last_used_profile = Some(name.into());
    }

    pub fn set_default_environment(&mut self, url: impl Into<String>) {
        self.default_environment = Some(url.into());
    }

    /// Move `name` to the front of the recent list, dropping the oldest past the cap.
    pub fn add_recent_solution(&mut self, name: &str) {
        self.recent_solutions.retain(|s| s != name);
        self.recent_solutions.insert(0, name.to_string());
        self.recent_solutions.truncate(MAX_RECENT_SOLUTIONS);
    }

    pub fn recent_solutions(&self) -> &[String] {
        &self.recent_solutions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recent_solutions_dedup_most_recent_first() {
        let mut state = LocalState::default();
        state.add_recent_solution("A");
        state.add_recent_solution("B");
        state.add_recent_solution("A");
        assert_eq!(state.recent_solutions(), ["A", "B"]);
    }

    #[test]
    fn test_recent_solutions_capped_at_ten() {
        let mut state = LocalState::default();
        for i in 0..15 {
            state.add_recent_solution(&format!("sol{}", i));
        }
        assert_eq!(state.recent_solutions().len(), MAX_RECENT_SOLUTIONS);
        assert_eq!(state.recent_solutions()[0], "sol14");
        assert_eq!(state.recent_solutions()[9], "sol5");
    }

    #[tokio::test]
    async fn test_load_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let state = LocalState::load(&dir.path().join("state.toml")).await.unwrap();
        assert_eq!(state, LocalState::default());
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("state.toml");

        let mut state = LocalState::default();
        state.set_last_used_profile("dev");
        state.set_default_environment("https://dev.crm.dynamics.com");
        state.add_recent_solution("Core");
        state.save(&path).await.unwrap();

        let loaded = LocalState::load(&path).await.unwrap();
        assert_eq!(loaded.last_used_profile.as_deref(), Some("dev"));
        assert_eq!(
            loaded.default_environment.as_deref(),
            Some("https://dev.crm.dynamics.com")
        );
        assert_eq!(loaded.recent_solutions(), ["Core"]);
    }

    #[tokio::test]
    async fn test_load_corrupt_file_is_state_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.toml");
        std::fs::write(&path, "recent_solutions = 12 = oops").unwrap();
        let result = LocalState::load(&path).await;
        assert!(matches!(result, Err(StudioError::State(ref msg)) if msg.contains("parse")));
    }
}
