//! Layered configuration
//!
//! Later layers win: user config dir, then the project's `.lca/config.yaml`,
//! then environment variables.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::core::project::Project;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";

const CONFIG_FILE: &str = "config.yaml";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,

    /// Base URL of the LCA classification service
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_base_url: Option<String>,
}

impl Config {
    /// Load every layer. Unreadable files are skipped with a warning.
    pub fn load() -> Self {
        let mut config = Config::default();

        if let Some(path) = Self::user_config_path() {
            if let Some(layer) = Self::read_layer(&path) {
                config.merge(layer);
            }
        }

        if let Ok(project) = Project::discover() {
            if let Some(layer) = Self::read_layer(&project.config_path()) {
                config.merge(layer);
            }
        }

        config.merge(Self::from_env());
        config
    }

    /// `~/.config/lca/config.yaml` or the platform equivalent
    pub fn user_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "lca").map(|d| d.config_dir().join(CONFIG_FILE))
    }

    fn read_layer(path: &Path) -> Option<Config> {
        let content = fs::read_to_string(path).ok()?;
        match serde_yml::from_str::<Config>(&content) {
            Ok(layer) => {
                debug!(path = %path.display(), "loaded config layer");
                Some(layer)
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "ignoring invalid config file");
                None
            }
        }
    }

    fn from_env() -> Self {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());
        Config {
            author: var("LCA_AUTHOR"),
            api_base_url: var("LCA_API_URL"),
        }
    }

    /// Overlay `other` on top of `self`; only set keys override
    pub fn merge(&mut self, other: Config) {
        if other.author.is_some() {
            self.author = other.author;
        }
        if other.api_base_url.is_some() {
            self.api_base_url = other.api_base_url;
        }
    }

    /// Configured author, falling back to the login name
    pub fn author(&self) -> String {
        self.author
            .clone()
            .or_else(|| std::env::var("USER").ok())
            .or_else(|| std::env::var("USERNAME").ok())
            .unwrap_or_else(|| "unknown".to_string())
    }

    pub fn api_base_url(&self) -> String {
        self.api_base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_only_overrides_set_keys() {
        let mut base = Config {
            author: Some("alice".to_string()),
            api_base_url: None,
        };
        base.merge(Config {
            author: Some("bob".to_string()),
            api_base_url: Some("http://lca.local".to_string()),
        });
        assert_eq!(base.author(), "bob");
        assert_eq!(base.api_base_url(), "http://lca.local");
    }

    #[test]
    fn test_default_api_base_url() {
        assert_eq!(Config::default().api_base_url(), DEFAULT_API_BASE_URL);
    }

    #[test]
    fn test_yaml_layer_parses_partial_file() {
        let layer: Config = serde_yml::from_str("api_base_url: http://example.test\n").unwrap();
        assert_eq!(layer.api_base_url.as_deref(), Some("http://example.test"));
        assert!(layer.author.is_none());
    }
}
