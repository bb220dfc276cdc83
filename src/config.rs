// src/config.rs
// Application configuration: defaults, then an optional YAML file, then env.

use color_eyre::{Result, eyre::{eyre, WrapErr}};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_USER_ID: &str = "demo_user_123";
pub const DEFAULT_LOG_DIR: &str = "./logs";
pub const DEFAULT_CONFIG_FILE: &str = "memory-compare.yml";

pub const ENV_CONFIG: &str = "MEMORY_COMPARE_CONFIG";
pub const ENV_BASE_URL: &str = "MEMORY_COMPARE_BASE_URL";
pub const ENV_USER_ID: &str = "MEMORY_COMPARE_USER_ID";
pub const ENV_LOG_DIR: &str = "MEMORY_COMPARE_LOG_DIR";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Address of the service exposing `/mem0/query` and `/zep/query`
    pub base_url: String,
    /// Pre-filled into the User ID field
    pub default_user_id: String,
    pub log_dir: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            default_user_id: DEFAULT_USER_ID.to_string(),
            log_dir: PathBuf::from(DEFAULT_LOG_DIR),
        }
    }
}

impl AppConfig {
    /// Load from the process environment and working directory.
    pub fn load() -> Result<Self> {
        Self::load_with(|key| std::env::var(key).ok())
    }

    /// Same as [`AppConfig::load`] with an injectable env lookup.
    pub fn load_with<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match lookup(ENV_CONFIG).filter(|p| !p.trim().is_empty()) {
            Some(path) => Self::from_file(Path::new(&path))?,
            None => {
                let path = Path::new(DEFAULT_CONFIG_FILE);
                if path.exists() {
                    Self::from_file(path)?
                } else {
                    Self::default()
                }
            }
        };

        config.apply_overrides(lookup);
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .wrap_err_with(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_yaml(&content)
            .wrap_err_with(|| format!("Failed to parse config file {}", path.display()))
    }

    pub fn from_yaml(yaml: &str) -> Result<Self> {
        // An empty document deserializes to unit, not to a map
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(base_url) = lookup(ENV_BASE_URL) {
            self.base_url = base_url;
        }
        if let Some(user_id) = lookup(ENV_USER_ID) {
            self.default_user_id = user_id;
        }
        if let Some(log_dir) = lookup(ENV_LOG_DIR) {
            self.log_dir = PathBuf::from(log_dir);
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.base_url.trim().is_empty() {
            return Err(eyre!("base_url must not be empty"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.base_url, "http://localhost:8000");
        assert_eq!(config.default_user_id, "demo_user_123");
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = AppConfig::from_yaml("base_url: \"http://memory.internal:9000\"\n").unwrap();
        assert_eq!(config.base_url, "http://memory.internal:9000");
        assert_eq!(config.default_user_id, DEFAULT_USER_ID);
        assert_eq!(config.log_dir, PathBuf::from(DEFAULT_LOG_DIR));
    }

    #[test]
    fn test_empty_yaml_is_default() {
        assert_eq!(AppConfig::from_yaml("").unwrap(), AppConfig::default());
    }

    #[test]
    fn test_file_then_env() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "base_url: http://from-file:8000").unwrap();
        writeln!(file, "default_user_id: file_user").unwrap();
        let path = file.path().to_string_lossy().into_owned();

        let config = AppConfig::load_with(env(&[
            (ENV_CONFIG, path.as_str()),
            (ENV_USER_ID, "env_user"),
        ]))
        .unwrap();

        assert_eq!(config.base_url, "http://from-file:8000");
        assert_eq!(config.default_user_id, "env_user");
    }

    #[test]
    fn test_explicit_missing_file_is_error() {
        let result = AppConfig::load_with(env(&[(ENV_CONFIG, "/definitely/not/here.yml")]));
        assert!(result.is_err());
    }

    #[test]
    fn test_malformed_file_is_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "base_url: [unclosed").unwrap();
        let path = file.path().to_string_lossy().into_owned();

        assert!(AppConfig::load_with(env(&[(ENV_CONFIG, path.as_str())])).is_err());
    }

    #[test]
    fn test_empty_base_url_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "log_dir: /tmp/mc").unwrap();
        let path = file.path().to_string_lossy().into_owned();

        let lookup = env(&[(ENV_CONFIG, path.as_str()), (ENV_BASE_URL, "  ")]);
        let result = AppConfig::load_with(lookup);
        assert!(result.is_err());
    }
}
