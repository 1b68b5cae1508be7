//! Application configuration
//!
//! Configuration is loaded from:
//! 1. Default values
//! 2. Config file (~/.config/coacherp/config.toml)
//! 3. Environment variables (COACHERP_* prefix)
//!
//! Environment variables take precedence over config file values.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Environment variable prefix
const ENV_PREFIX: &str = "COACHERP";

/// Name of the remote document in the user's Drive
pub const DEFAULT_FILE_NAME: &str = "CoachERP_data.json";

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory for local data (snapshot file)
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Name of the remote document
    #[serde(default = "default_file_name")]
    pub file_name: String,

    /// Google OAuth client id (needed to build the consent URL)
    #[serde(default)]
    pub client_id: Option<String>,

    /// A pre-obtained access token for non-interactive use
    #[serde(default)]
    pub access_token: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            file_name: default_file_name(),
            client_id: None,
            access_token: None,
        }
    }
}

impl Config {
    /// Load configuration from default location and environment
    ///
    /// Order of precedence (highest to lowest):
    /// 1. Environment variables (COACHERP_DATA_DIR, COACHERP_FILE_NAME,
    ///    COACHERP_CLIENT_ID, COACHERP_ACCESS_TOKEN)
    /// 2. Config file (~/.config/coacherp/config.toml or COACHERP_CONFIG)
    /// 3. Default values
    pub fn load() -> Result<Self> {
        Self::load_from_path(&Self::config_file_path())
    }

    /// Load configuration from a specific path
    ///
    /// Environment variables are still applied as overrides.
    /// If the file doesn't exist, defaults are used.
    pub fn load_from_path(path: &PathBuf) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {:?}", path))?;
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {:?}", path))?
        } else {
            Self::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Load configuration from a TOML string (useful for testing)
    pub fn load_from_str(toml_content: &str) -> Result<Self> {
        let mut config: Config =
            toml::from_str(toml_content).context("Failed to parse config TOML")?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var(format!("{}_DATA_DIR", ENV_PREFIX)) {
            self.data_dir = PathBuf::from(val);
        }

        if let Ok(val) = std::env::var(format!("{}_FILE_NAME", ENV_PREFIX)) {
            if !val.is_empty() {
                self.file_name = val;
            }
        }

        if let Ok(val) = std::env::var(format!("{}_CLIENT_ID", ENV_PREFIX)) {
            self.client_id = if val.is_empty() { None } else { Some(val) };
        }

        if let Ok(val) = std::env::var(format!("{}_ACCESS_TOKEN", ENV_PREFIX)) {
            self.access_token = if val.is_empty() { None } else { Some(val) };
        }
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_file_path();

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(&config_path, content)
            .with_context(|| format!("Failed to write config file: {:?}", config_path))?;
        Ok(())
    }

    /// Get the config file path
    ///
    /// Can be overridden with COACHERP_CONFIG environment variable
    pub fn config_file_path() -> PathBuf {
        if let Ok(path) = std::env::var(format!("{}_CONFIG", ENV_PREFIX)) {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("coacherp")
            .join("config.toml")
    }

    /// Get the path to the local snapshot file
    pub fn snapshot_path(&self) -> PathBuf {
        self.data_dir.join("coacherp.json")
    }
}

/// Get the default data directory
fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("coacherp")
}

fn default_file_name() -> String {
    DEFAULT_FILE_NAME.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    // Mutex to serialize tests that touch environment variables
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    /// Guard that locks env access and saves/restores env vars
    struct EnvGuard<'a> {
        _lock: std::sync::MutexGuard<'a, ()>,
        saved: Vec<(String, Option<String>)>,
    }

    impl<'a> EnvGuard<'a> {
        fn new(vars: &[&str]) -> Self {
            let lock = ENV_MUTEX.lock().unwrap();
            let saved = vars
                .iter()
                .map(|&name| (name.to_string(), env::var(name).ok()))
                .collect();
            for name in vars {
                env::remove_var(name);
            }
            Self { _lock: lock, saved }
        }
    }

    impl Drop for EnvGuard<'_> {
        fn drop(&mut self) {
            for (name, value) in &self.saved {
                match value {
                    Some(v) => env::set_var(name, v),
                    None => env::remove_var(name),
                }
            }
        }
    }

    const ENV_VARS: &[&str] = &[
        "COACHERP_DATA_DIR",
        "COACHERP_FILE_NAME",
        "COACHERP_CLIENT_ID",
        "COACHERP_ACCESS_TOKEN",
    ];

    #[test]
    fn test_default_config() {
        let _guard = EnvGuard::new(ENV_VARS);

        let config = Config::default();
        assert_eq!(config.file_name, DEFAULT_FILE_NAME);
        assert!(config.client_id.is_none());
        assert!(config.access_token.is_none());
        assert!(config.data_dir.ends_with("coacherp"));
    }

    #[test]
    fn test_snapshot_path() {
        let config = Config::default();
        assert!(config.snapshot_path().ends_with("coacherp.json"));
    }

    #[test]
    fn test_env_override_data_dir() {
        let _guard = EnvGuard::new(ENV_VARS);

        let mut config = Config::default();

        env::set_var("COACHERP_DATA_DIR", "/tmp/coacherp-test");
        config.apply_env_overrides();

        assert_eq!(config.data_dir, PathBuf::from("/tmp/coacherp-test"));
    }

    #[test]
    fn test_env_override_access_token() {
        let _guard = EnvGuard::new(ENV_VARS);

        let mut config = Config::default();
        assert!(config.access_token.is_none());

        env::set_var("COACHERP_ACCESS_TOKEN", "ya29.test");
        config.apply_env_overrides();
        assert_eq!(config.access_token, Some("ya29.test".to_string()));

        // Empty string clears it
        env::set_var("COACHERP_ACCESS_TOKEN", "");
        config.apply_env_overrides();
        assert!(config.access_token.is_none());
    }

    #[test]
    fn test_env_override_file_name_ignores_empty() {
        let _guard = EnvGuard::new(ENV_VARS);

        let mut config = Config::default();

        env::set_var("COACHERP_FILE_NAME", "Custom_data.json");
        config.apply_env_overrides();
        assert_eq!(config.file_name, "Custom_data.json");

        env::set_var("COACHERP_FILE_NAME", "");
        config.apply_env_overrides();
        assert_eq!(config.file_name, "Custom_data.json");
    }

    #[test]
    fn test_serialization() {
        let _guard = EnvGuard::new(ENV_VARS);

        let config = Config {
            data_dir: PathBuf::from("/data/coacherp"),
            file_name: "CoachERP_data.json".to_string(),
            client_id: Some("client.apps.googleusercontent.com".to_string()),
            access_token: None,
        };

        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("data_dir"));
        assert!(toml_str.contains("file_name"));
        assert!(toml_str.contains("client_id"));

        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.data_dir, config.data_dir);
        assert_eq!(parsed.file_name, config.file_name);
        assert_eq!(parsed.client_id, config.client_id);
    }

    #[test]
    fn test_load_from_str() {
        let _guard = EnvGuard::new(ENV_VARS);

        let toml = r#"
            data_dir = "/custom/data"
            file_name = "Institute_data.json"
        "#;

        let config = Config::load_from_str(toml).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/custom/data"));
        assert_eq!(config.file_name, "Institute_data.json");
    }

    #[test]
    fn test_load_from_path_missing_file() {
        let _guard = EnvGuard::new(ENV_VARS);

        let path = PathBuf::from("/nonexistent/config.toml");
        let config = Config::load_from_path(&path).unwrap();
        assert_eq!(config.file_name, DEFAULT_FILE_NAME);
        assert!(config.access_token.is_none());
    }
}
