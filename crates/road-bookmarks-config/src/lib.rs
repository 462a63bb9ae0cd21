use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

const CONFIG_DIR: &str = "~/.config/road-bookmarks";
const DEFAULT_STORE_FILE: &str = "road_bookmarks_data.json";
const DEFAULT_WATCH_INTERVAL_SECS: u64 = 1;
const DEFAULT_CLEAN_INTERVAL_SECS: u64 = 300;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {config_path}: {source}")]
    ConfigReadError {
        config_path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {config_path}: {source}")]
    ConfigParseError {
        config_path: PathBuf,
        source: toml::de::Error,
    },
}

/// User settings for where bookmarks live and how often they are polled.
///
/// Every field may be omitted from the file; missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding the persisted bookmark file
    pub data_dir: PathBuf,
    /// File name of the persisted bookmark file inside `data_dir`
    pub store_file: String,
    /// Seconds between two checks of open documents for bookmark changes
    pub watch_interval_secs: u64,
    /// Seconds between two sweeps of stale store entries
    pub clean_interval_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: Self::config_dir(),
            store_file: DEFAULT_STORE_FILE.to_string(),
            watch_interval_secs: DEFAULT_WATCH_INTERVAL_SECS,
            clean_interval_secs: DEFAULT_CLEAN_INTERVAL_SECS,
        }
    }
}

impl Config {
    pub fn load_from_path<P: AsRef<Path>>(config_path: P) -> Result<Option<Self>, ConfigError> {
        let config_path = config_path.as_ref();
        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(config_path).map_err(|source| {
            ConfigError::ConfigReadError {
                config_path: config_path.to_path_buf(),
                source,
            }
        })?;

        let mut config: Config =
            toml::from_str(&content).map_err(|source| ConfigError::ConfigParseError {
                config_path: config_path.to_path_buf(),
                source,
            })?;

        // Expand shell variables and tilde in the data directory
        config.data_dir = Self::expand_path(&config.data_dir).unwrap_or(config.data_dir);

        Ok(Some(config))
    }

    /// Load the config file at `config_path`, falling back to defaults when absent
    pub fn load_or_default<P: AsRef<Path>>(config_path: P) -> Result<Self, ConfigError> {
        Ok(Self::load_from_path(config_path)?.unwrap_or_default())
    }

    pub fn save_to_path<P: AsRef<Path>>(&self, config_path: P) -> anyhow::Result<()> {
        let config_path = config_path.as_ref();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Full path of the persisted bookmark file
    pub fn store_path(&self) -> PathBuf {
        self.data_dir.join(&self.store_file)
    }

    pub fn watch_interval(&self) -> Duration {
        Duration::from_secs(self.watch_interval_secs)
    }

    pub fn clean_interval(&self) -> Duration {
        Duration::from_secs(self.clean_interval_secs)
    }

    fn config_dir() -> PathBuf {
        let config_dir = shellexpand::tilde(CONFIG_DIR);
        PathBuf::from(config_dir.as_ref())
    }

    fn expand_path(path: &Path) -> Option<PathBuf> {
        let path_str = path.to_string_lossy();
        match shellexpand::full(&path_str) {
            Ok(expanded) => Some(PathBuf::from(expanded.as_ref())),
            Err(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use tempfile::TempDir;

    #[test]
    fn test_config_path() {
        let config_path = Config::config_path();
        let path_str = config_path.to_string_lossy();

        assert!(!path_str.starts_with('~'));
        assert!(path_str.ends_with(".config/road-bookmarks/config.toml"));
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();

        assert_eq!(config.store_file, "road_bookmarks_data.json");
        assert_eq!(config.watch_interval(), Duration::from_secs(1));
        assert_eq!(config.clean_interval(), Duration::from_secs(300));
        assert!(
            config
                .store_path()
                .ends_with(".config/road-bookmarks/road_bookmarks_data.json")
        );
    }

    #[test]
    fn test_config_serialization_roundtrip() {
        let original = Config {
            data_dir: PathBuf::from("/tmp/bookmarks"),
            store_file: "marks.json".to_string(),
            watch_interval_secs: 2,
            clean_interval_secs: 60,
        };

        let toml_str = toml::to_string(&original).unwrap();
        let deserialized: Config = toml::from_str(&toml_str).unwrap();

        assert_eq!(original, deserialized);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: Config = toml::from_str("clean_interval_secs = 30\n").unwrap();

        assert_eq!(config.clean_interval_secs, 30);
        assert_eq!(config.watch_interval_secs, 1);
        assert_eq!(config.store_file, "road_bookmarks_data.json");
    }

    #[test]
    fn test_expand_path_with_tilde() {
        let path = PathBuf::from("~/test/path");
        let expanded = Config::expand_path(&path);

        assert!(expanded.is_some());
        let expanded = expanded.unwrap();
        assert!(!expanded.to_string_lossy().starts_with('~'));
        assert!(expanded.to_string_lossy().contains("test/path"));
    }

    #[test]
    fn test_expand_path_with_env_var() {
        unsafe {
            env::set_var("ROAD_BOOKMARKS_TEST_VAR", "/test/env/path");
        }

        let path = PathBuf::from("$ROAD_BOOKMARKS_TEST_VAR/subdir");
        let expanded = Config::expand_path(&path);

        assert_eq!(expanded, Some(PathBuf::from("/test/env/path/subdir")));

        unsafe {
            env::remove_var("ROAD_BOOKMARKS_TEST_VAR");
        }
    }

    #[test]
    fn test_load_config_file_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let non_existent_config = temp_dir.path().join("nonexistent.toml");

        let result = Config::load_from_path(&non_existent_config).unwrap();
        assert!(result.is_none());

        let fallback = Config::load_or_default(&non_existent_config).unwrap();
        assert_eq!(fallback, Config::default());
    }

    #[test]
    fn test_load_malformed_config_is_parse_error() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("config.toml");
        std::fs::write(&config_file, "watch_interval_secs = \"soon\"").unwrap();

        let result = Config::load_from_path(&config_file);
        assert!(matches!(result, Err(ConfigError::ConfigParseError { .. })));
    }

    #[test]
    fn test_save_and_load_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("nested").join("config.toml");
        let test_config = Config {
            data_dir: PathBuf::from("/tmp/bookmarks"),
            ..Config::default()
        };

        test_config.save_to_path(&config_file).unwrap();

        let loaded_config = Config::load_from_path(&config_file).unwrap().unwrap();
        assert_eq!(loaded_config, test_config);
        assert_eq!(
            loaded_config.store_path(),
            PathBuf::from("/tmp/bookmarks/road_bookmarks_data.json")
        );
    }
}
