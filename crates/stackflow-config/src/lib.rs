pub mod error;

pub use error::*;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Environment variable naming the settings file directly
pub const CONFIG_PATH_ENV: &str = "STACKFLOW_CONFIG_PATH";

const CANDIDATES: [&str; 2] = ["stackflow.local.yaml", "stackflow.yaml"];

/// User settings loaded from `stackflow.yaml`
///
/// Every field is optional; the CLI falls back to its own defaults and
/// command-line flags override whatever is set here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// AWS region, e.g. `ap-northeast-1`
    pub region: Option<String>,

    /// Named profile from the shared AWS config files
    pub profile: Option<String>,

    pub poll_interval_secs: Option<u64>,

    pub max_wait_secs: Option<u64>,

    pub retry: RetrySettings,

    /// Default parameter values per stack name
    pub parameters: BTreeMap<String, BTreeMap<String, String>>,
}

/// Retry policy overrides for transient API failures
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RetrySettings {
    pub max_attempts: Option<u32>,
    pub initial_delay_ms: Option<u64>,
    pub max_delay_ms: Option<u64>,
    pub backoff_multiplier: Option<f64>,
}

impl RetrySettings {
    fn check(&self) -> std::result::Result<(), String> {
        match self.backoff_multiplier {
            Some(m) if !m.is_finite() || m < 1.0 => Err(format!(
                "retry.backoff_multiplier must be a finite number >= 1, got {}",
                m
            )),
            _ => Ok(()),
        }
    }
}

impl Settings {
    /// Parameter defaults configured for `stack`
    pub fn parameters_for(&self, stack: &str) -> impl Iterator<Item = (&str, &str)> {
        self.parameters
            .get(stack)
            .into_iter()
            .flat_map(|values| values.iter().map(|(k, v)| (k.as_str(), v.as_str())))
    }
}

/// StackFlow's global configuration directory (`~/.config/stackflow`)
pub fn get_config_dir() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .ok_or(ConfigError::ConfigDirNotFound)?
        .join("stackflow");
    Ok(config_dir)
}

/// Locate the settings file
///
/// Search order:
/// 1. `STACKFLOW_CONFIG_PATH`
/// 2. current directory: `stackflow.local.yaml`, `stackflow.yaml`
/// 3. `~/.config/stackflow/config.yaml`
pub fn find_config_file() -> Result<PathBuf> {
    if let Ok(config_path) = std::env::var(CONFIG_PATH_ENV) {
        let path = PathBuf::from(config_path);
        if path.exists() {
            return Ok(path);
        }
        tracing::warn!("{} points to a missing file: {}", CONFIG_PATH_ENV, path.display());
    }

    let current_dir = std::env::current_dir()?;
    for filename in &CANDIDATES {
        let path = current_dir.join(filename);
        if path.exists() {
            return Ok(path);
        }
    }

    if let Ok(config_dir) = get_config_dir() {
        let global_config = config_dir.join("config.yaml");
        if global_config.exists() {
            return Ok(global_config);
        }
    }

    Err(ConfigError::ConfigFileNotFound)
}

/// Read settings from `path`
pub fn load(path: &Path) -> Result<Settings> {
    let content = std::fs::read_to_string(path)?;
    let settings = serde_yaml::from_str::<Option<Settings>>(&content)
        .map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?
        .unwrap_or_default();
    settings
        .retry
        .check()
        .map_err(|reason| ConfigError::Invalid {
            path: path.to_path_buf(),
            reason,
        })?;
    tracing::debug!("Loaded settings from {}", path.display());
    Ok(settings)
}

/// Find and read the settings file, or return defaults when there is none
pub fn load_settings() -> Result<Settings> {
    match find_config_file() {
        Ok(path) => load(&path),
        Err(ConfigError::ConfigFileNotFound) => Ok(Settings::default()),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs;

    #[test]
    fn test_get_config_dir() {
        let config_dir = get_config_dir().unwrap();
        assert!(config_dir.ends_with("stackflow"));
    }

    #[test]
    fn test_load_full_settings() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("stackflow.yaml");
        fs::write(
            &path,
            r#"
region: ap-northeast-1
profile: staging
poll_interval_secs: 5
max_wait_secs: 1800
retry:
  max_attempts: 5
  initial_delay_ms: 500
parameters:
  sample:
    VpcCidr: 10.0.0.0/16
"#,
        )
        .unwrap();

        let settings = load(&path).unwrap();
        assert_eq!(settings.region.as_deref(), Some("ap-northeast-1"));
        assert_eq!(settings.profile.as_deref(), Some("staging"));
        assert_eq!(settings.poll_interval_secs, Some(5));
        assert_eq!(settings.max_wait_secs, Some(1800));
        assert_eq!(settings.retry.max_attempts, Some(5));
        assert_eq!(settings.retry.initial_delay_ms, Some(500));
        assert_eq!(settings.retry.max_delay_ms, None);

        let sample: Vec<_> = settings.parameters_for("sample").collect();
        assert_eq!(sample, vec![("VpcCidr", "10.0.0.0/16")]);
        assert_eq!(settings.parameters_for("vpc").count(), 0);
    }

    #[test]
    fn test_load_empty_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("stackflow.yaml");
        fs::write(&path, "").unwrap();

        assert_eq!(load(&path).unwrap(), Settings::default());
    }

    #[test]
    fn test_load_rejects_unknown_keys() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("stackflow.yaml");
        fs::write(&path, "regoin: us-east-1\n").unwrap();

        match load(&path) {
            Err(ConfigError::Parse { path: p, .. }) => assert_eq!(p, path),
            other => panic!("Expected Parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_load_rejects_bad_backoff_multiplier() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("stackflow.yaml");

        for value in ["-2", ".nan", "0.5"] {
            fs::write(&path, format!("retry:\n  backoff_multiplier: {}\n", value)).unwrap();
            match load(&path) {
                Err(ConfigError::Invalid { reason, .. }) => {
                    assert!(reason.contains("backoff_multiplier"))
                }
                other => panic!("Expected Invalid error for {}, got {:?}", value, other),
            }
        }

        fs::write(&path, "retry:\n  backoff_multiplier: 1.5\n").unwrap();
        assert_eq!(load(&path).unwrap().retry.backoff_multiplier, Some(1.5));
    }

    #[test]
    #[serial]
    fn test_find_config_file_in_current_dir() {
        let temp_dir = tempfile::tempdir().unwrap();
        let original_dir = std::env::current_dir().unwrap();

        fs::write(temp_dir.path().join("stackflow.yaml"), "region: us-east-1\n").unwrap();
        std::env::set_current_dir(&temp_dir).unwrap();

        let result = find_config_file();
        std::env::set_current_dir(original_dir).unwrap();

        assert!(result.unwrap().ends_with("stackflow.yaml"));
    }

    #[test]
    #[serial]
    fn test_find_config_file_local_priority() {
        let temp_dir = tempfile::tempdir().unwrap();
        let original_dir = std::env::current_dir().unwrap();

        fs::write(temp_dir.path().join("stackflow.yaml"), "region: us-east-1\n").unwrap();
        fs::write(
            temp_dir.path().join("stackflow.local.yaml"),
            "region: ap-northeast-1\n",
        )
        .unwrap();
        std::env::set_current_dir(&temp_dir).unwrap();

        let result = find_config_file();
        std::env::set_current_dir(original_dir).unwrap();

        // stackflow.local.yaml wins
        assert!(result.unwrap().ends_with("stackflow.local.yaml"));
    }

    #[test]
    #[serial]
    fn test_find_config_file_env_var() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config_path = temp_dir.path().join("custom.yaml");
        fs::write(&config_path, "profile: ci\n").unwrap();

        unsafe {
            std::env::set_var(CONFIG_PATH_ENV, config_path.to_str().unwrap());
        }

        let result = find_config_file();
        let settings = load_settings();

        unsafe {
            std::env::remove_var(CONFIG_PATH_ENV);
        }

        assert_eq!(result.unwrap(), config_path);
        assert_eq!(settings.unwrap().profile.as_deref(), Some("ci"));
    }

    #[test]
    #[serial]
    fn test_load_settings_defaults_without_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let original_dir = std::env::current_dir().unwrap();
        std::env::set_current_dir(&temp_dir).unwrap();

        let found = find_config_file();
        let settings = load_settings();
        std::env::set_current_dir(original_dir).unwrap();

        // A global ~/.config/stackflow/config.yaml may exist on the machine
        if matches!(found, Err(ConfigError::ConfigFileNotFound)) {
            assert_eq!(settings.unwrap(), Settings::default());
        } else {
            assert!(found.unwrap().ends_with("config.yaml"));
        }
    }
}
