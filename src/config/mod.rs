mod defaults;
mod types;

pub use types::*;

use crate::error::ConfigError;
use defaults::*;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_CONFIG_FILE: &str = "medsum.yaml";

impl Default for Config {
    fn default() -> Self {
        Self {
            version: default_version(),
            provider: Provider::default(),
            providers: ProvidersConfig::default(),
            timeout_sec: default_timeout_sec(),
            concurrency: default_concurrency(),
            surgery: SurgeryConfig::default(),
            report_dir: None,
        }
    }
}

impl Config {
    /// Load config from a YAML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Load `path` if given, else `medsum.yaml` when present, else defaults
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => {
                let fallback = Path::new(DEFAULT_CONFIG_FILE);
                if fallback.is_file() {
                    Self::load(fallback)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Validate the config
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.concurrency == 0 {
            return Err(ConfigError::Invalid {
                field: "concurrency",
                reason: "must be at least 1".to_string(),
            });
        }

        if self.timeout_sec == 0 {
            return Err(ConfigError::Invalid {
                field: "timeout_sec",
                reason: "must be at least 1".to_string(),
            });
        }

        if self.surgery.recent_notes == 0 {
            return Err(ConfigError::Invalid {
                field: "surgery.recent_notes",
                reason: "must be at least 1".to_string(),
            });
        }

        if self.provider == Provider::Fixture && !self.providers.fixture.dir.is_dir() {
            return Err(ConfigError::Invalid {
                field: "providers.fixture.dir",
                reason: format!(
                    "'{}' is not a directory",
                    self.providers.fixture.dir.display()
                ),
            });
        }

        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_sec)
    }
}
