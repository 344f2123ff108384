use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use anyhow::Context;
use batch_engine::ServiceSettings;
use engine_logging::{engine_info, engine_warn};
use log::LevelFilter;
use serde::Deserialize;

pub const DEFAULT_CONFIG_FILENAME: &str = "batchconv.ron";

/// Settings read from `batchconv.ron`. Every field is optional in the file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub service_url: String,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub log_level: String,
    pub log_file: Option<PathBuf>,
    pub download_dir: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        let service = ServiceSettings::default();
        Self {
            service_url: service.base_url,
            connect_timeout_secs: service.connect_timeout.as_secs(),
            request_timeout_secs: service.request_timeout.as_secs(),
            log_level: "warn".to_string(),
            log_file: None,
            download_dir: None,
        }
    }
}

impl AppConfig {
    /// Load from `explicit` if given, otherwise from `batchconv.ron` in the
    /// working directory when it exists.
    pub fn load(explicit: Option<&Path>) -> anyhow::Result<Self> {
        match explicit {
            Some(path) => {
                let content = fs::read_to_string(path)
                    .with_context(|| format!("cannot read config file {}", path.display()))?;
                ron::from_str(&content)
                    .with_context(|| format!("invalid config file {}", path.display()))
            }
            None => Ok(Self::load_implicit(Path::new(DEFAULT_CONFIG_FILENAME))),
        }
    }

    fn load_implicit(path: &Path) -> Self {
        let content = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == ErrorKind::NotFound => return Self::default(),
            Err(err) => {
                engine_warn!("Failed to read config from {:?}: {}", path, err);
                return Self::default();
            }
        };
        match ron::from_str(&content) {
            Ok(config) => {
                engine_info!("Loaded config from {:?}", path);
                config
            }
            Err(err) => {
                engine_warn!("Failed to parse config from {:?}: {}", path, err);
                Self::default()
            }
        }
    }

    pub fn service_settings(&self) -> ServiceSettings {
        ServiceSettings {
            base_url: self.service_url.clone(),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            ..ServiceSettings::default()
        }
    }

    /// Unknown level names fall back to `warn`.
    pub fn level_filter(&self) -> LevelFilter {
        LevelFilter::from_str(self.log_level.trim()).unwrap_or(LevelFilter::Warn)
    }
}
