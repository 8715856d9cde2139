//! Layered settings: defaults, user config file, `--config`, environment.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use jpegfit_core::compress::{QualityBounds, MAX_QUALITY, MIN_QUALITY};
use jpegfit_core::convert::DEFAULT_CONVERT_QUALITY;
use jpegfit_core::megabytes_to_bytes;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

const CONFIG_FILE: &str = "jpegfit.toml";
const ENV_PREFIX: &str = "JPEGFIT_";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file {} does not exist", .0.display())]
    Missing(PathBuf),

    #[error(transparent)]
    Figment(#[from] Box<figment::Error>),

    #[error("invalid setting `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Default ceiling for `compress`, in megabytes.
    pub target_mb: f64,
    pub min_quality: u8,
    pub max_quality: u8,
    /// Quality used by `convert`.
    pub convert_quality: u8,
    /// Probe the maximum quality first.
    pub fast: bool,
    /// Appended to the input's stem to name the compressed output.
    pub suffix: String,
}

impl Default for Settings {
    fn default() -> Self {
        let bounds = QualityBounds::DEFAULT;
        Self {
            target_mb: 1.0,
            min_quality: bounds.low(),
            max_quality: bounds.high(),
            convert_quality: DEFAULT_CONVERT_QUALITY,
            fast: false,
            suffix: "_compressed".to_string(),
        }
    }
}

impl Settings {
    /// The platform config file, e.g. `~/.config/jpegfit/jpegfit.toml`.
    pub fn user_config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "jpegfit").map(|dirs| dirs.config_dir().join(CONFIG_FILE))
    }

    /// Build the provider stack without extracting it.
    pub fn figment(explicit: Option<&Path>) -> Result<Figment, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Settings::default()));

        if let Some(path) = Self::user_config_path() {
            debug!(path = %path.display(), "user config");
            figment = figment.merge(Toml::file(path));
        }
        if let Some(path) = explicit {
            if !path.is_file() {
                return Err(ConfigError::Missing(path.to_path_buf()));
            }
            figment = figment.merge(Toml::file(path));
        }

        Ok(figment.merge(Env::prefixed(ENV_PREFIX)))
    }

    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        Self::from_figment(&Self::figment(explicit)?)
    }

    pub fn from_figment(figment: &Figment) -> Result<Self, ConfigError> {
        let settings: Settings = figment.extract().map_err(Box::new)?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if megabytes_to_bytes(self.target_mb).is_none() {
            return Err(ConfigError::Invalid {
                key: "target_mb",
                reason: format!("{} is not a positive size", self.target_mb),
            });
        }
        self.bounds()?;
        if !(MIN_QUALITY..=MAX_QUALITY).contains(&self.convert_quality) {
            return Err(ConfigError::Invalid {
                key: "convert_quality",
                reason: format!(
                    "{} is outside {MIN_QUALITY}..={MAX_QUALITY}",
                    self.convert_quality
                ),
            });
        }
        if self.suffix.contains(std::path::is_separator) {
            return Err(ConfigError::Invalid {
                key: "suffix",
                reason: "must not contain a path separator".to_string(),
            });
        }
        Ok(())
    }

    pub fn bounds(&self) -> Result<QualityBounds, ConfigError> {
        QualityBounds::new(self.min_quality, self.max_quality).map_err(|e| ConfigError::Invalid {
            key: "min_quality/max_quality",
            reason: e.to_string(),
        })
    }
}
