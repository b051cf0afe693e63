use serde::Deserialize;
use std::{collections::BTreeMap, fs, path::Path, time::Duration};
use thiserror::Error as ThisError;

/// Serializer bound to a model that names none.
pub const DEFAULT_SERIALIZER: &str = "json";

///
/// ConfigError
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {message}")]
    Read { path: String, message: String },

    #[error("failed to parse config: {0}")]
    Parse(String),

    #[error("invalid config for '{scope}': {message}")]
    Invalid { scope: String, message: String },
}

///
/// ModelConfig
///
/// Operational settings for one model. Every key is optional.
///
/// ```toml
/// serializer = "msgpack"
/// ttl_secs = 300
/// key_template = "user:%s"
/// ```
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ModelConfig {
    pub serializer: Option<String>,
    pub ttl_secs: Option<u64>,
    pub key_template: Option<String>,
}

impl ModelConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate("model")?;

        Ok(config)
    }

    #[must_use]
    pub fn serializer_name(&self) -> &str {
        self.serializer.as_deref().unwrap_or(DEFAULT_SERIALIZER)
    }

    #[must_use]
    pub fn ttl(&self) -> Option<Duration> {
        self.ttl_secs.map(Duration::from_secs)
    }

    fn validate(&self, scope: &str) -> Result<(), ConfigError> {
        let invalid = |message: &str| ConfigError::Invalid {
            scope: scope.to_string(),
            message: message.to_string(),
        };

        if self.serializer.as_deref().is_some_and(str::is_empty) {
            return Err(invalid("serializer name is empty"));
        }
        if self.ttl_secs == Some(0) {
            return Err(invalid("ttl_secs must be positive; omit it for no expiry"));
        }
        if self.key_template.as_deref().is_some_and(|t| !t.contains("%s")) {
            return Err(invalid("key_template has no %s placeholder"));
        }

        Ok(())
    }
}

///
/// CacheConfig
///
/// File-level settings: a `[models.<name>]` table per model.
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct CacheConfig {
    pub models: BTreeMap<String, ModelConfig>,
}

impl CacheConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        for (name, model) in &config.models {
            model.validate(name)?;
        }

        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        Self::from_toml_str(&text)
    }

    #[must_use]
    pub fn model(&self, name: &str) -> Option<&ModelConfig> {
        self.models.get(name)
    }
}
