use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use validator::Validate;

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    pub model: ModelSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub workers: Option<usize>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workers: None,
        }
    }
}

fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 5000 }

/// Location of the model artifact and its metadata
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ModelSettings {
    #[validate(length(min = 1))]
    pub dir: String,
    #[validate(length(min = 1))]
    pub file: String,
    #[serde(default)]
    pub metadata_file: Option<String>,
}

impl ModelSettings {
    pub fn model_path(&self) -> PathBuf {
        Path::new(&self.dir).join(&self.file)
    }

    /// Empty file names are treated as "no metadata"
    pub fn metadata_path(&self) -> Option<PathBuf> {
        self.metadata_file
            .as_deref()
            .filter(|f| !f.is_empty())
            .map(|f| Path::new(&self.dir).join(f))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl LoggingSettings {
    /// Read LOG_LEVEL and LOG_FORMAT directly, for when the layered config fails to load
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            level: lookup("LOG_LEVEL").unwrap_or_else(default_log_level),
            format: lookup("LOG_FORMAT").unwrap_or_else(default_log_format),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "json".to_string() }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Environment variables (prefixed with PREDICTOR__)
    /// 4. MODEL_DIR, MODEL_FILE, METADATA_FILE, LOG_LEVEL and LOG_FORMAT
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., PREDICTOR__MODEL__DIR -> model.dir
            .add_source(
                Environment::with_prefix("PREDICTOR")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let settings = substitute_env_vars(settings, |key| std::env::var(key).ok())?;

        Self::finish(settings)
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(
                Environment::with_prefix("PREDICTOR")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Self::finish(settings)
    }

    fn finish(settings: Config) -> Result<Self, ConfigError> {
        let settings: Settings = settings.try_deserialize()?;
        settings
            .model
            .validate()
            .map_err(|e| ConfigError::Message(format!("invalid model settings: {}", e)))?;
        Ok(settings)
    }
}

/// Apply the plain deployment variables on top of the layered config
fn substitute_env_vars<F>(settings: Config, lookup: F) -> Result<Config, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut builder = Config::builder().add_source(settings);

    for (var, key) in [
        ("MODEL_DIR", "model.dir"),
        ("MODEL_FILE", "model.file"),
        ("METADATA_FILE", "model.metadata_file"),
        ("LOG_LEVEL", "logging.level"),
        ("LOG_FORMAT", "logging.format"),
    ] {
        if let Some(value) = lookup(var) {
            builder = builder.set_override(key, value)?;
        }
    }

    builder.build()
}
