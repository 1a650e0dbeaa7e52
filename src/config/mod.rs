// Configuration module entry point
// Loads layered configuration and dumps the effective settings

mod types;

pub use types::{ConditionalConfig, Config, GzipConfig, LoggingConfig};

use crate::error::Result;

impl Config {
    /// Load configuration from specified file path (without extension)
    ///
    /// The file is optional. Environment variables prefixed with
    /// `CONDITIONAL` override it, using `__` between section and key
    /// (e.g. `CONDITIONAL_GZIP__LEVEL=6`).
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        let settings = Self::defaults()?
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix("CONDITIONAL")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        settings.try_deserialize()
    }

    /// Parse configuration from an inline TOML document
    pub fn from_toml_str(toml: &str) -> Result<Self, config::ConfigError> {
        let settings = Self::defaults()?
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()?;

        settings.try_deserialize()
    }

    /// Serialize the effective configuration as TOML
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    fn defaults() -> Result<config::ConfigBuilder<config::builder::DefaultState>, config::ConfigError> {
        config::Config::builder()
            .set_default("conditional.enforce_preconditions", false)?
            .set_default("conditional.safe_methods", vec!["GET", "HEAD"])?
            .set_default("gzip.level", 9)?
            .set_default("gzip.min_length", 0)?
            .set_default("logging.level", "info")?
            .set_default("logging.decision_log", false)?
            .set_default("logging.decision_log_format", "text")
    }
}
