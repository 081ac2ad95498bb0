//! Configuration Loader
//!
//! Environment-aware configuration loading. Sources are layered in order, later
//! sources overriding earlier ones:
//!
//! 1. built-in defaults
//! 2. `config/content-engine.{toml,yaml,json}` (or the file named by
//!    `CONTENT_ENGINE_CONFIG`)
//! 3. `config/content-engine.<environment>.*` overrides
//! 4. `CONTENT_ENGINE__SECTION__KEY` environment variables

use super::error::ConfigResult;
use super::EngineConfig;
use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

const CONFIG_BASENAME: &str = "config/content-engine";
const ENV_PREFIX: &str = "CONTENT_ENGINE";

pub struct ConfigManager {
    config: EngineConfig,
    environment: String,
    source: Option<PathBuf>,
}

impl ConfigManager {
    /// Load configuration with environment auto-detection
    pub fn load() -> ConfigResult<Arc<ConfigManager>> {
        let explicit = env::var("CONTENT_ENGINE_CONFIG").ok().map(PathBuf::from);
        Self::load_from_path(explicit)
    }

    /// Load configuration from a specific file (required when given)
    pub fn load_from_path(path: Option<PathBuf>) -> ConfigResult<Arc<ConfigManager>> {
        let environment = Self::detect_environment();
        Self::load_with_env(path.as_deref(), &environment)
    }

    /// Load configuration with an explicit environment
    /// This is useful for testing without modifying global environment variables
    pub fn load_with_env(path: Option<&Path>, environment: &str) -> ConfigResult<Arc<ConfigManager>> {
        let mut builder = config::Config::builder();

        builder = match path {
            Some(path) => builder.add_source(config::File::from(path).required(true)),
            None => builder
                .add_source(config::File::with_name(CONFIG_BASENAME).required(false))
                .add_source(
                    config::File::with_name(&format!("{CONFIG_BASENAME}.{environment}"))
                        .required(false),
                ),
        };

        let raw = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: EngineConfig = raw.try_deserialize()?;
        config.validate()?;

        debug!(
            environment = environment,
            source = ?path,
            workflows = config.catalog.workflows.len(),
            "Configuration sources merged"
        );
        info!(
            environment = environment,
            default_workflow = %config.catalog.default_workflow,
            telemetry_enabled = config.telemetry.enabled,
            "Configuration loaded successfully"
        );

        Ok(Arc::new(ConfigManager {
            config,
            environment: environment.to_string(),
            source: path.map(Path::to_path_buf),
        }))
    }

    /// Wrap an already-built configuration (validated)
    pub fn from_config(config: EngineConfig) -> ConfigResult<Arc<ConfigManager>> {
        config.validate()?;
        Ok(Arc::new(ConfigManager {
            config,
            environment: Self::detect_environment(),
            source: None,
        }))
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    fn detect_environment() -> String {
        env::var("CONTENT_ENV")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string())
    }
}
