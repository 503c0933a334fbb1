//! Shared configuration for the revsent workspace.

mod app_config;
mod config;

use thiserror::Error;

pub use app_config::{AppConfig, ClassifierBackend};
pub use config::{load_app_config, load_app_config_from_env, load_app_config_with_overrides};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
