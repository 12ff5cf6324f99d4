//! CLI command implementations.

pub mod migrate;
pub mod settings;
pub mod summary;

use saasbay_admin::StartupError;
use saasbay_admin::config::ConfigError;
use saasbay_admin::store::StoreError;

/// Errors from any CLI command.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Startup(#[from] StartupError),

    #[error("record store error: {0}")]
    Store(#[from] StoreError),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("encoding error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}
