use thiserror::Error;

use easel::EaselError;

use crate::{config::ConfigError, session::SessionError};

/// Errors returned by [`run`](crate::run).
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error(transparent)]
    Easel(#[from] EaselError),
}
