use std::path::PathBuf;

use crate::api::ApiError;
use crate::config::ConfigError;
use crate::crop::CropError;
use crate::preview::PreviewError;
use crate::session::SessionError;
use thiserror::Error;

pub type AppResult<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Crop(#[from] CropError),
    #[error(transparent)]
    Preview(#[from] PreviewError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("i/o error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl AppError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
