use thiserror::Error;

use super::state::{SessionEvent, SessionPhase};
use super::ToolKind;
use crate::api::ApiError;
use crate::geometry::{PixelSize, SourceRegion};

pub type StateResult<T> = std::result::Result<T, StateError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
    #[error("invalid session transition: from {from:?} using event {event:?}")]
    InvalidTransition {
        from: SessionPhase,
        event: SessionEvent,
    },
}

/// Problems caught before any network call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Invalid file type {mime}. Only JPG, PNG, WEBP allowed.")]
    UnsupportedType { mime: String },
    #[error("File too large ({size} bytes). Max 10MB allowed.")]
    FileTooLarge { size: u64 },
    #[error("could not read image: {message}")]
    UnreadableImage { message: String },
    #[error("{field} is required")]
    MissingField { field: &'static str },
    #[error("{field} must be between {min} and {max}, got {value}")]
    OutOfRange {
        field: &'static str,
        value: u64,
        min: u64,
        max: u64,
    },
    #[error("output of {width}x{height} exceeds the {limit}px limit")]
    OutputTooLarge { width: u64, height: u64, limit: u32 },
    #[error("crop region {region:?} lies outside the {}x{} image", .size.width, .size.height)]
    RegionOutOfBounds {
        region: SourceRegion,
        size: PixelSize,
    },
    #[error("upload an image first")]
    NoSourceImage,
    #[error("no processed image to download")]
    NoResult,
}

pub type SessionResult<T> = std::result::Result<T, SessionError>;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("processed image could not be loaded: {message}")]
    AssetLoad { message: String },
    #[error("a {tool} request is already in progress")]
    Busy { tool: ToolKind },
    #[error(transparent)]
    State(#[from] StateError),
}

impl SessionError {
    /// Local errors never reached the network and left the session untouched.
    pub const fn is_local(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::Busy { .. })
    }
}
