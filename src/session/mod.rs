//! Per-tool session controllers: upload, configure, process, download.

mod controller;
mod error;
mod machine;
mod state;
pub mod tools;
mod upload;

use std::fmt;

pub use controller::{
    execute_process, Completion, DownloadedFile, PendingProcess, PendingUpload, ResultAsset,
    ToolSession,
};
pub use error::{SessionError, SessionResult, StateError, StateResult, ValidationError};
pub use machine::SessionMachine;
pub use state::{PhaseTransition, SessionEvent, SessionPhase};
pub use tools::{
    Crop, CropParams, ImageTool, RemoveBackground, RemoveBackgroundParams, Resize, ResizeParams,
    Upscale, UpscaleParams,
};
pub use upload::{
    read_dimensions, validate_upload, LocalImage, SourceImage, ValidatedUpload,
    ALLOWED_MIME_TYPES, MAX_UPLOAD_BYTES,
};

#[cfg(test)]
pub(crate) use upload::png_bytes;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolKind {
    RemoveBackground,
    Crop,
    Resize,
    Upscale,
}

impl ToolKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::RemoveBackground => "remove-bg",
            Self::Crop => "crop",
            Self::Resize => "resize",
            Self::Upscale => "upscale",
        }
    }
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

pub type RemoveBackgroundSession = ToolSession<RemoveBackground>;
pub type CropSession = ToolSession<Crop>;
pub type ResizeSession = ToolSession<Resize>;
pub type UpscaleSession = ToolSession<Upscale>;
