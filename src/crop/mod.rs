//! Interactive crop geometry: presets, display/source conversion, gestures
//! and typed input.

mod constrain;
mod editor;
mod handle;
mod interaction;
mod manual;
mod preset;
mod transform;

use thiserror::Error;

pub use constrain::{
    clamp_rect, constrain_to_ratio, drag_rect, fit_ratio, initial_rect, resize_rect,
};
pub use editor::CropEditor;
pub use handle::{handle_at_point, ResizeHandle, HANDLE_HIT_RADIUS};
pub use interaction::{InteractionController, InteractionState};
pub use manual::{reconcile_manual, ManualCropInput};
pub use preset::{AspectPreset, AspectRatio};
pub use transform::CoordinateTransform;

/// Smallest crop side, in display pixels.
pub const CROP_MIN_SIZE: f64 = 30.0;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CropError {
    #[error("image is not laid out yet (display size {width}x{height})")]
    InvalidDisplaySize { width: f64, height: f64 },
    #[error("source image has no pixels")]
    EmptySource,
}
