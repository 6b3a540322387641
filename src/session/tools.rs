use std::fmt;

use super::error::ValidationError;
use super::upload::SourceImage;
use super::ToolKind;
use crate::api::{AssetRef, OutputFormat, ProcessRequest, ResizeMode, ScaleFactor};
use crate::geometry::{PixelSize, SourceRegion};
use crate::preview::BackgroundOverlay;

/// Largest output edge any tool may request.
pub const MAX_OUTPUT_DIMENSION: u32 = 10_000;
pub const MAX_EDGE_ADJUSTMENT: u8 = 20;
pub const DEFAULT_JPEG_QUALITY: u8 = 90;

/// Per-tool behaviour plugged into [`super::ToolSession`].
pub trait ImageTool: fmt::Debug {
    const KIND: ToolKind;
    /// Whether a result replaces the source for the next request.
    const CHAINS_SOURCE: bool = false;

    type Params: Clone + Default + PartialEq + fmt::Debug;

    fn validate(params: &Self::Params, source: &SourceImage) -> Result<(), ValidationError>;

    fn request(asset: AssetRef, params: &Self::Params) -> ProcessRequest;

    /// Adjusts parameters after a new source image arrives.
    fn on_source_loaded(_params: &mut Self::Params, _source: PixelSize) {}
}

fn check_range(field: &'static str, value: u64, min: u64, max: u64) -> Result<(), ValidationError> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(ValidationError::OutOfRange {
            field,
            value,
            min,
            max,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemoveBackground;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RemoveBackgroundParams {
    pub softness: u8,
    pub feather: u8,
    pub overlay: BackgroundOverlay,
}

impl ImageTool for RemoveBackground {
    const KIND: ToolKind = ToolKind::RemoveBackground;
    type Params = RemoveBackgroundParams;

    fn validate(params: &Self::Params, _source: &SourceImage) -> Result<(), ValidationError> {
        let max = u64::from(MAX_EDGE_ADJUSTMENT);
        check_range("softness", u64::from(params.softness), 0, max)?;
        check_range("feather", u64::from(params.feather), 0, max)
    }

    fn request(asset: AssetRef, params: &Self::Params) -> ProcessRequest {
        ProcessRequest::RemoveBackground {
            asset,
            softness: params.softness,
            feather: params.feather,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Crop;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CropParams {
    pub region: Option<SourceRegion>,
}

impl ImageTool for Crop {
    const KIND: ToolKind = ToolKind::Crop;
    const CHAINS_SOURCE: bool = true;
    type Params = CropParams;

    fn validate(params: &Self::Params, source: &SourceImage) -> Result<(), ValidationError> {
        let region = params
            .region
            .ok_or(ValidationError::MissingField { field: "crop region" })?;
        if !region.fits_within(source.dimensions) {
            return Err(ValidationError::RegionOutOfBounds {
                region,
                size: source.dimensions,
            });
        }
        Ok(())
    }

    fn request(asset: AssetRef, params: &Self::Params) -> ProcessRequest {
        ProcessRequest::Crop {
            asset,
            region: params.region.unwrap_or(SourceRegion::new(0, 0, 0, 0)),
        }
    }

    fn on_source_loaded(params: &mut Self::Params, source: PixelSize) {
        params.region = Some(SourceRegion::centered_default(source));
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResizeParams {
    pub width: u32,
    pub height: u32,
    pub mode: ResizeMode,
    pub format: OutputFormat,
    pub quality: u8,
}

impl Default for ResizeParams {
    fn default() -> Self {
        Self {
            width: 0,
            height: 0,
            mode: ResizeMode::default(),
            format: OutputFormat::default(),
            quality: DEFAULT_JPEG_QUALITY,
        }
    }
}

impl ResizeParams {
    /// Sets the width and derives the height from the source proportions.
    pub fn lock_width(&mut self, width: u32, source: PixelSize) {
        self.width = width;
        self.height = scaled_edge(width, source.height, source.width);
    }

    /// Sets the height and derives the width from the source proportions.
    pub fn lock_height(&mut self, height: u32, source: PixelSize) {
        self.height = height;
        self.width = scaled_edge(height, source.width, source.height);
    }
}

fn scaled_edge(value: u32, numerator: u32, denominator: u32) -> u32 {
    if denominator == 0 {
        return value;
    }
    let scaled = (f64::from(value) * f64::from(numerator) / f64::from(denominator)).round();
    (scaled.min(f64::from(u32::MAX)) as u32).max(1)
}

impl ImageTool for Resize {
    const KIND: ToolKind = ToolKind::Resize;
    type Params = ResizeParams;

    fn validate(params: &Self::Params, _source: &SourceImage) -> Result<(), ValidationError> {
        let max = u64::from(MAX_OUTPUT_DIMENSION);
        check_range("width", u64::from(params.width), 1, max)?;
        check_range("height", u64::from(params.height), 1, max)?;
        if params.format.uses_quality() {
            check_range("quality", u64::from(params.quality), 1, 100)?;
        }
        Ok(())
    }

    fn request(asset: AssetRef, params: &Self::Params) -> ProcessRequest {
        ProcessRequest::Resize {
            asset,
            width: params.width,
            height: params.height,
            mode: params.mode,
            format: params.format,
            quality: params.quality,
        }
    }

    fn on_source_loaded(params: &mut Self::Params, source: PixelSize) {
        params.width = source.width;
        params.height = source.height;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Upscale;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UpscaleParams {
    pub scale: ScaleFactor,
}

/// Whether upscaling `source` by `scale` stays within the output limit.
pub fn scale_available(scale: ScaleFactor, source: PixelSize) -> bool {
    u64::from(source.longest_edge()) * u64::from(scale.factor()) <= u64::from(MAX_OUTPUT_DIMENSION)
}

/// Every scale option with its enabled flag, smallest first.
pub fn scale_options(source: PixelSize) -> [(ScaleFactor, bool); 3] {
    ScaleFactor::ALL.map(|scale| (scale, scale_available(scale, source)))
}

impl ImageTool for Upscale {
    const KIND: ToolKind = ToolKind::Upscale;
    type Params = UpscaleParams;

    fn validate(params: &Self::Params, source: &SourceImage) -> Result<(), ValidationError> {
        if scale_available(params.scale, source.dimensions) {
            return Ok(());
        }
        let factor = u64::from(params.scale.factor());
        Err(ValidationError::OutputTooLarge {
            width: u64::from(source.dimensions.width) * factor,
            height: u64::from(source.dimensions.height) * factor,
            limit: MAX_OUTPUT_DIMENSION,
        })
    }

    fn request(asset: AssetRef, params: &Self::Params) -> ProcessRequest {
        ProcessRequest::Upscale {
            asset,
            scale: params.scale,
        }
    }

    /// Demotes an invalid selection to the next smaller scale, stopping at 2x.
    fn on_source_loaded(params: &mut Self::Params, source: PixelSize) {
        while !scale_available(params.scale, source) {
            let Some(smaller) = params.scale.smaller() else {
                break;
            };
            tracing::debug!(from = ?params.scale, to = ?smaller, "demoting upscale factor");
            params.scale = smaller;
        }
    }
}
