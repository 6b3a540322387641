//! Raster previews for the crop and background-removal tools.

use std::io::Cursor;

use image::{DynamicImage, GenericImageView, ImageFormat, Rgba, RgbaImage};
use thiserror::Error;

use crate::crop::{CropEditor, CropError};
use crate::geometry::{Color, DisplaySize, PixelSize, SourceRegion};

/// Longest edge of generated previews unless the caller asks otherwise.
pub const DEFAULT_PREVIEW_EDGE: u32 = 512;

#[derive(Debug, Error)]
pub enum PreviewError {
    #[error("failed to decode image: {0}")]
    Decode(#[source] image::ImageError),
    #[error("failed to encode preview: {0}")]
    Encode(#[source] image::ImageError),
    #[error("crop region {region:?} lies outside the {}x{} image", .size.width, .size.height)]
    RegionOutOfBounds {
        region: SourceRegion,
        size: PixelSize,
    },
    #[error(transparent)]
    Crop(#[from] CropError),
}

/// Backdrop shown behind a background-removed image. Preview only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackgroundOverlay {
    #[default]
    Transparent,
    Solid(Color),
}

pub fn decode_image(bytes: &[u8]) -> Result<DynamicImage, PreviewError> {
    image::load_from_memory(bytes).map_err(PreviewError::Decode)
}

pub fn encode_png(image: &DynamicImage) -> Result<Vec<u8>, PreviewError> {
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .map_err(PreviewError::Encode)?;
    Ok(bytes)
}

/// Cuts `region` out of `image` and scales it down to fit `max_edge`.
pub fn render_crop_preview(
    image: &DynamicImage,
    region: SourceRegion,
    max_edge: u32,
) -> Result<DynamicImage, PreviewError> {
    let (width, height) = image.dimensions();
    let size = PixelSize::new(width, height);
    if !region.fits_within(size) {
        return Err(PreviewError::RegionOutOfBounds { region, size });
    }
    let cropped = image.crop_imm(region.x, region.y, region.width, region.height);
    let max_edge = max_edge.max(1);
    if cropped.width() <= max_edge && cropped.height() <= max_edge {
        return Ok(cropped);
    }
    Ok(cropped.thumbnail(max_edge, max_edge))
}

/// Preview of what the crop editor currently selects.
pub fn render_editor_preview(
    image: &DynamicImage,
    editor: &mut CropEditor,
    display: DisplaySize,
    max_edge: u32,
) -> Result<DynamicImage, PreviewError> {
    let region = editor.source_region(display)?;
    render_crop_preview(image, region, max_edge)
}

/// Alpha-composites `image` over the overlay color.
pub fn composite_overlay(image: &DynamicImage, overlay: BackgroundOverlay) -> RgbaImage {
    let mut rgba = image.to_rgba8();
    let BackgroundOverlay::Solid(color) = overlay else {
        return rgba;
    };
    let (bg_r, bg_g, bg_b) = color.rgb();
    for pixel in rgba.pixels_mut() {
        let Rgba([r, g, b, a]) = *pixel;
        let alpha = u32::from(a);
        let blend = |fg: u8, bg: u8| -> u8 {
            ((u32::from(fg) * alpha + u32::from(bg) * (255 - alpha) + 127) / 255) as u8
        };
        *pixel = Rgba([blend(r, bg_r), blend(g, bg_g), blend(b, bg_b), 255]);
    }
    rgba
}
