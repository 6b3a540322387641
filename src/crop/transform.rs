use crate::geometry::{CropRect, DisplaySize, PixelSize, Point, SourceRegion};

use super::CropError;

/// Linear mapping between display pixels and source pixels.
///
/// Built from the current layout every time it is needed; callers never keep
/// one across a layout change.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateTransform {
    scale: f64,
}

impl CoordinateTransform {
    pub fn from_layout(display: DisplaySize, source: PixelSize) -> Result<Self, CropError> {
        if !display.is_usable() {
            return Err(CropError::InvalidDisplaySize {
                width: display.width,
                height: display.height,
            });
        }
        if source.width == 0 || source.height == 0 {
            return Err(CropError::EmptySource);
        }
        Ok(Self {
            scale: f64::from(source.width) / display.width,
        })
    }

    pub const fn scale(&self) -> f64 {
        self.scale
    }

    pub fn to_source(&self, value: f64) -> f64 {
        value * self.scale
    }

    pub fn to_display(&self, value: f64) -> f64 {
        value / self.scale
    }

    pub fn point_to_source(&self, point: Point) -> Point {
        Point::new(self.to_source(point.x), self.to_source(point.y))
    }

    pub fn point_to_display(&self, point: Point) -> Point {
        Point::new(self.to_display(point.x), self.to_display(point.y))
    }

    /// Rounds a display rectangle to whole source pixels inside `source`.
    pub fn rect_to_source_region(&self, rect: CropRect, source: PixelSize) -> SourceRegion {
        let max_x = source.width.saturating_sub(1);
        let max_y = source.height.saturating_sub(1);
        let x = round_to_u32(self.to_source(rect.x)).min(max_x);
        let y = round_to_u32(self.to_source(rect.y)).min(max_y);
        let width = round_to_u32(self.to_source(rect.width))
            .max(1)
            .min(source.width - x);
        let height = round_to_u32(self.to_source(rect.height))
            .max(1)
            .min(source.height - y);
        SourceRegion::new(x, y, width, height)
    }
}

fn round_to_u32(value: f64) -> u32 {
    if value.is_finite() && value > 0.0 {
        value.round().min(f64::from(u32::MAX)) as u32
    } else {
        0
    }
}
