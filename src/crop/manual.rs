use crate::geometry::{CropRect, DisplaySize};

use super::constrain::{fit_ratio, min_side};
use super::{AspectRatio, CoordinateTransform};

const DEFAULT_POSITION: f64 = 0.0;
const DEFAULT_SIZE: f64 = 100.0;

/// Typed crop fields in source pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ManualCropInput {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl ManualCropInput {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Lenient parse: empty or malformed fields fall back to 0 for position
    /// and 100 for size.
    pub fn parse(x: &str, y: &str, width: &str, height: &str) -> Self {
        Self {
            x: parse_field(x, DEFAULT_POSITION).max(0.0),
            y: parse_field(y, DEFAULT_POSITION).max(0.0),
            width: parse_field(width, DEFAULT_SIZE),
            height: parse_field(height, DEFAULT_SIZE),
        }
    }
}

fn parse_field(raw: &str, fallback: f64) -> f64 {
    finite_or(raw.trim().parse::<f64>().unwrap_or(fallback), fallback)
}

fn finite_or(value: f64, fallback: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        fallback
    }
}

/// Converts typed source-pixel fields into display geometry.
///
/// Position is clamped to `[0, display - 30]`, size to
/// `[30, display - position]`. With a ratio, the same tie-break as corner
/// resizing is applied with the top-left corner anchored, then the result is
/// scaled down if it no longer fits.
pub fn reconcile_manual(
    input: ManualCropInput,
    transform: CoordinateTransform,
    display: DisplaySize,
    ratio: Option<AspectRatio>,
) -> CropRect {
    let min_width = min_side(display.width);
    let min_height = min_side(display.height);
    let input = ManualCropInput::new(
        finite_or(input.x, DEFAULT_POSITION),
        finite_or(input.y, DEFAULT_POSITION),
        finite_or(input.width, DEFAULT_SIZE),
        finite_or(input.height, DEFAULT_SIZE),
    );

    let x = transform
        .to_display(input.x)
        .clamp(0.0, (display.width - min_width).max(0.0));
    let y = transform
        .to_display(input.y)
        .clamp(0.0, (display.height - min_height).max(0.0));
    let max_width = (display.width - x).max(min_width);
    let max_height = (display.height - y).max(min_height);
    let mut width = transform.to_display(input.width).clamp(min_width, max_width);
    let mut height = transform
        .to_display(input.height)
        .clamp(min_height, max_height);

    if let Some(ratio) = ratio {
        (width, height) = fit_ratio(width, height, ratio);
        let grow = (min_width / width).max(min_height / height).max(1.0);
        let shrink = (max_width / (width * grow)).min(max_height / (height * grow)).min(1.0);
        width = (width * grow * shrink).max(min_width);
        height = (height * grow * shrink).max(min_height);
    }

    CropRect::new(x, y, width, height)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::PixelSize;

    const DISPLAY: DisplaySize = DisplaySize::new(800.0, 600.0);

    fn half_scale() -> CoordinateTransform {
        CoordinateTransform::from_layout(DISPLAY, PixelSize::new(1600, 1200))
            .expect("layout should be valid")
    }

    #[test]
    fn typed_source_fields_convert_to_display_space() {
        let input = ManualCropInput::parse("10", "10", "200", "150");
        let rect = reconcile_manual(input, half_scale(), DISPLAY, None);
        assert_eq!(rect, CropRect::new(5.0, 5.0, 100.0, 75.0));
    }

    #[test]
    fn malformed_fields_fall_back_to_defaults() {
        let input = ManualCropInput::parse("", "abc", "  ", "NaN");
        assert_eq!(input, ManualCropInput::new(0.0, 0.0, 100.0, 100.0));
        let negative = ManualCropInput::parse("-20", "4.5", "-1", "60");
        assert_eq!(negative, ManualCropInput::new(0.0, 4.5, -1.0, 60.0));
    }

    #[test]
    fn reconcile_clamps_position_and_size() {
        let input = ManualCropInput::new(5000.0, 5000.0, 10.0, 5000.0);
        let rect = reconcile_manual(input, half_scale(), DISPLAY, None);
        assert_eq!(rect, CropRect::new(770.0, 570.0, 30.0, 30.0));

        let input = ManualCropInput::new(200.0, 0.0, 4000.0, 4000.0);
        let rect = reconcile_manual(input, half_scale(), DISPLAY, None);
        assert_eq!(rect, CropRect::new(100.0, 0.0, 700.0, 600.0));
    }

    #[test]
    fn reconcile_applies_ratio_and_stays_in_bounds() {
        let ratio = AspectRatio::new(16.0, 9.0).expect("ratio should be valid");
        let input = ManualCropInput::new(0.0, 0.0, 1600.0, 400.0);
        let rect = reconcile_manual(input, half_scale(), DISPLAY, Some(ratio));
        assert!((rect.height - 200.0).abs() < 1e-9);
        assert!((rect.width / rect.height - ratio.value()).abs() < 1e-9);

        let input = ManualCropInput::new(1000.0, 0.0, 1600.0, 1200.0);
        let rect = reconcile_manual(input, half_scale(), DISPLAY, Some(ratio));
        assert!(rect.right() <= DISPLAY.width + 1e-9);
        assert!((rect.width / rect.height - ratio.value()).abs() < 1e-9);
    }

    #[test]
    fn non_finite_fields_are_replaced_before_reconciling() {
        let input = ManualCropInput::new(f64::NAN, f64::INFINITY, f64::NAN, f64::NEG_INFINITY);
        let rect = reconcile_manual(input, half_scale(), DISPLAY, None);
        assert_eq!(rect, CropRect::new(0.0, 0.0, 50.0, 50.0));

        let ratio = AspectRatio::new(1.0, 1.0).expect("ratio should be valid");
        let rect = reconcile_manual(input, half_scale(), DISPLAY, Some(ratio));
        assert!(rect.x.is_finite() && rect.width.is_finite() && rect.height.is_finite());
    }
}
