//! Rectangle arithmetic shared by gestures, manual input and layout changes.
//!
//! Every function takes the previous rectangle by value and returns a new one;
//! nothing here keeps state between calls.

use crate::geometry::{CropRect, DisplaySize};

use super::{AspectRatio, ResizeHandle, CROP_MIN_SIZE};

const INITIAL_COVERAGE: f64 = 0.8;

/// Minimum side length along an axis of `extent` display pixels.
pub(crate) fn min_side(extent: f64) -> f64 {
    CROP_MIN_SIZE.min(extent.max(0.0))
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

/// Shrinks one side so that `width / height == ratio`.
///
/// When the current shape is wider than the target the width is derived from
/// the height, otherwise the height is derived from the width.
pub fn fit_ratio(width: f64, height: f64, ratio: AspectRatio) -> (f64, f64) {
    let target = ratio.value();
    if height <= 0.0 || width / height > target {
        (height * target, height)
    } else {
        (width, width / target)
    }
}

/// Scales `(width, height)` up uniformly until both sides reach the floor.
fn lift_to_floor(width: f64, height: f64, min_width: f64, min_height: f64) -> (f64, f64) {
    if width <= 0.0 || height <= 0.0 {
        return (width.max(min_width), height.max(min_height));
    }
    let factor = (min_width / width).max(min_height / height).max(1.0);
    (width * factor, height * factor)
}

/// Scales `(width, height)` down uniformly until both sides fit.
fn shrink_to_fit(width: f64, height: f64, max_width: f64, max_height: f64) -> (f64, f64) {
    if width <= 0.0 || height <= 0.0 {
        return (width.min(max_width), height.min(max_height));
    }
    let factor = (max_width / width).min(max_height / height).min(1.0).max(0.0);
    (width * factor, height * factor)
}

fn ratio_size(
    width: f64,
    height: f64,
    ratio: AspectRatio,
    display: DisplaySize,
) -> (f64, f64) {
    let (width, height) = fit_ratio(width, height, ratio);
    let (width, height) = lift_to_floor(
        width,
        height,
        min_side(display.width),
        min_side(display.height),
    );
    shrink_to_fit(width, height, display.width, display.height)
}

/// Keeps size within `[min, display]` and position within `[0, display - size]`.
pub fn clamp_rect(rect: CropRect, display: DisplaySize) -> CropRect {
    let width = finite_or_zero(rect.width).clamp(min_side(display.width), display.width.max(0.0));
    let height =
        finite_or_zero(rect.height).clamp(min_side(display.height), display.height.max(0.0));
    let x = finite_or_zero(rect.x).clamp(0.0, (display.width - width).max(0.0));
    let y = finite_or_zero(rect.y).clamp(0.0, (display.height - height).max(0.0));
    CropRect::new(x, y, width, height)
}

/// Rectangle created when an image is first laid out.
pub fn initial_rect(display: DisplaySize, ratio: Option<AspectRatio>) -> CropRect {
    let width = display.width * INITIAL_COVERAGE;
    let height = display.height * INITIAL_COVERAGE;
    let (width, height) = match ratio {
        Some(ratio) => ratio_size(width, height, ratio, display),
        None => (width, height),
    };
    clamp_rect(
        CropRect::new(
            (display.width - width) / 2.0,
            (display.height - height) / 2.0,
            width,
            height,
        ),
        display,
    )
}

/// Re-shapes `rect` around its center after the aspect ratio changes.
pub fn constrain_to_ratio(rect: CropRect, display: DisplaySize, ratio: AspectRatio) -> CropRect {
    let (width, height) = ratio_size(rect.width, rect.height, ratio, display);
    let center = rect.center();
    clamp_rect(
        CropRect::new(
            center.x - width / 2.0,
            center.y - height / 2.0,
            width,
            height,
        ),
        display,
    )
}

pub fn drag_rect(origin: CropRect, delta_x: f64, delta_y: f64, display: DisplaySize) -> CropRect {
    let x =
        (origin.x + finite_or_zero(delta_x)).clamp(0.0, (display.width - origin.width).max(0.0));
    let y =
        (origin.y + finite_or_zero(delta_y)).clamp(0.0, (display.height - origin.height).max(0.0));
    CropRect::new(x, y, origin.width, origin.height)
}

/// Horizontal or vertical span while resizing, with one edge possibly anchored.
#[derive(Debug, Clone, Copy)]
struct Span {
    start: f64,
    end: f64,
    moves_start: bool,
}

impl Span {
    fn len(&self) -> f64 {
        self.end - self.start
    }

    /// Sets the length, keeping the anchored edge where it is.
    fn set_len(&mut self, len: f64) {
        if self.moves_start {
            self.start = self.end - len;
        } else {
            self.end = self.start + len;
        }
    }

    fn clamp_to(&mut self, extent: f64) {
        self.start = self.start.max(0.0);
        self.end = self.end.min(extent);
    }

    /// Raises the length to `min`, then slides back inside `[0, extent]`.
    fn enforce_min(&mut self, min: f64, extent: f64) {
        if self.len() >= min {
            return;
        }
        self.set_len(min);
        if self.start < 0.0 {
            self.start = 0.0;
            self.end = min;
        }
        if self.end > extent {
            self.end = extent;
            self.start = (extent - min).max(0.0);
        }
    }
}

/// Applies a resize gesture to `origin`.
///
/// Order: raw delta, minimum size, aspect ratio (corners only), bounds clamp,
/// then the minimum size again so clamping never undercuts the floor.
pub fn resize_rect(
    origin: CropRect,
    handle: ResizeHandle,
    delta_x: f64,
    delta_y: f64,
    display: DisplaySize,
    ratio: Option<AspectRatio>,
) -> CropRect {
    let delta_x = finite_or_zero(delta_x);
    let delta_y = finite_or_zero(delta_y);
    let min_width = min_side(display.width);
    let min_height = min_side(display.height);

    let mut horizontal = Span {
        start: origin.x,
        end: origin.right(),
        moves_start: handle.moves_left(),
    };
    let mut vertical = Span {
        start: origin.y,
        end: origin.bottom(),
        moves_start: handle.moves_top(),
    };

    if handle.moves_left() {
        horizontal.start += delta_x;
    } else if handle.moves_right() {
        horizontal.end += delta_x;
    }
    if handle.moves_top() {
        vertical.start += delta_y;
    } else if handle.moves_bottom() {
        vertical.end += delta_y;
    }

    if horizontal.len() < min_width {
        horizontal.set_len(min_width);
    }
    if vertical.len() < min_height {
        vertical.set_len(min_height);
    }

    let ratio = ratio.filter(|_| handle.is_corner());
    if let Some(ratio) = ratio {
        let (width, height) = fit_ratio(horizontal.len(), vertical.len(), ratio);
        let (width, height) = lift_to_floor(width, height, min_width, min_height);
        horizontal.set_len(width);
        vertical.set_len(height);
    }

    horizontal.clamp_to(display.width);
    vertical.clamp_to(display.height);

    if let Some(ratio) = ratio {
        let (width, height) = fit_ratio(horizontal.len(), vertical.len(), ratio);
        horizontal.set_len(width);
        vertical.set_len(height);
    }

    horizontal.enforce_min(min_width, display.width);
    vertical.enforce_min(min_height, display.height);

    CropRect::new(
        horizontal.start,
        vertical.start,
        horizontal.len(),
        vertical.len(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const DISPLAY: DisplaySize = DisplaySize::new(800.0, 600.0);

    fn assert_within_display(rect: CropRect, display: DisplaySize) {
        const EPS: f64 = 1e-9;
        assert!(rect.x >= -EPS, "x out of bounds: {rect:?}");
        assert!(rect.y >= -EPS, "y out of bounds: {rect:?}");
        assert!(rect.right() <= display.width + EPS, "right out of bounds: {rect:?}");
        assert!(rect.bottom() <= display.height + EPS, "bottom out of bounds: {rect:?}");
        assert!(rect.width >= CROP_MIN_SIZE - EPS, "width under minimum: {rect:?}");
        assert!(rect.height >= CROP_MIN_SIZE - EPS, "height under minimum: {rect:?}");
    }

    fn ratio(w: f64, h: f64) -> AspectRatio {
        AspectRatio::new(w, h).expect("ratio should be valid")
    }

    #[test]
    fn initial_rect_is_centered_at_eighty_percent() {
        let rect = initial_rect(DISPLAY, None);
        assert_eq!(rect, CropRect::new(80.0, 60.0, 640.0, 480.0));
    }

    #[test]
    fn initial_rect_respects_aspect_ratio() {
        let rect = initial_rect(DISPLAY, Some(ratio(1.0, 1.0)));
        assert_eq!(rect, CropRect::new(160.0, 60.0, 480.0, 480.0));
    }

    #[test]
    fn drag_never_leaves_display_bounds() {
        let origin = CropRect::new(100.0, 100.0, 200.0, 150.0);
        for (dx, dy) in [
            (-1000.0, -1000.0),
            (1000.0, 1000.0),
            (650.0, -20.0),
            (3.5, 7.25),
            (f64::NAN, 10.0),
        ] {
            let moved = drag_rect(origin, dx, dy, DISPLAY);
            assert_within_display(moved, DISPLAY);
            assert_eq!(moved.width, origin.width);
            assert_eq!(moved.height, origin.height);
        }
        assert_eq!(
            drag_rect(origin, 1000.0, 1000.0, DISPLAY),
            CropRect::new(600.0, 450.0, 200.0, 150.0)
        );
    }

    #[test]
    fn resize_edge_handle_changes_one_dimension() {
        let origin = CropRect::new(100.0, 100.0, 200.0, 150.0);
        let resized = resize_rect(origin, ResizeHandle::MiddleRight, 50.0, 80.0, DISPLAY, None);
        assert_eq!(resized, CropRect::new(100.0, 100.0, 250.0, 150.0));

        let resized = resize_rect(origin, ResizeHandle::TopMiddle, 50.0, -40.0, DISPLAY, None);
        assert_eq!(resized, CropRect::new(100.0, 60.0, 200.0, 190.0));
    }

    #[test]
    fn resize_pins_opposite_edge_at_minimum_size() {
        let origin = CropRect::new(100.0, 100.0, 200.0, 150.0);
        let resized = resize_rect(origin, ResizeHandle::TopLeft, 500.0, 500.0, DISPLAY, None);
        assert_eq!(resized, CropRect::new(270.0, 220.0, 30.0, 30.0));

        let resized = resize_rect(origin, ResizeHandle::BottomRight, -500.0, -500.0, DISPLAY, None);
        assert_eq!(resized, CropRect::new(100.0, 100.0, 30.0, 30.0));
    }

    #[test]
    fn resize_clamps_to_display_bounds() {
        let origin = CropRect::new(100.0, 100.0, 200.0, 150.0);
        let resized = resize_rect(origin, ResizeHandle::TopLeft, -300.0, -300.0, DISPLAY, None);
        assert_eq!(resized, CropRect::new(0.0, 0.0, 300.0, 250.0));

        let resized = resize_rect(origin, ResizeHandle::BottomRight, 900.0, 900.0, DISPLAY, None);
        assert_eq!(resized, CropRect::new(100.0, 100.0, 700.0, 500.0));
    }

    #[test]
    fn locked_corner_resize_keeps_ratio_and_anchor() {
        let origin = CropRect::new(200.0, 200.0, 160.0, 90.0);
        let locked = ratio(16.0, 9.0);
        for handle in [
            ResizeHandle::TopLeft,
            ResizeHandle::TopRight,
            ResizeHandle::BottomLeft,
            ResizeHandle::BottomRight,
        ] {
            for (dx, dy) in [(40.0, 10.0), (-60.0, 25.0), (15.0, -70.0), (-5.0, -5.0)] {
                let resized = resize_rect(origin, handle, dx, dy, DISPLAY, Some(locked));
                assert_within_display(resized, DISPLAY);
                assert!(
                    (resized.width / resized.height - locked.value()).abs() < 1e-9,
                    "ratio drifted for {handle:?} ({dx}, {dy}): {resized:?}"
                );
                if !handle.moves_left() {
                    assert_eq!(resized.x, origin.x);
                } else {
                    assert!((resized.right() - origin.right()).abs() < 1e-9);
                }
                if !handle.moves_top() {
                    assert_eq!(resized.y, origin.y);
                } else {
                    assert!((resized.bottom() - origin.bottom()).abs() < 1e-9);
                }
            }
        }
    }

    #[test]
    fn locked_ratio_tie_break_derives_from_smaller_side() {
        let origin = CropRect::new(0.0, 0.0, 100.0, 100.0);
        let square = ratio(1.0, 1.0);
        let wide = resize_rect(
            origin,
            ResizeHandle::BottomRight,
            100.0,
            0.0,
            DISPLAY,
            Some(square),
        );
        assert_eq!(wide, CropRect::new(0.0, 0.0, 100.0, 100.0));
        let tall = resize_rect(
            origin,
            ResizeHandle::BottomRight,
            50.0,
            80.0,
            DISPLAY,
            Some(square),
        );
        assert_eq!(tall, CropRect::new(0.0, 0.0, 150.0, 150.0));
    }

    #[test]
    fn locked_ratio_survives_bounds_clamp_by_shrinking() {
        let origin = CropRect::new(500.0, 300.0, 200.0, 200.0);
        let resized = resize_rect(
            origin,
            ResizeHandle::BottomRight,
            400.0,
            400.0,
            DISPLAY,
            Some(ratio(1.0, 1.0)),
        );
        assert_eq!(resized, CropRect::new(500.0, 300.0, 300.0, 300.0));
    }

    #[test]
    fn locked_ratio_minimum_size_lifts_both_sides() {
        let origin = CropRect::new(100.0, 100.0, 160.0, 90.0);
        let resized = resize_rect(
            origin,
            ResizeHandle::BottomRight,
            -200.0,
            -200.0,
            DISPLAY,
            Some(ratio(16.0, 9.0)),
        );
        assert!((resized.height - CROP_MIN_SIZE).abs() < 1e-9);
        assert!((resized.width / resized.height - 16.0 / 9.0).abs() < 1e-9);
    }

    #[test]
    fn no_resize_gesture_goes_under_minimum_size() {
        let origin = CropRect::new(10.0, 10.0, 40.0, 40.0);
        for handle in ResizeHandle::ALL {
            for ratio_value in [None, Some(ratio(16.0, 9.0)), Some(ratio(9.0, 16.0))] {
                for (dx, dy) in [(-900.0, -900.0), (900.0, 900.0), (35.0, -35.0), (-35.0, 35.0)] {
                    let resized = resize_rect(origin, handle, dx, dy, DISPLAY, ratio_value);
                    assert_within_display(resized, DISPLAY);
                }
            }
        }
    }

    #[test]
    fn constrain_to_ratio_keeps_center_and_bounds() {
        let rect = CropRect::new(80.0, 60.0, 640.0, 480.0);
        let constrained = constrain_to_ratio(rect, DISPLAY, ratio(16.0, 9.0));
        assert!((constrained.width / constrained.height - 16.0 / 9.0).abs() < 1e-9);
        assert!((constrained.center().x - 400.0).abs() < 1e-9);
        assert!((constrained.center().y - 300.0).abs() < 1e-9);
        assert_within_display(constrained, DISPLAY);
    }

    #[test]
    fn clamp_rect_handles_displays_smaller_than_minimum() {
        let tiny = DisplaySize::new(20.0, 500.0);
        let rect = clamp_rect(CropRect::new(5.0, 5.0, 100.0, 10.0), tiny);
        assert_eq!(rect, CropRect::new(0.0, 5.0, 20.0, 30.0));
    }
}
