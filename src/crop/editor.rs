use crate::geometry::{CropRect, DisplaySize, PixelSize, Point, SourceRegion};

use super::constrain::{clamp_rect, constrain_to_ratio, initial_rect};
use super::manual::{reconcile_manual, ManualCropInput};
use super::{
    AspectPreset, AspectRatio, CoordinateTransform, CropError, InteractionController,
    InteractionState,
};

/// Owns the crop rectangle for one loaded image.
///
/// Every entry point that depends on the rendered size takes the current
/// [`DisplaySize`] and re-syncs before doing anything else, so the
/// display/source scale is never read stale.
#[derive(Debug, Clone)]
pub struct CropEditor {
    source: PixelSize,
    display: DisplaySize,
    preset: AspectPreset,
    rect: CropRect,
    interaction: InteractionController,
}

impl CropEditor {
    /// Creates the editor on image load with the rectangle centered at 80%.
    pub fn new(
        source: PixelSize,
        display: DisplaySize,
        preset: AspectPreset,
    ) -> Result<Self, CropError> {
        CoordinateTransform::from_layout(display, source)?;
        let editor = Self {
            source,
            display,
            preset,
            rect: initial_rect(display, preset.resolve(source)),
            interaction: InteractionController::new(),
        };
        tracing::debug!(
            ?source,
            layout = ?editor.display,
            rect = ?editor.rect,
            "crop editor initialised"
        );
        Ok(editor)
    }

    pub fn rect(&self) -> CropRect {
        self.rect
    }

    pub fn source_size(&self) -> PixelSize {
        self.source
    }

    pub fn display_size(&self) -> DisplaySize {
        self.display
    }

    pub fn preset(&self) -> AspectPreset {
        self.preset
    }

    pub fn aspect_ratio(&self) -> Option<AspectRatio> {
        self.preset.resolve(self.source)
    }

    pub fn interaction_state(&self) -> InteractionState {
        self.interaction.state()
    }

    /// Adopts a new rendered size, rescaling the rectangle so it keeps
    /// covering the same source region.
    pub fn sync_layout(&mut self, display: DisplaySize) -> Result<CoordinateTransform, CropError> {
        let transform = CoordinateTransform::from_layout(display, self.source)?;
        if display != self.display {
            let scale_x = display.width / self.display.width;
            let scale_y = display.height / self.display.height;
            let rescaled = CropRect::new(
                self.rect.x * scale_x,
                self.rect.y * scale_y,
                self.rect.width * scale_x,
                self.rect.height * scale_y,
            );
            self.display = display;
            self.rect = clamp_rect(rescaled, display);
            tracing::debug!(layout = ?self.display, rect = ?self.rect, "crop layout changed");
        }
        Ok(transform)
    }

    pub fn set_preset(&mut self, preset: AspectPreset) {
        self.preset = preset;
        if let Some(ratio) = self.aspect_ratio() {
            self.rect = constrain_to_ratio(self.rect, self.display, ratio);
        }
    }

    pub fn pointer_down(
        &mut self,
        display: DisplaySize,
        point: Point,
    ) -> Result<InteractionState, CropError> {
        self.sync_layout(display)?;
        Ok(self.interaction.pointer_down(self.rect, point))
    }

    /// Applies a pointer move to the active gesture. Returns the new rectangle
    /// or `None` when idle.
    pub fn pointer_move(&mut self, point: Point) -> Option<CropRect> {
        let next = self
            .interaction
            .pointer_move(point, self.display, self.aspect_ratio())?;
        self.rect = next;
        Some(next)
    }

    pub fn pointer_up(&mut self) -> bool {
        self.interaction.pointer_up()
    }

    pub fn apply_manual(
        &mut self,
        display: DisplaySize,
        input: ManualCropInput,
    ) -> Result<CropRect, CropError> {
        let transform = self.sync_layout(display)?;
        self.rect = reconcile_manual(input, transform, self.display, self.aspect_ratio());
        Ok(self.rect)
    }

    /// Current rectangle in whole source pixels, for the crop request.
    pub fn source_region(&mut self, display: DisplaySize) -> Result<SourceRegion, CropError> {
        let transform = self.sync_layout(display)?;
        Ok(transform.rect_to_source_region(self.rect, self.source))
    }

    /// Current rectangle expressed as the source-pixel input fields.
    pub fn source_fields(&mut self, display: DisplaySize) -> Result<ManualCropInput, CropError> {
        let region = self.source_region(display)?;
        Ok(ManualCropInput::new(
            f64::from(region.x),
            f64::from(region.y),
            f64::from(region.width),
            f64::from(region.height),
        ))
    }

    /// Loads a new source image (for example a crop result) into the editor.
    pub fn load_source(
        &mut self,
        source: PixelSize,
        display: DisplaySize,
    ) -> Result<(), CropError> {
        *self = Self::new(source, display, self.preset)?;
        Ok(())
    }

    pub fn reset(&mut self) {
        self.interaction = InteractionController::new();
        self.rect = initial_rect(self.display, self.aspect_ratio());
    }
}
