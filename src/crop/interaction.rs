use crate::geometry::{CropRect, DisplaySize, Point};

use super::constrain::{drag_rect, resize_rect};
use super::handle::handle_at_point;
use super::{AspectRatio, ResizeHandle};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionState {
    Idle,
    Dragging,
    Resizing(ResizeHandle),
}

/// Start point and geometry captured when a gesture begins. Never mutated.
#[derive(Debug, Clone, Copy, PartialEq)]
struct GestureSnapshot {
    state: InteractionState,
    start: Point,
    origin: CropRect,
}

#[derive(Debug, Clone, Default)]
pub struct InteractionController {
    active: Option<GestureSnapshot>,
}

impl InteractionController {
    pub const fn new() -> Self {
        Self { active: None }
    }

    pub fn state(&self) -> InteractionState {
        self.active
            .map_or(InteractionState::Idle, |snapshot| snapshot.state)
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Hit-tests `point` against `rect` and starts the matching gesture.
    ///
    /// Handles take priority over the interior. A press outside both leaves
    /// the controller idle.
    pub fn pointer_down(&mut self, rect: CropRect, point: Point) -> InteractionState {
        let state = if let Some(handle) = handle_at_point(rect, point) {
            InteractionState::Resizing(handle)
        } else if rect.contains(point) {
            InteractionState::Dragging
        } else {
            InteractionState::Idle
        };
        self.begin(state, rect, point);
        state
    }

    pub fn begin(&mut self, state: InteractionState, rect: CropRect, point: Point) {
        self.active = match state {
            InteractionState::Idle => None,
            _ => {
                tracing::debug!(?state, ?rect, "crop gesture started");
                Some(GestureSnapshot {
                    state,
                    start: point,
                    origin: rect,
                })
            }
        };
    }

    /// Geometry for the current pointer position, recomputed from the snapshot.
    pub fn pointer_move(
        &self,
        point: Point,
        display: DisplaySize,
        ratio: Option<AspectRatio>,
    ) -> Option<CropRect> {
        let snapshot = self.active?;
        let delta_x = point.x - snapshot.start.x;
        let delta_y = point.y - snapshot.start.y;
        match snapshot.state {
            InteractionState::Idle => None,
            InteractionState::Dragging => {
                Some(drag_rect(snapshot.origin, delta_x, delta_y, display))
            }
            InteractionState::Resizing(handle) => Some(resize_rect(
                snapshot.origin,
                handle,
                delta_x,
                delta_y,
                display,
                ratio,
            )),
        }
    }

    /// Ends the gesture. Returns `true` when one was active, meaning a final
    /// preview render is due.
    pub fn pointer_up(&mut self) -> bool {
        let ended = self.active.take();
        if let Some(snapshot) = ended {
            tracing::debug!(state = ?snapshot.state, "crop gesture finished");
        }
        ended.is_some()
    }
}
