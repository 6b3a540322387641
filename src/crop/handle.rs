use crate::geometry::{CropRect, Point};

/// Hit radius around each handle, in display pixels.
pub const HANDLE_HIT_RADIUS: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResizeHandle {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
    TopMiddle,
    BottomMiddle,
    MiddleLeft,
    MiddleRight,
}

impl ResizeHandle {
    /// Corners come first so they win hit tests on small rectangles.
    pub const ALL: [ResizeHandle; 8] = [
        Self::TopLeft,
        Self::TopRight,
        Self::BottomLeft,
        Self::BottomRight,
        Self::TopMiddle,
        Self::BottomMiddle,
        Self::MiddleLeft,
        Self::MiddleRight,
    ];

    pub const fn code(self) -> &'static str {
        match self {
            Self::TopLeft => "tl",
            Self::TopRight => "tr",
            Self::BottomLeft => "bl",
            Self::BottomRight => "br",
            Self::TopMiddle => "tm",
            Self::BottomMiddle => "bm",
            Self::MiddleLeft => "ml",
            Self::MiddleRight => "mr",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|handle| handle.code() == code)
    }

    pub const fn is_corner(self) -> bool {
        matches!(
            self,
            Self::TopLeft | Self::TopRight | Self::BottomLeft | Self::BottomRight
        )
    }

    pub const fn moves_left(self) -> bool {
        matches!(self, Self::TopLeft | Self::BottomLeft | Self::MiddleLeft)
    }

    pub const fn moves_right(self) -> bool {
        matches!(self, Self::TopRight | Self::BottomRight | Self::MiddleRight)
    }

    pub const fn moves_top(self) -> bool {
        matches!(self, Self::TopLeft | Self::TopRight | Self::TopMiddle)
    }

    pub const fn moves_bottom(self) -> bool {
        matches!(self, Self::BottomLeft | Self::BottomRight | Self::BottomMiddle)
    }

    pub fn position(self, rect: CropRect) -> Point {
        let center = rect.center();
        let x = if self.moves_left() {
            rect.x
        } else if self.moves_right() {
            rect.right()
        } else {
            center.x
        };
        let y = if self.moves_top() {
            rect.y
        } else if self.moves_bottom() {
            rect.bottom()
        } else {
            center.y
        };
        Point::new(x, y)
    }
}

pub fn handle_at_point(rect: CropRect, point: Point) -> Option<ResizeHandle> {
    ResizeHandle::ALL.into_iter().find(|handle| {
        let anchor = handle.position(rect);
        (point.x - anchor.x).abs() <= HANDLE_HIT_RADIUS
            && (point.y - anchor.y).abs() <= HANDLE_HIT_RADIUS
    })
}
