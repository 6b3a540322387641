use crate::geometry::PixelSize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AspectPreset {
    Free,
    Ratio1x1,
    Ratio4x3,
    Ratio3x2,
    Ratio16x9,
    Ratio9x16,
    Original,
}

impl AspectPreset {
    pub const ALL: [AspectPreset; 7] = [
        Self::Free,
        Self::Ratio1x1,
        Self::Ratio4x3,
        Self::Ratio3x2,
        Self::Ratio16x9,
        Self::Ratio9x16,
        Self::Original,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            Self::Free => "Free",
            Self::Ratio1x1 => "1:1",
            Self::Ratio4x3 => "4:3",
            Self::Ratio3x2 => "3:2",
            Self::Ratio16x9 => "16:9",
            Self::Ratio9x16 => "9:16",
            Self::Original => "Original",
        }
    }

    pub const fn ratio(self) -> Option<(u32, u32)> {
        match self {
            Self::Free | Self::Original => None,
            Self::Ratio1x1 => Some((1, 1)),
            Self::Ratio4x3 => Some((4, 3)),
            Self::Ratio3x2 => Some((3, 2)),
            Self::Ratio16x9 => Some((16, 9)),
            Self::Ratio9x16 => Some((9, 16)),
        }
    }

    /// Returns the effective width/height ratio for this preset.
    ///
    /// `Original` resolves to the source image proportions, `Free` to `None`.
    pub fn resolve(self, source: PixelSize) -> Option<AspectRatio> {
        match self {
            Self::Original => AspectRatio::new(
                f64::from(source.width.max(1)),
                f64::from(source.height.max(1)),
            ),
            _ => self
                .ratio()
                .and_then(|(w, h)| AspectRatio::new(f64::from(w), f64::from(h))),
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim();
        Self::ALL
            .into_iter()
            .find(|preset| preset.label().eq_ignore_ascii_case(label))
    }
}

/// A positive width/height ratio.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AspectRatio(f64);

impl AspectRatio {
    pub fn new(width: f64, height: f64) -> Option<Self> {
        let ratio = width / height;
        (ratio.is_finite() && ratio > 0.0).then_some(Self(ratio))
    }

    pub const fn value(self) -> f64 {
        self.0
    }
}
