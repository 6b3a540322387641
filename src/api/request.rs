use std::fmt;

use serde::{Deserialize, Serialize};

use crate::geometry::SourceRegion;

/// Remote handle for an uploaded or processed image.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetRef(String);

impl AssetRef {
    pub fn new(filename: impl Into<String>) -> Self {
        Self(filename.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AssetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResizeMode {
    /// Keep proportions and fit inside the target box.
    #[default]
    Fit,
    /// Keep proportions, cover the target box and center-crop the excess.
    Fill,
    /// Ignore proportions.
    Stretch,
}

impl ResizeMode {
    pub const ALL: [ResizeMode; 3] = [Self::Fit, Self::Fill, Self::Stretch];

    pub const fn as_form_value(self) -> &'static str {
        match self {
            Self::Fit => "fit",
            Self::Fill => "fill",
            Self::Stretch => "stretch",
        }
    }

    pub fn from_form_value(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|mode| mode.as_form_value().eq_ignore_ascii_case(value.trim()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Png,
    Jpg,
}

impl OutputFormat {
    pub const fn as_form_value(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpg => "jpg",
        }
    }

    pub fn from_form_value(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpg),
            _ => None,
        }
    }

    pub const fn uses_quality(self) -> bool {
        matches!(self, Self::Jpg)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum ScaleFactor {
    #[default]
    X2,
    X4,
    X8,
}

impl ScaleFactor {
    pub const ALL: [ScaleFactor; 3] = [Self::X2, Self::X4, Self::X8];

    pub const fn factor(self) -> u32 {
        match self {
            Self::X2 => 2,
            Self::X4 => 4,
            Self::X8 => 8,
        }
    }

    pub fn from_factor(factor: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|scale| scale.factor() == factor)
    }

    /// The next smaller scale, if any.
    pub const fn smaller(self) -> Option<Self> {
        match self {
            Self::X2 => None,
            Self::X4 => Some(Self::X2),
            Self::X8 => Some(Self::X4),
        }
    }
}

/// File handed to the upload endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub file_name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

/// One processing call, carrying the asset it targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessRequest {
    RemoveBackground {
        asset: AssetRef,
        softness: u8,
        feather: u8,
    },
    Crop {
        asset: AssetRef,
        region: SourceRegion,
    },
    Resize {
        asset: AssetRef,
        width: u32,
        height: u32,
        mode: ResizeMode,
        format: OutputFormat,
        quality: u8,
    },
    Upscale {
        asset: AssetRef,
        scale: ScaleFactor,
    },
}

impl ProcessRequest {
    pub const fn endpoint(&self) -> &'static str {
        match self {
            Self::RemoveBackground { .. } => "remove-bg",
            Self::Crop { .. } => "crop",
            Self::Resize { .. } => "resize",
            Self::Upscale { .. } => "upscale",
        }
    }

    pub fn asset(&self) -> &AssetRef {
        match self {
            Self::RemoveBackground { asset, .. }
            | Self::Crop { asset, .. }
            | Self::Resize { asset, .. }
            | Self::Upscale { asset, .. } => asset,
        }
    }

    /// Form body in the field order the endpoints document.
    pub fn form_fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = vec![("filename", self.asset().as_str().to_string())];
        match self {
            Self::RemoveBackground {
                softness, feather, ..
            } => {
                fields.push(("softness", softness.to_string()));
                fields.push(("feather", feather.to_string()));
            }
            Self::Crop { region, .. } => {
                fields.push(("x", region.x.to_string()));
                fields.push(("y", region.y.to_string()));
                fields.push(("width", region.width.to_string()));
                fields.push(("height", region.height.to_string()));
            }
            Self::Resize {
                width,
                height,
                mode,
                format,
                quality,
                ..
            } => {
                fields.push(("width", width.to_string()));
                fields.push(("height", height.to_string()));
                fields.push(("mode", mode.as_form_value().to_string()));
                fields.push(("format", format.as_form_value().to_string()));
                fields.push(("quality", quality.to_string()));
            }
            Self::Upscale { scale, .. } => {
                fields.push(("scale", scale.factor().to_string()));
            }
        }
        fields
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedAsset {
    pub filename: AssetRef,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedAsset {
    pub filename: AssetRef,
    pub image_url: String,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HealthStatus {
    pub message: String,
    #[serde(default)]
    pub version: Option<String>,
}
