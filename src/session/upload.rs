use std::io::{self, Cursor};
use std::path::Path;

use image::{ImageFormat, ImageReader};

use super::error::ValidationError;
use crate::api::{AssetRef, UploadFile};
use crate::geometry::PixelSize;

pub const MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;
pub const ALLOWED_MIME_TYPES: [&str; 3] = ["image/jpeg", "image/png", "image/webp"];

/// An image file picked by the user, not yet uploaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalImage {
    pub file_name: String,
    pub declared_mime: Option<String>,
    pub bytes: Vec<u8>,
}

impl LocalImage {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            declared_mime: None,
            bytes,
        }
    }

    pub fn with_mime(mut self, mime: impl Into<String>) -> Self {
        self.declared_mime = Some(mime.into());
        self
    }

    /// Reads a file, declaring the MIME type implied by its extension.
    pub fn from_path(path: &Path) -> io::Result<Self> {
        let bytes = std::fs::read(path)?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());
        let declared_mime = ImageFormat::from_path(path)
            .ok()
            .map(|format| format.to_mime_type().to_string());
        Ok(Self {
            file_name,
            declared_mime,
            bytes,
        })
    }
}

/// The current source image of a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceImage {
    pub asset: AssetRef,
    pub file_name: String,
    pub mime: String,
    pub byte_len: u64,
    pub dimensions: PixelSize,
}

/// Upload that passed local checks, with dimensions read from the raw bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedUpload {
    pub file: UploadFile,
    pub dimensions: PixelSize,
}

fn normalize_mime(mime: &str) -> String {
    let mime = mime
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    if mime == "image/jpg" {
        "image/jpeg".to_string()
    } else {
        mime
    }
}

pub fn sniff_mime(bytes: &[u8]) -> Option<&'static str> {
    image::guess_format(bytes)
        .ok()
        .map(|format| format.to_mime_type())
}

pub fn read_dimensions(bytes: &[u8]) -> Result<PixelSize, ValidationError> {
    let unreadable = |message: String| ValidationError::UnreadableImage { message };
    let (width, height) = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|err| unreadable(err.to_string()))?
        .into_dimensions()
        .map_err(|err| unreadable(err.to_string()))?;
    Ok(PixelSize::new(width, height))
}

/// Checks type and size, then reads the true dimensions locally.
pub fn validate_upload(image: LocalImage) -> Result<ValidatedUpload, ValidationError> {
    let mime = image
        .declared_mime
        .as_deref()
        .map(normalize_mime)
        .or_else(|| sniff_mime(&image.bytes).map(str::to_string))
        .unwrap_or_else(|| "application/octet-stream".to_string());
    if !ALLOWED_MIME_TYPES.contains(&mime.as_str()) {
        return Err(ValidationError::UnsupportedType { mime });
    }

    let size = image.bytes.len() as u64;
    if size > MAX_UPLOAD_BYTES {
        return Err(ValidationError::FileTooLarge { size });
    }

    let dimensions = read_dimensions(&image.bytes)?;
    Ok(ValidatedUpload {
        file: UploadFile {
            file_name: image.file_name,
            mime,
            bytes: image.bytes,
        },
        dimensions,
    })
}

#[cfg(test)]
pub(crate) fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let image = image::RgbaImage::from_pixel(width, height, image::Rgba([10, 20, 30, 255]));
    let mut bytes = Vec::new();
    image::DynamicImage::ImageRgba8(image)
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .expect("png should encode");
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_upload_sniffs_type_and_reads_dimensions() {
        let upload = validate_upload(LocalImage::new("a.png", png_bytes(12, 7)))
            .expect("png should validate");
        assert_eq!(upload.file.mime, "image/png");
        assert_eq!(upload.dimensions, PixelSize::new(12, 7));
    }

    #[test]
    fn validate_upload_rejects_disallowed_declared_type() {
        let err = validate_upload(LocalImage::new("a.gif", png_bytes(2, 2)).with_mime("image/gif"))
            .expect_err("gif should be rejected");
        assert_eq!(
            err,
            ValidationError::UnsupportedType {
                mime: "image/gif".to_string()
            }
        );
    }

    #[test]
    fn validate_upload_accepts_jpg_alias_and_parameters() {
        let upload = validate_upload(
            LocalImage::new("a.png", png_bytes(3, 3)).with_mime("IMAGE/JPG; charset=binary"),
        )
        .expect("alias should normalize");
        assert_eq!(upload.file.mime, "image/jpeg");
    }

    #[test]
    fn validate_upload_rejects_oversized_file_before_decoding() {
        let mut bytes = png_bytes(2, 2);
        bytes.resize((MAX_UPLOAD_BYTES + 1) as usize, 0);
        let err = validate_upload(LocalImage::new("big.png", bytes))
            .expect_err("oversized file should be rejected");
        assert_eq!(
            err,
            ValidationError::FileTooLarge {
                size: MAX_UPLOAD_BYTES + 1
            }
        );
    }

    #[test]
    fn validate_upload_rejects_unknown_bytes() {
        let err = validate_upload(LocalImage::new("notes.txt", b"hello".to_vec()))
            .expect_err("text should be rejected");
        assert!(matches!(err, ValidationError::UnsupportedType { .. }));

        let fake = LocalImage::new("fake.png", b"hello".to_vec()).with_mime("image/png");
        let err = validate_upload(fake).expect_err("undecodable bytes should be rejected");
        assert!(matches!(err, ValidationError::UnreadableImage { .. }));
    }
}
