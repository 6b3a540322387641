use std::path::{Path, PathBuf};

use image::DynamicImage;

use crate::error::{AppError, AppResult};
use crate::preview;

/// Explicit output wins, then the configured download dir, then the working dir.
pub fn resolve_output_path(
    output: Option<&Path>,
    download_dir: Option<&Path>,
    file_name: &str,
) -> PathBuf {
    if let Some(output) = output {
        return output.to_path_buf();
    }
    // Server names may carry path separators; keep only the last segment.
    let file_name = Path::new(file_name)
        .file_name()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("result.png"));
    match download_dir {
        Some(dir) => dir.join(file_name),
        None => file_name,
    }
}

pub(crate) fn write_file(path: &Path, bytes: &[u8]) -> AppResult<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|err| AppError::io(parent, err))?;
    }
    std::fs::write(path, bytes).map_err(|err| AppError::io(path, err))?;
    tracing::debug!(path = %path.display(), bytes = bytes.len(), "file written");
    Ok(())
}

/// Previews are always PNG, whatever extension the path carries.
pub(crate) fn write_preview(path: &Path, image: &DynamicImage) -> AppResult<()> {
    write_file(path, &preview::encode_png(image)?)
}
