//! Saving edited photos to disk.

use crate::error::Result;
use crate::image::{ImageFormat, ImagePayload};
use chrono::Utc;
use std::path::{Path, PathBuf};

/// File name prefix for saved edits.
const FILE_NAME_PREFIX: &str = "styleshift-edit";

/// Builds `styleshift-edit-<epoch-ms>.<ext>` for the given timestamp.
pub fn file_name_at(epoch_ms: i64, format: ImageFormat) -> String {
    format!("{FILE_NAME_PREFIX}-{epoch_ms}.{}", format.extension())
}

/// File name for an edit saved right now.
pub fn download_file_name(format: ImageFormat) -> String {
    file_name_at(Utc::now().timestamp_millis(), format)
}

/// Writes `image` into `dir` under a fresh timestamped name.
///
/// The extension follows the image's MIME type, defaulting to `.png` for
/// types the crate does not recognise.
pub async fn save_image(image: &ImagePayload, dir: &Path) -> Result<PathBuf> {
    let format = image.format().unwrap_or_default();
    let path = dir.join(download_file_name(format));
    tokio::fs::write(&path, &image.data).await?;
    tracing::debug!(path = %path.display(), size_bytes = image.size(), "saved edited image");
    Ok(path)
}
