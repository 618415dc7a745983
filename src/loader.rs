//! Decodes uploaded bytes into a canonical RGB buffer.

use std::ffi::OsStr;
use std::path::Path;

use image::{ImageFormat, RgbImage};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("unreadable image: {0}")]
    UnreadableImage(String),
}

const ACCEPTED: [ImageFormat; 3] = [ImageFormat::Png, ImageFormat::Jpeg, ImageFormat::Tiff];

/// Decodes PNG, JPEG, or TIFF bytes into an RGB raster.
///
/// Multi-page TIFFs yield page 0; later pages are ignored. Grayscale,
/// RGBA, and paletted sources are converted to RGB. No resizing happens
/// here; the detector and reconciler always work at original resolution.
pub fn load_rgb(bytes: &[u8]) -> Result<RgbImage, LoadError> {
    let format =
        image::guess_format(bytes).map_err(|e| LoadError::UnreadableImage(e.to_string()))?;
    if !ACCEPTED.contains(&format) {
        return Err(LoadError::UnreadableImage(format!(
            "unsupported format {format:?}"
        )));
    }
    let decoded = image::load_from_memory_with_format(bytes, format)
        .map_err(|e| LoadError::UnreadableImage(e.to_string()))?;
    Ok(decoded.to_rgb8())
}

/// Extension allowlist used by the CLI before reading a file.
pub fn is_supported_extension(path: &Path) -> bool {
    let Some(ext) = path.extension().and_then(OsStr::to_str) else {
        return false;
    };
    matches!(
        ext.to_ascii_lowercase().as_str(),
        "png" | "jpg" | "jpeg" | "tif" | "tiff"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_garbage_bytes() {
        let err = load_rgb(b"definitely not an image").unwrap_err();
        assert!(matches!(err, LoadError::UnreadableImage(_)));
    }

    #[test]
    fn extension_allowlist() {
        assert!(is_supported_extension(Path::new("cells.TIF")));
        assert!(is_supported_extension(Path::new("a/b/cells.jpeg")));
        assert!(!is_supported_extension(Path::new("cells.bmp")));
        assert!(!is_supported_extension(Path::new("cells")));
    }
}
