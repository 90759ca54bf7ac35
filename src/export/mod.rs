//! Image export
//!
//! Writes the displayed picture to a user-chosen location as PNG or JPEG.
//! The picture goes through RGBA first; JPEG has no alpha channel so it is
//! flattened to RGB before encoding.

use image::{DynamicImage, ImageFormat, RgbImage};
use std::path::{Path, PathBuf};

use crate::error::ApodError;

/// JPEG quality setting (0-100)
pub const JPEG_QUALITY: u8 = 90;

/// Output formats offered by the save dialog
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Png,
    Jpeg,
}

impl ExportFormat {
    /// Pick the format from a destination path's extension
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "png" => Some(ExportFormat::Png),
            "jpg" | "jpeg" => Some(ExportFormat::Jpeg),
            _ => None,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ExportFormat::Png => "PNG",
            ExportFormat::Jpeg => "JPEG",
        }
    }
}

/// Result of an export operation
#[derive(Debug)]
pub struct ExportResult {
    /// Path where the image was saved
    pub output_path: PathBuf,
    pub format: ExportFormat,
    /// Image dimensions
    pub size: (u32, u32),
}

/// Copy the cached image at `source` to `dest`
///
/// A destination without an extension is saved as PNG with `.png` appended.
pub fn export_image(source: &Path, dest: &Path) -> Result<ExportResult, ApodError> {
    let (output_path, format) = match dest.extension() {
        None => (dest.with_extension("png"), ExportFormat::Png),
        Some(_) => {
            let format = ExportFormat::from_path(dest).ok_or_else(|| {
                ApodError::ExportFailure(format!(
                    "Unsupported format for {} (use .png or .jpg)",
                    dest.display()
                ))
            })?;
            (dest.to_path_buf(), format)
        }
    };

    let img = image::open(source)
        .map_err(|e| ApodError::ExportFailure(format!("Failed to load {}: {}", source.display(), e)))?;
    let rgba = DynamicImage::ImageRgba8(img.to_rgba8());
    let size = (rgba.width(), rgba.height());

    match format {
        ExportFormat::Png => rgba
            .save_with_format(&output_path, ImageFormat::Png)
            .map_err(|e| ApodError::ExportFailure(e.to_string()))?,
        ExportFormat::Jpeg => {
            let jpeg = encode_jpeg(&rgba.to_rgb8(), JPEG_QUALITY)?;
            std::fs::write(&output_path, jpeg)
                .map_err(|e| ApodError::ExportFailure(format!("Failed to write file: {}", e)))?;
        }
    }

    log::info!(
        "Exported {} to {} ({}, {}x{})",
        source.display(),
        output_path.display(),
        format.display_name(),
        size.0,
        size.1
    );

    Ok(ExportResult {
        output_path,
        format,
        size,
    })
}

fn encode_jpeg(rgb_image: &RgbImage, quality: u8) -> Result<Vec<u8>, ApodError> {
    let mut output = Vec::new();
    let mut encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut output, quality);

    encoder
        .encode(
            rgb_image.as_raw(),
            rgb_image.width(),
            rgb_image.height(),
            image::ExtendedColorType::Rgb8,
        )
        .map_err(|e| ApodError::ExportFailure(format!("Failed to encode JPEG: {}", e)))?;

    Ok(output)
}

/// Suggested file name for the save dialog, taken from the cached file
pub fn default_export_name(source: &Path) -> String {
    source
        .file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.to_string())
        .unwrap_or_else(|| "apod.png".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_server::png_bytes;

    fn cached_png(dir: &Path) -> PathBuf {
        let path = dir.join("apod_2020-10-10.png");
        std::fs::write(&path, png_bytes(8, 6)).unwrap();
        path
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(ExportFormat::from_path(Path::new("a.png")), Some(ExportFormat::Png));
        assert_eq!(ExportFormat::from_path(Path::new("a.JPG")), Some(ExportFormat::Jpeg));
        assert_eq!(ExportFormat::from_path(Path::new("a.jpeg")), Some(ExportFormat::Jpeg));
        assert_eq!(ExportFormat::from_path(Path::new("a.gif")), None);
        assert_eq!(ExportFormat::from_path(Path::new("a")), None);
    }

    #[test]
    fn test_export_png() {
        let dir = tempfile::tempdir().unwrap();
        let source = cached_png(dir.path());
        let dest = dir.path().join("wallpaper.png");

        let result = export_image(&source, &dest).unwrap();
        assert_eq!(result.format, ExportFormat::Png);
        assert_eq!(result.size, (8, 6));

        let saved = image::open(&dest).unwrap();
        assert!(saved.color().has_alpha());
    }

    #[test]
    fn test_export_jpeg() {
        let dir = tempfile::tempdir().unwrap();
        let source = cached_png(dir.path());
        let dest = dir.path().join("wallpaper.jpg");

        let result = export_image(&source, &dest).unwrap();
        assert_eq!(result.format, ExportFormat::Jpeg);

        let bytes = std::fs::read(&dest).unwrap();
        assert_eq!(image::guess_format(&bytes).unwrap(), ImageFormat::Jpeg);
    }

    #[test]
    fn test_export_without_extension_appends_png() {
        let dir = tempfile::tempdir().unwrap();
        let source = cached_png(dir.path());

        let result = export_image(&source, &dir.path().join("wallpaper")).unwrap();
        assert_eq!(result.output_path, dir.path().join("wallpaper.png"));
        assert!(result.output_path.exists());
    }

    #[test]
    fn test_export_unsupported_extension() {
        let dir = tempfile::tempdir().unwrap();
        let source = cached_png(dir.path());
        let result = export_image(&source, &dir.path().join("wallpaper.gif"));
        assert!(matches!(result, Err(ApodError::ExportFailure(_))));
    }

    #[test]
    fn test_export_write_failure() {
        let dir = tempfile::tempdir().unwrap();
        let source = cached_png(dir.path());
        let missing = dir.path().join("no").join("such").join("dir");

        for name in ["out.png", "out.jpg"] {
            let result = export_image(&source, &missing.join(name));
            assert!(
                matches!(result, Err(ApodError::ExportFailure(_))),
                "{} should fail",
                name
            );
        }
        assert!(!missing.exists());
    }

    #[test]
    fn test_export_missing_source() {
        let dir = tempfile::tempdir().unwrap();
        let result = export_image(&dir.path().join("gone.png"), &dir.path().join("out.png"));
        assert!(matches!(result, Err(ApodError::ExportFailure(_))));
    }

    #[test]
    fn test_default_export_name() {
        assert_eq!(
            default_export_name(Path::new("apod_images/apod_2020-10-10.png")),
            "apod_2020-10-10.png"
        );
        assert_eq!(default_export_name(Path::new("/")), "apod.png");
    }
}
