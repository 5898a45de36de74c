//! Thumbnail producer.
//!
//! Decodes a raster image, flattens transparency onto white, shrinks it to
//! fit a square box and re-encodes it as a baseline JPEG. Failures are soft:
//! the caller gets `None` and falls back to the original file.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageReader, Rgb, RgbImage};

use crate::config::ThumbnailConfig;

/// Thumbnail-domain error type. Never escapes [`create_thumbnail`].
#[derive(Debug, thiserror::Error)]
pub enum ThumbnailError {
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Create a thumbnail of `source` at `target`.
///
/// `target` is forced to a `.jpg`/`.jpeg` name: any other extension is
/// replaced by `_thumb.jpg`. Returns the path actually written, or `None`
/// if the source could not be decoded or the JPEG could not be written.
pub fn create_thumbnail(source: &Path, target: &Path, config: &ThumbnailConfig) -> Option<PathBuf> {
    let target = jpeg_target(target);
    match write_thumbnail(source, &target, config) {
        Ok(()) => {
            tracing::debug!(thumbnail = %target.display(), "Thumbnail created");
            Some(target)
        }
        Err(e) => {
            tracing::warn!(
                source = %source.display(),
                thumbnail = %target.display(),
                error = %e,
                "Thumbnail creation failed"
            );
            if target.exists() {
                let _ = std::fs::remove_file(&target);
            }
            None
        }
    }
}

fn write_thumbnail(source: &Path, target: &Path, config: &ThumbnailConfig) -> Result<(), ThumbnailError> {
    let decoded = ImageReader::open(source)?.with_guessed_format()?.decode()?;
    let flat = flatten(&decoded);

    let max_edge = config.max_edge.max(1);
    let fitted = if flat.width() > max_edge || flat.height() > max_edge {
        DynamicImage::ImageRgb8(flat)
            .resize(max_edge, max_edge, FilterType::Lanczos3)
            .to_rgb8()
    } else {
        flat
    };

    let mut writer = BufWriter::new(File::create(target)?);
    JpegEncoder::new_with_quality(&mut writer, config.quality.clamp(1, 100)).encode_image(&fitted)?;
    writer.flush()?;
    Ok(())
}

/// Three-channel copy of `img`; alpha is composited over opaque white.
///
/// Palette images are already expanded to RGB(A) by the decoders.
fn flatten(img: &DynamicImage) -> RgbImage {
    if !img.color().has_alpha() {
        return img.to_rgb8();
    }

    let rgba = img.to_rgba8();
    let mut out = RgbImage::new(rgba.width(), rgba.height());
    for (x, y, px) in rgba.enumerate_pixels() {
        let alpha = u32::from(px[3]);
        let blend = |c: u8| ((u32::from(c) * alpha + 255 * (255 - alpha) + 127) / 255) as u8;
        out.put_pixel(x, y, Rgb([blend(px[0]), blend(px[1]), blend(px[2])]));
    }
    out
}

fn jpeg_target(target: &Path) -> PathBuf {
    let is_jpeg = target
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("jpg") || e.eq_ignore_ascii_case("jpeg"))
        .unwrap_or(false);
    if is_jpeg {
        return target.to_path_buf();
    }

    let stem = target
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    target.with_file_name(format!("{stem}_thumb.jpg"))
}

#[cfg(test)]
mod tests {
    use image::{GenericImageView, ImageFormat, Rgba, RgbaImage};

    use super::*;

    fn write_png(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
        let path = dir.join(name);
        let img = RgbaImage::from_pixel(width, height, Rgba([200, 10, 10, 255]));
        img.save_with_format(&path, ImageFormat::Png).unwrap();
        path
    }

    #[test]
    fn landscape_fits_box() {
        let dir = tempfile::tempdir().unwrap();
        let src = write_png(dir.path(), "wide.png", 300, 150);
        let out = create_thumbnail(&src, &dir.path().join("wide_thumb.jpg"), &ThumbnailConfig::default())
            .unwrap();

        let thumb = image::open(&out).unwrap();
        assert_eq!(thumb.dimensions(), (90, 45));
    }

    #[test]
    fn portrait_fits_box() {
        let dir = tempfile::tempdir().unwrap();
        let src = write_png(dir.path(), "tall.png", 120, 480);
        let out = create_thumbnail(&src, &dir.path().join("tall_thumb.jpg"), &ThumbnailConfig::default())
            .unwrap();

        let (w, h) = image::open(&out).unwrap().dimensions();
        assert_eq!(h, 90);
        assert!(w <= 90);
    }

    #[test]
    fn small_images_are_not_upscaled() {
        let dir = tempfile::tempdir().unwrap();
        let src = write_png(dir.path(), "tiny.png", 40, 20);
        let out = create_thumbnail(&src, &dir.path().join("tiny_thumb.jpg"), &ThumbnailConfig::default())
            .unwrap();

        assert_eq!(image::open(&out).unwrap().dimensions(), (40, 20));
    }

    #[test]
    fn output_is_jpeg_even_for_other_target_names() {
        let dir = tempfile::tempdir().unwrap();
        let src = write_png(dir.path(), "shot.png", 100, 100);
        let out = create_thumbnail(&src, &dir.path().join("shot.png"), &ThumbnailConfig::default())
            .unwrap();

        assert_eq!(out.file_name().and_then(|n| n.to_str()), Some("shot_thumb.jpg"));
        let bytes = std::fs::read(&out).unwrap();
        assert_eq!(image::guess_format(&bytes).unwrap(), ImageFormat::Jpeg);
    }

    #[test]
    fn transparency_is_flattened_onto_white() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("clear.png");
        RgbaImage::from_pixel(10, 10, Rgba([0, 0, 0, 0]))
            .save_with_format(&src, ImageFormat::Png)
            .unwrap();

        let out = create_thumbnail(&src, &dir.path().join("clear_thumb.jpg"), &ThumbnailConfig::default())
            .unwrap();
        let px = image::open(&out).unwrap().to_rgb8().get_pixel(5, 5).0;
        assert!(px.iter().all(|&c| c > 240), "expected white, got {px:?}");
    }

    #[test]
    fn corrupt_input_yields_none() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("broken.jpg");
        std::fs::write(&src, b"definitely not an image").unwrap();
        let target = dir.path().join("broken_thumb.jpg");

        assert!(create_thumbnail(&src, &target, &ThumbnailConfig::default()).is_none());
        assert!(!target.exists());
    }

    #[test]
    fn missing_input_yields_none() {
        let dir = tempfile::tempdir().unwrap();
        let out = create_thumbnail(
            &dir.path().join("absent.png"),
            &dir.path().join("absent_thumb.jpg"),
            &ThumbnailConfig::default(),
        );
        assert!(out.is_none());
    }
}
