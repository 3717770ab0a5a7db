// ============================================================================
// IMAGE I/O — decode scans into rasters, encode results back to disk
// ============================================================================
//
// The transforms themselves never touch the filesystem; this module is the
// single seam where external image formats become Rasters and back.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use image::codecs::bmp::BmpEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{DynamicImage, RgbaImage};

use crate::raster::Raster;

/// Output encodings the CLI can write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveFormat {
    Png,
    Jpeg,
    Webp,
    Bmp,
}

impl SaveFormat {
    pub fn extension(self) -> &'static str {
        match self {
            SaveFormat::Png => "png",
            SaveFormat::Jpeg => "jpg",
            SaveFormat::Webp => "webp",
            SaveFormat::Bmp => "bmp",
        }
    }

    /// Whether the encoding carries the alpha channel. Line-extraction
    /// output is meaningless without it.
    pub fn preserves_alpha(self) -> bool {
        !matches!(self, SaveFormat::Jpeg)
    }
}

/// Decode an image file (PNG/JPEG/WebP and anything else the `image` crate
/// recognizes) into an RGBA raster.
pub fn load_raster(path: &Path) -> Result<Raster, String> {
    let img: RgbaImage = image::open(path)
        .map_err(|e| format!("decode failed for '{}': {}", path.display(), e))?
        .to_rgba8();
    Raster::from_rgba_image(&img).map_err(|e| e.to_string())
}

/// Encode a raster and write it to `path`.
///
/// Standalone function (no state) so batch jobs can fan it out to worker
/// threads freely.
pub fn encode_and_write(
    raster: &Raster,
    path: &Path,
    format: SaveFormat,
    quality: u8,
) -> Result<(), String> {
    let image = raster.to_rgba_image();
    let file =
        File::create(path).map_err(|e| format!("cannot create '{}': {}", path.display(), e))?;
    let mut writer = BufWriter::new(file);

    match format {
        SaveFormat::Png => {
            let encoder = PngEncoder::new(&mut writer);
            #[allow(deprecated)]
            encoder
                .encode(
                    image.as_raw(),
                    image.width(),
                    image.height(),
                    image::ColorType::Rgba8,
                )
                .map_err(|e| e.to_string())?;
        }
        SaveFormat::Jpeg => {
            // JPEG has no alpha channel; flatten to RGB first.
            let rgb_image = DynamicImage::ImageRgba8(image).to_rgb8();
            let mut encoder = JpegEncoder::new_with_quality(&mut writer, quality);
            encoder
                .encode(
                    rgb_image.as_raw(),
                    rgb_image.width(),
                    rgb_image.height(),
                    image::ColorType::Rgb8,
                )
                .map_err(|e| e.to_string())?;
        }
        SaveFormat::Webp => {
            let dyn_img = DynamicImage::ImageRgba8(image);
            dyn_img.save(path).map_err(|e| e.to_string())?;
        }
        SaveFormat::Bmp => {
            let mut encoder = BmpEncoder::new(&mut writer);
            encoder
                .encode(
                    image.as_raw(),
                    image.width(),
                    image.height(),
                    image::ColorType::Rgba8,
                )
                .map_err(|e| e.to_string())?;
        }
    }

    Ok(())
}
