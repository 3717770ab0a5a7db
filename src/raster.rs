// ============================================================================
// RASTER MODEL — validated RGBA pixel buffer shared by every operation
// ============================================================================

use image::RgbaImage;

/// Error type for raster construction.
///
/// A raster is either fully valid or never exists; no operation in the crate
/// ever sees a partially constructed pixel buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RasterError {
    /// Width or height is zero.
    ZeroDimension { width: u32, height: u32 },
    /// Pixel buffer length does not match `width * height * 4`.
    BufferLength { expected: usize, actual: usize },
}

impl std::fmt::Display for RasterError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RasterError::ZeroDimension { width, height } => {
                write!(f, "raster dimensions cannot be zero (got {}x{})", width, height)
            }
            RasterError::BufferLength { expected, actual } => {
                write!(
                    f,
                    "pixel buffer holds {} bytes, expected {} for the given dimensions",
                    actual, expected
                )
            }
        }
    }
}

impl std::error::Error for RasterError {}

/// An owned width × height grid of RGBA byte pixels, interleaved row-major.
///
/// Transforms borrow a `Raster` and return a freshly allocated output; nothing
/// in the crate mutates pixel data in place. The length invariant
/// (`pixels.len() == width * height * 4`) is checked once at construction and
/// holds for the lifetime of the value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Raster {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Raster {
    /// Build a raster from raw interleaved RGBA bytes.
    pub fn from_raw(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self, RasterError> {
        if width == 0 || height == 0 {
            return Err(RasterError::ZeroDimension { width, height });
        }
        let expected = width as usize * height as usize * 4;
        if pixels.len() != expected {
            return Err(RasterError::BufferLength {
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self { width, height, pixels })
    }

    /// Build a raster from a decoded [`image::RgbaImage`].
    pub fn from_rgba_image(img: &RgbaImage) -> Result<Self, RasterError> {
        Self::from_raw(img.width(), img.height(), img.as_raw().clone())
    }

    /// Convert back to an [`image::RgbaImage`] for encoding.
    pub fn to_rgba_image(&self) -> RgbaImage {
        // Length invariant is checked at construction, so from_raw cannot fail.
        RgbaImage::from_raw(self.width, self.height, self.pixels.clone()).unwrap()
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Raster dimensions as a `(width, height)` pair.
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Bytes per pixel row.
    pub fn stride(&self) -> usize {
        self.width as usize * 4
    }

    /// Raw interleaved RGBA bytes, row-major.
    pub fn as_raw(&self) -> &[u8] {
        &self.pixels
    }

    /// Consume the raster and return its pixel buffer.
    pub fn into_raw(self) -> Vec<u8> {
        self.pixels
    }

    /// The `[R, G, B, A]` quadruple at `(x, y)`.
    ///
    /// Panics when out of bounds; callers iterate within `width`/`height`.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        assert!(x < self.width && y < self.height, "pixel ({}, {}) out of bounds", x, y);
        let i = (y as usize * self.width as usize + x as usize) * 4;
        [self.pixels[i], self.pixels[i + 1], self.pixels[i + 2], self.pixels[i + 3]]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_zero_dimensions() {
        assert_eq!(
            Raster::from_raw(0, 4, vec![]),
            Err(RasterError::ZeroDimension { width: 0, height: 4 })
        );
        assert_eq!(
            Raster::from_raw(4, 0, vec![]),
            Err(RasterError::ZeroDimension { width: 4, height: 0 })
        );
    }

    #[test]
    fn rejects_wrong_buffer_length() {
        // 2x2 needs 16 bytes
        assert_eq!(
            Raster::from_raw(2, 2, vec![0u8; 15]),
            Err(RasterError::BufferLength { expected: 16, actual: 15 })
        );
    }

    #[test]
    fn pixel_access_is_row_major() {
        let mut buf = vec![0u8; 2 * 2 * 4];
        // pixel (1, 0) = red, pixel (0, 1) = green
        buf[4..8].copy_from_slice(&[255, 0, 0, 255]);
        buf[8..12].copy_from_slice(&[0, 255, 0, 255]);
        let r = Raster::from_raw(2, 2, buf).unwrap();
        assert_eq!(r.pixel(1, 0), [255, 0, 0, 255]);
        assert_eq!(r.pixel(0, 1), [0, 255, 0, 255]);
        assert_eq!(r.dimensions(), (2, 2));
        assert_eq!(r.stride(), 8);
    }

    #[test]
    fn rgba_image_round_trip() {
        let img = image::RgbaImage::from_pixel(3, 2, image::Rgba([10, 20, 30, 40]));
        let raster = Raster::from_rgba_image(&img).unwrap();
        assert_eq!(raster.to_rgba_image(), img);
    }
}
