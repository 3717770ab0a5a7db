// ============================================================================
// CLEANUP — binarize a scanned sketch against a luminance threshold
// ============================================================================

use rayon::prelude::*;

use crate::ops::luminance;
use crate::raster::Raster;

/// Color applied to ink pixels in [`InkStyle::NonPhotoBlue`] mode; the
/// col-erase pencil blue traditionally used for under-drawing.
pub const NON_PHOTO_BLUE: [u8; 3] = [70, 130, 255];

/// How classified ink pixels are recolored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InkStyle {
    /// Pure black lines on white paper.
    BlackInk,
    /// Non-photo blue lines on white paper.
    NonPhotoBlue,
}

/// Threshold a rough scan into clean two-tone line art.
///
/// Pixels whose channel mean is strictly below `threshold` are ink and take
/// the style color; everything else becomes pure white paper. The output is
/// fully opaque regardless of the input alpha.
///
/// A threshold of 0 therefore produces an all-white image: no mean is
/// strictly below zero, not even pure black. The strict `<` is load-bearing
/// and deliberately differs from the `>` test in
/// [`extract_lines`](crate::ops::extract::extract_lines); the two tools
/// break the tie in opposite directions.
pub fn cleanup(src: &Raster, threshold: u8, style: InkStyle) -> Raster {
    let w = src.width() as usize;
    let stride = src.stride();
    let src_raw = src.as_raw();
    let cutoff = threshold as f32;
    let ink: [u8; 3] = match style {
        InkStyle::BlackInk => [0, 0, 0],
        InkStyle::NonPhotoBlue => NON_PHOTO_BLUE,
    };

    let mut dst_raw = vec![0u8; src_raw.len()];
    dst_raw.par_chunks_mut(stride).enumerate().for_each(|(y, row_out)| {
        let row_in = &src_raw[y * stride..(y + 1) * stride];
        for x in 0..w {
            let pi = x * 4;
            let avg = luminance(row_in[pi], row_in[pi + 1], row_in[pi + 2]);
            let rgb = if avg < cutoff { &ink } else { &[255, 255, 255] };
            row_out[pi..pi + 3].copy_from_slice(rgb);
            row_out[pi + 3] = 255;
        }
    });

    // Same dimensions as the input, so construction cannot fail.
    Raster::from_raw(src.width(), src.height(), dst_raw).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single(rgba: [u8; 4]) -> Raster {
        Raster::from_raw(1, 1, rgba.to_vec()).unwrap()
    }

    #[test]
    fn mid_gray_becomes_black_ink() {
        let out = cleanup(&single([100, 100, 100, 255]), 128, InkStyle::BlackInk);
        assert_eq!(out.pixel(0, 0), [0, 0, 0, 255]);
    }

    #[test]
    fn mid_gray_becomes_non_photo_blue() {
        let out = cleanup(&single([100, 100, 100, 255]), 128, InkStyle::NonPhotoBlue);
        assert_eq!(out.pixel(0, 0), [70, 130, 255, 255]);
    }

    #[test]
    fn pixel_at_threshold_is_paper() {
        // avg == threshold fails the strict `avg < threshold` test, so the
        // pixel is paper, not ink. The opposite tie-break belongs to
        // extraction only.
        let out = cleanup(&single([128, 128, 128, 255]), 128, InkStyle::BlackInk);
        assert_eq!(out.pixel(0, 0), [255, 255, 255, 255]);
    }

    #[test]
    fn threshold_zero_whitens_everything() {
        // Not even pure black satisfies avg < 0.
        let out = cleanup(&single([0, 0, 0, 255]), 0, InkStyle::BlackInk);
        assert_eq!(out.pixel(0, 0), [255, 255, 255, 255]);
    }

    #[test]
    fn threshold_255_inks_everything_but_pure_white() {
        let out = cleanup(&single([254, 254, 254, 255]), 255, InkStyle::BlackInk);
        assert_eq!(out.pixel(0, 0), [0, 0, 0, 255]);
        let out = cleanup(&single([255, 255, 255, 255]), 255, InkStyle::BlackInk);
        assert_eq!(out.pixel(0, 0), [255, 255, 255, 255]);
    }

    #[test]
    fn input_alpha_is_ignored_and_output_is_opaque() {
        let out = cleanup(&single([10, 10, 10, 0]), 128, InkStyle::BlackInk);
        assert_eq!(out.pixel(0, 0), [0, 0, 0, 255]);
    }

    #[test]
    fn dimensions_are_preserved() {
        let src = Raster::from_raw(3, 5, vec![200u8; 3 * 5 * 4]).unwrap();
        let out = cleanup(&src, 128, InkStyle::BlackInk);
        assert_eq!(out.dimensions(), src.dimensions());
    }

    #[test]
    fn second_pass_is_a_fixed_point() {
        // Once binarized, every pixel is pure black or pure white; running
        // the same parameters again changes nothing.
        let pixels: Vec<u8> = (0..4 * 4 * 4).map(|i| (i * 37 % 256) as u8).collect();
        let src = Raster::from_raw(4, 4, pixels).unwrap();
        let once = cleanup(&src, 128, InkStyle::BlackInk);
        let twice = cleanup(&once, 128, InkStyle::BlackInk);
        assert_eq!(once, twice);

        let once_blue = cleanup(&src, 128, InkStyle::NonPhotoBlue);
        let twice_blue = cleanup(&once_blue, 128, InkStyle::NonPhotoBlue);
        assert_eq!(once_blue, twice_blue);
    }

    #[test]
    fn mixed_channels_classify_by_mean() {
        // (255 + 0 + 0) / 3 = 85.0 < 128 → ink
        let out = cleanup(&single([255, 0, 0, 255]), 128, InkStyle::BlackInk);
        assert_eq!(out.pixel(0, 0), [0, 0, 0, 255]);
        // (255 + 255 + 0) / 3 = 170.0 ≥ 128 → paper
        let out = cleanup(&single([255, 255, 0, 255]), 128, InkStyle::BlackInk);
        assert_eq!(out.pixel(0, 0), [255, 255, 255, 255]);
    }
}
