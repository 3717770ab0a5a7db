// ============================================================================
// LINE EXTRACTION — turn white paper into transparency for coloring
// ============================================================================

use rayon::prelude::*;

use crate::ops::luminance;
use crate::raster::Raster;

/// Strip the paper background out of scanned line art, producing an
/// alpha-masked overlay ready for digital coloring.
///
/// Pixels whose channel mean is strictly above `threshold` are paper: their
/// RGB is kept as-is and only the alpha is zeroed. Everything else is a line
/// pixel and becomes solid black at full opacity.
///
/// Paper RGB is intentionally *not* normalized to white. Downstream
/// compositing keys on alpha alone, so zeroing alpha is sufficient; this is
/// not the same rule as [`cleanup`](crate::ops::cleanup::cleanup), which
/// forces paper to white. Note also the comparison direction: paper is
/// `avg > threshold` here, so a pixel sitting exactly on the threshold is a
/// line. Cleanup breaks the same tie the other way (`avg < threshold` for
/// ink). Both tie-breaks are deliberate; unifying them silently changes
/// observable output at the boundary.
pub fn extract_lines(src: &Raster, threshold: u8) -> Raster {
    let w = src.width() as usize;
    let stride = src.stride();
    let src_raw = src.as_raw();
    let cutoff = threshold as f32;

    let mut dst_raw = vec![0u8; src_raw.len()];
    dst_raw.par_chunks_mut(stride).enumerate().for_each(|(y, row_out)| {
        let row_in = &src_raw[y * stride..(y + 1) * stride];
        for x in 0..w {
            let pi = x * 4;
            let avg = luminance(row_in[pi], row_in[pi + 1], row_in[pi + 2]);
            if avg > cutoff {
                // Paper: RGB untouched, fully transparent.
                row_out[pi..pi + 3].copy_from_slice(&row_in[pi..pi + 3]);
                row_out[pi + 3] = 0;
            } else {
                // Line: solid black for clean coloring.
                row_out[pi..pi + 4].copy_from_slice(&[0, 0, 0, 255]);
            }
        }
    });

    Raster::from_raw(src.width(), src.height(), dst_raw).unwrap()
}
