// ============================================================================
// LIGHT TABLE — two-keyframe comparison: onion-skin blend and flicker check
// ============================================================================
//
// The light table holds up to two keyframes (A and B) and answers one
// question: what should be on screen right now? In onion-skin mode that is a
// multiply blend of B over A at the configured opacity; in flicker mode it is
// whichever frame is currently active, with an external scheduler calling
// tick() to alternate between them. The table owns no timer of its own, which
// keeps the alternation deterministic and testable.

use std::time::Duration;

use rayon::prelude::*;

use crate::raster::Raster;

/// Cadence at which a driving shell should call [`LightTable::tick`] while
/// flicker mode is active: 200 ms, i.e. five alternations per second.
pub const FLICKER_INTERVAL: Duration = Duration::from_millis(200);

/// Default onion-skin opacity, matching a 50% slider position.
pub const DEFAULT_OPACITY_PERCENT: u8 = 50;

/// What the light table is currently showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewMode {
    /// Both frames blended: A solid underneath, B multiplied on top.
    #[default]
    OnionSkin,
    /// Frames alternate on every tick; opacity is ignored.
    Flicker,
}

/// One of the two keyframe slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FrameSlot {
    #[default]
    A,
    B,
}

impl FrameSlot {
    fn other(self) -> Self {
        match self {
            FrameSlot::A => FrameSlot::B,
            FrameSlot::B => FrameSlot::A,
        }
    }
}

/// Error type for loading keyframes into the light table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompareError {
    /// The new frame's dimensions disagree with the frame already loaded in
    /// the other slot. Per-pixel blending requires equal dimensions, so the
    /// mismatch is rejected here rather than surfacing mid-display.
    DimensionMismatch {
        loaded: (u32, u32),
        offered: (u32, u32),
    },
}

impl std::fmt::Display for CompareError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CompareError::DimensionMismatch { loaded, offered } => write!(
                f,
                "keyframe is {}x{} but the other slot holds {}x{}; both frames must match",
                offered.0, offered.1, loaded.0, loaded.1
            ),
        }
    }
}

impl std::error::Error for CompareError {}

/// Two-keyframe comparison state machine.
///
/// Initial state: onion-skin mode, active frame A, 50% opacity, both slots
/// empty. All mutation goes through `&mut self`, so a table shared across
/// threads needs the usual exterior lock; the crate itself never shares one.
#[derive(Debug, Clone)]
pub struct LightTable {
    frame_a: Option<Raster>,
    frame_b: Option<Raster>,
    /// Normalized blend opacity in [0, 1]; only read in onion-skin mode.
    opacity: f32,
    mode: ViewMode,
    /// Which frame a flicker tick last landed on. Meaningless outside
    /// flicker mode but always kept at A there, so entering flicker starts
    /// from a known frame.
    active: FrameSlot,
}

impl Default for LightTable {
    fn default() -> Self {
        Self::new()
    }
}

impl LightTable {
    pub fn new() -> Self {
        Self {
            frame_a: None,
            frame_b: None,
            opacity: DEFAULT_OPACITY_PERCENT as f32 / 100.0,
            mode: ViewMode::OnionSkin,
            active: FrameSlot::A,
        }
    }

    /// Load a keyframe into a slot, replacing any previous occupant.
    ///
    /// Rejects the frame when its dimensions disagree with the frame in the
    /// other slot. Replacing a frame restarts any flicker alternation at A.
    pub fn set_frame(&mut self, slot: FrameSlot, frame: Raster) -> Result<(), CompareError> {
        if let Some(other) = self.frame(slot.other())
            && other.dimensions() != frame.dimensions()
        {
            return Err(CompareError::DimensionMismatch {
                loaded: other.dimensions(),
                offered: frame.dimensions(),
            });
        }
        match slot {
            FrameSlot::A => self.frame_a = Some(frame),
            FrameSlot::B => self.frame_b = Some(frame),
        }
        self.active = FrameSlot::A;
        Ok(())
    }

    /// Empty a slot. Also restarts any flicker alternation at A.
    pub fn clear_frame(&mut self, slot: FrameSlot) {
        match slot {
            FrameSlot::A => self.frame_a = None,
            FrameSlot::B => self.frame_b = None,
        }
        self.active = FrameSlot::A;
    }

    pub fn frame(&self, slot: FrameSlot) -> Option<&Raster> {
        match slot {
            FrameSlot::A => self.frame_a.as_ref(),
            FrameSlot::B => self.frame_b.as_ref(),
        }
    }

    /// Set the onion-skin opacity from a 0–100 slider value. Values above
    /// 100 clamp; a slider cannot produce them, but the boundary stays safe.
    pub fn set_opacity_percent(&mut self, percent: u8) {
        self.opacity = percent.min(100) as f32 / 100.0;
    }

    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    pub fn mode(&self) -> ViewMode {
        self.mode
    }

    /// Switch between onion-skin and flicker display.
    ///
    /// Both entering and leaving flicker reset the active frame to A; the
    /// reset on exit is invisible in onion-skin mode but guarantees that
    /// re-entering flicker always starts on A.
    pub fn set_mode(&mut self, mode: ViewMode) {
        if self.mode != mode {
            self.active = FrameSlot::A;
        }
        self.mode = mode;
    }

    pub fn active_frame(&self) -> FrameSlot {
        self.active
    }

    /// Advance the flicker alternation by one step.
    ///
    /// Flips the active frame only while in flicker mode with both frames
    /// loaded; in every other state a tick is a no-op, so a scheduler that
    /// keeps firing after the mode changed cannot corrupt the state.
    pub fn tick(&mut self) {
        if self.mode == ViewMode::Flicker && self.frame_a.is_some() && self.frame_b.is_some() {
            self.active = self.active.other();
        }
    }

    /// Compute what the light table should currently display.
    ///
    /// Returns `None` when no frame is loaded. With a single frame, that
    /// frame is returned unmodified in either mode. With both frames,
    /// onion-skin mode blends B over A and flicker mode returns the active
    /// frame untouched.
    pub fn display(&self) -> Option<Raster> {
        match self.mode {
            ViewMode::Flicker => match self.active {
                FrameSlot::A => self.frame_a.as_ref().or(self.frame_b.as_ref()).cloned(),
                FrameSlot::B => self.frame_b.as_ref().or(self.frame_a.as_ref()).cloned(),
            },
            ViewMode::OnionSkin => match (&self.frame_a, &self.frame_b) {
                (None, None) => None,
                (Some(a), None) => Some(a.clone()),
                (None, Some(b)) => Some(b.clone()),
                (Some(a), Some(b)) => Some(multiply_blend(a, b, self.opacity)),
            },
        }
    }
}

/// Multiply-blend `top` over `base` at the given opacity.
///
/// Per channel: `out = base*(1-opacity) + (base*top/255)*opacity`. At
/// opacity 0 the result is exactly `base`; at opacity 1 it is the pure
/// multiply of the two frames. The result is fully opaque. Callers guarantee
/// equal dimensions (enforced by [`LightTable::set_frame`]).
fn multiply_blend(base: &Raster, top: &Raster, opacity: f32) -> Raster {
    let w = base.width() as usize;
    let stride = base.stride();
    let base_raw = base.as_raw();
    let top_raw = top.as_raw();

    let mut dst_raw = vec![0u8; base_raw.len()];
    dst_raw.par_chunks_mut(stride).enumerate().for_each(|(y, row_out)| {
        let row_base = &base_raw[y * stride..(y + 1) * stride];
        let row_top = &top_raw[y * stride..(y + 1) * stride];
        for x in 0..w {
            let pi = x * 4;
            for c in 0..3 {
                let bv = row_base[pi + c] as f32;
                let tv = row_top[pi + c] as f32;
                let blended = bv * (1.0 - opacity) + (bv * tv / 255.0) * opacity;
                row_out[pi + c] = blended.round().clamp(0.0, 255.0) as u8;
            }
            row_out[pi + 3] = 255;
        }
    });

    Raster::from_raw(base.width(), base.height(), dst_raw).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat(w: u32, h: u32, rgba: [u8; 4]) -> Raster {
        let mut buf = Vec::with_capacity((w * h * 4) as usize);
        for _ in 0..w * h {
            buf.extend_from_slice(&rgba);
        }
        Raster::from_raw(w, h, buf).unwrap()
    }

    fn loaded_table() -> LightTable {
        let mut lt = LightTable::new();
        lt.set_frame(FrameSlot::A, flat(2, 2, [200, 100, 50, 255])).unwrap();
        lt.set_frame(FrameSlot::B, flat(2, 2, [100, 200, 0, 255])).unwrap();
        lt
    }

    #[test]
    fn starts_in_onion_skin_on_frame_a() {
        let lt = LightTable::new();
        assert_eq!(lt.mode(), ViewMode::OnionSkin);
        assert_eq!(lt.active_frame(), FrameSlot::A);
        assert!(lt.display().is_none());
    }

    #[test]
    fn single_frame_is_shown_unmodified() {
        let mut lt = LightTable::new();
        let a = flat(2, 2, [10, 20, 30, 40]);
        lt.set_frame(FrameSlot::A, a.clone()).unwrap();
        // alpha included: nothing is composited for a lone frame
        assert_eq!(lt.display(), Some(a));
    }

    #[test]
    fn rejects_mismatched_keyframes() {
        let mut lt = LightTable::new();
        lt.set_frame(FrameSlot::A, flat(2, 2, [0, 0, 0, 255])).unwrap();
        let err = lt.set_frame(FrameSlot::B, flat(3, 2, [0, 0, 0, 255]));
        assert_eq!(
            err,
            Err(CompareError::DimensionMismatch {
                loaded: (2, 2),
                offered: (3, 2),
            })
        );
        // The rejected frame must not have been stored.
        assert!(lt.frame(FrameSlot::B).is_none());
    }

    #[test]
    fn opacity_zero_composite_equals_frame_a() {
        let mut lt = loaded_table();
        lt.set_opacity_percent(0);
        let shown = lt.display().unwrap();
        assert_eq!(shown, *lt.frame(FrameSlot::A).unwrap());
    }

    #[test]
    fn opacity_full_composite_is_pure_multiply() {
        let mut lt = loaded_table();
        lt.set_opacity_percent(100);
        let shown = lt.display().unwrap();
        // 200*100/255 = 78.43 → 78, 100*200/255 = 78.43 → 78, 50*0/255 = 0
        assert_eq!(shown.pixel(0, 0), [78, 78, 0, 255]);
    }

    #[test]
    fn half_opacity_mixes_linear_and_multiply() {
        let mut lt = loaded_table();
        lt.set_opacity_percent(50);
        let shown = lt.display().unwrap();
        // r: 200*0.5 + 78.43*0.5 = 139.2 → 139
        // g: 100*0.5 + 78.43*0.5 = 89.2  → 89
        // b: 50*0.5  + 0*0.5     = 25
        assert_eq!(shown.pixel(0, 0), [139, 89, 25, 255]);
    }

    #[test]
    fn opacity_percent_clamps_above_100() {
        let mut lt = LightTable::new();
        lt.set_opacity_percent(150);
        assert_eq!(lt.opacity(), 1.0);
    }

    #[test]
    fn flicker_alternates_strictly() {
        let mut lt = loaded_table();
        lt.set_mode(ViewMode::Flicker);
        assert_eq!(lt.active_frame(), FrameSlot::A);
        let mut seen = Vec::new();
        for _ in 0..5 {
            lt.tick();
            seen.push(lt.active_frame());
        }
        assert_eq!(
            seen,
            vec![FrameSlot::B, FrameSlot::A, FrameSlot::B, FrameSlot::A, FrameSlot::B]
        );
    }

    #[test]
    fn flicker_shows_the_active_frame_and_ignores_opacity() {
        let mut lt = loaded_table();
        lt.set_opacity_percent(0);
        lt.set_mode(ViewMode::Flicker);
        assert_eq!(lt.display(), Some(lt.frame(FrameSlot::A).unwrap().clone()));
        lt.tick();
        assert_eq!(lt.display(), Some(lt.frame(FrameSlot::B).unwrap().clone()));
    }

    #[test]
    fn entering_and_leaving_flicker_resets_to_a() {
        let mut lt = loaded_table();
        lt.set_mode(ViewMode::Flicker);
        lt.tick();
        assert_eq!(lt.active_frame(), FrameSlot::B);
        lt.set_mode(ViewMode::OnionSkin);
        assert_eq!(lt.active_frame(), FrameSlot::A);
        // Re-entering must start on A again.
        lt.set_mode(ViewMode::Flicker);
        assert_eq!(lt.active_frame(), FrameSlot::A);
    }

    #[test]
    fn tick_is_a_no_op_outside_flicker() {
        let mut lt = loaded_table();
        lt.tick();
        assert_eq!(lt.active_frame(), FrameSlot::A);
    }

    #[test]
    fn tick_is_a_no_op_with_a_missing_frame() {
        let mut lt = LightTable::new();
        lt.set_frame(FrameSlot::A, flat(1, 1, [0, 0, 0, 255])).unwrap();
        lt.set_mode(ViewMode::Flicker);
        lt.tick();
        assert_eq!(lt.active_frame(), FrameSlot::A);
    }

    #[test]
    fn replacing_a_frame_restarts_the_alternation() {
        let mut lt = loaded_table();
        lt.set_mode(ViewMode::Flicker);
        lt.tick();
        assert_eq!(lt.active_frame(), FrameSlot::B);
        lt.set_frame(FrameSlot::B, flat(2, 2, [1, 2, 3, 255])).unwrap();
        assert_eq!(lt.active_frame(), FrameSlot::A);
    }

    #[test]
    fn composite_is_fully_opaque() {
        let mut lt = LightTable::new();
        lt.set_frame(FrameSlot::A, flat(2, 2, [200, 100, 50, 120])).unwrap();
        lt.set_frame(FrameSlot::B, flat(2, 2, [100, 200, 0, 10])).unwrap();
        let shown = lt.display().unwrap();
        for y in 0..2 {
            for x in 0..2 {
                assert_eq!(shown.pixel(x, y)[3], 255);
            }
        }
    }

    #[test]
    fn flicker_interval_is_five_per_second() {
        assert_eq!(FLICKER_INTERVAL, Duration::from_millis(200));
    }
}
