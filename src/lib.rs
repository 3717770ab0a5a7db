//! inkdesk — offline bitmap tools for hand-drawn animation workflows.
//!
//! Three tools over plain RGBA rasters:
//!
//! * **cleanup** — threshold a rough scan into two-tone line art, black ink
//!   or non-photo blue ([`ops::cleanup`]).
//! * **extract** — turn white paper into transparency so line art can be
//!   colored underneath ([`ops::extract`]).
//! * **compare** — a light-table state machine for checking motion between
//!   two keyframes: onion-skin multiply blending, or a tick-driven flicker
//!   alternation ([`compare`]).
//!
//! The transforms are pure functions: they borrow a [`Raster`], never mutate
//! it, and return a freshly allocated result. Decoding and encoding live at
//! the edges in [`io`]; the headless shell lives in [`cli`].

pub mod cli;
pub mod compare;
pub mod io;
pub mod logger;
pub mod ops;
pub mod raster;

pub use compare::{CompareError, FLICKER_INTERVAL, FrameSlot, LightTable, ViewMode};
pub use ops::cleanup::{InkStyle, NON_PHOTO_BLUE, cleanup};
pub use ops::extract::extract_lines;
pub use raster::{Raster, RasterError};
