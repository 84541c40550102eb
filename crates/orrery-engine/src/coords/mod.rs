//! Coordinate spaces shared by the renderer and the window glue.
//!
//! Two spaces exist:
//! - screen space: pixels, origin top-left, +X right, +Y down
//! - world space: simulation units, origin at the viewport center, +Y up
//!
//! `ViewPort` holds the world-space clip planes and the screen size that
//! relate the two.

mod viewport;

pub use viewport::ViewPort;
