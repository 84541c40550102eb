//! Orrery engine crate.
//!
//! An immediate-mode batched 2D renderer (`render`) plus the platform and
//! GPU runtime pieces that host it (`window`, `device`, `core`).

pub mod core;
pub mod device;
pub mod window;

pub mod coords;
pub mod logging;
pub mod paint;
pub mod render;
