//! Colour model for emitted vertices.

pub mod color;

pub use color::Color;
