//! Shared value types
//!
//! Plain data used by both the tracker and the window content code.

mod geometry;
mod image;

pub use geometry::Geometry;
pub use image::Image;
