//! Area Tracker
//!
//! Window, workspace and monitor tracking for the Area shell, plus live
//! window contents: per-window textures fed by the composite extension
//! that fall back to the window icon whenever live capture is not possible.

pub mod config;
pub mod content;
pub mod core;
pub mod native;
pub mod shared;
pub mod tracker;
pub mod x11;
pub mod x11_async;

#[cfg(test)]
mod testing;

pub use crate::config::{Config, ContentConfig, ResumePriority};
pub use crate::content::{ContentId, ContentManager, WindowContent};
pub use crate::core::Core;
pub use crate::tracker::{Tracker, TrackerEvent, TrackerObserver, WindowId};
