use anyhow::Result;
use thiserror::Error;

use super::{NativeDamage, NativePixmap, NativeWindow, NativeWorkspace};
use crate::shared::{Geometry, Image};

/// Commands and lookups the tracker forwards to the windowing system
///
/// Commands are fire-and-forget: success is observed later through the
/// matching [`super::NativeEvent`].
pub trait WindowBackend {
    fn activate_window(&self, window: NativeWindow) -> Result<()>;

    fn close_window(&self, window: NativeWindow) -> Result<()>;

    /// Move and/or resize; `None` components are left untouched
    fn move_resize_window(
        &self,
        window: NativeWindow,
        position: Option<(i32, i32)>,
        size: Option<(u32, u32)>,
    ) -> Result<()>;

    fn move_window_to_workspace(&self, window: NativeWindow, workspace: NativeWorkspace) -> Result<()>;

    fn set_window_minimized(&self, window: NativeWindow, minimized: bool) -> Result<()>;

    fn activate_workspace(&self, workspace: NativeWorkspace) -> Result<()>;

    /// Map the shell's own stage window
    fn show_stage_window(&self, window: NativeWindow) -> Result<()>;

    /// Unmap the shell's own stage window
    fn hide_stage_window(&self, window: NativeWindow) -> Result<()>;

    /// Whether monitors are reported individually and may be hot-plugged
    fn supports_multiple_monitors(&self) -> bool;

    /// Desktop window advertised through the background pixmap hint, if any.
    /// Often stale during deferred start-up.
    fn background_window_hint(&self) -> Option<NativeWindow>;
}

/// Extensions available for live capture, detected once at start-up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureCapabilities {
    /// Off-screen redirection with named window pixmaps
    pub composite: bool,
    /// Change notifications for redirected windows
    pub damage: bool,
}

/// Why a capture resource could not be acquired
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CaptureError {
    #[error("{op} failed for window {window}: {reason}")]
    Protocol {
        op: &'static str,
        window: NativeWindow,
        reason: String,
    },

    #[error("window {0} is not viewable")]
    NotViewable(NativeWindow),

    #[error("live capture is not supported by the display")]
    Unsupported,
}

/// Native capture resources used by window content
///
/// Every fallible call is error-trapped by the implementation: native
/// protocol errors come back as [`CaptureError`] and never abort the process.
pub trait CaptureBackend {
    fn capabilities(&self) -> CaptureCapabilities;

    fn is_window_mapped(&self, window: NativeWindow) -> bool;

    /// Window whose pixels are captured: the client itself, or the window
    /// manager frame around it when `include_frame` is set.
    fn capture_target(&self, window: NativeWindow, include_frame: bool) -> NativeWindow;

    fn name_window_pixmap(&self, window: NativeWindow) -> Result<NativePixmap, CaptureError>;

    /// Width and height of a named pixmap
    fn pixmap_size(&self, pixmap: NativePixmap) -> Result<(u32, u32), CaptureError>;

    fn free_pixmap(&self, pixmap: NativePixmap);

    fn create_damage(&self, window: NativeWindow) -> Result<NativeDamage, CaptureError>;

    /// Acknowledge all pending damage so further changes are reported again
    fn subtract_damage(&self, damage: NativeDamage);

    fn destroy_damage(&self, damage: NativeDamage);

    /// Copy the pixels of a pixmap into an independent image
    fn read_pixels(&self, pixmap: NativePixmap, area: Geometry) -> Result<Image, CaptureError>;
}
