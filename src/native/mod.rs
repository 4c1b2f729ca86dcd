//! Native windowing system seam
//!
//! Everything the tracker and the window content code know about the host
//! windowing system goes through this module: opaque handles, the inbound
//! event stream and the two backend traits. The X11 implementation lives in
//! [`crate::x11`]; tests use in-memory backends.

mod backend;
mod flags;

use std::sync::Arc;

use serde::Serialize;

use crate::shared::{Geometry, Image};

pub use backend::{CaptureBackend, CaptureCapabilities, CaptureError, WindowBackend};
pub use flags::{WindowActions, WindowState, WindowType};

macro_rules! native_handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
        pub struct $name(pub u32);

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "0x{:x}", self.0)
            }
        }
    };
}

native_handle!(
    /// Top-level client window id
    NativeWindow
);
native_handle!(
    /// Virtual desktop index
    NativeWorkspace
);
native_handle!(
    /// Output/monitor identity (stable across re-layouts)
    NativeMonitor
);
native_handle!(
    /// Off-screen pixmap holding a redirected window's contents
    NativePixmap
);
native_handle!(
    /// Damage object reporting content changes of a window
    NativeDamage
);

/// Snapshot of a window's properties at the time it was announced
#[derive(Debug, Clone, PartialEq)]
pub struct NativeWindowInfo {
    pub window: NativeWindow,
    pub name: String,
    pub icon: Option<Arc<Image>>,
    pub geometry: Geometry,
    pub state: WindowState,
    pub actions: WindowActions,
    pub window_type: WindowType,
    /// `None` for pinned windows or windows not yet placed on a workspace
    pub workspace: Option<NativeWorkspace>,
    pub pid: Option<u32>,
    /// `WM_CLASS` res_name and res_class
    pub instance_names: Vec<String>,
    /// The shell's own stage window
    pub is_stage: bool,
}

impl NativeWindowInfo {
    pub fn new(window: NativeWindow) -> Self {
        Self {
            window,
            name: String::new(),
            icon: None,
            geometry: Geometry::default(),
            state: WindowState::empty(),
            actions: WindowActions::empty(),
            window_type: WindowType::Normal,
            workspace: None,
            pid: None,
            instance_names: Vec::new(),
            is_stage: false,
        }
    }
}

/// Output as reported by the display server
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NativeMonitorInfo {
    pub monitor: NativeMonitor,
    pub geometry: Geometry,
    pub primary: bool,
}

/// Inbound event stream from the windowing system
///
/// The first group mirrors window-manager level changes; the last group are
/// raw notifications filtered from the low-level event stream and only
/// consumed by the window content code.
#[derive(Debug, Clone, PartialEq)]
pub enum NativeEvent {
    WindowOpened(NativeWindowInfo),
    WindowClosed(NativeWindow),
    WindowNameChanged { window: NativeWindow, name: String },
    WindowIconChanged { window: NativeWindow, icon: Option<Arc<Image>> },
    WindowStateChanged { window: NativeWindow, state: WindowState },
    WindowActionsChanged { window: NativeWindow, actions: WindowActions },
    WindowGeometryChanged { window: NativeWindow, geometry: Geometry },
    WindowWorkspaceChanged { window: NativeWindow, workspace: Option<NativeWorkspace> },
    /// Full stacking order, bottom-most first
    StackingChanged(Vec<NativeWindow>),
    ActiveWindowChanged(Option<NativeWindow>),

    WorkspaceAdded { workspace: NativeWorkspace, name: String },
    WorkspaceRemoved(NativeWorkspace),
    WorkspaceRenamed { workspace: NativeWorkspace, name: String },
    ActiveWorkspaceChanged(Option<NativeWorkspace>),

    MonitorAdded(NativeMonitorInfo),
    MonitorRemoved(NativeMonitor),
    MonitorGeometryChanged { monitor: NativeMonitor, geometry: Geometry },
    PrimaryMonitorChanged(Option<NativeMonitor>),
    ScreenSizeChanged { width: u32, height: u32 },
    WindowManagerChanged,

    Mapped(NativeWindow),
    Unmapped(NativeWindow),
    Configured { window: NativeWindow, width: u32, height: u32 },
    Destroyed(NativeWindow),
    Damaged(NativeDamage),
}

impl NativeEvent {
    /// Raw notifications bypass the tracker
    pub fn is_raw(&self) -> bool {
        matches!(
            self,
            NativeEvent::Mapped(_)
                | NativeEvent::Unmapped(_)
                | NativeEvent::Configured { .. }
                | NativeEvent::Destroyed(_)
                | NativeEvent::Damaged(_)
        )
    }
}
