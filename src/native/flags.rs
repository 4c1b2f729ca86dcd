//! Window flags
//!
//! Bitfield flags for window state and allowed actions, as reported by the
//! window manager through EWMH.

use bitflags::bitflags;
use serde::Serialize;

bitflags! {
    /// Window state flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize)]
    pub struct WindowState: u32 {
        const HIDDEN        = 1 << 0;
        const MINIMIZED     = 1 << 1;
        const MAXIMIZED     = 1 << 2;
        const FULLSCREEN    = 1 << 3;
        const SKIP_PAGER    = 1 << 4;
        const SKIP_TASKLIST = 1 << 5;
        const PINNED        = 1 << 6;
        const URGENT        = 1 << 7;
    }
}

bitflags! {
    /// Actions the window manager allows on a window
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize)]
    pub struct WindowActions: u32 {
        const CLOSE            = 1 << 0;
        const MOVE             = 1 << 1;
        const RESIZE           = 1 << 2;
        const MINIMIZE         = 1 << 3;
        const MAXIMIZE         = 1 << 4;
        const FULLSCREEN       = 1 << 5;
        const CHANGE_WORKSPACE = 1 << 6;
        const STICK            = 1 << 7;
    }
}

/// EWMH window type (`_NET_WM_WINDOW_TYPE`), reduced to what the shell cares about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize)]
pub enum WindowType {
    #[default]
    Normal,
    Desktop,
    Dock,
    Dialog,
    Toolbar,
    Menu,
    Utility,
    Splash,
}
