//! Normalized tracker signals

use serde::Serialize;

use super::{MonitorId, Tracker, WindowId, WorkspaceId};
use crate::native::{WindowActions, WindowState};
use crate::shared::Geometry;

/// Change notification emitted after the tracker's registries were updated
///
/// Change signals carry the previous value next to the new one so consumers
/// can diff.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "signal", rename_all = "snake_case")]
pub enum TrackerEvent {
    WindowOpened { window: WindowId },
    /// The id is already stale when this is delivered
    WindowClosed { window: WindowId },
    WindowNameChanged { window: WindowId },
    WindowIconChanged { window: WindowId },
    WindowStateChanged { window: WindowId, old: WindowState, new: WindowState },
    WindowActionsChanged { window: WindowId, old: WindowActions, new: WindowActions },
    WindowGeometryChanged { window: WindowId, old: Geometry, new: Geometry },
    WindowWorkspaceChanged {
        window: WindowId,
        old: Option<WorkspaceId>,
        new: Option<WorkspaceId>,
    },
    WindowMonitorChanged {
        window: WindowId,
        old: Option<MonitorId>,
        new: Option<MonitorId>,
    },
    ActiveWindowChanged { old: Option<WindowId>, new: Option<WindowId> },
    WindowStackingChanged,

    WorkspaceAdded { workspace: WorkspaceId },
    WorkspaceRemoved { workspace: WorkspaceId },
    WorkspaceNameChanged { workspace: WorkspaceId },
    ActiveWorkspaceChanged { old: Option<WorkspaceId>, new: Option<WorkspaceId> },

    MonitorAdded { monitor: MonitorId },
    MonitorRemoved { monitor: MonitorId },
    MonitorGeometryChanged { monitor: MonitorId, old: Geometry, new: Geometry },
    PrimaryMonitorChanged { old: Option<MonitorId>, new: Option<MonitorId> },
    ScreenSizeChanged { width: u32, height: u32 },
    WindowManagerChanged,
}

/// Consumer of tracker signals
pub trait TrackerObserver {
    fn on_tracker_event(&mut self, tracker: &Tracker, event: &TrackerEvent);
}
