//! Window Tracker Module
//!
//! Single source of truth for the top-level windows, workspaces and monitors
//! of the display. Native events are folded into arena-owned wrappers and
//! re-emitted as normalized [`TrackerEvent`]s; commands are forwarded to the
//! [`WindowBackend`].

mod events;
mod monitor;
pub(crate) mod registry;
mod window;
mod workspace;

use std::cell::Cell;
use std::rc::Rc;

use slotmap::new_key_type;
use thiserror::Error;
use tracing::{debug, info, trace, warn};

use crate::native::{
    NativeEvent, NativeMonitor, NativeMonitorInfo, NativeWindow, NativeWindowInfo,
    NativeWorkspace, WindowBackend, WindowType,
};
use crate::shared::Geometry;

pub use events::{TrackerEvent, TrackerObserver};
pub use monitor::TrackedMonitor;
pub use registry::Registry;
pub use window::TrackedWindow;
pub use workspace::TrackedWorkspace;

new_key_type! {
    /// Reference to a [`TrackedWindow`]
    pub struct WindowId;

    /// Reference to a [`TrackedWorkspace`]
    pub struct WorkspaceId;

    /// Reference to a [`TrackedMonitor`]
    pub struct MonitorId;
}

/// Handle used for the synthetic monitor of single-monitor backends
const SYNTHETIC_MONITOR: NativeMonitor = NativeMonitor(0);

#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("window {0:?} is not tracked")]
    UnknownWindow(WindowId),

    #[error("workspace {0:?} is not tracked")]
    UnknownWorkspace(WorkspaceId),

    #[error("window {0:?} is not the stage window")]
    NotStageWindow(WindowId),

    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

/// Mirror of the display's windows, workspaces and monitors
pub struct Tracker {
    backend: Rc<dyn WindowBackend>,

    windows: Registry<NativeWindow, WindowId, TrackedWindow>,
    /// Client list order
    window_order: Vec<WindowId>,
    /// Last native stacking list, bottom-most first
    native_stacking: Vec<NativeWindow>,
    /// Wrapped windows, front to back
    stacking: Vec<WindowId>,

    workspaces: Registry<NativeWorkspace, WorkspaceId, TrackedWorkspace>,
    workspace_order: Vec<WorkspaceId>,

    monitors: Registry<NativeMonitor, MonitorId, TrackedMonitor>,
    monitor_order: Vec<MonitorId>,

    active_window: Option<WindowId>,
    active_workspace: Option<WorkspaceId>,
    primary_monitor: Option<MonitorId>,

    multiple_monitors: bool,
    native_screen_size: (u32, u32),
    /// Bounding box of all monitors, recomputed lazily
    screen_size: Cell<Option<(u32, u32)>>,
}

impl Tracker {
    /// Create an empty tracker. State arrives through [`Tracker::handle_native_event`].
    pub fn new(backend: Rc<dyn WindowBackend>) -> Self {
        let multiple_monitors = backend.supports_multiple_monitors();
        let mut tracker = Self {
            backend,
            windows: Registry::new(),
            window_order: Vec::new(),
            native_stacking: Vec::new(),
            stacking: Vec::new(),
            workspaces: Registry::new(),
            workspace_order: Vec::new(),
            monitors: Registry::new(),
            monitor_order: Vec::new(),
            active_window: None,
            active_workspace: None,
            primary_monitor: None,
            multiple_monitors,
            native_screen_size: (0, 0),
            screen_size: Cell::new(None),
        };

        if !multiple_monitors {
            info!("Backend does not support multiple monitors, using a single synthetic monitor");
            let (id, _) = tracker.monitors.get_or_insert_with(SYNTHETIC_MONITOR, || TrackedMonitor {
                handle: SYNTHETIC_MONITOR,
                number: 0,
                geometry: Geometry::default(),
                primary: true,
            });
            tracker.monitor_order.push(id);
            tracker.primary_monitor = Some(id);
        }

        tracker
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub fn window(&self, id: WindowId) -> Option<&TrackedWindow> {
        self.windows.get(id)
    }

    pub fn workspace(&self, id: WorkspaceId) -> Option<&TrackedWorkspace> {
        self.workspaces.get(id)
    }

    pub fn monitor(&self, id: MonitorId) -> Option<&TrackedMonitor> {
        self.monitors.get(id)
    }

    pub fn lookup_window(&self, handle: NativeWindow) -> Option<WindowId> {
        self.windows.lookup(handle)
    }

    pub fn lookup_workspace(&self, handle: NativeWorkspace) -> Option<WorkspaceId> {
        self.workspaces.lookup(handle)
    }

    pub fn lookup_monitor(&self, handle: NativeMonitor) -> Option<MonitorId> {
        self.monitors.lookup(handle)
    }

    /// Windows in client list order
    pub fn get_windows(&self) -> &[WindowId] {
        &self.window_order
    }

    /// Windows in visual order, front-most first
    pub fn get_windows_stacked(&self) -> &[WindowId] {
        &self.stacking
    }

    pub fn get_active_window(&self) -> Option<WindowId> {
        self.active_window
    }

    pub fn get_active_workspace(&self) -> Option<WorkspaceId> {
        self.active_workspace
    }

    pub fn get_primary_monitor(&self) -> Option<MonitorId> {
        self.primary_monitor
    }

    pub fn get_workspaces(&self) -> &[WorkspaceId] {
        &self.workspace_order
    }

    pub fn get_workspace_by_number(&self, number: u32) -> Option<WorkspaceId> {
        self.workspace_order.get(number as usize).copied()
    }

    pub fn get_monitors(&self) -> &[MonitorId] {
        &self.monitor_order
    }

    pub fn get_monitor_by_number(&self, number: u32) -> Option<MonitorId> {
        self.monitor_order.get(number as usize).copied()
    }

    /// Monitor whose rectangle contains the point
    pub fn get_monitor_by_position(&self, x: i32, y: i32) -> Option<MonitorId> {
        self.monitor_order
            .iter()
            .copied()
            .find(|id| self.monitors.get(*id).is_some_and(|m| m.contains(x, y)))
    }

    pub fn get_monitor_for_window(&self, window: WindowId) -> Option<MonitorId> {
        self.windows.get(window).and_then(|w| w.monitor)
    }

    pub fn supports_multiple_monitors(&self) -> bool {
        self.multiple_monitors
    }

    /// Total screen size: bounding box of every monitor
    pub fn get_screen_size(&self) -> (u32, u32) {
        if let Some(size) = self.screen_size.get() {
            return size;
        }

        let size = self
            .monitor_order
            .iter()
            .filter_map(|id| self.monitors.get(*id))
            .map(|m| m.geometry)
            .filter(|g| g.width > 0 && g.height > 0)
            .reduce(|acc, g| acc.union(&g))
            .map(|g| (g.width, g.height))
            .unwrap_or(self.native_screen_size);

        self.screen_size.set(Some(size));
        size
    }

    /// Desktop (background) window
    ///
    /// The background hint is tried first; it is often stale right after a
    /// deferred start, so every window is scanned for the desktop type next.
    pub fn get_root_window(&self) -> Option<WindowId> {
        if let Some(id) = self
            .backend
            .background_window_hint()
            .and_then(|handle| self.windows.lookup(handle))
        {
            return Some(id);
        }

        self.window_order.iter().copied().find(|id| {
            self.windows
                .get(*id)
                .is_some_and(|w| w.window_type == WindowType::Desktop)
        })
    }

    /// Windows located on `workspace`, pinned windows included
    pub fn get_windows_on_workspace(&self, workspace: WorkspaceId) -> Vec<WindowId> {
        self.window_order
            .iter()
            .copied()
            .filter(|id| self.windows.get(*id).is_some_and(|w| w.is_on_workspace(workspace)))
            .collect()
    }

    /// The shell's own stage window, if tracked
    pub fn get_stage_window(&self) -> Option<WindowId> {
        self.window_order
            .iter()
            .copied()
            .find(|id| self.windows.get(*id).is_some_and(|w| w.is_stage))
    }

    // ------------------------------------------------------------------
    // Commands
    // ------------------------------------------------------------------

    fn window_handle(&self, window: WindowId) -> Result<NativeWindow, TrackerError> {
        self.windows.handle(window).ok_or_else(|| {
            warn!("Refusing command for untracked window {:?}", window);
            TrackerError::UnknownWindow(window)
        })
    }

    fn forward(&self, what: &str, result: anyhow::Result<()>) -> Result<(), TrackerError> {
        result.map_err(|e| {
            warn!("Failed to {}: {}", what, e);
            TrackerError::Backend(e)
        })
    }

    pub fn activate_window(&self, window: WindowId) -> Result<(), TrackerError> {
        let handle = self.window_handle(window)?;
        debug!("Activating window {}", handle);
        self.forward("activate window", self.backend.activate_window(handle))
    }

    pub fn close_window(&self, window: WindowId) -> Result<(), TrackerError> {
        let handle = self.window_handle(window)?;
        debug!("Closing window {}", handle);
        self.forward("close window", self.backend.close_window(handle))
    }

    pub fn move_window(&self, window: WindowId, x: i32, y: i32) -> Result<(), TrackerError> {
        let handle = self.window_handle(window)?;
        self.forward(
            "move window",
            self.backend.move_resize_window(handle, Some((x, y)), None),
        )
    }

    pub fn resize_window(&self, window: WindowId, width: u32, height: u32) -> Result<(), TrackerError> {
        let handle = self.window_handle(window)?;
        self.forward(
            "resize window",
            self.backend.move_resize_window(handle, None, Some((width, height))),
        )
    }

    pub fn move_resize_window(&self, window: WindowId, geometry: Geometry) -> Result<(), TrackerError> {
        let handle = self.window_handle(window)?;
        self.forward(
            "move and resize window",
            self.backend.move_resize_window(
                handle,
                Some((geometry.x, geometry.y)),
                Some((geometry.width, geometry.height)),
            ),
        )
    }

    pub fn move_window_to_workspace(
        &self,
        window: WindowId,
        workspace: WorkspaceId,
    ) -> Result<(), TrackerError> {
        let handle = self.window_handle(window)?;
        let target = self.workspaces.handle(workspace).ok_or_else(|| {
            warn!("Refusing to move window {} to untracked workspace {:?}", handle, workspace);
            TrackerError::UnknownWorkspace(workspace)
        })?;
        self.forward(
            "move window to workspace",
            self.backend.move_window_to_workspace(handle, target),
        )
    }

    pub fn set_window_minimized(&self, window: WindowId, minimized: bool) -> Result<(), TrackerError> {
        let handle = self.window_handle(window)?;
        debug!("Setting window {} minimized={}", handle, minimized);
        self.forward(
            "change minimized state",
            self.backend.set_window_minimized(handle, minimized),
        )
    }

    pub fn activate_workspace(&self, workspace: WorkspaceId) -> Result<(), TrackerError> {
        let handle = self.workspaces.handle(workspace).ok_or_else(|| {
            warn!("Refusing to activate untracked workspace {:?}", workspace);
            TrackerError::UnknownWorkspace(workspace)
        })?;
        self.forward("activate workspace", self.backend.activate_workspace(handle))
    }

    fn stage_handle(&self, window: WindowId) -> Result<NativeWindow, TrackerError> {
        let handle = self.window_handle(window)?;
        if !self.windows.get(window).is_some_and(|w| w.is_stage) {
            warn!("Window {} is not the stage window", handle);
            return Err(TrackerError::NotStageWindow(window));
        }
        Ok(handle)
    }

    pub fn show_stage_window(&self, window: WindowId) -> Result<(), TrackerError> {
        let handle = self.stage_handle(window)?;
        self.forward("show stage window", self.backend.show_stage_window(handle))
    }

    pub fn hide_stage_window(&self, window: WindowId) -> Result<(), TrackerError> {
        let handle = self.stage_handle(window)?;
        self.forward("hide stage window", self.backend.hide_stage_window(handle))
    }

    // ------------------------------------------------------------------
    // Event translation
    // ------------------------------------------------------------------

    /// Fold one native event into the mirror.
    ///
    /// Returns the normalized signals in emission order; the registries are
    /// already updated when they are returned. Events naming unknown handles
    /// are dropped.
    pub fn handle_native_event(&mut self, event: &NativeEvent) -> Vec<TrackerEvent> {
        let mut out = Vec::new();

        match event {
            NativeEvent::WindowOpened(info) => self.on_window_opened(info, &mut out),
            NativeEvent::WindowClosed(handle) => self.on_window_closed(*handle, &mut out),
            NativeEvent::WindowNameChanged { window, name } => {
                if let Some((id, w)) = self.resolve_window_mut(*window) {
                    if w.name != *name {
                        w.name = name.clone();
                        out.push(TrackerEvent::WindowNameChanged { window: id });
                    }
                }
            }
            NativeEvent::WindowIconChanged { window, icon } => {
                if let Some((id, w)) = self.resolve_window_mut(*window) {
                    w.icon = icon.clone();
                    out.push(TrackerEvent::WindowIconChanged { window: id });
                }
            }
            NativeEvent::WindowStateChanged { window, state } => {
                if let Some((id, w)) = self.resolve_window_mut(*window) {
                    let old = w.state;
                    if old != *state {
                        w.state = *state;
                        out.push(TrackerEvent::WindowStateChanged { window: id, old, new: *state });
                    }
                }
            }
            NativeEvent::WindowActionsChanged { window, actions } => {
                if let Some((id, w)) = self.resolve_window_mut(*window) {
                    let old = w.actions;
                    if old != *actions {
                        w.actions = *actions;
                        out.push(TrackerEvent::WindowActionsChanged {
                            window: id,
                            old,
                            new: *actions,
                        });
                    }
                }
            }
            NativeEvent::WindowGeometryChanged { window, geometry } => {
                self.on_window_geometry_changed(*window, *geometry, &mut out)
            }
            NativeEvent::WindowWorkspaceChanged { window, workspace } => {
                self.on_window_workspace_changed(*window, *workspace, &mut out)
            }
            NativeEvent::StackingChanged(stacking) => {
                self.native_stacking = stacking.clone();
                self.rebuild_stacking();
                out.push(TrackerEvent::WindowStackingChanged);
            }
            NativeEvent::ActiveWindowChanged(handle) => self.on_active_window_changed(*handle, &mut out),

            NativeEvent::WorkspaceAdded { workspace, name } => {
                self.on_workspace_added(*workspace, name, &mut out)
            }
            NativeEvent::WorkspaceRemoved(handle) => self.on_workspace_removed(*handle, &mut out),
            NativeEvent::WorkspaceRenamed { workspace, name } => {
                match self.workspaces.lookup(*workspace) {
                    Some(id) => {
                        if let Some(ws) = self.workspaces.get_mut(id) {
                            if ws.name != *name {
                                ws.name = name.clone();
                                out.push(TrackerEvent::WorkspaceNameChanged { workspace: id });
                            }
                        }
                    }
                    None => trace!("Rename for unknown workspace {}", workspace),
                }
            }
            NativeEvent::ActiveWorkspaceChanged(handle) => {
                self.on_active_workspace_changed(*handle, &mut out)
            }

            NativeEvent::MonitorAdded(info) => self.on_monitor_added(info, &mut out),
            NativeEvent::MonitorRemoved(handle) => self.on_monitor_removed(*handle, &mut out),
            NativeEvent::MonitorGeometryChanged { monitor, geometry } => {
                self.on_monitor_geometry_changed(*monitor, *geometry, &mut out)
            }
            NativeEvent::PrimaryMonitorChanged(handle) => {
                self.on_primary_monitor_changed(*handle, &mut out)
            }
            NativeEvent::ScreenSizeChanged { width, height } => {
                self.on_screen_size_changed(*width, *height, &mut out)
            }
            NativeEvent::WindowManagerChanged => {
                info!("Window manager changed");
                out.push(TrackerEvent::WindowManagerChanged);
            }

            NativeEvent::Mapped(_)
            | NativeEvent::Unmapped(_)
            | NativeEvent::Configured { .. }
            | NativeEvent::Destroyed(_)
            | NativeEvent::Damaged(_) => {}
        }

        out
    }

    fn resolve_window_mut(&mut self, handle: NativeWindow) -> Option<(WindowId, &mut TrackedWindow)> {
        let Some(id) = self.windows.lookup(handle) else {
            trace!("Dropping event for untracked window {}", handle);
            return None;
        };
        self.windows.get_mut(id).map(|w| (id, w))
    }

    fn on_window_opened(&mut self, info: &NativeWindowInfo, out: &mut Vec<TrackerEvent>) {
        let (id, inserted) = self
            .windows
            .get_or_insert_with(info.window, || TrackedWindow::from_info(info));
        if !inserted {
            trace!("Window {} already tracked, ignoring repeated open", info.window);
            return;
        }

        let workspace = info.workspace.and_then(|ws| self.workspaces.lookup(ws));
        let monitor = self.monitor_for_geometry(info.geometry);
        if let Some(w) = self.windows.get_mut(id) {
            w.workspace = workspace;
            w.monitor = monitor;
        }

        self.window_order.push(id);
        self.rebuild_stacking();

        debug!("Window opened: {} '{}'", info.window, info.name);
        out.push(TrackerEvent::WindowOpened { window: id });
    }

    fn on_window_closed(&mut self, handle: NativeWindow, out: &mut Vec<TrackerEvent>) {
        let Some(id) = self.windows.lookup(handle) else {
            trace!("Close for untracked window {}", handle);
            return;
        };

        self.windows.remove(id);
        self.window_order.retain(|w| *w != id);
        self.stacking.retain(|w| *w != id);
        self.native_stacking.retain(|w| *w != handle);

        if self.active_window == Some(id) {
            self.active_window = None;
            out.push(TrackerEvent::ActiveWindowChanged { old: Some(id), new: None });
        }

        debug!("Window closed: {}", handle);
        out.push(TrackerEvent::WindowClosed { window: id });
    }

    fn on_window_geometry_changed(
        &mut self,
        handle: NativeWindow,
        geometry: Geometry,
        out: &mut Vec<TrackerEvent>,
    ) {
        let monitor = self.monitor_for_geometry(geometry);
        let Some((id, w)) = self.resolve_window_mut(handle) else {
            return;
        };

        let old = w.geometry;
        if old == geometry {
            return;
        }
        w.geometry = geometry;
        let old_monitor = w.monitor;
        w.monitor = monitor;

        out.push(TrackerEvent::WindowGeometryChanged { window: id, old, new: geometry });
        if old_monitor != monitor {
            out.push(TrackerEvent::WindowMonitorChanged {
                window: id,
                old: old_monitor,
                new: monitor,
            });
        }
    }

    fn on_window_workspace_changed(
        &mut self,
        handle: NativeWindow,
        workspace: Option<NativeWorkspace>,
        out: &mut Vec<TrackerEvent>,
    ) {
        let resolved = workspace.and_then(|ws| self.workspaces.lookup(ws));
        let Some((id, w)) = self.resolve_window_mut(handle) else {
            return;
        };

        w.native_workspace = workspace;
        let old = w.workspace;
        if old != resolved {
            w.workspace = resolved;
            out.push(TrackerEvent::WindowWorkspaceChanged { window: id, old, new: resolved });
        }
    }

    fn on_active_window_changed(&mut self, handle: Option<NativeWindow>, out: &mut Vec<TrackerEvent>) {
        let new = match handle {
            Some(handle) => match self.windows.lookup(handle) {
                Some(id) => Some(id),
                None => {
                    trace!("Active window {} is not tracked", handle);
                    return;
                }
            },
            None => None,
        };

        let old = self.active_window;
        if old != new {
            self.active_window = new;
            out.push(TrackerEvent::ActiveWindowChanged { old, new });
        }
    }

    /// Re-derive the wrapper stacking order from the native list.
    /// Native windows without a wrapper yet are skipped.
    fn rebuild_stacking(&mut self) {
        self.stacking = self
            .native_stacking
            .iter()
            .rev()
            .filter_map(|handle| self.windows.lookup(*handle))
            .collect();
    }

    fn on_workspace_added(&mut self, handle: NativeWorkspace, name: &str, out: &mut Vec<TrackerEvent>) {
        let number = self.workspace_order.len() as u32;
        let (id, inserted) = self.workspaces.get_or_insert_with(handle, || TrackedWorkspace {
            handle,
            number,
            name: name.to_string(),
            active: false,
        });
        if !inserted {
            trace!("Workspace {} already tracked", handle);
            return;
        }
        self.workspace_order.push(id);
        debug!("Workspace added: {} '{}'", handle, name);
        out.push(TrackerEvent::WorkspaceAdded { workspace: id });

        // Windows announced before their workspace existed
        for window in self.window_order.clone() {
            if let Some(w) = self.windows.get_mut(window) {
                if w.workspace.is_none() && w.native_workspace == Some(handle) {
                    w.workspace = Some(id);
                    out.push(TrackerEvent::WindowWorkspaceChanged {
                        window,
                        old: None,
                        new: Some(id),
                    });
                }
            }
        }
    }

    fn on_workspace_removed(&mut self, handle: NativeWorkspace, out: &mut Vec<TrackerEvent>) {
        let Some(id) = self.workspaces.lookup(handle) else {
            trace!("Removal of unknown workspace {}", handle);
            return;
        };

        self.workspaces.remove(id);
        self.workspace_order.retain(|ws| *ws != id);
        for (number, ws) in self.workspace_order.iter().enumerate() {
            if let Some(ws) = self.workspaces.get_mut(*ws) {
                ws.number = number as u32;
            }
        }

        for window in self.window_order.clone() {
            if let Some(w) = self.windows.get_mut(window) {
                if w.workspace == Some(id) {
                    w.workspace = None;
                    out.push(TrackerEvent::WindowWorkspaceChanged {
                        window,
                        old: Some(id),
                        new: None,
                    });
                }
            }
        }

        if self.active_workspace == Some(id) {
            self.active_workspace = None;
            out.push(TrackerEvent::ActiveWorkspaceChanged { old: Some(id), new: None });
        }

        debug!("Workspace removed: {}", handle);
        out.push(TrackerEvent::WorkspaceRemoved { workspace: id });
    }

    fn on_active_workspace_changed(
        &mut self,
        handle: Option<NativeWorkspace>,
        out: &mut Vec<TrackerEvent>,
    ) {
        let new = match handle {
            Some(handle) => match self.workspaces.lookup(handle) {
                Some(id) => Some(id),
                None => {
                    trace!("Active workspace {} is not tracked", handle);
                    return;
                }
            },
            None => None,
        };

        let old = self.active_workspace;
        if old == new {
            return;
        }

        if let Some(ws) = old.and_then(|id| self.workspaces.get_mut(id)) {
            ws.active = false;
        }
        if let Some(ws) = new.and_then(|id| self.workspaces.get_mut(id)) {
            ws.active = true;
        }
        self.active_workspace = new;
        out.push(TrackerEvent::ActiveWorkspaceChanged { old, new });
    }

    fn on_monitor_added(&mut self, info: &NativeMonitorInfo, out: &mut Vec<TrackerEvent>) {
        if !self.multiple_monitors {
            trace!("Ignoring monitor {} on single-monitor backend", info.monitor);
            return;
        }

        let number = self.monitor_order.len() as u32;
        let (id, inserted) = self.monitors.get_or_insert_with(info.monitor, || TrackedMonitor {
            handle: info.monitor,
            number,
            geometry: info.geometry,
            primary: false,
        });
        if !inserted {
            trace!("Monitor {} already tracked", info.monitor);
            return;
        }
        self.monitor_order.push(id);
        self.screen_size.set(None);

        debug!("Monitor added: {} at {:?}", info.monitor, info.geometry);
        out.push(TrackerEvent::MonitorAdded { monitor: id });

        if info.primary || self.primary_monitor.is_none() {
            self.swap_primary(id, out);
        }
        self.update_window_monitors(out);
    }

    fn on_monitor_removed(&mut self, handle: NativeMonitor, out: &mut Vec<TrackerEvent>) {
        if !self.multiple_monitors {
            return;
        }
        let Some(id) = self.monitors.lookup(handle) else {
            trace!("Removal of unknown monitor {}", handle);
            return;
        };

        self.monitors.remove(id);
        self.monitor_order.retain(|m| *m != id);
        for (number, m) in self.monitor_order.iter().enumerate() {
            if let Some(m) = self.monitors.get_mut(*m) {
                m.number = number as u32;
            }
        }
        self.screen_size.set(None);

        let was_primary = self.primary_monitor == Some(id);
        let successor = if was_primary {
            self.primary_monitor = None;
            let next = self.monitor_order.first().copied();
            if let Some(m) = next.and_then(|next| self.monitors.get_mut(next)) {
                m.primary = true;
            }
            self.primary_monitor = next;
            Some(next)
        } else {
            None
        };

        debug!("Monitor removed: {}", handle);
        out.push(TrackerEvent::MonitorRemoved { monitor: id });
        if let Some(new) = successor {
            out.push(TrackerEvent::PrimaryMonitorChanged { old: Some(id), new });
        }
        self.update_window_monitors(out);
    }

    fn on_monitor_geometry_changed(
        &mut self,
        handle: NativeMonitor,
        geometry: Geometry,
        out: &mut Vec<TrackerEvent>,
    ) {
        if !self.multiple_monitors {
            return;
        }
        let Some(id) = self.monitors.lookup(handle) else {
            trace!("Geometry change for unknown monitor {}", handle);
            return;
        };
        let Some(m) = self.monitors.get_mut(id) else {
            return;
        };
        let old = m.geometry;
        if old == geometry {
            return;
        }
        m.geometry = geometry;
        self.screen_size.set(None);

        out.push(TrackerEvent::MonitorGeometryChanged { monitor: id, old, new: geometry });
        self.update_window_monitors(out);
    }

    fn on_primary_monitor_changed(&mut self, handle: Option<NativeMonitor>, out: &mut Vec<TrackerEvent>) {
        if !self.multiple_monitors {
            return;
        }
        let Some(handle) = handle else {
            trace!("Ignoring primary monitor reset, keeping current primary");
            return;
        };
        let Some(id) = self.monitors.lookup(handle) else {
            trace!("Primary monitor {} is not tracked", handle);
            return;
        };
        self.swap_primary(id, out);
    }

    /// Hand the primary flag to `new` in one step so exactly one monitor holds it.
    fn swap_primary(&mut self, new: MonitorId, out: &mut Vec<TrackerEvent>) {
        let old = self.primary_monitor;
        if old == Some(new) {
            return;
        }
        if let Some(m) = old.and_then(|id| self.monitors.get_mut(id)) {
            m.primary = false;
        }
        if let Some(m) = self.monitors.get_mut(new) {
            m.primary = true;
        }
        self.primary_monitor = Some(new);
        debug!("Primary monitor changed: {:?} -> {:?}", old, new);
        out.push(TrackerEvent::PrimaryMonitorChanged { old, new: Some(new) });
    }

    fn on_screen_size_changed(&mut self, width: u32, height: u32, out: &mut Vec<TrackerEvent>) {
        self.native_screen_size = (width, height);
        self.screen_size.set(None);

        if !self.multiple_monitors {
            if let Some(id) = self.monitors.lookup(SYNTHETIC_MONITOR) {
                if let Some(m) = self.monitors.get_mut(id) {
                    let old = m.geometry;
                    let new = Geometry::new(0, 0, width, height);
                    if old != new {
                        m.geometry = new;
                        out.push(TrackerEvent::MonitorGeometryChanged { monitor: id, old, new });
                    }
                }
            }
        }

        out.push(TrackerEvent::ScreenSizeChanged { width, height });
        self.update_window_monitors(out);
    }

    /// Monitor containing the centre of `geometry`, falling back to the primary
    fn monitor_for_geometry(&self, geometry: Geometry) -> Option<MonitorId> {
        let (x, y) = geometry.center();
        self.get_monitor_by_position(x, y).or(self.primary_monitor)
    }

    fn update_window_monitors(&mut self, out: &mut Vec<TrackerEvent>) {
        for window in self.window_order.clone() {
            let Some(geometry) = self.windows.get(window).map(|w| w.geometry) else {
                continue;
            };
            let monitor = self.monitor_for_geometry(geometry);
            if let Some(w) = self.windows.get_mut(window) {
                if w.monitor != monitor {
                    let old = w.monitor;
                    w.monitor = monitor;
                    out.push(TrackerEvent::WindowMonitorChanged { window, old, new: monitor });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::native::{WindowActions, WindowState};
    use crate::testing::{MockWindowBackend, WindowCommand, monitor_info, window_info};

    fn tracker() -> (Rc<MockWindowBackend>, Tracker) {
        let backend = Rc::new(MockWindowBackend::new(true));
        let tracker = Tracker::new(backend.clone());
        (backend, tracker)
    }

    fn add_workspaces(tracker: &mut Tracker, count: u32) {
        for n in 0..count {
            tracker.handle_native_event(&NativeEvent::WorkspaceAdded {
                workspace: NativeWorkspace(n),
                name: format!("Workspace {}", n + 1),
            });
        }
    }

    fn primaries(tracker: &Tracker) -> usize {
        tracker
            .get_monitors()
            .iter()
            .filter(|id| tracker.monitor(**id).is_some_and(|m| m.is_primary()))
            .count()
    }

    #[test]
    fn test_repeated_open_keeps_single_wrapper() {
        let (_, mut tracker) = tracker();
        let first = tracker.handle_native_event(&NativeEvent::WindowOpened(window_info(0x100)));
        let second = tracker.handle_native_event(&NativeEvent::WindowOpened(window_info(0x100)));

        assert_eq!(first.len(), 1);
        assert!(second.is_empty());
        assert_eq!(tracker.get_windows().len(), 1);
    }

    #[test]
    fn test_repeated_workspace_added_keeps_single_wrapper() {
        let (_, mut tracker) = tracker();
        add_workspaces(&mut tracker, 2);
        let first = tracker.lookup_workspace(NativeWorkspace(1)).unwrap();

        let events = tracker.handle_native_event(&NativeEvent::WorkspaceAdded {
            workspace: NativeWorkspace(1),
            name: "Other".into(),
        });
        assert!(events.is_empty());
        assert_eq!(tracker.get_workspaces().len(), 2);
        assert_eq!(tracker.lookup_workspace(NativeWorkspace(1)), Some(first));
        assert_eq!(tracker.workspace(first).unwrap().name(), "Workspace 2");
        assert_eq!(tracker.workspace(first).unwrap().number(), 1);
    }

    #[test]
    fn test_repeated_monitor_added_keeps_single_wrapper() {
        let (_, mut tracker) = tracker();
        tracker.handle_native_event(&NativeEvent::MonitorAdded(monitor_info(0, 0, true)));
        let first = tracker.lookup_monitor(NativeMonitor(0)).unwrap();

        let events = tracker.handle_native_event(&NativeEvent::MonitorAdded(monitor_info(0, 1920, false)));
        assert!(events.is_empty());
        assert_eq!(tracker.get_monitors(), &[first]);
        assert_eq!(tracker.lookup_monitor(NativeMonitor(0)), Some(first));
        assert_eq!(tracker.monitor(first).unwrap().geometry().x, 0);
        assert_eq!(primaries(&tracker), 1);
    }

    #[test]
    fn test_open_on_inactive_workspace_has_no_workspace_change() {
        let (_, mut tracker) = tracker();
        add_workspaces(&mut tracker, 2);
        tracker.handle_native_event(&NativeEvent::ActiveWorkspaceChanged(Some(NativeWorkspace(0))));

        let mut info = window_info(0x200);
        info.workspace = Some(NativeWorkspace(1));
        let events = tracker.handle_native_event(&NativeEvent::WindowOpened(info));

        let id = tracker.lookup_window(NativeWindow(0x200)).unwrap();
        assert_eq!(events, vec![TrackerEvent::WindowOpened { window: id }]);
        assert_eq!(tracker.window(id).unwrap().workspace(), tracker.get_workspace_by_number(1));
        assert_ne!(tracker.get_active_workspace(), tracker.window(id).unwrap().workspace());

        let moved = tracker.handle_native_event(&NativeEvent::WindowWorkspaceChanged {
            window: NativeWindow(0x200),
            workspace: Some(NativeWorkspace(0)),
        });
        assert_eq!(
            moved,
            vec![TrackerEvent::WindowWorkspaceChanged {
                window: id,
                old: tracker.get_workspace_by_number(1),
                new: tracker.get_workspace_by_number(0),
            }]
        );
    }

    #[test]
    fn test_window_announced_before_its_workspace() {
        let (_, mut tracker) = tracker();
        let mut info = window_info(0x300);
        info.workspace = Some(NativeWorkspace(3));
        tracker.handle_native_event(&NativeEvent::WindowOpened(info));
        let id = tracker.lookup_window(NativeWindow(0x300)).unwrap();
        assert_eq!(tracker.window(id).unwrap().workspace(), None);

        let events = tracker.handle_native_event(&NativeEvent::WorkspaceAdded {
            workspace: NativeWorkspace(3),
            name: "Four".into(),
        });
        let ws = tracker.lookup_workspace(NativeWorkspace(3)).unwrap();
        assert_eq!(
            events,
            vec![
                TrackerEvent::WorkspaceAdded { workspace: ws },
                TrackerEvent::WindowWorkspaceChanged { window: id, old: None, new: Some(ws) },
            ]
        );
    }

    #[test]
    fn test_state_change_carries_old_value() {
        let (_, mut tracker) = tracker();
        tracker.handle_native_event(&NativeEvent::WindowOpened(window_info(0x10)));
        let id = tracker.lookup_window(NativeWindow(0x10)).unwrap();

        let events = tracker.handle_native_event(&NativeEvent::WindowStateChanged {
            window: NativeWindow(0x10),
            state: WindowState::MINIMIZED | WindowState::SKIP_PAGER,
        });
        assert_eq!(
            events,
            vec![TrackerEvent::WindowStateChanged {
                window: id,
                old: WindowState::empty(),
                new: WindowState::MINIMIZED | WindowState::SKIP_PAGER,
            }]
        );
        assert!(tracker.window(id).unwrap().is_minimized());

        let unchanged = tracker.handle_native_event(&NativeEvent::WindowStateChanged {
            window: NativeWindow(0x10),
            state: WindowState::MINIMIZED | WindowState::SKIP_PAGER,
        });
        assert!(unchanged.is_empty());

        let actions = tracker.handle_native_event(&NativeEvent::WindowActionsChanged {
            window: NativeWindow(0x10),
            actions: WindowActions::CLOSE,
        });
        assert_eq!(actions.len(), 1);
    }

    #[test]
    fn test_events_for_unknown_handles_are_dropped() {
        let (_, mut tracker) = tracker();
        assert!(tracker.handle_native_event(&NativeEvent::WindowClosed(NativeWindow(9))).is_empty());
        assert!(
            tracker
                .handle_native_event(&NativeEvent::ActiveWindowChanged(Some(NativeWindow(9))))
                .is_empty()
        );
        assert!(
            tracker
                .handle_native_event(&NativeEvent::WindowNameChanged {
                    window: NativeWindow(9),
                    name: "x".into(),
                })
                .is_empty()
        );
        assert!(tracker.handle_native_event(&NativeEvent::MonitorRemoved(NativeMonitor(4))).is_empty());
    }

    #[test]
    fn test_stacking_skips_unwrapped_windows_and_is_front_to_back() {
        let (_, mut tracker) = tracker();
        for handle in [1, 2, 3] {
            tracker.handle_native_event(&NativeEvent::WindowOpened(window_info(handle)));
        }
        let events = tracker.handle_native_event(&NativeEvent::StackingChanged(vec![
            NativeWindow(2),
            NativeWindow(99),
            NativeWindow(1),
            NativeWindow(3),
        ]));
        assert_eq!(events, vec![TrackerEvent::WindowStackingChanged]);

        let stacked: Vec<NativeWindow> = tracker
            .get_windows_stacked()
            .iter()
            .map(|id| tracker.window(*id).unwrap().handle())
            .collect();
        assert_eq!(stacked, vec![NativeWindow(3), NativeWindow(1), NativeWindow(2)]);

        // The late window shows up once it is wrapped
        tracker.handle_native_event(&NativeEvent::WindowOpened(window_info(99)));
        assert_eq!(tracker.get_windows_stacked().len(), 4);
    }

    #[test]
    fn test_closing_active_window_clears_it() {
        let (_, mut tracker) = tracker();
        tracker.handle_native_event(&NativeEvent::WindowOpened(window_info(5)));
        let id = tracker.lookup_window(NativeWindow(5)).unwrap();
        tracker.handle_native_event(&NativeEvent::ActiveWindowChanged(Some(NativeWindow(5))));
        assert_eq!(tracker.get_active_window(), Some(id));

        let events = tracker.handle_native_event(&NativeEvent::WindowClosed(NativeWindow(5)));
        assert_eq!(
            events,
            vec![
                TrackerEvent::ActiveWindowChanged { old: Some(id), new: None },
                TrackerEvent::WindowClosed { window: id },
            ]
        );
        assert!(tracker.window(id).is_none());
        assert_eq!(tracker.get_active_window(), None);
    }

    #[test]
    fn test_primary_monitor_unplugged() {
        let (_, mut tracker) = tracker();
        tracker.handle_native_event(&NativeEvent::MonitorAdded(monitor_info(0, 0, true)));
        tracker.handle_native_event(&NativeEvent::MonitorAdded(monitor_info(1, 1920, false)));
        let m0 = tracker.lookup_monitor(NativeMonitor(0)).unwrap();
        let m1 = tracker.lookup_monitor(NativeMonitor(1)).unwrap();
        assert_eq!(tracker.get_primary_monitor(), Some(m0));
        assert_eq!(primaries(&tracker), 1);

        let events = tracker.handle_native_event(&NativeEvent::MonitorRemoved(NativeMonitor(0)));
        assert_eq!(
            events,
            vec![
                TrackerEvent::MonitorRemoved { monitor: m0 },
                TrackerEvent::PrimaryMonitorChanged { old: Some(m0), new: Some(m1) },
            ]
        );
        assert_eq!(tracker.get_primary_monitor(), Some(m1));
        assert_eq!(primaries(&tracker), 1);
        assert_eq!(tracker.monitor(m1).unwrap().number(), 0);
    }

    #[test]
    fn test_primary_swap_keeps_exactly_one() {
        let (_, mut tracker) = tracker();
        // First monitor becomes primary even when not flagged
        tracker.handle_native_event(&NativeEvent::MonitorAdded(monitor_info(0, 0, false)));
        assert_eq!(primaries(&tracker), 1);
        tracker.handle_native_event(&NativeEvent::MonitorAdded(monitor_info(1, 1920, true)));
        assert_eq!(primaries(&tracker), 1);
        let m1 = tracker.lookup_monitor(NativeMonitor(1)).unwrap();
        assert_eq!(tracker.get_primary_monitor(), Some(m1));

        let events = tracker.handle_native_event(&NativeEvent::PrimaryMonitorChanged(Some(NativeMonitor(0))));
        assert_eq!(events.len(), 1);
        assert_eq!(primaries(&tracker), 1);
        assert!(tracker.handle_native_event(&NativeEvent::PrimaryMonitorChanged(Some(NativeMonitor(0)))).is_empty());
    }

    #[test]
    fn test_screen_size_cache_follows_monitors() {
        let (_, mut tracker) = tracker();
        tracker.handle_native_event(&NativeEvent::MonitorAdded(monitor_info(0, 0, true)));
        assert_eq!(tracker.get_screen_size(), (1920, 1080));

        tracker.handle_native_event(&NativeEvent::MonitorAdded(monitor_info(1, 1920, false)));
        assert_eq!(tracker.get_screen_size(), (3840, 1080));

        tracker.handle_native_event(&NativeEvent::MonitorGeometryChanged {
            monitor: NativeMonitor(1),
            geometry: Geometry::new(1920, 0, 2560, 1440),
        });
        assert_eq!(tracker.get_screen_size(), (4480, 1440));

        tracker.handle_native_event(&NativeEvent::MonitorRemoved(NativeMonitor(1)));
        assert_eq!(tracker.get_screen_size(), (1920, 1080));
    }

    #[test]
    fn test_monitor_lookup_and_window_monitor_tracking() {
        let (_, mut tracker) = tracker();
        tracker.handle_native_event(&NativeEvent::MonitorAdded(monitor_info(0, 0, true)));
        tracker.handle_native_event(&NativeEvent::MonitorAdded(monitor_info(1, 1920, false)));
        let m0 = tracker.lookup_monitor(NativeMonitor(0)).unwrap();
        let m1 = tracker.lookup_monitor(NativeMonitor(1)).unwrap();
        assert_eq!(tracker.get_monitor_by_position(2000, 10), Some(m1));
        assert_eq!(tracker.get_monitor_by_position(-5, 10), None);
        assert_eq!(tracker.get_monitor_by_number(1), Some(m1));

        tracker.handle_native_event(&NativeEvent::WindowOpened(window_info(7)));
        let w = tracker.lookup_window(NativeWindow(7)).unwrap();
        assert_eq!(tracker.get_monitor_for_window(w), Some(m0));

        let events = tracker.handle_native_event(&NativeEvent::WindowGeometryChanged {
            window: NativeWindow(7),
            geometry: Geometry::new(2000, 100, 640, 480),
        });
        assert_eq!(events.len(), 2);
        assert_eq!(
            events[1],
            TrackerEvent::WindowMonitorChanged { window: w, old: Some(m0), new: Some(m1) }
        );
    }

    #[test]
    fn test_single_monitor_backend_uses_synthetic_primary() {
        let backend = Rc::new(MockWindowBackend::new(false));
        let mut tracker = Tracker::new(backend);
        let primary = tracker.get_primary_monitor().unwrap();
        assert!(tracker.monitor(primary).unwrap().is_primary());

        assert!(tracker.handle_native_event(&NativeEvent::MonitorAdded(monitor_info(5, 0, true))).is_empty());
        assert!(tracker.handle_native_event(&NativeEvent::MonitorRemoved(NativeMonitor(0))).is_empty());

        tracker.handle_native_event(&NativeEvent::ScreenSizeChanged { width: 1280, height: 800 });
        assert_eq!(tracker.get_screen_size(), (1280, 800));
        assert_eq!(tracker.get_monitors(), &[primary]);
        assert_eq!(tracker.get_primary_monitor(), Some(primary));
    }

    #[test]
    fn test_workspace_removal_detaches_windows() {
        let (_, mut tracker) = tracker();
        add_workspaces(&mut tracker, 3);
        tracker.handle_native_event(&NativeEvent::ActiveWorkspaceChanged(Some(NativeWorkspace(2))));
        let mut info = window_info(1);
        info.workspace = Some(NativeWorkspace(2));
        tracker.handle_native_event(&NativeEvent::WindowOpened(info));
        let w = tracker.lookup_window(NativeWindow(1)).unwrap();
        let ws = tracker.lookup_workspace(NativeWorkspace(2)).unwrap();
        assert!(tracker.workspace(ws).unwrap().is_active());

        let events = tracker.handle_native_event(&NativeEvent::WorkspaceRemoved(NativeWorkspace(2)));
        assert_eq!(
            events,
            vec![
                TrackerEvent::WindowWorkspaceChanged { window: w, old: Some(ws), new: None },
                TrackerEvent::ActiveWorkspaceChanged { old: Some(ws), new: None },
                TrackerEvent::WorkspaceRemoved { workspace: ws },
            ]
        );
        assert_eq!(tracker.get_workspaces().len(), 2);
        assert_eq!(tracker.get_workspace_by_number(2), None);
    }

    #[test]
    fn test_root_window_falls_back_to_desktop_type() {
        let (backend, mut tracker) = tracker();
        let mut desktop = window_info(0x50);
        desktop.window_type = WindowType::Desktop;
        tracker.handle_native_event(&NativeEvent::WindowOpened(window_info(0x40)));
        tracker.handle_native_event(&NativeEvent::WindowOpened(desktop));
        let desktop_id = tracker.lookup_window(NativeWindow(0x50)).unwrap();
        assert_eq!(tracker.get_root_window(), Some(desktop_id));

        backend.set_background_hint(Some(NativeWindow(0x40)));
        assert_eq!(tracker.get_root_window(), tracker.lookup_window(NativeWindow(0x40)));

        // Stale hint
        backend.set_background_hint(Some(NativeWindow(0xdead)));
        assert_eq!(tracker.get_root_window(), Some(desktop_id));
    }

    #[test]
    fn test_commands_forward_native_handles() {
        let (backend, mut tracker) = tracker();
        add_workspaces(&mut tracker, 2);
        tracker.handle_native_event(&NativeEvent::WindowOpened(window_info(0x77)));
        let w = tracker.lookup_window(NativeWindow(0x77)).unwrap();
        let ws = tracker.get_workspace_by_number(1).unwrap();

        tracker.activate_window(w).unwrap();
        tracker.move_window(w, 10, 20).unwrap();
        tracker.resize_window(w, 300, 200).unwrap();
        tracker.move_window_to_workspace(w, ws).unwrap();
        tracker.close_window(w).unwrap();

        assert_eq!(
            backend.commands(),
            vec![
                WindowCommand::Activate(NativeWindow(0x77)),
                WindowCommand::MoveResize(NativeWindow(0x77), Some((10, 20)), None),
                WindowCommand::MoveResize(NativeWindow(0x77), None, Some((300, 200))),
                WindowCommand::MoveToWorkspace(NativeWindow(0x77), NativeWorkspace(1)),
                WindowCommand::Close(NativeWindow(0x77)),
            ]
        );
    }

    #[test]
    fn test_commands_refused_for_stale_ids() {
        let (backend, mut tracker) = tracker();
        tracker.handle_native_event(&NativeEvent::WindowOpened(window_info(1)));
        let w = tracker.lookup_window(NativeWindow(1)).unwrap();
        tracker.handle_native_event(&NativeEvent::WindowClosed(NativeWindow(1)));

        assert!(matches!(tracker.activate_window(w), Err(TrackerError::UnknownWindow(_))));
        assert!(backend.commands().is_empty());
    }

    #[test]
    fn test_stage_commands_require_stage_window() {
        let (backend, mut tracker) = tracker();
        let mut stage = window_info(0x900);
        stage.is_stage = true;
        tracker.handle_native_event(&NativeEvent::WindowOpened(window_info(0x800)));
        tracker.handle_native_event(&NativeEvent::WindowOpened(stage));
        let other = tracker.lookup_window(NativeWindow(0x800)).unwrap();
        let stage = tracker.get_stage_window().unwrap();

        assert!(matches!(tracker.hide_stage_window(other), Err(TrackerError::NotStageWindow(_))));
        tracker.hide_stage_window(stage).unwrap();
        tracker.show_stage_window(stage).unwrap();
        assert_eq!(
            backend.commands(),
            vec![
                WindowCommand::HideStage(NativeWindow(0x900)),
                WindowCommand::ShowStage(NativeWindow(0x900)),
            ]
        );
    }
}
