//! Tracked window wrapper

use std::sync::Arc;

use crate::native::{NativeWindow, NativeWindowInfo, NativeWorkspace, WindowActions, WindowState, WindowType};
use crate::shared::{Geometry, Image};

use super::{MonitorId, WorkspaceId};

/// Stable wrapper for one native top-level window
#[derive(Debug, Clone)]
pub struct TrackedWindow {
    pub(super) handle: NativeWindow,
    pub(super) name: String,
    pub(super) icon: Option<Arc<Image>>,
    pub(super) geometry: Geometry,
    pub(super) state: WindowState,
    pub(super) actions: WindowActions,
    pub(super) window_type: WindowType,
    pub(super) workspace: Option<WorkspaceId>,
    /// Workspace as last reported natively; resolved once its wrapper exists
    pub(super) native_workspace: Option<NativeWorkspace>,
    pub(super) monitor: Option<MonitorId>,
    pub(super) is_stage: bool,
    pub(super) pid: Option<u32>,
    pub(super) instance_names: Vec<String>,
}

impl TrackedWindow {
    pub(super) fn from_info(info: &NativeWindowInfo) -> Self {
        Self {
            handle: info.window,
            name: info.name.clone(),
            icon: info.icon.clone(),
            geometry: info.geometry,
            state: info.state,
            actions: info.actions,
            window_type: info.window_type,
            workspace: None,
            native_workspace: info.workspace,
            monitor: None,
            is_stage: info.is_stage,
            pid: info.pid,
            instance_names: info.instance_names.clone(),
        }
    }

    pub fn handle(&self) -> NativeWindow {
        self.handle
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn icon(&self) -> Option<&Arc<Image>> {
        self.icon.as_ref()
    }

    pub fn geometry(&self) -> Geometry {
        self.geometry
    }

    pub fn state(&self) -> WindowState {
        self.state
    }

    pub fn actions(&self) -> WindowActions {
        self.actions
    }

    pub fn window_type(&self) -> WindowType {
        self.window_type
    }

    /// Owning workspace; `None` for pinned windows or once the workspace is gone
    pub fn workspace(&self) -> Option<WorkspaceId> {
        self.workspace
    }

    /// Monitor containing the window's centre
    pub fn monitor(&self) -> Option<MonitorId> {
        self.monitor
    }

    /// The shell's own stage window
    pub fn is_stage(&self) -> bool {
        self.is_stage
    }

    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    pub fn instance_names(&self) -> &[String] {
        &self.instance_names
    }

    pub fn is_minimized(&self) -> bool {
        self.state.contains(WindowState::MINIMIZED)
    }

    pub fn is_pinned(&self) -> bool {
        self.state.contains(WindowState::PINNED)
    }

    pub fn is_visible(&self) -> bool {
        !self.state.intersects(WindowState::HIDDEN | WindowState::MINIMIZED)
    }

    /// Pinned windows are on every workspace
    pub fn is_on_workspace(&self, workspace: WorkspaceId) -> bool {
        self.is_pinned() || self.workspace == Some(workspace)
    }
}
