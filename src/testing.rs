//! In-memory backends used by unit tests

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};

use anyhow::Result;

use crate::native::{
    CaptureBackend, CaptureCapabilities, CaptureError, NativeDamage, NativeMonitor,
    NativeMonitorInfo, NativePixmap, NativeWindow, NativeWindowInfo, NativeWorkspace,
    WindowActions, WindowBackend,
};
use crate::shared::{Geometry, Image};

/// Command recorded by [`MockWindowBackend`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WindowCommand {
    Activate(NativeWindow),
    Close(NativeWindow),
    MoveResize(NativeWindow, Option<(i32, i32)>, Option<(u32, u32)>),
    MoveToWorkspace(NativeWindow, NativeWorkspace),
    SetMinimized(NativeWindow, bool),
    ActivateWorkspace(NativeWorkspace),
    ShowStage(NativeWindow),
    HideStage(NativeWindow),
}

pub struct MockWindowBackend {
    multiple_monitors: bool,
    background: Cell<Option<NativeWindow>>,
    commands: RefCell<Vec<WindowCommand>>,
}

impl MockWindowBackend {
    pub fn new(multiple_monitors: bool) -> Self {
        Self {
            multiple_monitors,
            background: Cell::new(None),
            commands: RefCell::new(Vec::new()),
        }
    }

    pub fn set_background_hint(&self, window: Option<NativeWindow>) {
        self.background.set(window);
    }

    pub fn commands(&self) -> Vec<WindowCommand> {
        self.commands.borrow().clone()
    }

    fn record(&self, command: WindowCommand) -> Result<()> {
        self.commands.borrow_mut().push(command);
        Ok(())
    }
}

impl WindowBackend for MockWindowBackend {
    fn activate_window(&self, window: NativeWindow) -> Result<()> {
        self.record(WindowCommand::Activate(window))
    }

    fn close_window(&self, window: NativeWindow) -> Result<()> {
        self.record(WindowCommand::Close(window))
    }

    fn move_resize_window(
        &self,
        window: NativeWindow,
        position: Option<(i32, i32)>,
        size: Option<(u32, u32)>,
    ) -> Result<()> {
        self.record(WindowCommand::MoveResize(window, position, size))
    }

    fn move_window_to_workspace(&self, window: NativeWindow, workspace: NativeWorkspace) -> Result<()> {
        self.record(WindowCommand::MoveToWorkspace(window, workspace))
    }

    fn set_window_minimized(&self, window: NativeWindow, minimized: bool) -> Result<()> {
        self.record(WindowCommand::SetMinimized(window, minimized))
    }

    fn activate_workspace(&self, workspace: NativeWorkspace) -> Result<()> {
        self.record(WindowCommand::ActivateWorkspace(workspace))
    }

    fn show_stage_window(&self, window: NativeWindow) -> Result<()> {
        self.record(WindowCommand::ShowStage(window))
    }

    fn hide_stage_window(&self, window: NativeWindow) -> Result<()> {
        self.record(WindowCommand::HideStage(window))
    }

    fn supports_multiple_monitors(&self) -> bool {
        self.multiple_monitors
    }

    fn background_window_hint(&self) -> Option<NativeWindow> {
        self.background.get()
    }
}

/// Call recorded by [`MockCapture`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureCall {
    NamePixmap(NativeWindow),
    FreePixmap(NativePixmap),
    CreateDamage(NativeWindow),
    SubtractDamage(NativeDamage),
    DestroyDamage(NativeDamage),
    ReadPixels(NativePixmap),
}

/// Capture backend tracking every resource it hands out
pub struct MockCapture {
    capabilities: Cell<CaptureCapabilities>,
    mapped: RefCell<HashMap<NativeWindow, (u32, u32)>>,
    frames: RefCell<HashMap<NativeWindow, NativeWindow>>,
    fail_damage: Cell<bool>,
    fail_read: Cell<bool>,
    next_id: Cell<u32>,
    pixmaps: RefCell<HashMap<NativePixmap, (u32, u32)>>,
    damages: RefCell<HashSet<NativeDamage>>,
    calls: RefCell<Vec<CaptureCall>>,
}

impl MockCapture {
    pub fn new() -> Self {
        Self {
            capabilities: Cell::new(CaptureCapabilities {
                composite: true,
                damage: true,
            }),
            mapped: RefCell::new(HashMap::new()),
            frames: RefCell::new(HashMap::new()),
            fail_damage: Cell::new(false),
            fail_read: Cell::new(false),
            next_id: Cell::new(0x1000),
            pixmaps: RefCell::new(HashMap::new()),
            damages: RefCell::new(HashSet::new()),
            calls: RefCell::new(Vec::new()),
        }
    }

    pub fn set_capabilities(&self, composite: bool, damage: bool) {
        self.capabilities.set(CaptureCapabilities { composite, damage });
    }

    pub fn map_window(&self, window: NativeWindow, width: u32, height: u32) {
        self.mapped.borrow_mut().insert(window, (width, height));
    }

    pub fn unmap_window(&self, window: NativeWindow) {
        self.mapped.borrow_mut().remove(&window);
    }

    /// Report `frame` as the window manager frame of `window`
    pub fn set_frame(&self, window: NativeWindow, frame: NativeWindow) {
        self.frames.borrow_mut().insert(window, frame);
    }

    pub fn fail_damage(&self, fail: bool) {
        self.fail_damage.set(fail);
    }

    pub fn fail_read(&self, fail: bool) {
        self.fail_read.set(fail);
    }

    pub fn calls(&self) -> Vec<CaptureCall> {
        self.calls.borrow().clone()
    }

    pub fn live_pixmaps(&self) -> usize {
        self.pixmaps.borrow().len()
    }

    pub fn live_damages(&self) -> usize {
        self.damages.borrow().len()
    }

    fn allocate(&self) -> u32 {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        id
    }

    fn record(&self, call: CaptureCall) {
        self.calls.borrow_mut().push(call);
    }
}

impl CaptureBackend for MockCapture {
    fn capabilities(&self) -> CaptureCapabilities {
        self.capabilities.get()
    }

    fn is_window_mapped(&self, window: NativeWindow) -> bool {
        self.mapped.borrow().contains_key(&window)
    }

    fn capture_target(&self, window: NativeWindow, include_frame: bool) -> NativeWindow {
        if include_frame {
            if let Some(frame) = self.frames.borrow().get(&window) {
                return *frame;
            }
        }
        window
    }

    fn name_window_pixmap(&self, window: NativeWindow) -> Result<NativePixmap, CaptureError> {
        self.record(CaptureCall::NamePixmap(window));
        let size = self.mapped.borrow().get(&window).copied();
        let Some(size) = size else {
            return Err(CaptureError::Protocol {
                op: "NameWindowPixmap",
                window,
                reason: "BadMatch".into(),
            });
        };
        let pixmap = NativePixmap(self.allocate());
        self.pixmaps.borrow_mut().insert(pixmap, size);
        Ok(pixmap)
    }

    fn pixmap_size(&self, pixmap: NativePixmap) -> Result<(u32, u32), CaptureError> {
        self.pixmaps
            .borrow()
            .get(&pixmap)
            .copied()
            .ok_or(CaptureError::Unsupported)
    }

    fn free_pixmap(&self, pixmap: NativePixmap) {
        self.record(CaptureCall::FreePixmap(pixmap));
        self.pixmaps.borrow_mut().remove(&pixmap);
    }

    fn create_damage(&self, window: NativeWindow) -> Result<NativeDamage, CaptureError> {
        self.record(CaptureCall::CreateDamage(window));
        if self.fail_damage.get() {
            return Err(CaptureError::Protocol {
                op: "DamageCreate",
                window,
                reason: "BadDrawable".into(),
            });
        }
        let damage = NativeDamage(self.allocate());
        self.damages.borrow_mut().insert(damage);
        Ok(damage)
    }

    fn subtract_damage(&self, damage: NativeDamage) {
        self.record(CaptureCall::SubtractDamage(damage));
    }

    fn destroy_damage(&self, damage: NativeDamage) {
        self.record(CaptureCall::DestroyDamage(damage));
        self.damages.borrow_mut().remove(&damage);
    }

    fn read_pixels(&self, pixmap: NativePixmap, area: Geometry) -> Result<Image, CaptureError> {
        self.record(CaptureCall::ReadPixels(pixmap));
        if self.fail_read.get() || !self.pixmaps.borrow().contains_key(&pixmap) {
            return Err(CaptureError::Unsupported);
        }
        Ok(Image::filled(area.width, area.height, 0xff00ff00))
    }
}

/// Normal window at (100, 100) sized 800x600
pub fn window_info(handle: u32) -> NativeWindowInfo {
    let mut info = NativeWindowInfo::new(NativeWindow(handle));
    info.name = format!("Window {:x}", handle);
    info.geometry = Geometry::new(100, 100, 800, 600);
    info.actions = WindowActions::all();
    info
}

/// 1920x1080 monitor placed at `x` on the top row
pub fn monitor_info(number: u32, x: i32, primary: bool) -> NativeMonitorInfo {
    NativeMonitorInfo {
        monitor: NativeMonitor(number),
        geometry: Geometry::new(x, 0, 1920, 1080),
        primary,
    }
}
