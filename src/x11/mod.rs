//! X11 backend
//!
//! Implements [`WindowBackend`] and [`CaptureBackend`] on top of an x11rb
//! connection. Window manager state is mirrored from EWMH root properties,
//! monitors from RandR 1.5, and live capture uses Composite and Damage.
//! Root properties only say *that* something changed, so the last seen
//! values are kept and diffed into [`NativeEvent`]s.

mod atoms;
mod diff;
mod props;
mod trap;

use std::cell::{Cell, RefCell};
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, info, trace, warn};
use x11rb::connection::{Connection, RequestConnection};
use x11rb::protocol::composite::{self, ConnectionExt as _, Redirect};
use x11rb::protocol::damage::{self, ConnectionExt as _, ReportLevel};
use x11rb::protocol::randr::{self, ConnectionExt as _, NotifyMask};
use x11rb::protocol::xproto::{
    AtomEnum, ChangeWindowAttributesAux, ClientMessageEvent, ConnectionExt as _, EventMask,
    ImageFormat, MapState, Window,
};
use x11rb::protocol::Event;
use x11rb::rust_connection::RustConnection;

use crate::native::{
    CaptureBackend, CaptureCapabilities, CaptureError, NativeDamage, NativeEvent, NativeMonitor,
    NativeMonitorInfo, NativePixmap, NativeWindow, NativeWindowInfo, NativeWorkspace,
    WindowBackend,
};
use crate::shared::{Geometry, Image};

pub use atoms::Atoms;
use trap::{Trap, checked, reply};

/// Source indication for EWMH client messages: pager
const SOURCE_PAGER: u32 = 2;

/// ICCCM `IconicState`
const ICONIC_STATE: u32 = 3;

/// Extensions found at start-up
#[derive(Debug, Clone, Copy, Default)]
struct Extensions {
    /// Composite >= 0.2 (NameWindowPixmap)
    composite: bool,
    damage: bool,
    /// RandR >= 1.5 (monitor objects)
    randr_monitors: bool,
}

/// Last seen root state
#[derive(Debug, Default)]
struct Mirror {
    synced: bool,
    clients: Vec<Window>,
    stacking: Vec<Window>,
    active_window: Option<Window>,
    workspaces: Vec<String>,
    current_workspace: Option<u32>,
    monitors: Vec<NativeMonitorInfo>,
    screen_size: (u32, u32),
    wm_check: Option<Window>,
}

pub struct X11Backend {
    conn: Arc<RustConnection>,
    root: Window,
    atoms: Atoms,
    extensions: Extensions,
    stage: Cell<Option<Window>>,
    mirror: RefCell<Mirror>,
}

impl X11Backend {
    /// Query extensions, intern atoms and subscribe to root changes
    pub fn new(conn: Arc<RustConnection>, screen_num: usize) -> Result<Self> {
        let screen = conn
            .setup()
            .roots
            .get(screen_num)
            .context("Screen not found in X setup")?;
        let root = screen.root;
        let screen_size = (screen.width_in_pixels as u32, screen.height_in_pixels as u32);

        let atoms = Atoms::new(conn.as_ref()).context("Failed to intern atoms")?;
        let extensions = Self::detect_extensions(conn.as_ref(), root)?;

        conn.change_window_attributes(
            root,
            &ChangeWindowAttributesAux::new()
                .event_mask(EventMask::PROPERTY_CHANGE | EventMask::STRUCTURE_NOTIFY),
        )?
        .check()
        .context("Failed to select root window events")?;

        if extensions.randr_monitors {
            conn.randr_select_input(root, NotifyMask::SCREEN_CHANGE | NotifyMask::OUTPUT_CHANGE)?;
        }

        info!(
            "X11 backend on root 0x{:x} ({}x{}), composite={}, damage={}, randr monitors={}",
            root, screen_size.0, screen_size.1, extensions.composite, extensions.damage, extensions.randr_monitors
        );

        Ok(Self {
            conn,
            root,
            atoms,
            extensions,
            stage: Cell::new(None),
            mirror: RefCell::new(Mirror {
                screen_size,
                ..Mirror::default()
            }),
        })
    }

    fn detect_extensions(conn: &RustConnection, root: Window) -> Result<Extensions> {
        let mut ext = Extensions::default();

        if conn.extension_information(composite::X11_EXTENSION_NAME)?.is_some() {
            let version = conn.composite_query_version(0, 4)?.reply()?;
            ext.composite = (version.major_version, version.minor_version) >= (0, 2);
            debug!(
                "Composite extension version: {}.{}",
                version.major_version, version.minor_version
            );
            if ext.composite {
                // Windows must be redirected for their pixmaps to be named.
                // Automatic redirection leaves painting to the server.
                conn.composite_redirect_subwindows(root, Redirect::AUTOMATIC)?;
            }
        }

        if conn.extension_information(damage::X11_EXTENSION_NAME)?.is_some() {
            let version = conn.damage_query_version(1, 1)?.reply()?;
            debug!(
                "Damage extension version: {}.{}",
                version.major_version, version.minor_version
            );
            ext.damage = true;
        }

        if conn.extension_information(randr::X11_EXTENSION_NAME)?.is_some() {
            let version = conn.randr_query_version(1, 5)?.reply()?;
            ext.randr_monitors = (version.major_version, version.minor_version) >= (1, 5);
            debug!(
                "RandR extension version: {}.{}",
                version.major_version, version.minor_version
            );
        }

        Ok(ext)
    }

    pub fn root(&self) -> Window {
        self.root
    }

    /// Declare the shell's own stage window
    pub fn set_stage_window(&self, window: Option<NativeWindow>) {
        self.stage.set(window.map(|w| w.0));
    }

    /// Full state as events, for the tracker's start-up
    pub fn initial_events(&self) -> Result<Vec<NativeEvent>> {
        let mut out = Vec::new();
        let (width, height) = self.mirror.borrow().screen_size;
        out.push(NativeEvent::ScreenSizeChanged { width, height });

        self.refresh_monitors(&mut out);
        self.refresh_workspaces(&mut out)?;
        self.refresh_current_workspace(&mut out)?;
        self.refresh_clients(&mut out)?;
        self.refresh_stacking(&mut out)?;
        self.refresh_active_window(&mut out)?;
        self.refresh_wm_check(&mut out)?;

        self.mirror.borrow_mut().synced = true;
        info!("Initial sync produced {} events", out.len());
        Ok(out)
    }

    /// Translate one X event. Failures to read state of windows that just
    /// went away are expected and only logged.
    pub fn translate(&self, event: &Event) -> Vec<NativeEvent> {
        let mut out = Vec::new();
        let result = match event {
            Event::PropertyNotify(e) if e.window == self.root => self.root_property_changed(e.atom, &mut out),
            Event::PropertyNotify(e) => {
                self.client_property_changed(e.window, e.atom, &mut out);
                Ok(())
            }
            Event::ConfigureNotify(e) if e.window == self.root => {
                self.screen_resized(e.width as u32, e.height as u32, &mut out);
                Ok(())
            }
            Event::ConfigureNotify(e) if self.is_client(e.window) => {
                out.push(NativeEvent::Configured {
                    window: NativeWindow(e.window),
                    width: e.width as u32,
                    height: e.height as u32,
                });
                if let Some(geometry) = self.logged(e.window, "geometry", self.window_geometry(e.window)) {
                    out.push(NativeEvent::WindowGeometryChanged {
                        window: NativeWindow(e.window),
                        geometry,
                    });
                }
                Ok(())
            }
            Event::MapNotify(e) if self.is_client(e.window) => {
                out.push(NativeEvent::Mapped(NativeWindow(e.window)));
                Ok(())
            }
            Event::UnmapNotify(e) if self.is_client(e.window) => {
                out.push(NativeEvent::Unmapped(NativeWindow(e.window)));
                Ok(())
            }
            Event::DestroyNotify(e) if self.is_client(e.window) => {
                out.push(NativeEvent::Destroyed(NativeWindow(e.window)));
                Ok(())
            }
            Event::DamageNotify(e) => {
                out.push(NativeEvent::Damaged(NativeDamage(e.damage)));
                Ok(())
            }
            Event::RandrScreenChangeNotify(e) => {
                self.screen_resized(e.width as u32, e.height as u32, &mut out);
                self.refresh_monitors(&mut out);
                Ok(())
            }
            Event::RandrNotify(_) => {
                self.refresh_monitors(&mut out);
                Ok(())
            }
            Event::Error(e) => {
                trace!("X error: {:?}", e);
                Ok(())
            }
            other => {
                trace!("Ignoring X event {:?}", other);
                Ok(())
            }
        };

        if let Err(e) = result {
            debug!("Failed to refresh root state: {}", e);
        }
        out
    }

    fn is_client(&self, window: Window) -> bool {
        self.mirror.borrow().clients.contains(&window)
    }

    fn logged<T>(&self, window: Window, what: &str, result: Result<T>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                debug!("Failed to read {} of window 0x{:x}: {}", what, window, e);
                None
            }
        }
    }

    // ------------------------------------------------------------------
    // Root state
    // ------------------------------------------------------------------

    fn root_property_changed(&self, atom: u32, out: &mut Vec<NativeEvent>) -> Result<()> {
        let atoms = &self.atoms;
        match atom {
            a if a == atoms.net_client_list => self.refresh_clients(out),
            a if a == atoms.net_client_list_stacking => self.refresh_stacking(out),
            a if a == atoms.net_active_window => self.refresh_active_window(out),
            a if a == atoms.net_number_of_desktops || a == atoms.net_desktop_names => {
                self.refresh_workspaces(out)
            }
            a if a == atoms.net_current_desktop => self.refresh_current_workspace(out),
            a if a == atoms.net_supporting_wm_check => self.refresh_wm_check(out),
            _ => Ok(()),
        }
    }

    fn refresh_clients(&self, out: &mut Vec<NativeEvent>) -> Result<()> {
        let clients = props::get_u32s(
            self.conn.as_ref(),
            self.root,
            self.atoms.net_client_list,
            AtomEnum::WINDOW,
            u32::MAX / 4,
        )?;
        let (added, removed) = diff::diff_list(&self.mirror.borrow().clients, &clients);
        self.mirror.borrow_mut().clients = clients;

        for window in removed {
            out.push(NativeEvent::WindowClosed(NativeWindow(window)));
        }
        for window in added {
            if let Err(e) = self.conn.change_window_attributes(
                window,
                &ChangeWindowAttributesAux::new()
                    .event_mask(EventMask::PROPERTY_CHANGE | EventMask::STRUCTURE_NOTIFY),
            ) {
                debug!("Failed to select events on window 0x{:x}: {}", window, e);
            }
            match self.read_window_info(window) {
                Ok(info) => out.push(NativeEvent::WindowOpened(info)),
                Err(e) => debug!("Skipping window 0x{:x}: {}", window, e),
            }
        }
        Ok(())
    }

    fn refresh_stacking(&self, out: &mut Vec<NativeEvent>) -> Result<()> {
        let stacking = props::get_u32s(
            self.conn.as_ref(),
            self.root,
            self.atoms.net_client_list_stacking,
            AtomEnum::WINDOW,
            u32::MAX / 4,
        )?;
        let mut mirror = self.mirror.borrow_mut();
        if mirror.stacking != stacking {
            out.push(NativeEvent::StackingChanged(
                stacking.iter().copied().map(NativeWindow).collect(),
            ));
            mirror.stacking = stacking;
        }
        Ok(())
    }

    fn refresh_active_window(&self, out: &mut Vec<NativeEvent>) -> Result<()> {
        let active = props::get_u32(
            self.conn.as_ref(),
            self.root,
            self.atoms.net_active_window,
            AtomEnum::WINDOW,
        )?
        .filter(|w| *w != x11rb::NONE);
        let mut mirror = self.mirror.borrow_mut();
        if mirror.active_window != active {
            mirror.active_window = active;
            out.push(NativeEvent::ActiveWindowChanged(active.map(NativeWindow)));
        }
        Ok(())
    }

    fn refresh_workspaces(&self, out: &mut Vec<NativeEvent>) -> Result<()> {
        let conn = self.conn.as_ref();
        let count = props::get_u32(conn, self.root, self.atoms.net_number_of_desktops, AtomEnum::CARDINAL)?
            .unwrap_or(1);
        let raw_names = props::get_bytes(conn, self.root, self.atoms.net_desktop_names)?;
        let names = diff::workspace_names(count, &props::split_strings(&raw_names));

        let mut mirror = self.mirror.borrow_mut();
        out.extend(diff::diff_workspaces(&mirror.workspaces, &names));
        mirror.workspaces = names;
        Ok(())
    }

    fn refresh_current_workspace(&self, out: &mut Vec<NativeEvent>) -> Result<()> {
        let current = props::get_u32(
            self.conn.as_ref(),
            self.root,
            self.atoms.net_current_desktop,
            AtomEnum::CARDINAL,
        )?;
        let mut mirror = self.mirror.borrow_mut();
        if mirror.current_workspace != current {
            mirror.current_workspace = current;
            out.push(NativeEvent::ActiveWorkspaceChanged(current.map(NativeWorkspace)));
        }
        Ok(())
    }

    fn refresh_wm_check(&self, out: &mut Vec<NativeEvent>) -> Result<()> {
        let check = props::get_u32(
            self.conn.as_ref(),
            self.root,
            self.atoms.net_supporting_wm_check,
            AtomEnum::WINDOW,
        )?
        .filter(|w| *w != x11rb::NONE);
        let mut mirror = self.mirror.borrow_mut();
        if mirror.wm_check != check {
            mirror.wm_check = check;
            if mirror.synced {
                info!("Window manager changed");
                out.push(NativeEvent::WindowManagerChanged);
            }
        }
        Ok(())
    }

    fn refresh_monitors(&self, out: &mut Vec<NativeEvent>) {
        if !self.extensions.randr_monitors {
            return;
        }
        let monitors = match self.read_monitors() {
            Ok(monitors) => monitors,
            Err(e) => {
                warn!("Failed to read monitors: {}", e);
                return;
            }
        };
        let mut mirror = self.mirror.borrow_mut();
        out.extend(diff::diff_monitors(&mirror.monitors, &monitors));
        mirror.monitors = monitors;
    }

    fn read_monitors(&self) -> Result<Vec<NativeMonitorInfo>> {
        let reply = self.conn.randr_get_monitors(self.root, true)?.reply()?;
        Ok(reply
            .monitors
            .iter()
            .map(|m| NativeMonitorInfo {
                monitor: NativeMonitor(m.name),
                geometry: Geometry::new(m.x as i32, m.y as i32, m.width as u32, m.height as u32),
                primary: m.primary,
            })
            .collect())
    }

    fn screen_resized(&self, width: u32, height: u32, out: &mut Vec<NativeEvent>) {
        let mut mirror = self.mirror.borrow_mut();
        if mirror.screen_size != (width, height) {
            mirror.screen_size = (width, height);
            out.push(NativeEvent::ScreenSizeChanged { width, height });
        }
    }

    // ------------------------------------------------------------------
    // Client windows
    // ------------------------------------------------------------------

    fn client_property_changed(&self, window: Window, atom: u32, out: &mut Vec<NativeEvent>) {
        if !self.is_client(window) {
            return;
        }
        let conn = self.conn.as_ref();
        let atoms = &self.atoms;
        let native = NativeWindow(window);

        if atom == atoms.net_wm_name || atom == atoms.wm_name {
            if let Some(name) = self.logged(window, "name", props::read_name(conn, atoms, window)) {
                out.push(NativeEvent::WindowNameChanged { window: native, name });
            }
        } else if atom == atoms.net_wm_icon {
            if let Some(icon) = self.logged(window, "icon", props::read_icon(conn, atoms, window)) {
                out.push(NativeEvent::WindowIconChanged {
                    window: native,
                    icon: icon.map(Arc::new),
                });
            }
        } else if atom == atoms.net_wm_state || atom == atoms.wm_state {
            if let Some(state) = self.logged(window, "state", props::read_state(conn, atoms, window)) {
                out.push(NativeEvent::WindowStateChanged { window: native, state });
            }
        } else if atom == atoms.net_wm_allowed_actions {
            if let Some(actions) = self.logged(window, "actions", props::read_actions(conn, atoms, window)) {
                out.push(NativeEvent::WindowActionsChanged { window: native, actions });
            }
        } else if atom == atoms.net_wm_desktop {
            if let Some(workspace) = self.logged(window, "desktop", props::read_workspace(conn, atoms, window)) {
                out.push(NativeEvent::WindowWorkspaceChanged { window: native, workspace });
            }
            // Pinned-ness follows the desktop value
            if let Some(state) = self.logged(window, "state", props::read_state(conn, atoms, window)) {
                out.push(NativeEvent::WindowStateChanged { window: native, state });
            }
        }
    }

    fn read_window_info(&self, window: Window) -> Result<NativeWindowInfo> {
        let conn = self.conn.as_ref();
        let atoms = &self.atoms;

        let mut info = NativeWindowInfo::new(NativeWindow(window));
        info.geometry = self.window_geometry(window)?;
        info.name = props::read_name(conn, atoms, window)?;
        info.icon = props::read_icon(conn, atoms, window)?.map(Arc::new);
        info.state = props::read_state(conn, atoms, window)?;
        info.actions = props::read_actions(conn, atoms, window)?;
        info.window_type = props::read_window_type(conn, atoms, window)?;
        info.workspace = props::read_workspace(conn, atoms, window)?;
        info.pid = props::get_u32(conn, window, atoms.net_wm_pid, AtomEnum::CARDINAL)?;
        info.instance_names = props::read_class(conn, atoms, window)?;
        info.is_stage = self.stage.get() == Some(window);

        trace!("Read window 0x{:x}: {:?}", window, info.name);
        Ok(info)
    }

    /// Root-relative geometry of a client
    fn window_geometry(&self, window: Window) -> Result<Geometry> {
        let geometry = self.conn.get_geometry(window)?.reply()?;
        let origin = self.conn.translate_coordinates(window, self.root, 0, 0)?.reply()?;
        Ok(Geometry::new(
            origin.dst_x as i32,
            origin.dst_y as i32,
            geometry.width as u32,
            geometry.height as u32,
        ))
    }

    /// Top-level ancestor of `window`: the window manager frame if reparented
    fn frame_of(&self, window: Window) -> Result<Window> {
        let mut current = window;
        loop {
            let tree = self.conn.query_tree(current)?.reply()?;
            if tree.parent == tree.root || tree.parent == x11rb::NONE {
                return Ok(current);
            }
            current = tree.parent;
        }
    }

    fn send_client_message(&self, window: Window, message_type: u32, data: [u32; 5]) -> Result<()> {
        let event = ClientMessageEvent::new(32, window, message_type, data);
        self.conn.send_event(
            false,
            self.root,
            EventMask::SUBSTRUCTURE_REDIRECT | EventMask::SUBSTRUCTURE_NOTIFY,
            event,
        )?;
        Ok(())
    }
}

impl WindowBackend for X11Backend {
    fn activate_window(&self, window: NativeWindow) -> Result<()> {
        self.send_client_message(
            window.0,
            self.atoms.net_active_window,
            [SOURCE_PAGER, x11rb::CURRENT_TIME, 0, 0, 0],
        )
        .context("Failed to activate window")
    }

    fn close_window(&self, window: NativeWindow) -> Result<()> {
        self.send_client_message(
            window.0,
            self.atoms.net_close_window,
            [x11rb::CURRENT_TIME, SOURCE_PAGER, 0, 0, 0],
        )
        .context("Failed to close window")
    }

    fn move_resize_window(
        &self,
        window: NativeWindow,
        position: Option<(i32, i32)>,
        size: Option<(u32, u32)>,
    ) -> Result<()> {
        // Gravity 0 keeps the window's own gravity
        let mut flags = SOURCE_PAGER << 12;
        let (x, y) = position.unwrap_or_default();
        let (width, height) = size.unwrap_or_default();
        if position.is_some() {
            flags |= (1 << 8) | (1 << 9);
        }
        if size.is_some() {
            flags |= (1 << 10) | (1 << 11);
        }
        self.send_client_message(
            window.0,
            self.atoms.net_moveresize_window,
            [flags, x as u32, y as u32, width, height],
        )
        .context("Failed to move or resize window")
    }

    fn move_window_to_workspace(&self, window: NativeWindow, workspace: NativeWorkspace) -> Result<()> {
        self.send_client_message(
            window.0,
            self.atoms.net_wm_desktop,
            [workspace.0, SOURCE_PAGER, 0, 0, 0],
        )
        .context("Failed to move window to workspace")
    }

    fn set_window_minimized(&self, window: NativeWindow, minimized: bool) -> Result<()> {
        if minimized {
            self.send_client_message(window.0, self.atoms.wm_change_state, [ICONIC_STATE, 0, 0, 0, 0])
                .context("Failed to minimize window")
        } else {
            // Activation restores iconified windows
            self.activate_window(window)
        }
    }

    fn activate_workspace(&self, workspace: NativeWorkspace) -> Result<()> {
        self.send_client_message(
            self.root,
            self.atoms.net_current_desktop,
            [workspace.0, x11rb::CURRENT_TIME, 0, 0, 0],
        )
        .context("Failed to activate workspace")
    }

    fn show_stage_window(&self, window: NativeWindow) -> Result<()> {
        self.conn.map_window(window.0).context("Failed to map stage window")?;
        Ok(())
    }

    fn hide_stage_window(&self, window: NativeWindow) -> Result<()> {
        self.conn.unmap_window(window.0).context("Failed to unmap stage window")?;
        Ok(())
    }

    fn supports_multiple_monitors(&self) -> bool {
        self.extensions.randr_monitors
    }

    fn background_window_hint(&self) -> Option<NativeWindow> {
        props::get_u32(self.conn.as_ref(), self.root, self.atoms.desktop_window_id, AtomEnum::WINDOW)
            .ok()
            .flatten()
            .filter(|w| *w != x11rb::NONE)
            .map(NativeWindow)
    }
}

impl CaptureBackend for X11Backend {
    fn capabilities(&self) -> CaptureCapabilities {
        CaptureCapabilities {
            composite: self.extensions.composite,
            damage: self.extensions.damage,
        }
    }

    fn is_window_mapped(&self, window: NativeWindow) -> bool {
        reply(self.conn.get_window_attributes(window.0), "GetWindowAttributes", window)
            .map(|attrs| attrs.map_state == MapState::VIEWABLE)
            .unwrap_or(false)
    }

    fn capture_target(&self, window: NativeWindow, include_frame: bool) -> NativeWindow {
        if !include_frame {
            return window;
        }
        match self.frame_of(window.0) {
            Ok(frame) => NativeWindow(frame),
            Err(e) => {
                debug!("Failed to find frame of window {}: {}", window, e);
                window
            }
        }
    }

    fn name_window_pixmap(&self, window: NativeWindow) -> Result<NativePixmap, CaptureError> {
        let pixmap = self.conn.generate_id().trap("NameWindowPixmap", window)?;
        checked(
            self.conn.composite_name_window_pixmap(window.0, pixmap),
            "NameWindowPixmap",
            window,
        )?;
        Ok(NativePixmap(pixmap))
    }

    fn pixmap_size(&self, pixmap: NativePixmap) -> Result<(u32, u32), CaptureError> {
        let geometry = reply(self.conn.get_geometry(pixmap.0), "GetGeometry", NativeWindow(pixmap.0))?;
        Ok((geometry.width as u32, geometry.height as u32))
    }

    fn free_pixmap(&self, pixmap: NativePixmap) {
        if let Err(e) = self.conn.free_pixmap(pixmap.0) {
            warn!("Failed to free pixmap {}: {}", pixmap, e);
        }
    }

    fn create_damage(&self, window: NativeWindow) -> Result<NativeDamage, CaptureError> {
        let damage = self.conn.generate_id().trap("DamageCreate", window)?;
        checked(
            self.conn.damage_create(damage, window.0, ReportLevel::NON_EMPTY),
            "DamageCreate",
            window,
        )?;
        Ok(NativeDamage(damage))
    }

    fn subtract_damage(&self, damage: NativeDamage) {
        if let Err(e) = self.conn.damage_subtract(damage.0, x11rb::NONE, x11rb::NONE) {
            debug!("Failed to subtract damage {}: {}", damage, e);
        }
    }

    fn destroy_damage(&self, damage: NativeDamage) {
        if let Err(e) = self.conn.damage_destroy(damage.0) {
            warn!("Failed to destroy damage {}: {}", damage, e);
        }
    }

    fn read_pixels(&self, pixmap: NativePixmap, area: Geometry) -> Result<Image, CaptureError> {
        let target = NativeWindow(pixmap.0);
        let image = reply(
            self.conn.get_image(
                ImageFormat::Z_PIXMAP,
                pixmap.0,
                area.x as i16,
                area.y as i16,
                area.width as u16,
                area.height as u16,
                !0,
            ),
            "GetImage",
            target,
        )?;

        let pixels = props::decode_z_pixmap(&image.data, image.depth);
        Image::new(area.width, area.height, pixels).ok_or_else(|| CaptureError::Protocol {
            op: "GetImage",
            window: target,
            reason: format!("unexpected image depth {} or size", image.depth),
        })
    }
}
