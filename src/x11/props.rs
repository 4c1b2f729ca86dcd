//! Window property readers
//!
//! Raw `GetProperty` helpers plus pure decoders turning property values
//! into the native seam's types.

use anyhow::Result;
use x11rb::connection::Connection;
use x11rb::protocol::xproto::{Atom, AtomEnum, ConnectionExt as _, Window};

use super::atoms::Atoms;
use crate::native::{NativeWorkspace, WindowActions, WindowState, WindowType};
use crate::shared::Image;

/// `_NET_WM_DESKTOP` value meaning "on all desktops"
pub const ALL_DESKTOPS: u32 = 0xFFFF_FFFF;

/// `WM_STATE` value of iconified windows
const ICONIC_STATE: u32 = 3;

/// Largest icon accepted, in pixels
const MAX_ICON_PIXELS: usize = 512 * 512;

/// Read a 32-bit property; missing properties read as empty
pub fn get_u32s<C: Connection>(
    conn: &C,
    window: Window,
    property: Atom,
    type_: impl Into<Atom>,
    max_len: u32,
) -> Result<Vec<u32>> {
    let reply = conn
        .get_property(false, window, property, type_, 0, max_len)?
        .reply()?;
    Ok(reply.value32().map(|values| values.collect()).unwrap_or_default())
}

/// First value of a 32-bit property
pub fn get_u32<C: Connection>(
    conn: &C,
    window: Window,
    property: Atom,
    type_: impl Into<Atom>,
) -> Result<Option<u32>> {
    Ok(get_u32s(conn, window, property, type_, 1)?.first().copied())
}

/// Read an 8-bit property of any type
pub fn get_bytes<C: Connection>(conn: &C, window: Window, property: Atom) -> Result<Vec<u8>> {
    let reply = conn
        .get_property(false, window, property, AtomEnum::ANY, 0, u32::MAX / 4)?
        .reply()?;
    if reply.format != 8 {
        return Ok(Vec::new());
    }
    Ok(reply.value)
}

/// Display name: `_NET_WM_NAME`, falling back to `WM_NAME`
pub fn read_name<C: Connection>(conn: &C, atoms: &Atoms, window: Window) -> Result<String> {
    let name = get_bytes(conn, window, atoms.net_wm_name)?;
    if !name.is_empty() {
        return Ok(String::from_utf8_lossy(&name).into_owned());
    }
    let legacy = get_bytes(conn, window, atoms.wm_name)?;
    Ok(String::from_utf8_lossy(&legacy).into_owned())
}

/// `_NET_WM_STATE` combined with the ICCCM iconic state and the sticky desktop
pub fn read_state<C: Connection>(conn: &C, atoms: &Atoms, window: Window) -> Result<WindowState> {
    let net_state = get_u32s(conn, window, atoms.net_wm_state, AtomEnum::ATOM, 64)?;
    let wm_state = get_u32(conn, window, atoms.wm_state, atoms.wm_state)?;
    let desktop = get_u32(conn, window, atoms.net_wm_desktop, AtomEnum::CARDINAL)?;
    Ok(window_state(
        atoms,
        &net_state,
        wm_state == Some(ICONIC_STATE),
        desktop == Some(ALL_DESKTOPS),
    ))
}

pub fn read_actions<C: Connection>(conn: &C, atoms: &Atoms, window: Window) -> Result<WindowActions> {
    let actions = get_u32s(conn, window, atoms.net_wm_allowed_actions, AtomEnum::ATOM, 64)?;
    Ok(window_actions(atoms, &actions))
}

pub fn read_window_type<C: Connection>(conn: &C, atoms: &Atoms, window: Window) -> Result<WindowType> {
    let types = get_u32s(conn, window, atoms.net_wm_window_type, AtomEnum::ATOM, 16)?;
    Ok(window_type(atoms, &types))
}

pub fn read_workspace<C: Connection>(
    conn: &C,
    atoms: &Atoms,
    window: Window,
) -> Result<Option<NativeWorkspace>> {
    let desktop = get_u32(conn, window, atoms.net_wm_desktop, AtomEnum::CARDINAL)?;
    Ok(desktop.and_then(workspace_from_desktop))
}

/// Largest complete icon from `_NET_WM_ICON`
pub fn read_icon<C: Connection>(conn: &C, atoms: &Atoms, window: Window) -> Result<Option<Image>> {
    let values = get_u32s(conn, window, atoms.net_wm_icon, AtomEnum::CARDINAL, u32::MAX / 4)?;
    Ok(parse_icon(&values))
}

/// `WM_CLASS` res_name and res_class
pub fn read_class<C: Connection>(conn: &C, atoms: &Atoms, window: Window) -> Result<Vec<String>> {
    Ok(split_strings(&get_bytes(conn, window, atoms.wm_class)?))
}

/// Decode `_NET_WM_ICON`: a sequence of `width, height, pixels...` entries.
/// Truncated or oversized entries end the scan.
pub fn parse_icon(values: &[u32]) -> Option<Image> {
    let mut best: Option<(u32, u32, &[u32])> = None;
    let mut rest = values;

    while let [width, height, tail @ ..] = rest {
        let Some(count) = (*width as usize).checked_mul(*height as usize) else {
            break;
        };
        if count == 0 || count > MAX_ICON_PIXELS || tail.len() < count {
            break;
        }
        let (pixels, next) = tail.split_at(count);
        if best.is_none_or(|(w, h, _)| (w as usize) * (h as usize) < count) {
            best = Some((*width, *height, pixels));
        }
        rest = next;
    }

    best.and_then(|(width, height, pixels)| Image::new(width, height, pixels.to_vec()))
}

/// ZPixmap data of a 24 or 32 bit drawable as ARGB words. Both depths are
/// stored 32 bits per pixel; depth 24 has no alpha and comes out opaque.
pub fn decode_z_pixmap(data: &[u8], depth: u8) -> Vec<u32> {
    let opaque = if depth == 32 { 0 } else { 0xff00_0000 };
    data.chunks_exact(4)
        .map(|px| bytemuck::pod_read_unaligned::<u32>(px) | opaque)
        .collect()
}

/// Split a list of NUL-terminated strings (desktop names, `WM_CLASS`)
pub fn split_strings(bytes: &[u8]) -> Vec<String> {
    let bytes = bytes.strip_suffix(&[0]).unwrap_or(bytes);
    if bytes.is_empty() {
        return Vec::new();
    }
    bytes
        .split(|b| *b == 0)
        .map(|s| String::from_utf8_lossy(s).into_owned())
        .collect()
}

pub fn window_state(atoms: &Atoms, net_state: &[Atom], iconic: bool, sticky_desktop: bool) -> WindowState {
    let mut state = WindowState::empty();
    let mut maximized_vert = false;
    let mut maximized_horz = false;

    for atom in net_state {
        match *atom {
            a if a == atoms.net_wm_state_hidden => state |= WindowState::HIDDEN,
            a if a == atoms.net_wm_state_fullscreen => state |= WindowState::FULLSCREEN,
            a if a == atoms.net_wm_state_skip_pager => state |= WindowState::SKIP_PAGER,
            a if a == atoms.net_wm_state_skip_taskbar => state |= WindowState::SKIP_TASKLIST,
            a if a == atoms.net_wm_state_sticky => state |= WindowState::PINNED,
            a if a == atoms.net_wm_state_demands_attention => state |= WindowState::URGENT,
            a if a == atoms.net_wm_state_maximized_vert => maximized_vert = true,
            a if a == atoms.net_wm_state_maximized_horz => maximized_horz = true,
            _ => {}
        }
    }

    if maximized_vert && maximized_horz {
        state |= WindowState::MAXIMIZED;
    }
    if iconic || state.contains(WindowState::HIDDEN) {
        state |= WindowState::MINIMIZED;
    }
    if sticky_desktop {
        state |= WindowState::PINNED;
    }
    state
}

pub fn window_actions(atoms: &Atoms, actions: &[Atom]) -> WindowActions {
    let table = [
        (atoms.net_wm_action_close, WindowActions::CLOSE),
        (atoms.net_wm_action_move, WindowActions::MOVE),
        (atoms.net_wm_action_resize, WindowActions::RESIZE),
        (atoms.net_wm_action_minimize, WindowActions::MINIMIZE),
        (atoms.net_wm_action_maximize_horz, WindowActions::MAXIMIZE),
        (atoms.net_wm_action_maximize_vert, WindowActions::MAXIMIZE),
        (atoms.net_wm_action_fullscreen, WindowActions::FULLSCREEN),
        (atoms.net_wm_action_change_desktop, WindowActions::CHANGE_WORKSPACE),
        (atoms.net_wm_action_stick, WindowActions::STICK),
    ];
    table
        .iter()
        .filter(|(atom, _)| actions.contains(atom))
        .fold(WindowActions::empty(), |acc, (_, flag)| acc | *flag)
}

/// First recognised entry of `_NET_WM_WINDOW_TYPE`; unknown or missing is normal
pub fn window_type(atoms: &Atoms, types: &[Atom]) -> WindowType {
    let table = [
        (atoms.net_wm_window_type_normal, WindowType::Normal),
        (atoms.net_wm_window_type_desktop, WindowType::Desktop),
        (atoms.net_wm_window_type_dock, WindowType::Dock),
        (atoms.net_wm_window_type_dialog, WindowType::Dialog),
        (atoms.net_wm_window_type_toolbar, WindowType::Toolbar),
        (atoms.net_wm_window_type_menu, WindowType::Menu),
        (atoms.net_wm_window_type_utility, WindowType::Utility),
        (atoms.net_wm_window_type_splash, WindowType::Splash),
    ];
    types
        .iter()
        .find_map(|atom| table.iter().find(|(a, _)| a == atom).map(|(_, t)| *t))
        .unwrap_or_default()
}

/// Pinned windows belong to no single workspace
pub fn workspace_from_desktop(desktop: u32) -> Option<NativeWorkspace> {
    (desktop != ALL_DESKTOPS).then_some(NativeWorkspace(desktop))
}
