//! Interned atoms
//!
//! Every atom the backend reads or sends, interned once at start-up.

use anyhow::{Context, Result};
use x11rb::connection::Connection;
use x11rb::protocol::xproto::{Atom, ConnectionExt as _};

macro_rules! atoms {
    ($($field:ident => $name:literal,)*) => {
        /// Holds all interned atoms
        #[derive(Debug, Clone)]
        pub struct Atoms {
            $(pub $field: Atom,)*
        }

        impl Atoms {
            /// Intern all required atoms
            ///
            /// Requests are sent up front and the replies collected afterwards,
            /// so this costs a single round-trip.
            pub fn new<C: Connection>(conn: &C) -> Result<Self> {
                $(
                    let $field = conn
                        .intern_atom(false, $name.as_bytes())
                        .context(concat!("Failed to intern ", $name))?;
                )*
                Ok(Self {
                    $($field: $field.reply().context(concat!("Failed to intern ", $name))?.atom,)*
                })
            }

            /// Distinct fake values, for tests that never talk to a server
            #[cfg(test)]
            pub fn sequential() -> Self {
                let mut next: Atom = 1000;
                let mut take = || {
                    next += 1;
                    next
                };
                Self {
                    $($field: take(),)*
                }
            }
        }
    };
}

atoms! {
    utf8_string => "UTF8_STRING",
    wm_name => "WM_NAME",
    wm_class => "WM_CLASS",
    wm_state => "WM_STATE",
    wm_change_state => "WM_CHANGE_STATE",

    net_supporting_wm_check => "_NET_SUPPORTING_WM_CHECK",
    net_client_list => "_NET_CLIENT_LIST",
    net_client_list_stacking => "_NET_CLIENT_LIST_STACKING",
    net_active_window => "_NET_ACTIVE_WINDOW",
    net_close_window => "_NET_CLOSE_WINDOW",
    net_moveresize_window => "_NET_MOVERESIZE_WINDOW",
    net_number_of_desktops => "_NET_NUMBER_OF_DESKTOPS",
    net_current_desktop => "_NET_CURRENT_DESKTOP",
    net_desktop_names => "_NET_DESKTOP_NAMES",

    net_wm_name => "_NET_WM_NAME",
    net_wm_icon => "_NET_WM_ICON",
    net_wm_pid => "_NET_WM_PID",
    net_wm_desktop => "_NET_WM_DESKTOP",

    net_wm_window_type => "_NET_WM_WINDOW_TYPE",
    net_wm_window_type_normal => "_NET_WM_WINDOW_TYPE_NORMAL",
    net_wm_window_type_desktop => "_NET_WM_WINDOW_TYPE_DESKTOP",
    net_wm_window_type_dock => "_NET_WM_WINDOW_TYPE_DOCK",
    net_wm_window_type_dialog => "_NET_WM_WINDOW_TYPE_DIALOG",
    net_wm_window_type_toolbar => "_NET_WM_WINDOW_TYPE_TOOLBAR",
    net_wm_window_type_menu => "_NET_WM_WINDOW_TYPE_MENU",
    net_wm_window_type_utility => "_NET_WM_WINDOW_TYPE_UTILITY",
    net_wm_window_type_splash => "_NET_WM_WINDOW_TYPE_SPLASH",

    net_wm_state => "_NET_WM_STATE",
    net_wm_state_hidden => "_NET_WM_STATE_HIDDEN",
    net_wm_state_maximized_vert => "_NET_WM_STATE_MAXIMIZED_VERT",
    net_wm_state_maximized_horz => "_NET_WM_STATE_MAXIMIZED_HORZ",
    net_wm_state_fullscreen => "_NET_WM_STATE_FULLSCREEN",
    net_wm_state_skip_pager => "_NET_WM_STATE_SKIP_PAGER",
    net_wm_state_skip_taskbar => "_NET_WM_STATE_SKIP_TASKBAR",
    net_wm_state_sticky => "_NET_WM_STATE_STICKY",
    net_wm_state_demands_attention => "_NET_WM_STATE_DEMANDS_ATTENTION",

    net_wm_allowed_actions => "_NET_WM_ALLOWED_ACTIONS",
    net_wm_action_close => "_NET_WM_ACTION_CLOSE",
    net_wm_action_move => "_NET_WM_ACTION_MOVE",
    net_wm_action_resize => "_NET_WM_ACTION_RESIZE",
    net_wm_action_minimize => "_NET_WM_ACTION_MINIMIZE",
    net_wm_action_maximize_horz => "_NET_WM_ACTION_MAXIMIZE_HORZ",
    net_wm_action_maximize_vert => "_NET_WM_ACTION_MAXIMIZE_VERT",
    net_wm_action_fullscreen => "_NET_WM_ACTION_FULLSCREEN",
    net_wm_action_change_desktop => "_NET_WM_ACTION_CHANGE_DESKTOP",
    net_wm_action_stick => "_NET_WM_ACTION_STICK",

    desktop_window_id => "NAUTILUS_DESKTOP_WINDOW_ID",
}
