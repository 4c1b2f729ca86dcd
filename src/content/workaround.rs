//! Minimized window capture workaround
//!
//! Some window managers stop updating the backing pixmap of minimized
//! windows. When enabled, a minimized window is briefly restored, one frame
//! is copied, and the window is minimized again. This visibly toggles a real
//! window, so it runs at most one cycle per window.

use crate::native::WindowState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WorkaroundState {
    #[default]
    Idle,
    /// Waiting for the window to report it is no longer minimized
    Unminimizing,
    /// Frame captured, waiting for the window to be minimized again
    Reminimizing,
    Done,
}

/// What the owner must do after a state change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkaroundStep {
    None,
    /// Window is visible: copy its pixels, then minimize it again
    CaptureAndReminimize,
    /// Cycle complete; stop listening
    Finished,
}

impl WorkaroundState {
    /// Begin a cycle. Returns false when one ran or is running already.
    pub fn start(&mut self) -> bool {
        if *self != WorkaroundState::Idle {
            return false;
        }
        *self = WorkaroundState::Unminimizing;
        true
    }

    pub fn is_running(&self) -> bool {
        matches!(self, WorkaroundState::Unminimizing | WorkaroundState::Reminimizing)
    }

    /// Single entry point for window state notifications
    pub fn on_window_state_changed(&mut self, new: WindowState) -> WorkaroundStep {
        let minimized = new.contains(WindowState::MINIMIZED);
        match *self {
            WorkaroundState::Unminimizing if !minimized => {
                *self = WorkaroundState::Reminimizing;
                WorkaroundStep::CaptureAndReminimize
            }
            WorkaroundState::Reminimizing if minimized => {
                *self = WorkaroundState::Done;
                WorkaroundStep::Finished
            }
            _ => WorkaroundStep::None,
        }
    }

    /// Give up on a running cycle (window gone)
    pub fn abort(&mut self) {
        if self.is_running() {
            *self = WorkaroundState::Done;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_cycle() {
        let mut state = WorkaroundState::default();
        assert!(state.start());
        assert!(!state.start());

        // Unrelated change while still minimized
        assert_eq!(
            state.on_window_state_changed(WindowState::MINIMIZED | WindowState::URGENT),
            WorkaroundStep::None
        );
        assert_eq!(
            state.on_window_state_changed(WindowState::empty()),
            WorkaroundStep::CaptureAndReminimize
        );
        assert_eq!(state, WorkaroundState::Reminimizing);
        assert_eq!(
            state.on_window_state_changed(WindowState::MINIMIZED),
            WorkaroundStep::Finished
        );
        assert_eq!(state, WorkaroundState::Done);
        assert!(!state.start());
    }

    #[test]
    fn test_idle_ignores_state_changes() {
        let mut state = WorkaroundState::Idle;
        assert_eq!(state.on_window_state_changed(WindowState::empty()), WorkaroundStep::None);
        state.abort();
        assert_eq!(state, WorkaroundState::Idle);
    }
}
