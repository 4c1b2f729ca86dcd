//! Error trapping for capture requests
//!
//! Capture requests race against clients unmapping or destroying their
//! windows, so protocol errors are expected. Each request is sent checked and
//! any error comes back as a [`CaptureError`] naming the request and window.

use std::fmt::Display;

use x11rb::connection::RequestConnection;
use x11rb::cookie::{Cookie, VoidCookie};
use x11rb::errors::{ConnectionError, ReplyError};
use x11rb::x11_utils::TryParse;

use crate::native::{CaptureError, NativeWindow};

/// Tag failures with the request name and the window it concerned
pub trait Trap<T> {
    fn trap(self, op: &'static str, window: NativeWindow) -> Result<T, CaptureError>;
}

impl<T, E: Display> Trap<T> for Result<T, E> {
    fn trap(self, op: &'static str, window: NativeWindow) -> Result<T, CaptureError> {
        self.map_err(|e| CaptureError::Protocol {
            op,
            window,
            reason: e.to_string(),
        })
    }
}

/// Send a void request and wait for its error, if any
pub fn checked<C: RequestConnection>(
    sent: Result<VoidCookie<'_, C>, ConnectionError>,
    op: &'static str,
    window: NativeWindow,
) -> Result<(), CaptureError> {
    sent.map_err(ReplyError::from)
        .and_then(|cookie| cookie.check())
        .trap(op, window)
}

/// Send a request and wait for its reply or error
pub fn reply<C: RequestConnection, R: TryParse>(
    sent: Result<Cookie<'_, C, R>, ConnectionError>,
    op: &'static str,
    window: NativeWindow,
) -> Result<R, CaptureError> {
    sent.map_err(ReplyError::from)
        .and_then(|cookie| cookie.reply())
        .trap(op, window)
}
