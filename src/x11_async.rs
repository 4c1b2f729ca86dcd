//! X11 Async Event Stream
//!
//! Readiness of the X connection's socket is watched with mio on a blocking
//! task; the main loop awaits a [`Notify`] and then drains x11rb's queue
//! without blocking.

use std::os::unix::io::AsRawFd;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::{Notify, oneshot};
use tracing::{info, warn};
use x11rb::connection::Connection;
use x11rb::protocol::Event;
use x11rb::rust_connection::RustConnection;

const X11_TOKEN: mio::Token = mio::Token(0);

/// How often the poll thread checks whether the stream was dropped
const POLL_TIMEOUT: Duration = Duration::from_millis(100);

pub struct X11EventStream {
    conn: Arc<RustConnection>,
    readable: Arc<Notify>,
    /// Dropping this stops the poll thread
    _alive: oneshot::Receiver<()>,
}

impl X11EventStream {
    /// Start watching the connection's file descriptor.
    /// Must be called inside a tokio runtime.
    pub fn new(conn: Arc<RustConnection>) -> Result<Self> {
        let fd = conn.stream().as_raw_fd();
        let readable = Arc::new(Notify::new());
        let notify = readable.clone();
        let (alive_tx, alive_rx) = oneshot::channel::<()>();

        let mut poll = mio::Poll::new().context("Failed to create mio Poll")?;
        poll.registry()
            .register(&mut mio::unix::SourceFd(&fd), X11_TOKEN, mio::Interest::READABLE)
            .context("Failed to register X11 socket with mio")?;

        tokio::task::spawn_blocking(move || {
            let mut events = mio::Events::with_capacity(4);
            while !alive_tx.is_closed() {
                if let Err(e) = poll.poll(&mut events, Some(POLL_TIMEOUT)) {
                    warn!("X11 socket poll failed: {}", e);
                    continue;
                }
                if events.iter().any(|event| event.token() == X11_TOKEN) {
                    notify.notify_one();
                }
            }
            info!("X11 socket polling stopped");
        });

        Ok(Self {
            conn,
            readable,
            _alive: alive_rx,
        })
    }

    /// Every event already received, without blocking
    pub fn drain(&self) -> Result<Vec<Event>> {
        let mut events = Vec::new();
        while let Some(event) = self.conn.poll_for_event()? {
            events.push(event);
        }
        Ok(events)
    }

    /// Resolves once the socket became readable. A wake-up that happened
    /// while nobody was waiting is kept, so none is lost between drains.
    pub async fn wait_readable(&self) {
        self.readable.notified().await;
    }

    /// Send queued requests to the server
    pub fn flush(&self) -> Result<()> {
        self.conn.flush().context("Failed to flush X11 connection")
    }
}
