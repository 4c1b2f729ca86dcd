//! Area Tracker
//!
//! Diagnostic front-end for the tracker: mirrors the display's windows,
//! workspaces and monitors, keeps a live content for every client window and
//! logs what happens. `--json` prints every tracker signal as one JSON line.
//!
//! Signals: SIGUSR1 toggles suspension of all window contents, SIGINT and
//! SIGTERM shut down cleanly.

use std::collections::HashMap;
use std::rc::Rc;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal::unix::{SignalKind, signal};
use tracing::{debug, error, info, trace, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use area_tracker::config::{Config, ContentConfig, ResumePriority};
use area_tracker::content::ContentId;
use area_tracker::native::NativeEvent;
use area_tracker::x11::X11Backend;
use area_tracker::x11_async::X11EventStream;
use area_tracker::{Core, Tracker, TrackerEvent, TrackerObserver, WindowId};

/// Prints every signal as a JSON line on stdout
struct JsonPrinter;

impl TrackerObserver for JsonPrinter {
    fn on_tracker_event(&mut self, _tracker: &Tracker, event: &TrackerEvent) {
        match serde_json::to_string(event) {
            Ok(line) => println!("{}", line),
            Err(e) => warn!("Failed to serialize tracker signal: {}", e),
        }
    }
}

/// Logs window lifecycle signals with the window's name
struct SignalLogger;

impl TrackerObserver for SignalLogger {
    fn on_tracker_event(&mut self, tracker: &Tracker, event: &TrackerEvent) {
        match event {
            TrackerEvent::WindowOpened { window } => {
                if let Some(w) = tracker.window(*window) {
                    info!("Window opened: {:?} ({})", w.name(), w.handle());
                }
            }
            TrackerEvent::WindowClosed { window } => info!("Window closed: {:?}", window),
            TrackerEvent::ActiveWorkspaceChanged { new, .. } => {
                let number = new.and_then(|ws| tracker.workspace(ws)).map(|ws| ws.number());
                info!("Active workspace: {:?}", number);
            }
            TrackerEvent::MonitorAdded { .. } | TrackerEvent::MonitorRemoved { .. } => {
                let (width, height) = tracker.get_screen_size();
                info!("Monitors: {} ({}x{})", tracker.get_monitors().len(), width, height);
            }
            other => debug!("{:?}", other),
        }
    }
}

struct TrackerApp {
    backend: Rc<X11Backend>,
    stream: X11EventStream,
    core: Core,
    contents: HashMap<WindowId, ContentId>,
}

impl TrackerApp {
    fn new(json: bool) -> Result<Self> {
        let (conn, screen_num) = x11rb::connect(None).context("Failed to connect to X server")?;
        let conn = Arc::new(conn);
        info!("Connected to X server, screen {}", screen_num);

        let config = match Config::load() {
            Ok(config) => config,
            Err(e) => {
                warn!("Failed to load configuration, using defaults: {:#}", e);
                Config::default()
            }
        };

        let backend = Rc::new(X11Backend::new(conn.clone(), screen_num)?);
        let stream = X11EventStream::new(conn).context("Failed to initialize X11 event stream")?;

        // Contents are destroyed as soon as their window closes
        let settings = ContentConfig {
            snapshot_closed_windows: false,
            ..config.content
        };
        let mut core = Core::new(backend.clone(), backend.clone(), settings);
        core.add_observer(Box::new(SignalLogger));
        if json {
            core.add_observer(Box::new(JsonPrinter));
        }

        let mut app = Self {
            backend,
            stream,
            core,
            contents: HashMap::new(),
        };
        for event in app.backend.initial_events()? {
            app.dispatch(&event);
        }
        info!(
            "Tracking {} windows on {} workspaces",
            app.core.tracker().get_windows().len(),
            app.core.tracker().get_workspaces().len()
        );
        Ok(app)
    }

    fn dispatch(&mut self, event: &NativeEvent) {
        for signal in self.core.dispatch(event) {
            match signal {
                TrackerEvent::WindowOpened { window } => {
                    let is_stage = self.core.tracker().window(window).is_some_and(|w| w.is_stage());
                    if !is_stage {
                        if let Some(id) = self.core.create_content(window) {
                            self.contents.insert(window, id);
                        }
                    }
                }
                TrackerEvent::WindowClosed { window } => {
                    if let Some(id) = self.contents.remove(&window) {
                        self.core.destroy_content(id);
                    }
                }
                _ => {}
            }
        }
    }

    /// Translate and dispatch everything x11rb has queued
    fn process_pending(&mut self) -> Result<()> {
        loop {
            let events = self.stream.drain()?;
            if events.is_empty() {
                return Ok(());
            }
            for event in &events {
                for native in self.backend.translate(event) {
                    self.dispatch(&native);
                }
            }
        }
    }

    fn report_redraws(&mut self) {
        let redraws = self.core.content_mut().take_redraw_requests();
        if !redraws.is_empty() {
            trace!("{} window contents need a redraw", redraws.len());
        }
    }

    fn toggle_suspend(&mut self) {
        if self.core.is_suspended() {
            info!("Resuming window contents");
            self.core.resume();
        } else {
            info!("Suspending window contents");
            self.core.suspend();
        }
    }

    async fn run(mut self) -> Result<()> {
        let mut sigterm = signal(SignalKind::terminate())?;
        let mut sigint = signal(SignalKind::interrupt())?;
        let mut sigusr1 = signal(SignalKind::user_defined1())?;

        info!("Starting main event loop");
        loop {
            if let Err(e) = self.stream.flush() {
                error!("X11 connection lost: {:#}", e);
                break;
            }

            // High priority resumes run ahead of pending events
            if self.core.content().idle_priority() == Some(ResumePriority::High) {
                self.core.run_idle();
            }

            if let Err(e) = self.process_pending() {
                error!("Error polling for X11 events: {:#}", e);
                break;
            }
            self.report_redraws();

            let idle_armed = self.core.content().has_pending_idle();
            tokio::select! {
                biased;
                _ = sigterm.recv() => {
                    info!("Received SIGTERM, shutting down gracefully");
                    break;
                }
                _ = sigint.recv() => {
                    info!("Received SIGINT, shutting down gracefully");
                    break;
                }
                _ = sigusr1.recv() => self.toggle_suspend(),
                () = self.stream.wait_readable() => {}
                () = tokio::task::yield_now(), if idle_armed => {
                    self.core.run_idle();
                }
            }
        }

        self.core.shutdown();
        let _ = self.stream.flush();
        Ok(())
    }
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "area_tracker=debug,info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let json = std::env::args().any(|arg| arg == "--json");
    info!("Starting Area Tracker");

    // The tracker and its backends are single-threaded (Rc)
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to build tokio runtime")?;

    runtime.block_on(async {
        let app = TrackerApp::new(json)?;
        app.run().await
    })
}
