//! Live Window Content Module
//!
//! Per-window textures that mirror a tracked window's pixels through the
//! composite extension, falling back to the window icon whenever live
//! capture is unavailable, impossible or suspended. Native resources are
//! only held for mapped windows.

mod paint;
mod queue;
mod resources;
mod texture;
mod workaround;

use std::collections::HashMap;
use std::rc::Rc;
use std::sync::Arc;

use slotmap::new_key_type;
use tracing::{debug, info, trace, warn};

use crate::config::{ContentConfig, ResumePriority};
use crate::native::{
    CaptureBackend, CaptureCapabilities, NativeDamage, NativeEvent, NativeWindow,
};
use crate::shared::Image;
use crate::tracker::{Registry, Tracker, TrackerEvent, TrackerObserver, WindowId};

pub use paint::{IconPlacement, OutlineStyle, PaintOp, RectF};
pub use queue::{IdleSource, ResumeQueue};
pub use resources::LiveCapture;
pub use texture::{Texture, TextureSource};
pub use workaround::{WorkaroundState, WorkaroundStep};

new_key_type! {
    /// Reference to a [`WindowContent`]
    pub struct ContentId;
}

/// Capture lifecycle of one content
pub enum CaptureState {
    /// No native resources; showing the fallback icon or a snapshot
    Suspended,
    /// Waiting in the resume queue
    Queued,
    /// Pixmap (and damage, if available) held; texture is live
    Live(LiveCapture),
}

impl std::fmt::Debug for CaptureState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CaptureState::Suspended => write!(f, "Suspended"),
            CaptureState::Queued => write!(f, "Queued"),
            CaptureState::Live(live) => write!(f, "Live({})", live.pixmap()),
        }
    }
}

/// Texture-like content mirroring one tracked window
#[derive(Debug)]
pub struct WindowContent {
    /// `None` once the window closed
    window: Option<WindowId>,
    handle: NativeWindow,
    /// Title of the tracked window, kept for log messages
    name: String,
    texture: Texture,
    fallback_icon: Arc<Image>,
    /// Last frame copied out of a live capture
    snapshot: Option<Arc<Image>>,
    capture: CaptureState,
    mapped: bool,
    /// Last known client size, from a configure notification or a capture
    configured_size: Option<(u32, u32)>,
    workaround: WorkaroundState,
    /// Window restored by the workaround but not mapped yet
    workaround_capture_pending: bool,
    outline: OutlineStyle,
    icon_placement: IconPlacement,
}

impl WindowContent {
    pub fn window(&self) -> Option<WindowId> {
        self.window
    }

    pub fn handle(&self) -> NativeWindow {
        self.handle
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn texture(&self) -> &Texture {
        &self.texture
    }

    pub fn capture_state(&self) -> &CaptureState {
        &self.capture
    }

    /// Showing the static icon instead of window pixels
    pub fn is_fallback(&self) -> bool {
        self.texture.is_icon()
    }

    /// Holding no native capture resources
    pub fn is_suspended(&self) -> bool {
        !matches!(self.capture, CaptureState::Live(_))
    }

    pub fn is_detached(&self) -> bool {
        self.window.is_none()
    }

    pub fn is_mapped(&self) -> bool {
        self.mapped
    }

    pub fn has_pixmap(&self) -> bool {
        matches!(self.capture, CaptureState::Live(_))
    }

    pub fn has_damage(&self) -> bool {
        matches!(&self.capture, CaptureState::Live(live) if live.damage().is_some())
    }

    pub fn workaround_state(&self) -> WorkaroundState {
        self.workaround
    }

    pub fn outline(&self) -> OutlineStyle {
        self.outline
    }

    pub fn icon_placement(&self) -> IconPlacement {
        self.icon_placement
    }

    /// Texture shown while no live capture is held
    fn resting_texture(&self) -> Texture {
        match &self.snapshot {
            Some(image) => Texture::snapshot(image.clone()),
            None => Texture::icon(self.fallback_icon.clone()),
        }
    }

    /// Drop live resources, showing the snapshot or the fallback icon again
    fn release(&mut self, damage_owner: &mut HashMap<NativeDamage, ContentId>) {
        match std::mem::replace(&mut self.capture, CaptureState::Suspended) {
            CaptureState::Live(live) => {
                if let Some(damage) = live.damage() {
                    damage_owner.remove(&damage);
                }
                live.release();
                self.texture = self.resting_texture();
                debug!("Released capture resources of window {}", self.handle);
            }
            CaptureState::Queued | CaptureState::Suspended => {}
        }
    }
}

/// Owner of every window content and of the global resume queue
pub struct ContentManager {
    capture: Rc<dyn CaptureBackend>,
    capabilities: CaptureCapabilities,
    settings: ContentConfig,
    contents: Registry<WindowId, ContentId, WindowContent>,
    by_native: HashMap<NativeWindow, ContentId>,
    damage_owner: HashMap<NativeDamage, ContentId>,
    queue: ResumeQueue,
    /// Application-wide suspension (shell hidden)
    suspended: bool,
    redraws: Vec<ContentId>,
}

impl ContentManager {
    /// Query capture capabilities once; missing extensions degrade every
    /// content for the lifetime of the process.
    pub fn new(capture: Rc<dyn CaptureBackend>, settings: ContentConfig) -> Self {
        let capabilities = capture.capabilities();
        if !capabilities.composite {
            warn!("Composite extension unavailable, window contents will only show icons");
        } else if !capabilities.damage {
            warn!("Damage extension unavailable, live window contents will not update");
        }
        info!(
            "Window content initialized (resume priority {:?}, unmapped window workaround {})",
            settings.resume_priority, settings.workaround_unmapped_window
        );

        Self {
            capture,
            capabilities,
            settings,
            contents: Registry::new(),
            by_native: HashMap::new(),
            damage_owner: HashMap::new(),
            queue: ResumeQueue::new(),
            suspended: false,
            redraws: Vec::new(),
        }
    }

    pub fn capabilities(&self) -> CaptureCapabilities {
        self.capabilities
    }

    pub fn settings(&self) -> &ContentConfig {
        &self.settings
    }

    pub fn content(&self, id: ContentId) -> Option<&WindowContent> {
        self.contents.get(id)
    }

    pub fn content_for_window(&self, window: WindowId) -> Option<ContentId> {
        self.contents.lookup(window)
    }

    /// Texture currently shown by `id`
    pub fn texture(&self, id: ContentId) -> Option<&Texture> {
        self.contents.get(id).map(WindowContent::texture)
    }

    pub fn ids(&self) -> Vec<ContentId> {
        self.contents.ids()
    }

    pub fn len(&self) -> usize {
        self.contents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contents.is_empty()
    }

    pub fn is_suspended(&self) -> bool {
        self.suspended
    }

    pub fn queue(&self) -> &ResumeQueue {
        &self.queue
    }

    pub fn has_pending_idle(&self) -> bool {
        self.queue.idle().is_some()
    }

    /// Priority of the armed idle source, if any
    pub fn idle_priority(&self) -> Option<ResumePriority> {
        self.queue.idle().map(|idle| idle.priority)
    }

    /// Contents that asked for a redraw since the last call
    pub fn take_redraw_requests(&mut self) -> Vec<ContentId> {
        std::mem::take(&mut self.redraws)
    }

    fn request_redraw(redraws: &mut Vec<ContentId>, id: ContentId) {
        if !redraws.contains(&id) {
            redraws.push(id);
        }
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Create the content for `window`, or return the one that exists.
    ///
    /// The icon texture is available immediately; live capture is requested
    /// right away.
    pub fn create(&mut self, tracker: &Tracker, window: WindowId) -> Option<ContentId> {
        if let Some(id) = self.contents.lookup(window) {
            return Some(id);
        }
        let Some(tracked) = tracker.window(window) else {
            warn!("Cannot create content for untracked window {:?}", window);
            return None;
        };

        let handle = tracked.handle();
        let name = tracked.name().to_owned();
        let fallback_icon = tracked
            .icon()
            .cloned()
            .unwrap_or_else(|| Arc::new(Image::placeholder()));
        let mapped = self.capture.is_window_mapped(handle);
        let settings = &self.settings;

        let (id, _) = self.contents.get_or_insert_with(window, || WindowContent {
            window: Some(window),
            handle,
            name,
            texture: Texture::icon(fallback_icon.clone()),
            fallback_icon,
            snapshot: None,
            capture: CaptureState::Suspended,
            mapped,
            configured_size: None,
            workaround: WorkaroundState::Idle,
            workaround_capture_pending: false,
            outline: settings.outline,
            icon_placement: settings.unmapped_icon,
        });
        self.by_native.insert(handle, id);
        debug!("Created content for window {} (mapped={})", handle, mapped);

        self.resume(tracker, id);
        Some(id)
    }

    /// Destroy a content, releasing its resources and dequeuing it.
    pub fn destroy(&mut self, id: ContentId) {
        self.queue.remove(id);
        let Some(mut content) = self.contents.remove(id) else {
            return;
        };
        content.release(&mut self.damage_owner);
        if self.by_native.get(&content.handle) == Some(&id) {
            self.by_native.remove(&content.handle);
        }
        self.redraws.retain(|r| *r != id);
        debug!("Destroyed content for window {}", content.handle);
    }

    /// Drain the queue and cancel its idle source, then destroy every content.
    pub fn shutdown(&mut self) {
        self.queue.clear();
        for id in self.contents.ids() {
            self.destroy(id);
        }
        info!("Window content shut down");
    }

    /// Apply new settings. A priority change re-arms the idle source;
    /// switching to immediate acquires everything queued right away.
    pub fn set_settings(&mut self, settings: ContentConfig) {
        let priority_changed = settings.resume_priority != self.settings.resume_priority;
        self.settings = settings;

        if priority_changed && !self.queue.is_empty() {
            if self.settings.resume_priority == ResumePriority::Immediate {
                debug!("Resume priority is now immediate, flushing {} queued contents", self.queue.len());
                while let Some(id) = self.queue.pop() {
                    self.acquire(id);
                }
            } else {
                self.queue.rearm(self.settings.resume_priority);
            }
        }
    }

    pub fn set_outline(&mut self, id: ContentId, outline: OutlineStyle) {
        if let Some(content) = self.contents.get_mut(id) {
            if content.outline != outline {
                content.outline = outline;
                Self::request_redraw(&mut self.redraws, id);
            }
        }
    }

    pub fn set_icon_placement(&mut self, id: ContentId, placement: IconPlacement) {
        if let Some(content) = self.contents.get_mut(id) {
            if content.icon_placement != placement {
                content.icon_placement = placement;
                if content.is_fallback() {
                    Self::request_redraw(&mut self.redraws, id);
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // Suspend / resume
    // ------------------------------------------------------------------

    /// Request live capture for `id` according to the resume policy.
    pub fn resume(&mut self, tracker: &Tracker, id: ContentId) {
        let Some(content) = self.contents.get_mut(id) else {
            return;
        };
        let Some(window) = content.window else {
            return;
        };
        if !self.capabilities.composite || self.suspended {
            return;
        }
        if matches!(content.capture, CaptureState::Live(_)) {
            return;
        }

        if !content.mapped {
            let minimized = tracker.window(window).is_some_and(|w| w.is_minimized());
            if self.settings.workaround_unmapped_window && minimized && content.workaround.start() {
                debug!("Restoring minimized window {} to capture it", content.handle);
                if tracker.set_window_minimized(window, false).is_err() {
                    content.workaround.abort();
                }
            }
            return;
        }

        match self.settings.resume_priority {
            ResumePriority::Immediate => {
                self.acquire(id);
            }
            priority => {
                content.capture = CaptureState::Queued;
                if self.queue.push(id, priority) {
                    trace!("Queued window {} for capture", content.handle);
                }
            }
        }
    }

    /// Release the native resources of `id`.
    pub fn suspend(&mut self, id: ContentId) {
        self.queue.remove(id);
        if let Some(content) = self.contents.get_mut(id) {
            let was_live = content.has_pixmap();
            content.release(&mut self.damage_owner);
            if was_live {
                Self::request_redraw(&mut self.redraws, id);
            }
        }
    }

    /// Application-wide suspend: every content releases its resources before
    /// this returns and the resume queue is emptied.
    pub fn suspend_all(&mut self) {
        if self.suspended {
            return;
        }
        self.suspended = true;
        self.queue.clear();
        for id in self.contents.ids() {
            self.suspend(id);
        }
        info!("Window content suspended");
    }

    /// Leave application-wide suspension and resume every mapped content.
    pub fn resume_all(&mut self, tracker: &Tracker) {
        if !self.suspended {
            return;
        }
        self.suspended = false;
        for id in self.contents.ids() {
            self.resume(tracker, id);
        }
        info!("Window content resumed");
    }

    /// One idle slice: acquire resources for the queue head.
    /// Returns whether the idle source is still armed.
    pub fn run_idle(&mut self) -> bool {
        if let Some(id) = self.queue.pop() {
            self.acquire(id);
        }
        self.has_pending_idle()
    }

    /// Acquire live resources for `id` now. Failures are transient: the
    /// content stays suspended and is retried on the next qualifying event.
    fn acquire(&mut self, id: ContentId) -> bool {
        self.queue.remove(id);
        let Some(content) = self.contents.get_mut(id) else {
            return false;
        };
        if content.window.is_none() || self.suspended {
            content.capture = CaptureState::Suspended;
            return false;
        }

        // Never leak resources of a previous attempt
        content.release(&mut self.damage_owner);

        let target = self
            .capture
            .capture_target(content.handle, self.settings.include_window_frame);
        match LiveCapture::acquire(&self.capture, target, self.capabilities.damage) {
            Ok(live) => {
                let (width, height) = live.size();
                if let Some(damage) = live.damage() {
                    self.damage_owner.insert(damage, id);
                }
                if target == content.handle {
                    content.configured_size = Some((width, height));
                }
                content.texture = Texture::live(live.pixmap(), width, height);
                content.capture = CaptureState::Live(live);
                debug!("Capturing window {} ({}x{})", content.handle, width, height);
                Self::request_redraw(&mut self.redraws, id);
                true
            }
            Err(e) => {
                debug!("Could not capture window {} ({:?}): {}", content.handle, content.name, e);
                content.capture = CaptureState::Suspended;
                false
            }
        }
    }

    // ------------------------------------------------------------------
    // Event handling
    // ------------------------------------------------------------------

    /// Raw map/unmap/configure/destroy/damage notifications
    pub fn handle_raw_event(&mut self, tracker: &Tracker, event: &NativeEvent) {
        match event {
            NativeEvent::Damaged(damage) => self.on_damage(*damage),
            NativeEvent::Mapped(handle) => {
                let Some(id) = self.by_native.get(handle).copied() else {
                    return;
                };
                let pending = match self.contents.get_mut(id) {
                    Some(content) => {
                        content.mapped = true;
                        std::mem::take(&mut content.workaround_capture_pending)
                    }
                    None => return,
                };
                if pending {
                    self.capture_workaround_frame(tracker, id);
                } else {
                    self.resume(tracker, id);
                }
            }
            NativeEvent::Unmapped(handle) => {
                let Some(id) = self.by_native.get(handle).copied() else {
                    return;
                };
                if let Some(content) = self.contents.get_mut(id) {
                    content.mapped = false;
                }
                self.suspend(id);
            }
            NativeEvent::Configured { window, width, height } => {
                self.on_configured(tracker, *window, (*width, *height))
            }
            NativeEvent::Destroyed(handle) => {
                if let Some(id) = self.by_native.get(handle).copied() {
                    self.detach(id);
                }
            }
            _ => {}
        }
    }

    fn on_damage(&mut self, damage: NativeDamage) {
        let Some(id) = self.damage_owner.get(&damage).copied() else {
            trace!("Damage {} has no content", damage);
            return;
        };
        if let Some(content) = self.contents.get_mut(id) {
            content.texture.invalidate();
            self.capture.subtract_damage(damage);
            Self::request_redraw(&mut self.redraws, id);
        }
    }

    fn on_configured(&mut self, tracker: &Tracker, handle: NativeWindow, size: (u32, u32)) {
        let Some(id) = self.by_native.get(&handle).copied() else {
            return;
        };
        let Some(content) = self.contents.get_mut(id) else {
            return;
        };
        let previous = content.configured_size.replace(size);
        // Without an earlier notification, compare against the named pixmap
        let resized = match (&content.capture, previous) {
            (CaptureState::Live(_), Some(previous)) => previous != size,
            (CaptureState::Live(live), None) => live.size() != size,
            _ => false,
        };
        if resized {
            debug!("Window {} resized to {}x{}, recreating capture", handle, size.0, size.1);
            self.suspend(id);
            self.resume(tracker, id);
        }
    }

    /// Window went away: release everything and never resume again. With
    /// `snapshot_closed_windows` a copy of the last frame is kept when it can
    /// still be read.
    fn detach(&mut self, id: ContentId) {
        self.queue.remove(id);
        let Some(content) = self.contents.get_mut(id) else {
            return;
        };
        if content.window.is_none() {
            return;
        }

        let snapshot = match &content.capture {
            CaptureState::Live(live) if self.settings.snapshot_closed_windows => {
                live.snapshot(self.capture.as_ref()).ok()
            }
            _ => None,
        };
        content.release(&mut self.damage_owner);
        if let Some(image) = snapshot {
            let image = Arc::new(image);
            content.texture = Texture::snapshot(image.clone());
            content.snapshot = Some(image);
        }
        content.workaround.abort();
        content.window = None;
        content.mapped = false;
        if self.by_native.get(&content.handle) == Some(&id) {
            self.by_native.remove(&content.handle);
        }
        debug!("Detached content from closed window {}", content.handle);
        Self::request_redraw(&mut self.redraws, id);
    }

    fn on_window_state_changed(&mut self, tracker: &Tracker, id: ContentId, window: WindowId) {
        let Some(content) = self.contents.get_mut(id) else {
            return;
        };
        let Some(state) = tracker.window(window).map(|w| w.state()) else {
            return;
        };

        match content.workaround.on_window_state_changed(state) {
            WorkaroundStep::None => {}
            WorkaroundStep::CaptureAndReminimize => {
                if content.mapped {
                    self.capture_workaround_frame(tracker, id);
                } else {
                    content.workaround_capture_pending = true;
                }
            }
            WorkaroundStep::Finished => {
                debug!("Minimized window workaround finished for window {}", content.handle);
            }
        }
    }

    /// Copy one frame of a window the workaround restored, then minimize it
    /// again. The copy is kept as the resting texture.
    fn capture_workaround_frame(&mut self, tracker: &Tracker, id: ContentId) {
        let Some(window) = self.contents.get(id).and_then(|c| c.window) else {
            return;
        };

        if self.acquire(id) {
            if let Some(content) = self.contents.get_mut(id) {
                let snapshot = match &content.capture {
                    CaptureState::Live(live) => Some(live.snapshot(self.capture.as_ref())),
                    _ => None,
                };
                content.release(&mut self.damage_owner);
                match snapshot {
                    Some(Ok(image)) => {
                        debug!("Captured frame of minimized window {}", content.handle);
                        let image = Arc::new(image);
                        content.texture = Texture::snapshot(image.clone());
                        content.snapshot = Some(image);
                        Self::request_redraw(&mut self.redraws, id);
                    }
                    Some(Err(e)) => debug!("Could not copy frame of window {}: {}", content.handle, e),
                    None => {}
                }
            }
        }

        if let Err(e) = tracker.set_window_minimized(window, true) {
            warn!("Failed to minimize window again: {}", e);
        }
    }

    fn on_window_icon_changed(&mut self, tracker: &Tracker, id: ContentId, window: WindowId) {
        let Some(content) = self.contents.get_mut(id) else {
            return;
        };
        let icon = tracker
            .window(window)
            .and_then(|w| w.icon().cloned())
            .unwrap_or_else(|| Arc::new(Image::placeholder()));
        content.fallback_icon = icon.clone();
        if content.is_fallback() {
            content.texture = Texture::icon(icon);
            Self::request_redraw(&mut self.redraws, id);
        }
    }

    // ------------------------------------------------------------------
    // Painting
    // ------------------------------------------------------------------

    /// Preferred size: the real window size while showing a fallback or
    /// while suspended, otherwise the texture size.
    pub fn preferred_size(&self, tracker: &Tracker, id: ContentId) -> Option<(f32, f32)> {
        let content = self.contents.get(id)?;
        if content.is_fallback() || content.is_suspended() {
            if let Some(geometry) = content.window.and_then(|w| tracker.window(w)).map(|w| w.geometry()) {
                return Some((geometry.width as f32, geometry.height as f32));
            }
        }
        let (width, height) = content.texture.size();
        Some((width as f32, height as f32))
    }

    /// Paint operations for `id` inside `allocation`
    pub fn paint(&mut self, id: ContentId, allocation: RectF) -> Vec<PaintOp> {
        let Some(content) = self.contents.get_mut(id) else {
            return Vec::new();
        };

        let rect = if content.is_fallback() {
            content.icon_placement.place(allocation, content.texture.size())
        } else {
            allocation
        };

        let mut ops = vec![PaintOp::Texture {
            texture: content.texture.clone(),
            rect,
            resample: content.texture.is_stale(),
        }];
        content.texture.mark_sampled();

        if content.outline.width > 0.0 {
            ops.push(PaintOp::Outline {
                rect: allocation,
                color: content.outline.color,
                width: content.outline.width,
            });
        }
        ops
    }
}

impl TrackerObserver for ContentManager {
    fn on_tracker_event(&mut self, tracker: &Tracker, event: &TrackerEvent) {
        match event {
            TrackerEvent::WindowClosed { window } => {
                if let Some(id) = self.contents.lookup(*window) {
                    self.detach(id);
                }
            }
            TrackerEvent::WindowStateChanged { window, .. } => {
                if let Some(id) = self.contents.lookup(*window) {
                    self.on_window_state_changed(tracker, id, *window);
                }
            }
            TrackerEvent::WindowIconChanged { window } => {
                if let Some(id) = self.contents.lookup(*window) {
                    self.on_window_icon_changed(tracker, id, *window);
                }
            }
            TrackerEvent::WindowNameChanged { window } => {
                let name = tracker.window(*window).map(|w| w.name().to_owned());
                let content = self.contents.lookup(*window).and_then(|id| self.contents.get_mut(id));
                if let (Some(content), Some(name)) = (content, name) {
                    content.name = name;
                }
            }
            _ => {}
        }
    }
}

impl Drop for ContentManager {
    fn drop(&mut self) {
        self.queue.clear();
        self.contents.clear();
    }
}
