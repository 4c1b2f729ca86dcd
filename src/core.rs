//! Process-wide context
//!
//! Binds the tracker and the content manager together and fans tracker
//! signals out to observers. Created once at start-up; everything runs on
//! the main loop's thread.

use std::rc::Rc;

use tracing::{debug, info};

use crate::config::ContentConfig;
use crate::content::{ContentId, ContentManager};
use crate::native::{CaptureBackend, NativeEvent, WindowBackend};
use crate::tracker::{Tracker, TrackerEvent, TrackerObserver, WindowId};

pub struct Core {
    tracker: Tracker,
    content: ContentManager,
    observers: Vec<Box<dyn TrackerObserver>>,
    shut_down: bool,
}

impl Core {
    pub fn new(
        windows: Rc<dyn WindowBackend>,
        capture: Rc<dyn CaptureBackend>,
        settings: ContentConfig,
    ) -> Self {
        Self {
            tracker: Tracker::new(windows),
            content: ContentManager::new(capture, settings),
            observers: Vec::new(),
            shut_down: false,
        }
    }

    pub fn tracker(&self) -> &Tracker {
        &self.tracker
    }

    pub fn content(&self) -> &ContentManager {
        &self.content
    }

    pub fn content_mut(&mut self) -> &mut ContentManager {
        &mut self.content
    }

    /// Observers see every signal after the content manager did
    pub fn add_observer(&mut self, observer: Box<dyn TrackerObserver>) {
        self.observers.push(observer);
    }

    /// Route one native event and return the signals it produced.
    pub fn dispatch(&mut self, event: &NativeEvent) -> Vec<TrackerEvent> {
        if event.is_raw() {
            self.content.handle_raw_event(&self.tracker, event);
            return Vec::new();
        }

        let signals = self.tracker.handle_native_event(event);
        for signal in &signals {
            self.content.on_tracker_event(&self.tracker, signal);
            for observer in &mut self.observers {
                observer.on_tracker_event(&self.tracker, signal);
            }
        }
        signals
    }

    pub fn create_content(&mut self, window: WindowId) -> Option<ContentId> {
        self.content.create(&self.tracker, window)
    }

    pub fn destroy_content(&mut self, id: ContentId) {
        self.content.destroy(id);
    }

    /// One resume-queue idle slice; returns whether more work is queued
    pub fn run_idle(&mut self) -> bool {
        self.content.run_idle()
    }

    /// Shell hidden: release every capture resource now
    pub fn suspend(&mut self) {
        self.content.suspend_all();
    }

    pub fn resume(&mut self) {
        self.content.resume_all(&self.tracker);
    }

    pub fn is_suspended(&self) -> bool {
        self.content.is_suspended()
    }

    pub fn set_content_settings(&mut self, settings: ContentConfig) {
        debug!("Applying content settings: {:?}", settings);
        self.content.set_settings(settings);
    }

    /// Drain the resume queue, then tear every content down
    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        self.shut_down = true;
        self.content.shutdown();
        self.observers.clear();
        info!("Core shut down");
    }
}

impl Drop for Core {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::config::ResumePriority;
    use crate::native::NativeWindow;
    use crate::testing::{MockCapture, MockWindowBackend, window_info};

    struct Recorder(Rc<RefCell<Vec<TrackerEvent>>>);

    impl TrackerObserver for Recorder {
        fn on_tracker_event(&mut self, _tracker: &Tracker, event: &TrackerEvent) {
            self.0.borrow_mut().push(event.clone());
        }
    }

    fn core(capture: &Rc<MockCapture>) -> Core {
        let settings = ContentConfig {
            resume_priority: ResumePriority::Immediate,
            ..ContentConfig::default()
        };
        Core::new(Rc::new(MockWindowBackend::new(true)), capture.clone(), settings)
    }

    #[test]
    fn test_observers_see_dispatched_signals() {
        let capture = Rc::new(MockCapture::new());
        let mut core = core(&capture);
        let seen = Rc::new(RefCell::new(Vec::new()));
        core.add_observer(Box::new(Recorder(seen.clone())));

        let signals = core.dispatch(&NativeEvent::WindowOpened(window_info(1)));
        assert_eq!(signals.len(), 1);
        assert_eq!(*seen.borrow(), signals);

        assert!(core.dispatch(&NativeEvent::Mapped(NativeWindow(1))).is_empty());
        assert_eq!(seen.borrow().len(), 1);
    }

    #[test]
    fn test_suspend_resume_round_trip() {
        let capture = Rc::new(MockCapture::new());
        capture.map_window(NativeWindow(1), 100, 100);
        let mut core = core(&capture);
        core.dispatch(&NativeEvent::WindowOpened(window_info(1)));
        let window = core.tracker().lookup_window(NativeWindow(1)).unwrap();
        let id = core.create_content(window).unwrap();
        assert_eq!(capture.live_pixmaps(), 1);

        core.suspend();
        assert!(core.is_suspended());
        assert_eq!(capture.live_pixmaps(), 0);

        core.resume();
        assert!(core.content().content(id).unwrap().has_pixmap());
    }

    #[test]
    fn test_drop_releases_everything() {
        let capture = Rc::new(MockCapture::new());
        capture.map_window(NativeWindow(1), 100, 100);
        capture.map_window(NativeWindow(2), 100, 100);
        {
            let mut core = core(&capture);
            for handle in [1, 2] {
                core.dispatch(&NativeEvent::WindowOpened(window_info(handle)));
                let window = core.tracker().lookup_window(NativeWindow(handle)).unwrap();
                core.create_content(window);
            }
            assert_eq!(capture.live_pixmaps(), 2);
        }
        assert_eq!(capture.live_pixmaps(), 0);
        assert_eq!(capture.live_damages(), 0);
    }
}
