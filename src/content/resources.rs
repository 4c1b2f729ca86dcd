//! Native capture resources
//!
//! Each handle is owned by a guard that returns it to the display when
//! dropped, so a failed acquisition or an early destroy cannot leak it.

use std::rc::Rc;

use tracing::trace;

use crate::native::{CaptureBackend, CaptureError, NativeDamage, NativePixmap, NativeWindow};
use crate::shared::{Geometry, Image};

pub struct PixmapGuard {
    backend: Rc<dyn CaptureBackend>,
    pixmap: NativePixmap,
}

impl PixmapGuard {
    pub fn handle(&self) -> NativePixmap {
        self.pixmap
    }
}

impl Drop for PixmapGuard {
    fn drop(&mut self) {
        trace!("Freeing pixmap {}", self.pixmap);
        self.backend.free_pixmap(self.pixmap);
    }
}

pub struct DamageGuard {
    backend: Rc<dyn CaptureBackend>,
    damage: NativeDamage,
}

impl DamageGuard {
    pub fn handle(&self) -> NativeDamage {
        self.damage
    }
}

impl Drop for DamageGuard {
    fn drop(&mut self) {
        trace!("Destroying damage {}", self.damage);
        self.backend.destroy_damage(self.damage);
    }
}

/// Resources held while a content shows live pixels
pub struct LiveCapture {
    // Field order is drop order: damage goes before the pixmap it watches.
    damage: Option<DamageGuard>,
    pixmap: PixmapGuard,
    width: u32,
    height: u32,
}

impl LiveCapture {
    /// Name the window's backing pixmap and, when available, bind a damage
    /// object to the window. Anything acquired before a failure is released.
    pub fn acquire(
        backend: &Rc<dyn CaptureBackend>,
        target: NativeWindow,
        with_damage: bool,
    ) -> Result<Self, CaptureError> {
        let pixmap = PixmapGuard {
            backend: backend.clone(),
            pixmap: backend.name_window_pixmap(target)?,
        };

        let (width, height) = backend.pixmap_size(pixmap.handle())?;
        if width == 0 || height == 0 {
            return Err(CaptureError::NotViewable(target));
        }

        let damage = if with_damage {
            Some(DamageGuard {
                backend: backend.clone(),
                damage: backend.create_damage(target)?,
            })
        } else {
            None
        };

        Ok(Self {
            damage,
            pixmap,
            width,
            height,
        })
    }

    pub fn pixmap(&self) -> NativePixmap {
        self.pixmap.handle()
    }

    pub fn damage(&self) -> Option<NativeDamage> {
        self.damage.as_ref().map(DamageGuard::handle)
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Copy the current frame into an image that outlives these resources
    pub fn snapshot(&self, backend: &dyn CaptureBackend) -> Result<Image, CaptureError> {
        backend.read_pixels(
            self.pixmap.handle(),
            Geometry::new(0, 0, self.width, self.height),
        )
    }

    /// Release damage then pixmap
    pub fn release(self) {
        drop(self);
    }
}
