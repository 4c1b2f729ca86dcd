//! Textures shown by window contents

use std::sync::Arc;

use crate::native::NativePixmap;
use crate::shared::Image;

/// Where a texture's pixels come from
#[derive(Debug, Clone, PartialEq)]
pub enum TextureSource {
    /// Static fallback image (application icon)
    Icon(Arc<Image>),
    /// Redirected window contents, sampled from the named pixmap
    Live(NativePixmap),
    /// Independent copy of a former live frame
    Snapshot(Arc<Image>),
}

/// Renderable texture of a window content
#[derive(Debug, Clone, PartialEq)]
pub struct Texture {
    source: TextureSource,
    width: u32,
    height: u32,
    /// Pixels changed since the last paint and must be re-sampled
    stale: bool,
}

impl Texture {
    pub fn icon(image: Arc<Image>) -> Self {
        Self {
            width: image.width,
            height: image.height,
            source: TextureSource::Icon(image),
            stale: true,
        }
    }

    pub fn live(pixmap: NativePixmap, width: u32, height: u32) -> Self {
        Self {
            source: TextureSource::Live(pixmap),
            width,
            height,
            stale: true,
        }
    }

    pub fn snapshot(image: impl Into<Arc<Image>>) -> Self {
        let image = image.into();
        Self {
            width: image.width,
            height: image.height,
            source: TextureSource::Snapshot(image),
            stale: true,
        }
    }

    pub fn source(&self) -> &TextureSource {
        &self.source
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn is_icon(&self) -> bool {
        matches!(self.source, TextureSource::Icon(_))
    }

    pub fn is_live(&self) -> bool {
        matches!(self.source, TextureSource::Live(_))
    }

    pub fn is_stale(&self) -> bool {
        self.stale
    }

    /// Content changed; re-sample on next paint
    pub fn invalidate(&mut self) {
        self.stale = true;
    }

    pub(super) fn mark_sampled(&mut self) {
        self.stale = false;
    }
}
