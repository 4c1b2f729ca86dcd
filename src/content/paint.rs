//! Paint output of window contents

use serde::{Deserialize, Serialize};

use super::texture::Texture;

/// Rectangle in actor-local coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RectF {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl RectF {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }
}

/// Outline drawn around the content
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutlineStyle {
    /// RGBA, 0.0-1.0
    pub color: [f32; 4],
    /// Line width in pixels; 0 disables the outline
    pub width: f32,
}

impl Default for OutlineStyle {
    fn default() -> Self {
        Self {
            color: [1.0, 1.0, 1.0, 1.0],
            width: 0.0,
        }
    }
}

/// Placement of the icon shown while a window has no live capture
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IconPlacement {
    pub x_fill: bool,
    pub y_fill: bool,
    /// 0.0 = left, 1.0 = right
    pub x_align: f32,
    /// 0.0 = top, 1.0 = bottom
    pub y_align: f32,
    pub x_scale: f32,
    pub y_scale: f32,
}

impl Default for IconPlacement {
    fn default() -> Self {
        Self {
            x_fill: false,
            y_fill: false,
            x_align: 0.5,
            y_align: 0.5,
            x_scale: 1.0,
            y_scale: 1.0,
        }
    }
}

impl IconPlacement {
    /// Destination of an icon of `icon_size` inside `allocation`
    pub fn place(&self, allocation: RectF, icon_size: (u32, u32)) -> RectF {
        let width = if self.x_fill {
            allocation.width
        } else {
            (icon_size.0 as f32 * self.x_scale).min(allocation.width)
        };
        let height = if self.y_fill {
            allocation.height
        } else {
            (icon_size.1 as f32 * self.y_scale).min(allocation.height)
        };

        let x_align = self.x_align.clamp(0.0, 1.0);
        let y_align = self.y_align.clamp(0.0, 1.0);
        RectF {
            x: allocation.x + (allocation.width - width) * x_align,
            y: allocation.y + (allocation.height - height) * y_align,
            width,
            height,
        }
    }
}

/// Drawing operation handed to the rendering framework
#[derive(Debug, Clone, PartialEq)]
pub enum PaintOp {
    Texture {
        texture: Texture,
        rect: RectF,
        /// Pixels must be re-sampled from the source
        resample: bool,
    },
    Outline {
        rect: RectF,
        color: [f32; 4],
        width: f32,
    },
}
