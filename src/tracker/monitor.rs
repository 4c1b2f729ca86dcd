use crate::native::NativeMonitor;
use crate::shared::Geometry;

/// Stable wrapper for one physical output
#[derive(Debug, Clone)]
pub struct TrackedMonitor {
    pub(super) handle: NativeMonitor,
    pub(super) number: u32,
    pub(super) geometry: Geometry,
    pub(super) primary: bool,
}

impl TrackedMonitor {
    pub fn handle(&self) -> NativeMonitor {
        self.handle
    }

    pub fn number(&self) -> u32 {
        self.number
    }

    pub fn geometry(&self) -> Geometry {
        self.geometry
    }

    pub fn is_primary(&self) -> bool {
        self.primary
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        self.geometry.contains(x, y)
    }
}
