use crate::native::NativeWorkspace;

/// Stable wrapper for one virtual desktop
#[derive(Debug, Clone)]
pub struct TrackedWorkspace {
    pub(super) handle: NativeWorkspace,
    pub(super) number: u32,
    pub(super) name: String,
    pub(super) active: bool,
}

impl TrackedWorkspace {
    pub fn handle(&self) -> NativeWorkspace {
        self.handle
    }

    /// Position in the workspace ordering
    pub fn number(&self) -> u32 {
        self.number
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_active(&self) -> bool {
        self.active
    }
}
