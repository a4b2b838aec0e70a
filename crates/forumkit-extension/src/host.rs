//! Shared runtime state for the extension system.

use std::sync::Arc;

use crate::hooks::bus::HookBus;
use crate::loader::ComponentHandle;
use crate::permissions::PermissionManager;
use crate::registry::{MultiOccupancyRegistry, SingleWinnerRegistry};

/// Process-wide singletons shared by every lifecycle manager and context.
///
/// Constructed once at host startup and passed explicitly; nothing in the
/// runtime reaches for ambient globals. The registries outlive any single
/// extension; they are only ever emptied by explicit bulk-removal calls.
#[derive(Debug)]
pub struct ExtensionHost {
    hooks: Arc<HookBus>,
    layouts: Arc<SingleWinnerRegistry<ComponentHandle>>,
    slots: Arc<MultiOccupancyRegistry<ComponentHandle>>,
    permissions: Arc<PermissionManager>,
}

impl ExtensionHost {
    /// Creates the shared runtime state.
    pub fn new() -> Self {
        Self {
            hooks: Arc::new(HookBus::new()),
            layouts: Arc::new(SingleWinnerRegistry::new()),
            slots: Arc::new(MultiOccupancyRegistry::new()),
            permissions: Arc::new(PermissionManager::new()),
        }
    }

    /// The shared hook bus.
    pub fn hooks(&self) -> &Arc<HookBus> {
        &self.hooks
    }

    /// The single-winner layout override registry.
    pub fn layouts(&self) -> &Arc<SingleWinnerRegistry<ComponentHandle>> {
        &self.layouts
    }

    /// The multi-occupancy UI slot registry.
    pub fn slots(&self) -> &Arc<MultiOccupancyRegistry<ComponentHandle>> {
        &self.slots
    }

    /// The permission manager.
    pub fn permissions(&self) -> &Arc<PermissionManager> {
        &self.permissions
    }
}

impl Default for ExtensionHost {
    fn default() -> Self {
        Self::new()
    }
}
