//! Multi-occupancy slot registry.
//!
//! Unlike the single-winner layout registry, a UI slot renders *every*
//! registered component simultaneously, in priority order. Entries are
//! tagged with the owning extension id so deactivation can strip exactly
//! one extension's contributions.

use std::collections::HashMap;

use tokio::sync::RwLock;
use tracing::debug;

/// A component registered into a slot.
#[derive(Debug, Clone)]
pub struct SlotEntry<P> {
    /// Id of the extension that registered this component.
    pub extension_id: String,
    /// Render priority (lower renders first).
    pub priority: i32,
    /// The opaque component payload.
    pub payload: P,
}

/// Registry accumulating all registered components per slot name.
#[derive(Debug)]
pub struct MultiOccupancyRegistry<P> {
    slots: RwLock<HashMap<String, Vec<SlotEntry<P>>>>,
}

impl<P: Clone + Send + Sync> MultiOccupancyRegistry<P> {
    /// Creates a new empty registry.
    pub fn new() -> Self {
        Self {
            slots: RwLock::new(HashMap::new()),
        }
    }

    /// Registers a component into `slot` on behalf of `extension_id`.
    pub async fn register(&self, slot: &str, extension_id: &str, payload: P, priority: i32) {
        let mut slots = self.slots.write().await;
        let entries = slots.entry(slot.to_string()).or_default();
        entries.push(SlotEntry {
            extension_id: extension_id.to_string(),
            priority,
            payload,
        });
        // Stable sort keeps same-priority entries in registration order.
        entries.sort_by_key(|e| e.priority);
        debug!(slot = %slot, extension_id = %extension_id, priority, "Slot component registered");
    }

    /// Returns every component registered in `slot`, priority-ordered.
    pub async fn components(&self, slot: &str) -> Vec<SlotEntry<P>> {
        let slots = self.slots.read().await;
        slots.get(slot).cloned().unwrap_or_default()
    }

    /// Removes `extension_id`'s components from a single slot.
    pub async fn remove(&self, slot: &str, extension_id: &str) {
        let mut slots = self.slots.write().await;
        if let Some(entries) = slots.get_mut(slot) {
            entries.retain(|e| e.extension_id != extension_id);
            if entries.is_empty() {
                slots.remove(slot);
            }
        }
    }

    /// Strips `extension_id`'s components from every slot; slots left empty
    /// are removed entirely. Other extensions' entries are untouched.
    pub async fn remove_by_source(&self, extension_id: &str) {
        let mut slots = self.slots.write().await;
        for entries in slots.values_mut() {
            entries.retain(|e| e.extension_id != extension_id);
        }
        slots.retain(|_, entries| !entries.is_empty());
    }

    /// Returns all slot names with at least one component.
    pub async fn slot_names(&self) -> Vec<String> {
        let slots = self.slots.read().await;
        slots.keys().cloned().collect()
    }

    /// Returns the number of components registered in `slot`.
    pub async fn count(&self, slot: &str) -> usize {
        let slots = self.slots.read().await;
        slots.get(slot).map(|e| e.len()).unwrap_or(0)
    }
}

impl<P: Clone + Send + Sync> Default for MultiOccupancyRegistry<P> {
    fn default() -> Self {
        Self::new()
    }
}
