//! Hook bus: priority-ordered action/filter dispatch with error isolation.
//!
//! Actions fan out to every subscriber for side effects; filters thread a
//! value through a transformation pipeline. Callbacks run in ascending
//! priority order, ties preserving registration order. A failing callback
//! is logged and skipped: actions continue with the remaining subscribers,
//! filters carry the previous value forward so the pipeline always yields
//! a value.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, error};

use forumkit_core::AppResult;

/// Value passed through hooks. Hook payloads are owned by the host and
/// opaque to this runtime.
pub type HookValue = serde_json::Value;

/// Callback signature for actions: side effects only, no return value.
pub type ActionCallback = Arc<dyn Fn(&[HookValue]) -> AppResult<()> + Send + Sync>;

/// Callback signature for filters: receives the current pipeline value plus
/// the extra dispatch arguments, returns the transformed value.
pub type FilterCallback = Arc<dyn Fn(HookValue, &[HookValue]) -> AppResult<HookValue> + Send + Sync>;

/// Default registration priority, matching the host convention.
pub const DEFAULT_PRIORITY: i32 = 10;

/// Which of the two hook namespaces a registration lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookKind {
    /// Fire-and-forget side-effect hooks.
    Action,
    /// Value-transforming pipeline hooks.
    Filter,
}

struct HookEntry<C> {
    callback: C,
    priority: i32,
}

impl<C: Clone> Clone for HookEntry<C> {
    fn clone(&self) -> Self {
        Self {
            callback: self.callback.clone(),
            priority: self.priority,
        }
    }
}

/// Names of hooks with at least one registration, per namespace.
#[derive(Debug, Clone, Default)]
pub struct RegisteredHooks {
    /// Action hook names.
    pub actions: Vec<String>,
    /// Filter hook names.
    pub filters: Vec<String>,
}

/// The shared hook bus. One instance lives for the whole process; it has no
/// notion of which extension owns a registration; ownership bookkeeping
/// belongs to [`crate::context::ExtensionContext`].
pub struct HookBus {
    actions: RwLock<HashMap<String, Vec<HookEntry<ActionCallback>>>>,
    filters: RwLock<HashMap<String, Vec<HookEntry<FilterCallback>>>>,
}

impl std::fmt::Debug for HookBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HookBus").finish_non_exhaustive()
    }
}

impl HookBus {
    /// Creates a new empty hook bus.
    pub fn new() -> Self {
        Self {
            actions: RwLock::new(HashMap::new()),
            filters: RwLock::new(HashMap::new()),
        }
    }

    /// Registers an action callback.
    ///
    /// No uniqueness constraint: the same callback added twice runs twice.
    pub async fn add_action(&self, name: &str, callback: ActionCallback, priority: i32) {
        let mut actions = self.actions.write().await;
        let entries = actions.entry(name.to_string()).or_default();
        entries.push(HookEntry { callback, priority });
        // sort_by_key is stable: equal priorities keep registration order
        entries.sort_by_key(|e| e.priority);
    }

    /// Registers a filter callback.
    pub async fn add_filter(&self, name: &str, callback: FilterCallback, priority: i32) {
        let mut filters = self.filters.write().await;
        let entries = filters.entry(name.to_string()).or_default();
        entries.push(HookEntry { callback, priority });
        entries.sort_by_key(|e| e.priority);
    }

    /// Invokes every registered action callback for `name` in priority order.
    ///
    /// Callback failures are logged and the remaining callbacks still run;
    /// no error ever escapes to the dispatching caller.
    pub async fn do_action(&self, name: &str, args: &[HookValue]) {
        // Snapshot under the read lock, then dispatch lock-free so that
        // registrations made while we iterate cannot affect this pass.
        let snapshot: Vec<HookEntry<ActionCallback>> = {
            let actions = self.actions.read().await;
            match actions.get(name) {
                Some(entries) => entries.to_vec(),
                None => return,
            }
        };

        debug!(hook = %name, callbacks = snapshot.len(), "Dispatching action");

        for entry in &snapshot {
            if let Err(e) = (entry.callback)(args) {
                error!(hook = %name, error = %e, "Action callback failed");
            }
        }
    }

    /// Threads `value` through every registered filter for `name` in
    /// priority order and returns the accumulated result.
    ///
    /// A failing filter is skipped and the previous value carries forward
    /// unchanged, so a failed transform never poisons the pipeline.
    pub async fn apply_filters(&self, name: &str, value: HookValue, args: &[HookValue]) -> HookValue {
        let snapshot: Vec<HookEntry<FilterCallback>> = {
            let filters = self.filters.read().await;
            match filters.get(name) {
                Some(entries) => entries.to_vec(),
                None => return value,
            }
        };

        debug!(hook = %name, callbacks = snapshot.len(), "Applying filters");

        let mut result = value;
        for entry in &snapshot {
            match (entry.callback)(result.clone(), args) {
                Ok(next) => result = next,
                Err(e) => {
                    error!(hook = %name, error = %e, "Filter callback failed, carrying previous value");
                }
            }
        }
        result
    }

    /// Removes the first action registration whose callback is the same
    /// allocation as `callback`. No-op if not found.
    pub async fn remove_action(&self, name: &str, callback: &ActionCallback) {
        let mut actions = self.actions.write().await;
        if let Some(entries) = actions.get_mut(name) {
            if let Some(pos) = entries
                .iter()
                .position(|e| Arc::ptr_eq(&e.callback, callback))
            {
                entries.remove(pos);
            }
            if entries.is_empty() {
                actions.remove(name);
            }
        }
    }

    /// Removes the first filter registration whose callback is the same
    /// allocation as `callback`. No-op if not found.
    pub async fn remove_filter(&self, name: &str, callback: &FilterCallback) {
        let mut filters = self.filters.write().await;
        if let Some(entries) = filters.get_mut(name) {
            if let Some(pos) = entries
                .iter()
                .position(|e| Arc::ptr_eq(&e.callback, callback))
            {
                entries.remove(pos);
            }
            if entries.is_empty() {
                filters.remove(name);
            }
        }
    }

    /// Returns all hook names with at least one registration, for diagnostics.
    pub async fn registered_hooks(&self) -> RegisteredHooks {
        let actions = self.actions.read().await;
        let filters = self.filters.read().await;
        RegisteredHooks {
            actions: actions.keys().cloned().collect(),
            filters: filters.keys().cloned().collect(),
        }
    }

    /// Returns the number of registrations for a hook name, 0 if none.
    pub async fn hook_count(&self, name: &str, kind: HookKind) -> usize {
        match kind {
            HookKind::Action => {
                let actions = self.actions.read().await;
                actions.get(name).map(|e| e.len()).unwrap_or(0)
            }
            HookKind::Filter => {
                let filters = self.filters.read().await;
                filters.get(name).map(|e| e.len()).unwrap_or(0)
            }
        }
    }

    /// Empties both namespaces. Full-process teardown and tests only;
    /// extension deactivation must go through the context ledger instead.
    pub async fn clear_all(&self) {
        self.actions.write().await.clear();
        self.filters.write().await.clear();
    }
}

impl Default for HookBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Wraps a plain closure into an [`ActionCallback`].
pub fn action_fn<F>(f: F) -> ActionCallback
where
    F: Fn(&[HookValue]) -> AppResult<()> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Wraps a plain closure into a [`FilterCallback`].
pub fn filter_fn<F>(f: F) -> FilterCallback
where
    F: Fn(HookValue, &[HookValue]) -> AppResult<HookValue> + Send + Sync + 'static,
{
    Arc::new(f)
}
