//! Per-extension isolated execution contexts.
//!
//! A context is built fresh at every activation and discarded at
//! deactivation; it is never reused. It fronts the shared hook bus and
//! registries but records every registration in a private ledger, so the
//! lifecycle manager can surgically undo exactly what this one extension
//! did. The shared bus itself has no notion of ownership.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::{Mutex, RwLock};
use tracing::{error, info, warn};

use crate::hooks::bus::{ActionCallback, FilterCallback, HookBus, HookValue};
use crate::host::ExtensionHost;
use crate::loader::ComponentHandle;
use crate::manifest::{ExtensionManifestInfo, Permission};
use crate::permissions::{PermissionChecker, PermissionManager};
use crate::registry::{MultiOccupancyRegistry, SingleWinnerRegistry, SourceRank};
use forumkit_core::AppResult;

/// Host callback invoked when an extension changes one of its settings,
/// so the host can persist the new value. Arguments: extension id, key,
/// new value.
pub type SettingsChangeCallback = Arc<dyn Fn(&str, &str, &Value) + Send + Sync>;

/// One recorded registration, replayed in reverse at deactivation.
enum LedgerEntry {
    Action { name: String, callback: ActionCallback },
    Filter { name: String, callback: FilterCallback },
    Slot { name: String },
    Layout { id: String },
}

type Ledger = Arc<Mutex<Vec<LedgerEntry>>>;

/// The isolated facade handed to an extension's `activate`.
pub struct ExtensionContext {
    extension_id: String,
    extension_version: String,
    /// Scoped hook registration; everything registered here is ledgered.
    pub hooks: HookProxy,
    /// Scoped settings: manifest defaults overlaid with overrides.
    pub settings: SettingsStore,
    /// Permission checks scoped to this extension's id.
    pub permissions: PermissionHandle,
    /// Scoped UI slot and layout registration.
    pub ui: UiHandle,
    /// Logger prefixed with this extension's id.
    pub logger: ExtensionLogger,
    ledger: Ledger,
}

impl std::fmt::Debug for ExtensionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtensionContext")
            .field("extension_id", &self.extension_id)
            .field("extension_version", &self.extension_version)
            .finish_non_exhaustive()
    }
}

impl ExtensionContext {
    /// Builds a context for one activation.
    ///
    /// Fails fast on a malformed manifest: no half-constructed context is
    /// ever exposed to extension code.
    pub fn build(
        host: &ExtensionHost,
        manifest: &ExtensionManifestInfo,
        source: SourceRank,
        initial_settings: HashMap<String, Value>,
        on_settings_change: Option<SettingsChangeCallback>,
    ) -> AppResult<Arc<Self>> {
        manifest.validate()?;

        let extension_id = manifest.id.clone();
        let ledger: Ledger = Arc::new(Mutex::new(Vec::new()));

        Ok(Arc::new(Self {
            hooks: HookProxy {
                bus: host.hooks().clone(),
                permissions: host.permissions().clone(),
                extension_id: extension_id.clone(),
                ledger: ledger.clone(),
            },
            settings: SettingsStore {
                extension_id: extension_id.clone(),
                defaults: manifest.default_settings(),
                overrides: RwLock::new(initial_settings),
                on_change: on_settings_change,
            },
            permissions: PermissionHandle {
                checker: host.permissions().clone(),
                extension_id: extension_id.clone(),
            },
            ui: UiHandle {
                slots: host.slots().clone(),
                layouts: host.layouts().clone(),
                extension_id: extension_id.clone(),
                source,
                ledger: ledger.clone(),
            },
            logger: ExtensionLogger {
                extension_id: extension_id.clone(),
            },
            extension_id,
            extension_version: manifest.version.clone(),
            ledger,
        }))
    }

    /// Id of the extension this context belongs to.
    pub fn extension_id(&self) -> &str {
        &self.extension_id
    }

    /// Version of the extension this context belongs to.
    pub fn extension_version(&self) -> &str {
        &self.extension_version
    }

    /// Replays the ledger against the shared bus and registries, removing
    /// exactly what this context registered, then clears the ledger.
    ///
    /// Invoked by the lifecycle manager at deactivation and after a failed
    /// activation; never by extension code.
    pub(crate) async fn revoke_all(&self) {
        let entries: Vec<LedgerEntry> = {
            let mut ledger = self.ledger.lock().await;
            ledger.drain(..).collect()
        };

        for entry in &entries {
            match entry {
                LedgerEntry::Action { name, callback } => {
                    self.hooks.bus.remove_action(name, callback).await;
                }
                LedgerEntry::Filter { name, callback } => {
                    self.hooks.bus.remove_filter(name, callback).await;
                }
                LedgerEntry::Slot { name } => {
                    self.ui.slots.remove(name, &self.extension_id).await;
                }
                LedgerEntry::Layout { id } => {
                    self.ui.layouts.remove(id, self.ui.source).await;
                }
            }
        }
    }
}

/// Hook facade bound to one extension.
///
/// Registrations are forwarded to the shared [`HookBus`] so dispatch works,
/// and recorded locally so they can be mass-removed later.
pub struct HookProxy {
    bus: Arc<HookBus>,
    permissions: Arc<PermissionManager>,
    extension_id: String,
    ledger: Ledger,
}

impl HookProxy {
    /// Registers an action on the shared bus.
    ///
    /// Silently skipped (with a warning) when the hook requires a
    /// permission this extension does not hold.
    pub async fn add_action(&self, name: &str, callback: ActionCallback, priority: i32) {
        if !self.permissions.check_hook(&self.extension_id, name).await {
            return;
        }
        self.bus.add_action(name, callback.clone(), priority).await;
        self.ledger.lock().await.push(LedgerEntry::Action {
            name: name.to_string(),
            callback,
        });
    }

    /// Registers a filter on the shared bus, subject to the same permission
    /// gating as actions.
    pub async fn add_filter(&self, name: &str, callback: FilterCallback, priority: i32) {
        if !self.permissions.check_hook(&self.extension_id, name).await {
            return;
        }
        self.bus.add_filter(name, callback.clone(), priority).await;
        self.ledger.lock().await.push(LedgerEntry::Filter {
            name: name.to_string(),
            callback,
        });
    }

    /// Removes a previously registered action and its ledger record.
    pub async fn remove_action(&self, name: &str, callback: &ActionCallback) {
        self.bus.remove_action(name, callback).await;
        let mut ledger = self.ledger.lock().await;
        if let Some(pos) = ledger.iter().position(|e| {
            matches!(e, LedgerEntry::Action { name: n, callback: c }
                if n == name && Arc::ptr_eq(c, callback))
        }) {
            ledger.remove(pos);
        }
    }

    /// Removes a previously registered filter and its ledger record.
    pub async fn remove_filter(&self, name: &str, callback: &FilterCallback) {
        self.bus.remove_filter(name, callback).await;
        let mut ledger = self.ledger.lock().await;
        if let Some(pos) = ledger.iter().position(|e| {
            matches!(e, LedgerEntry::Filter { name: n, callback: c }
                if n == name && Arc::ptr_eq(c, callback))
        }) {
            ledger.remove(pos);
        }
    }

    /// Dispatches an action on the shared bus.
    pub async fn do_action(&self, name: &str, args: &[HookValue]) {
        self.bus.do_action(name, args).await;
    }

    /// Applies filters on the shared bus.
    pub async fn apply_filters(&self, name: &str, value: HookValue, args: &[HookValue]) -> HookValue {
        self.bus.apply_filters(name, value, args).await
    }
}

/// Settings snapshot scoped to one activation.
///
/// Reads fall back from the override map to the manifest-declared default.
/// Writes never touch the manifest; they go to the override map and notify
/// the host persistence callback when one is installed.
pub struct SettingsStore {
    extension_id: String,
    defaults: HashMap<String, Value>,
    overrides: RwLock<HashMap<String, Value>>,
    on_change: Option<SettingsChangeCallback>,
}

impl SettingsStore {
    /// Returns the override for `key` if set, else the manifest default.
    pub async fn get(&self, key: &str) -> Option<Value> {
        let overrides = self.overrides.read().await;
        overrides
            .get(key)
            .cloned()
            .or_else(|| self.defaults.get(key).cloned())
    }

    /// Stores an override and notifies the host persistence callback.
    pub async fn set(&self, key: &str, value: Value) {
        {
            let mut overrides = self.overrides.write().await;
            overrides.insert(key.to_string(), value.clone());
        }
        if let Some(on_change) = &self.on_change {
            on_change(&self.extension_id, key, &value);
        }
    }

    /// Returns the merged view: every declared default overlaid with
    /// overrides, plus override keys not declared in the manifest.
    pub async fn get_all(&self) -> HashMap<String, Value> {
        let overrides = self.overrides.read().await;
        let mut merged = self.defaults.clone();
        for (key, value) in overrides.iter() {
            merged.insert(key.clone(), value.clone());
        }
        merged
    }
}

/// Permission checks scoped to one extension.
pub struct PermissionHandle {
    checker: Arc<PermissionManager>,
    extension_id: String,
}

impl PermissionHandle {
    /// Returns whether this extension holds `permission`. A `false` result
    /// is the normal "denied" outcome; callers branch, nothing throws.
    pub async fn check(&self, permission: Permission) -> bool {
        self.checker.check(&self.extension_id, permission).await
    }

    /// Returns every permission granted to this extension.
    pub async fn granted(&self) -> Vec<Permission> {
        PermissionChecker::granted(self.checker.as_ref(), &self.extension_id).await
    }
}

/// UI contribution facade bound to one extension.
pub struct UiHandle {
    slots: Arc<MultiOccupancyRegistry<ComponentHandle>>,
    layouts: Arc<SingleWinnerRegistry<ComponentHandle>>,
    extension_id: String,
    source: SourceRank,
    ledger: Ledger,
}

impl UiHandle {
    /// Registers a component into a named slot, tagged with this
    /// extension's id and recorded for deactivation cleanup.
    pub async fn register_slot(&self, slot: &str, component: ComponentHandle, priority: i32) {
        self.slots
            .register(slot, &self.extension_id, component, priority)
            .await;
        self.ledger.lock().await.push(LedgerEntry::Slot {
            name: slot.to_string(),
        });
        info!(extension_id = %self.extension_id, slot = %slot, priority, "UI slot registered");
    }

    /// Removes this extension's components from a slot.
    pub async fn remove_slot(&self, slot: &str) {
        self.slots.remove(slot, &self.extension_id).await;
        let mut ledger = self.ledger.lock().await;
        ledger.retain(|e| !matches!(e, LedgerEntry::Slot { name } if name == slot));
    }

    /// Registers a layout override under this extension's source rank.
    ///
    /// Duplicate `(id, source)` registrations are idempotent no-ops and are
    /// not ledgered, so deactivating this extension cannot remove a layout
    /// another extension registered first.
    pub async fn register_layout(&self, id: &str, component: ComponentHandle) {
        let inserted = self.layouts.register(id, self.source, component).await;
        if inserted {
            self.ledger.lock().await.push(LedgerEntry::Layout {
                id: id.to_string(),
            });
        }
    }
}

/// Structured logger bound to one extension id.
pub struct ExtensionLogger {
    extension_id: String,
}

impl ExtensionLogger {
    /// Logs at info level.
    pub fn info(&self, message: &str) {
        info!(extension_id = %self.extension_id, "{message}");
    }

    /// Logs at warn level.
    pub fn warn(&self, message: &str) {
        warn!(extension_id = %self.extension_id, "{message}");
    }

    /// Logs at error level.
    pub fn error(&self, message: &str) {
        error!(extension_id = %self.extension_id, "{message}");
    }
}
