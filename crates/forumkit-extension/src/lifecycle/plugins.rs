//! Plugin lifecycle manager.

use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};

use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::context::{ExtensionContext, SettingsChangeCallback};
use crate::extension::Extension;
use crate::hooks::names;
use crate::host::ExtensionHost;
use crate::lifecycle::register_manifest_components;
use crate::loader::ComponentLoader;
use crate::manifest::{ExtensionKind, ExtensionManifestInfo};
use crate::registry::SourceRank;
use forumkit_core::{AppError, AppResult};

struct InstalledPlugin {
    manifest: ExtensionManifestInfo,
    extension: Arc<dyn Extension>,
}

struct ActivePlugin {
    context: Arc<ExtensionContext>,
    extension: Arc<dyn Extension>,
    activated_at: DateTime<Utc>,
}

/// Manages the install and activation lifecycle of plugins.
///
/// Any number of plugins may be active at once. Activation is transactional:
/// if any step fails, the plugin's context ledger is replayed and its
/// permission grants revoked, leaving the shared registries exactly as they
/// were before the attempt.
pub struct PluginManager {
    host: Arc<ExtensionHost>,
    loader: Option<Arc<dyn ComponentLoader>>,
    installed: RwLock<HashMap<String, InstalledPlugin>>,
    active: RwLock<HashMap<String, ActivePlugin>>,
    // Persisted setting overrides, keyed by plugin id. Written from the
    // synchronous settings-change callback, hence the std mutex.
    saved_settings: Arc<StdMutex<HashMap<String, HashMap<String, Value>>>>,
}

impl PluginManager {
    /// Creates a manager with no component loader. Plugins whose manifests
    /// declare components will fail to activate until one is configured.
    pub fn new(host: Arc<ExtensionHost>) -> Self {
        Self {
            host,
            loader: None,
            installed: RwLock::new(HashMap::new()),
            active: RwLock::new(HashMap::new()),
            saved_settings: Arc::new(StdMutex::new(HashMap::new())),
        }
    }

    /// Sets the loader used to resolve manifest-declared components.
    pub fn with_loader(mut self, loader: Arc<dyn ComponentLoader>) -> Self {
        self.loader = Some(loader);
        self
    }

    /// Installs a plugin without activating it.
    ///
    /// Fails on a malformed manifest, a manifest of the wrong kind, or an
    /// id collision with an already-installed plugin.
    pub async fn install(
        &self,
        manifest: ExtensionManifestInfo,
        extension: Arc<dyn Extension>,
    ) -> AppResult<()> {
        manifest.validate()?;
        if manifest.kind != ExtensionKind::Plugin {
            return Err(AppError::validation(format!(
                "Extension '{}' is not a plugin",
                manifest.id
            )));
        }

        let mut installed = self.installed.write().await;
        if installed.contains_key(&manifest.id) {
            return Err(AppError::conflict(format!(
                "Plugin '{}' is already installed",
                manifest.id
            )));
        }

        info!(extension_id = %manifest.id, version = %manifest.version, "Plugin installed");
        installed.insert(manifest.id.clone(), InstalledPlugin { manifest, extension });
        Ok(())
    }

    /// Uninstalls a plugin, deactivating it first if needed.
    pub async fn uninstall(&self, id: &str) -> AppResult<()> {
        self.deactivate(id).await?;

        let mut installed = self.installed.write().await;
        if installed.remove(id).is_none() {
            return Err(AppError::not_found(format!("Plugin '{id}' is not installed")));
        }
        if let Ok(mut saved) = self.saved_settings.lock() {
            saved.remove(id);
        }
        info!(extension_id = %id, "Plugin uninstalled");
        Ok(())
    }

    /// Activates an installed plugin. Idempotent: activating an
    /// already-active plugin is a no-op.
    pub async fn activate(&self, id: &str) -> AppResult<()> {
        if self.active.read().await.contains_key(id) {
            debug!(extension_id = %id, "Plugin already active");
            return Ok(());
        }

        let (manifest, extension) = {
            let installed = self.installed.read().await;
            let plugin = installed
                .get(id)
                .ok_or_else(|| AppError::not_found(format!("Plugin '{id}' is not installed")))?;
            (plugin.manifest.clone(), plugin.extension.clone())
        };

        self.host
            .permissions()
            .grant(id, &manifest.permissions)
            .await;

        let context = match self.build_context(&manifest) {
            Ok(context) => context,
            Err(e) => {
                self.host.permissions().revoke(id).await;
                return Err(e);
            }
        };

        if let Err(e) = self.run_activation(&context, &manifest, extension.clone()).await {
            context.revoke_all().await;
            self.host.permissions().revoke(id).await;
            return Err(AppError::activation(format!(
                "Failed to activate plugin '{id}': {e}"
            )));
        }

        self.active.write().await.insert(
            id.to_string(),
            ActivePlugin {
                context,
                extension,
                activated_at: Utc::now(),
            },
        );

        info!(extension_id = %id, "Plugin activated");
        self.host
            .hooks()
            .do_action(names::PLUGIN_ACTIVATED, &[json!(id)])
            .await;
        Ok(())
    }

    /// Deactivates an active plugin, replaying its context ledger so every
    /// hook, slot, and layout it registered is removed. Idempotent.
    pub async fn deactivate(&self, id: &str) -> AppResult<()> {
        let Some(plugin) = self.active.write().await.remove(id) else {
            return Ok(());
        };

        if let Err(e) = plugin.extension.deactivate().await {
            warn!(extension_id = %id, error = %e, "Plugin deactivate callback failed");
        }

        plugin.context.revoke_all().await;
        self.host.permissions().revoke(id).await;

        info!(extension_id = %id, "Plugin deactivated");
        self.host
            .hooks()
            .do_action(names::PLUGIN_DEACTIVATED, &[json!(id)])
            .await;
        Ok(())
    }

    /// Deactivates every active plugin.
    pub async fn deactivate_all(&self) -> AppResult<()> {
        let ids: Vec<String> = self.active.read().await.keys().cloned().collect();
        for id in ids {
            self.deactivate(&id).await?;
        }
        Ok(())
    }

    /// Returns whether the plugin is currently active.
    pub async fn is_active(&self, id: &str) -> bool {
        self.active.read().await.contains_key(id)
    }

    /// Ids of all active plugins, in activation order.
    pub async fn active_ids(&self) -> Vec<String> {
        let active = self.active.read().await;
        let mut entries: Vec<(&String, DateTime<Utc>)> = active
            .iter()
            .map(|(id, plugin)| (id, plugin.activated_at))
            .collect();
        entries.sort_by_key(|(_, activated_at)| *activated_at);
        entries.into_iter().map(|(id, _)| id.clone()).collect()
    }

    /// Ids of all installed plugins.
    pub async fn installed_ids(&self) -> Vec<String> {
        self.installed.read().await.keys().cloned().collect()
    }

    /// Returns the manifest of an installed plugin.
    pub async fn manifest(&self, id: &str) -> Option<ExtensionManifestInfo> {
        let installed = self.installed.read().await;
        installed.get(id).map(|p| p.manifest.clone())
    }

    /// Updates one setting of an installed plugin.
    ///
    /// When the plugin is active the write goes through its live settings
    /// store so the plugin observes the new value immediately; otherwise
    /// only the persisted overrides are updated.
    pub async fn update_setting(&self, id: &str, key: &str, value: Value) -> AppResult<()> {
        if !self.installed.read().await.contains_key(id) {
            return Err(AppError::not_found(format!("Plugin '{id}' is not installed")));
        }

        let active = self.active.read().await;
        match active.get(id) {
            Some(plugin) => plugin.context.settings.set(key, value).await,
            None => {
                if let Ok(mut saved) = self.saved_settings.lock() {
                    saved
                        .entry(id.to_string())
                        .or_default()
                        .insert(key.to_string(), value);
                }
            }
        }
        Ok(())
    }

    fn build_context(&self, manifest: &ExtensionManifestInfo) -> AppResult<Arc<ExtensionContext>> {
        let initial = self
            .saved_settings
            .lock()
            .ok()
            .and_then(|saved| saved.get(&manifest.id).cloned())
            .unwrap_or_default();

        let sink = self.saved_settings.clone();
        let on_change: SettingsChangeCallback = Arc::new(move |id, key, value| {
            if let Ok(mut saved) = sink.lock() {
                saved
                    .entry(id.to_string())
                    .or_default()
                    .insert(key.to_string(), value.clone());
            }
        });

        ExtensionContext::build(
            &self.host,
            manifest,
            SourceRank::Plugin,
            initial,
            Some(on_change),
        )
    }

    async fn run_activation(
        &self,
        context: &Arc<ExtensionContext>,
        manifest: &ExtensionManifestInfo,
        extension: Arc<dyn Extension>,
    ) -> AppResult<()> {
        register_manifest_components(context, manifest, self.loader.as_ref()).await;
        extension.activate(context.clone()).await
    }
}

impl std::fmt::Debug for PluginManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginManager").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::bus::{action_fn, HookKind, DEFAULT_PRIORITY};
    use crate::loader::ComponentHandle;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn manifest(id: &str) -> ExtensionManifestInfo {
        ExtensionManifestInfo {
            id: id.to_string(),
            name: "Test Plugin".to_string(),
            version: "1.0.0".to_string(),
            description: None,
            kind: ExtensionKind::Plugin,
            permissions: Vec::new(),
            settings: HashMap::new(),
            components: Vec::new(),
        }
    }

    /// Registers one action and one slot component at activation.
    #[derive(Debug, Default)]
    struct RecordingPlugin {
        activations: AtomicUsize,
        deactivations: AtomicUsize,
    }

    #[async_trait]
    impl Extension for RecordingPlugin {
        async fn activate(&self, context: Arc<ExtensionContext>) -> AppResult<()> {
            self.activations.fetch_add(1, Ordering::SeqCst);
            context
                .hooks
                .add_action("before_page_render", action_fn(|_| Ok(())), DEFAULT_PRIORITY)
                .await;
            context
                .ui
                .register_slot("sidebar", Arc::new("widget") as ComponentHandle, 10)
                .await;
            Ok(())
        }

        async fn deactivate(&self) -> AppResult<()> {
            self.deactivations.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[derive(Debug)]
    struct FailingPlugin;

    #[async_trait]
    impl Extension for FailingPlugin {
        async fn activate(&self, context: Arc<ExtensionContext>) -> AppResult<()> {
            // Registers first, then fails: the registration must be rolled back.
            context
                .hooks
                .add_action("before_page_render", action_fn(|_| Ok(())), DEFAULT_PRIORITY)
                .await;
            Err(AppError::internal("boom"))
        }

        async fn deactivate(&self) -> AppResult<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_install_activate_deactivate() {
        let host = Arc::new(ExtensionHost::new());
        let manager = PluginManager::new(host.clone());
        let plugin = Arc::new(RecordingPlugin::default());

        manager.install(manifest("plugin-a"), plugin.clone()).await.unwrap();
        assert!(!manager.is_active("plugin-a").await);

        manager.activate("plugin-a").await.unwrap();
        assert!(manager.is_active("plugin-a").await);
        assert_eq!(plugin.activations.load(Ordering::SeqCst), 1);
        assert_eq!(
            host.hooks().hook_count("before_page_render", HookKind::Action).await,
            1
        );
        assert_eq!(host.slots().count("sidebar").await, 1);

        manager.deactivate("plugin-a").await.unwrap();
        assert!(!manager.is_active("plugin-a").await);
        assert_eq!(plugin.deactivations.load(Ordering::SeqCst), 1);
        assert_eq!(
            host.hooks().hook_count("before_page_render", HookKind::Action).await,
            0
        );
        assert_eq!(host.slots().count("sidebar").await, 0);
    }

    #[tokio::test]
    async fn test_activation_is_idempotent() {
        let host = Arc::new(ExtensionHost::new());
        let manager = PluginManager::new(host);
        let plugin = Arc::new(RecordingPlugin::default());

        manager.install(manifest("plugin-a"), plugin.clone()).await.unwrap();
        manager.activate("plugin-a").await.unwrap();
        manager.activate("plugin-a").await.unwrap();

        assert_eq!(plugin.activations.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_duplicate_install_conflicts() {
        let host = Arc::new(ExtensionHost::new());
        let manager = PluginManager::new(host);

        manager
            .install(manifest("plugin-a"), Arc::new(RecordingPlugin::default()))
            .await
            .unwrap();
        let err = manager
            .install(manifest("plugin-a"), Arc::new(RecordingPlugin::default()))
            .await
            .unwrap_err();
        assert!(err.message.contains("already installed"));
    }

    #[tokio::test]
    async fn test_activate_unknown_plugin_fails() {
        let host = Arc::new(ExtensionHost::new());
        let manager = PluginManager::new(host);
        assert!(manager.activate("ghost").await.is_err());
    }

    #[tokio::test]
    async fn test_failed_activation_rolls_back() {
        let host = Arc::new(ExtensionHost::new());
        let manager = PluginManager::new(host.clone());

        manager
            .install(manifest("bad-plugin"), Arc::new(FailingPlugin))
            .await
            .unwrap();
        assert!(manager.activate("bad-plugin").await.is_err());

        assert!(!manager.is_active("bad-plugin").await);
        assert_eq!(
            host.hooks().hook_count("before_page_render", HookKind::Action).await,
            0
        );
        assert!(
            crate::permissions::PermissionChecker::granted(
                host.permissions().as_ref(),
                "bad-plugin"
            )
            .await
            .is_empty()
        );
    }

    #[tokio::test]
    async fn test_many_plugins_active_simultaneously() {
        let host = Arc::new(ExtensionHost::new());
        let manager = PluginManager::new(host.clone());

        for id in ["plugin-a", "plugin-b", "plugin-c"] {
            manager
                .install(manifest(id), Arc::new(RecordingPlugin::default()))
                .await
                .unwrap();
            manager.activate(id).await.unwrap();
        }

        let mut ids = manager.active_ids().await;
        ids.sort();
        assert_eq!(ids, vec!["plugin-a", "plugin-b", "plugin-c"]);
        assert_eq!(host.slots().count("sidebar").await, 3);

        // Deactivating one leaves the others' registrations intact.
        manager.deactivate("plugin-b").await.unwrap();
        assert_eq!(host.slots().count("sidebar").await, 2);
    }

    #[tokio::test]
    async fn test_settings_persist_across_reactivation() {
        let host = Arc::new(ExtensionHost::new());
        let manager = PluginManager::new(host);
        let plugin = Arc::new(RecordingPlugin::default());

        manager.install(manifest("plugin-a"), plugin).await.unwrap();
        manager.activate("plugin-a").await.unwrap();
        manager
            .update_setting("plugin-a", "color", json!("red"))
            .await
            .unwrap();
        manager.deactivate("plugin-a").await.unwrap();
        manager.activate("plugin-a").await.unwrap();

        let active = manager.active.read().await;
        let context = &active.get("plugin-a").unwrap().context;
        assert_eq!(context.settings.get("color").await, Some(json!("red")));
    }

    #[tokio::test]
    async fn test_update_setting_while_inactive() {
        let host = Arc::new(ExtensionHost::new());
        let manager = PluginManager::new(host);

        manager
            .install(manifest("plugin-a"), Arc::new(RecordingPlugin::default()))
            .await
            .unwrap();
        manager
            .update_setting("plugin-a", "color", json!("blue"))
            .await
            .unwrap();
        manager.activate("plugin-a").await.unwrap();

        let active = manager.active.read().await;
        let context = &active.get("plugin-a").unwrap().context;
        assert_eq!(context.settings.get("color").await, Some(json!("blue")));
    }

    #[tokio::test]
    async fn test_uninstall_requires_installed() {
        let host = Arc::new(ExtensionHost::new());
        let manager = PluginManager::new(host);
        assert!(manager.uninstall("ghost").await.is_err());
    }

    #[tokio::test]
    async fn test_theme_manifest_rejected() {
        let host = Arc::new(ExtensionHost::new());
        let manager = PluginManager::new(host);

        let mut m = manifest("theme-x");
        m.kind = ExtensionKind::Theme;
        assert!(manager
            .install(m, Arc::new(RecordingPlugin::default()))
            .await
            .is_err());
    }
}
