//! Theme lifecycle manager.

use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};

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

struct InstalledTheme {
    manifest: ExtensionManifestInfo,
    extension: Arc<dyn Extension>,
}

struct ActiveTheme {
    id: String,
    context: Arc<ExtensionContext>,
    extension: Arc<dyn Extension>,
}

/// Manages the install and activation lifecycle of themes.
///
/// At most one theme is active: activating a theme deactivates the current
/// one first, so the theme rank of the layout registry never holds two
/// competing candidates for the same id. If the incoming theme fails to
/// activate, its partial registrations are unwound and no theme is left
/// active; the host falls back to core layouts.
pub struct ThemeManager {
    host: Arc<ExtensionHost>,
    loader: Option<Arc<dyn ComponentLoader>>,
    installed: RwLock<HashMap<String, InstalledTheme>>,
    active: RwLock<Option<ActiveTheme>>,
    saved_settings: Arc<StdMutex<HashMap<String, HashMap<String, Value>>>>,
}

impl ThemeManager {
    /// Creates a manager with no component loader.
    pub fn new(host: Arc<ExtensionHost>) -> Self {
        Self {
            host,
            loader: None,
            installed: RwLock::new(HashMap::new()),
            active: RwLock::new(None),
            saved_settings: Arc::new(StdMutex::new(HashMap::new())),
        }
    }

    /// Sets the loader used to resolve manifest-declared components.
    pub fn with_loader(mut self, loader: Arc<dyn ComponentLoader>) -> Self {
        self.loader = Some(loader);
        self
    }

    /// Installs a theme without activating it.
    pub async fn install(
        &self,
        manifest: ExtensionManifestInfo,
        extension: Arc<dyn Extension>,
    ) -> AppResult<()> {
        manifest.validate()?;
        if manifest.kind != ExtensionKind::Theme {
            return Err(AppError::validation(format!(
                "Extension '{}' is not a theme",
                manifest.id
            )));
        }

        let mut installed = self.installed.write().await;
        if installed.contains_key(&manifest.id) {
            return Err(AppError::conflict(format!(
                "Theme '{}' is already installed",
                manifest.id
            )));
        }

        info!(extension_id = %manifest.id, version = %manifest.version, "Theme installed");
        installed.insert(manifest.id.clone(), InstalledTheme { manifest, extension });
        Ok(())
    }

    /// Uninstalls a theme, deactivating it first if it is the active one.
    pub async fn uninstall(&self, id: &str) -> AppResult<()> {
        if self.active_theme().await.as_deref() == Some(id) {
            self.deactivate().await?;
        }

        let mut installed = self.installed.write().await;
        if installed.remove(id).is_none() {
            return Err(AppError::not_found(format!("Theme '{id}' is not installed")));
        }
        if let Ok(mut saved) = self.saved_settings.lock() {
            saved.remove(id);
        }
        info!(extension_id = %id, "Theme uninstalled");
        Ok(())
    }

    /// Activates an installed theme, switching away from the current one.
    ///
    /// The current theme is fully deactivated before the new one starts, so
    /// the two never coexist in the registries. A failed activation unwinds
    /// the incoming theme completely; the previous theme is not restored.
    pub async fn activate(&self, id: &str) -> AppResult<()> {
        if self.active_theme().await.as_deref() == Some(id) {
            debug!(extension_id = %id, "Theme already active");
            return Ok(());
        }

        let (manifest, extension) = {
            let installed = self.installed.read().await;
            let theme = installed
                .get(id)
                .ok_or_else(|| AppError::not_found(format!("Theme '{id}' is not installed")))?;
            (theme.manifest.clone(), theme.extension.clone())
        };

        self.deactivate().await?;

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

        register_manifest_components(&context, &manifest, self.loader.as_ref()).await;

        if let Err(e) = extension.activate(context.clone()).await {
            context.revoke_all().await;
            self.host.permissions().revoke(id).await;
            return Err(AppError::activation(format!(
                "Failed to activate theme '{id}': {e}"
            )));
        }

        *self.active.write().await = Some(ActiveTheme {
            id: id.to_string(),
            context,
            extension,
        });

        info!(extension_id = %id, "Theme activated");
        self.host
            .hooks()
            .do_action(names::THEME_ACTIVATED, &[json!(id)])
            .await;
        Ok(())
    }

    /// Deactivates the active theme, if any, replaying its context ledger.
    pub async fn deactivate(&self) -> AppResult<()> {
        let Some(theme) = self.active.write().await.take() else {
            return Ok(());
        };

        if let Err(e) = theme.extension.deactivate().await {
            warn!(extension_id = %theme.id, error = %e, "Theme deactivate callback failed");
        }

        theme.context.revoke_all().await;
        self.host.permissions().revoke(&theme.id).await;

        info!(extension_id = %theme.id, "Theme deactivated");
        self.host
            .hooks()
            .do_action(names::THEME_DEACTIVATED, &[json!(theme.id)])
            .await;
        Ok(())
    }

    /// Id of the active theme, if one is active.
    pub async fn active_theme(&self) -> Option<String> {
        self.active.read().await.as_ref().map(|t| t.id.clone())
    }

    /// Ids of all installed themes.
    pub async fn installed_ids(&self) -> Vec<String> {
        self.installed.read().await.keys().cloned().collect()
    }

    /// Returns the manifest of an installed theme.
    pub async fn manifest(&self, id: &str) -> Option<ExtensionManifestInfo> {
        let installed = self.installed.read().await;
        installed.get(id).map(|t| t.manifest.clone())
    }

    /// Updates one setting of an installed theme. Live when active,
    /// persisted-only otherwise.
    pub async fn update_setting(&self, id: &str, key: &str, value: Value) -> AppResult<()> {
        if !self.installed.read().await.contains_key(id) {
            return Err(AppError::not_found(format!("Theme '{id}' is not installed")));
        }

        let active = self.active.read().await;
        match active.as_ref().filter(|t| t.id == id) {
            Some(theme) => theme.context.settings.set(key, value).await,
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
            SourceRank::Theme,
            initial,
            Some(on_change),
        )
    }
}

impl std::fmt::Debug for ThemeManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThemeManager").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::ComponentHandle;
    use crate::manifest::ComponentDefinition;
    use async_trait::async_trait;

    fn manifest(id: &str) -> ExtensionManifestInfo {
        ExtensionManifestInfo {
            id: id.to_string(),
            name: "Test Theme".to_string(),
            version: "1.0.0".to_string(),
            description: None,
            kind: ExtensionKind::Theme,
            permissions: Vec::new(),
            settings: HashMap::new(),
            components: Vec::new(),
        }
    }

    /// Overrides the `post-list` layout at activation.
    #[derive(Debug)]
    struct LayoutTheme {
        marker: &'static str,
    }

    #[async_trait]
    impl Extension for LayoutTheme {
        async fn activate(&self, context: Arc<ExtensionContext>) -> AppResult<()> {
            context
                .ui
                .register_layout("post-list", Arc::new(self.marker) as ComponentHandle)
                .await;
            Ok(())
        }

        async fn deactivate(&self) -> AppResult<()> {
            Ok(())
        }
    }

    #[derive(Debug)]
    struct FailingTheme;

    #[async_trait]
    impl Extension for FailingTheme {
        async fn activate(&self, context: Arc<ExtensionContext>) -> AppResult<()> {
            context
                .ui
                .register_layout("post-list", Arc::new("broken") as ComponentHandle)
                .await;
            Err(AppError::internal("theme init failed"))
        }

        async fn deactivate(&self) -> AppResult<()> {
            Ok(())
        }
    }

    /// Loader returning the requested path as the component payload.
    struct PathLoader;

    #[async_trait]
    impl ComponentLoader for PathLoader {
        async fn load(&self, _extension_id: &str, path: &str) -> AppResult<ComponentHandle> {
            Ok(Arc::new(path.to_string()))
        }
    }

    #[tokio::test]
    async fn test_single_active_theme() {
        let host = Arc::new(ExtensionHost::new());
        let manager = ThemeManager::new(host.clone());

        manager
            .install(manifest("theme-a"), Arc::new(LayoutTheme { marker: "a" }))
            .await
            .unwrap();
        manager
            .install(manifest("theme-b"), Arc::new(LayoutTheme { marker: "b" }))
            .await
            .unwrap();

        manager.activate("theme-a").await.unwrap();
        assert_eq!(manager.active_theme().await.as_deref(), Some("theme-a"));

        // Switching replaces the previous theme's layout override.
        manager.activate("theme-b").await.unwrap();
        assert_eq!(manager.active_theme().await.as_deref(), Some("theme-b"));

        let entry = host.layouts().resolve("post-list", None).await.unwrap();
        let marker = entry.payload.downcast_ref::<&str>().unwrap();
        assert_eq!(*marker, "b");
    }

    #[tokio::test]
    async fn test_deactivate_clears_layout_overrides() {
        let host = Arc::new(ExtensionHost::new());
        let manager = ThemeManager::new(host.clone());

        manager
            .install(manifest("theme-a"), Arc::new(LayoutTheme { marker: "a" }))
            .await
            .unwrap();
        manager.activate("theme-a").await.unwrap();
        assert!(host.layouts().resolve("post-list", None).await.is_some());

        manager.deactivate().await.unwrap();
        assert_eq!(manager.active_theme().await, None);
        assert!(host.layouts().resolve("post-list", None).await.is_none());
    }

    #[tokio::test]
    async fn test_failed_activation_leaves_no_theme_active() {
        let host = Arc::new(ExtensionHost::new());
        let manager = ThemeManager::new(host.clone());

        manager
            .install(manifest("theme-a"), Arc::new(LayoutTheme { marker: "a" }))
            .await
            .unwrap();
        manager
            .install(manifest("theme-bad"), Arc::new(FailingTheme))
            .await
            .unwrap();

        manager.activate("theme-a").await.unwrap();
        assert!(manager.activate("theme-bad").await.is_err());

        // Previous theme was already deactivated; the failed one unwound.
        assert_eq!(manager.active_theme().await, None);
        assert!(host.layouts().resolve("post-list", None).await.is_none());
    }

    #[tokio::test]
    async fn test_manifest_components_auto_registered() {
        let host = Arc::new(ExtensionHost::new());
        let manager = ThemeManager::new(host.clone()).with_loader(Arc::new(PathLoader));

        let mut m = manifest("theme-a");
        m.components = vec![
            ComponentDefinition {
                id: "header-banner".to_string(),
                name: "Header banner".to_string(),
                slot: Some("header".to_string()),
                path: "components/banner".to_string(),
                priority: 5,
            },
            ComponentDefinition {
                id: "post-list".to_string(),
                name: "Post list".to_string(),
                slot: None,
                path: "layouts/post-list".to_string(),
                priority: 10,
            },
        ];

        manager.install(m, Arc::new(LayoutTheme { marker: "x" })).await.unwrap();
        manager.activate("theme-a").await.unwrap();

        assert_eq!(host.slots().count("header").await, 1);
        assert!(host.layouts().resolve("post-list", None).await.is_some());

        manager.deactivate().await.unwrap();
        assert_eq!(host.slots().count("header").await, 0);
        assert!(host.layouts().resolve("post-list", None).await.is_none());
    }

    #[tokio::test]
    async fn test_components_without_loader_are_skipped() {
        let host = Arc::new(ExtensionHost::new());
        let manager = ThemeManager::new(host.clone());

        let mut m = manifest("theme-a");
        m.components = vec![ComponentDefinition {
            id: "banner".to_string(),
            name: "Banner".to_string(),
            slot: Some("header".to_string()),
            path: "components/banner".to_string(),
            priority: 10,
        }];

        // No loader configured: the declared component is skipped, the
        // theme itself still activates.
        manager.install(m, Arc::new(LayoutTheme { marker: "x" })).await.unwrap();
        manager.activate("theme-a").await.unwrap();
        assert_eq!(host.slots().count("header").await, 0);
        assert!(host.layouts().resolve("post-list", None).await.is_some());
    }

    #[tokio::test]
    async fn test_plugin_manifest_rejected() {
        let host = Arc::new(ExtensionHost::new());
        let manager = ThemeManager::new(host);

        let mut m = manifest("plugin-x");
        m.kind = ExtensionKind::Plugin;
        assert!(manager
            .install(m, Arc::new(LayoutTheme { marker: "x" }))
            .await
            .is_err());
    }
}
