//! End-to-end tests for the extension runtime: themes and plugins sharing
//! one host, layered layout resolution, and exact deactivation cleanup.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use forumkit_core::AppResult;
use forumkit_extension::hooks::bus::{filter_fn, DEFAULT_PRIORITY};
use forumkit_extension::hooks::names;
use forumkit_extension::loader::ComponentHandle;
use forumkit_extension::manifest::{ExtensionKind, ExtensionManifestInfo, Permission};
use forumkit_extension::registry::SourceRank;
use forumkit_extension::{Extension, ExtensionContext, ExtensionHost, PluginManager, ThemeManager};

fn manifest(id: &str, kind: ExtensionKind) -> ExtensionManifestInfo {
    ExtensionManifestInfo {
        id: id.to_string(),
        name: id.to_string(),
        version: "1.0.0".to_string(),
        description: None,
        kind,
        // post_title is a permission-gated hook.
        permissions: vec![Permission::PostsRead],
        settings: Default::default(),
        components: Vec::new(),
    }
}

/// Prefixes post titles with a tag and overrides the `post-list` layout.
#[derive(Debug)]
struct TitleTagPlugin {
    tag: &'static str,
    override_layout: bool,
}

#[async_trait]
impl Extension for TitleTagPlugin {
    async fn activate(&self, context: Arc<ExtensionContext>) -> AppResult<()> {
        let tag = self.tag;
        context
            .hooks
            .add_filter(
                names::POST_TITLE,
                filter_fn(move |value, _| {
                    let title = value.as_str().unwrap_or_default();
                    Ok(json!(format!("[{tag}] {title}")))
                }),
                DEFAULT_PRIORITY,
            )
            .await;

        if self.override_layout {
            context
                .ui
                .register_layout("post-list", Arc::new(self.tag) as ComponentHandle)
                .await;
        }
        Ok(())
    }

    async fn deactivate(&self) -> AppResult<()> {
        Ok(())
    }
}

#[derive(Debug)]
struct SimpleTheme {
    marker: &'static str,
}

#[async_trait]
impl Extension for SimpleTheme {
    async fn activate(&self, context: Arc<ExtensionContext>) -> AppResult<()> {
        context
            .ui
            .register_layout("post-list", Arc::new(self.marker) as ComponentHandle)
            .await;
        context
            .ui
            .register_slot("footer", Arc::new(self.marker) as ComponentHandle, 10)
            .await;
        Ok(())
    }

    async fn deactivate(&self) -> AppResult<()> {
        Ok(())
    }
}

#[tokio::test]
async fn plugin_layout_overrides_theme_layout() {
    let host = Arc::new(ExtensionHost::new());
    let themes = ThemeManager::new(host.clone());
    let plugins = PluginManager::new(host.clone());

    // Core fallback layout.
    host.layouts()
        .register("post-list", SourceRank::Core, Arc::new("core") as ComponentHandle)
        .await;

    themes
        .install(
            manifest("default-theme", ExtensionKind::Theme),
            Arc::new(SimpleTheme { marker: "theme" }),
        )
        .await
        .unwrap();
    themes.activate("default-theme").await.unwrap();

    plugins
        .install(
            manifest("layout-plugin", ExtensionKind::Plugin),
            Arc::new(TitleTagPlugin {
                tag: "plugin",
                override_layout: true,
            }),
        )
        .await
        .unwrap();
    plugins.activate("layout-plugin").await.unwrap();

    // Plugin wins over theme over core, regardless of registration order.
    let winner = host.layouts().resolve("post-list", None).await.unwrap();
    assert_eq!(winner.source, SourceRank::Plugin);

    plugins.deactivate("layout-plugin").await.unwrap();
    let winner = host.layouts().resolve("post-list", None).await.unwrap();
    assert_eq!(winner.source, SourceRank::Theme);

    themes.deactivate().await.unwrap();
    let winner = host.layouts().resolve("post-list", None).await.unwrap();
    assert_eq!(winner.source, SourceRank::Core);
}

#[tokio::test]
async fn filters_from_many_plugins_compose() {
    let host = Arc::new(ExtensionHost::new());
    let plugins = PluginManager::new(host.clone());

    for tag in ["alpha", "beta"] {
        plugins
            .install(
                manifest(tag, ExtensionKind::Plugin),
                Arc::new(TitleTagPlugin {
                    tag: if tag == "alpha" { "A" } else { "B" },
                    override_layout: false,
                }),
            )
            .await
            .unwrap();
        plugins.activate(tag).await.unwrap();
    }

    let title = host
        .hooks()
        .apply_filters(names::POST_TITLE, json!("Hello"), &[])
        .await;
    assert_eq!(title, json!("[B] [A] Hello"));

    // Deactivating one plugin removes only its filter.
    plugins.deactivate("alpha").await.unwrap();
    let title = host
        .hooks()
        .apply_filters(names::POST_TITLE, json!("Hello"), &[])
        .await;
    assert_eq!(title, json!("[B] Hello"));
}

#[tokio::test]
async fn theme_switch_replaces_slots_and_layouts() {
    let host = Arc::new(ExtensionHost::new());
    let themes = ThemeManager::new(host.clone());

    themes
        .install(
            manifest("light", ExtensionKind::Theme),
            Arc::new(SimpleTheme { marker: "light" }),
        )
        .await
        .unwrap();
    themes
        .install(
            manifest("dark", ExtensionKind::Theme),
            Arc::new(SimpleTheme { marker: "dark" }),
        )
        .await
        .unwrap();

    themes.activate("light").await.unwrap();
    themes.activate("dark").await.unwrap();

    assert_eq!(themes.active_theme().await.as_deref(), Some("dark"));
    let footer = host.slots().components("footer").await;
    assert_eq!(footer.len(), 1);
    assert_eq!(footer[0].extension_id, "dark");

    let layout = host.layouts().resolve("post-list", None).await.unwrap();
    let marker = layout.payload.downcast_ref::<&str>().unwrap();
    assert_eq!(*marker, "dark");
}

#[tokio::test]
async fn lifecycle_hooks_fire_on_activation() {
    let host = Arc::new(ExtensionHost::new());
    let plugins = PluginManager::new(host.clone());

    let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
    let sink = seen.clone();
    host.hooks()
        .add_action(
            names::PLUGIN_ACTIVATED,
            forumkit_extension::hooks::bus::action_fn(move |args| {
                sink.lock().unwrap().push(args[0].clone());
                Ok(())
            }),
            DEFAULT_PRIORITY,
        )
        .await;

    plugins
        .install(
            manifest("observed", ExtensionKind::Plugin),
            Arc::new(TitleTagPlugin {
                tag: "O",
                override_layout: false,
            }),
        )
        .await
        .unwrap();
    plugins.activate("observed").await.unwrap();

    assert_eq!(seen.lock().unwrap().as_slice(), &[json!("observed")]);
}
