//! The banner plugin itself.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

use crate::models::BannerPosition;
use crate::provider::BannerProvider;
use crate::render::{banner_html, insert_after_paragraph};
use forumkit_core::AppResult;
use forumkit_extension::hooks::bus::{filter_fn, HookValue};
use forumkit_extension::hooks::names;
use forumkit_extension::loader::ComponentHandle;
use forumkit_extension::manifest::{ExtensionManifestInfo, Permission, SettingType};
use forumkit_extension::{context::ExtensionContext, extension::Extension};
use forumkit_extension_sdk::ManifestBuilder;

const DEFAULT_API_BASE_URL: &str = "/api/v2";
const DEFAULT_INSERT_AFTER_PARAGRAPH: usize = 3;

/// Position-based banner advertising plugin.
///
/// Banners are fetched from the provider once, at activation. Hook
/// callbacks are synchronous and only read the captured snapshot, so a
/// slow banner API can delay activation but never a page render.
pub struct BannerMessagePlugin {
    provider: Arc<dyn BannerProvider>,
}

impl std::fmt::Debug for BannerMessagePlugin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BannerMessagePlugin").finish_non_exhaustive()
    }
}

impl BannerMessagePlugin {
    pub fn new(provider: Arc<dyn BannerProvider>) -> Self {
        Self { provider }
    }

    /// The plugin's manifest, as shipped in its package.
    pub fn manifest() -> AppResult<ExtensionManifestInfo> {
        ManifestBuilder::plugin("banner-message", "Banner Message", "1.0.0")
            .description("Position-based banner advertising")
            .permission(Permission::NetworkFetch)
            .permission(Permission::PostsRead)
            .setting("header_enabled", SettingType::Boolean, "Header banner", json!(true))
            .setting("sidebar_enabled", SettingType::Boolean, "Sidebar banner", json!(true))
            .setting("content_enabled", SettingType::Boolean, "Content banner", json!(false))
            .setting(
                "content_insert_after_paragraph",
                SettingType::Number,
                "Insert after paragraph",
                json!(DEFAULT_INSERT_AFTER_PARAGRAPH),
            )
            .setting("api_base_url", SettingType::Url, "Banner API base URL", json!(DEFAULT_API_BASE_URL))
            .build()
    }

    async fn setting_bool(context: &ExtensionContext, key: &str, fallback: bool) -> bool {
        match context.settings.get(key).await {
            Some(Value::Bool(b)) => b,
            _ => fallback,
        }
    }

    async fn setting_usize(context: &ExtensionContext, key: &str, fallback: usize) -> usize {
        match context.settings.get(key).await {
            Some(Value::Number(n)) => n.as_u64().map(|v| v as usize).unwrap_or(fallback),
            _ => fallback,
        }
    }

    async fn setting_string(context: &ExtensionContext, key: &str, fallback: &str) -> String {
        match context.settings.get(key).await {
            Some(Value::String(s)) => s,
            _ => fallback.to_string(),
        }
    }
}

#[async_trait]
impl Extension for BannerMessagePlugin {
    async fn activate(&self, context: Arc<ExtensionContext>) -> AppResult<()> {
        let api_base_url =
            Self::setting_string(&context, "api_base_url", DEFAULT_API_BASE_URL).await;

        if Self::setting_bool(&context, "header_enabled", true).await {
            let banners = self.provider.banners(BannerPosition::Header).await?;
            if let Some(banner) = banners.first() {
                let markup = banner_html(banner, &api_base_url);
                context
                    .ui
                    .register_slot("header", Arc::new(markup) as ComponentHandle, 5)
                    .await;
            } else {
                debug!("No header banners available");
            }
        }

        if Self::setting_bool(&context, "content_enabled", false).await {
            let banners = self.provider.banners(BannerPosition::Content).await?;
            if let Some(banner) = banners.first() {
                let markup = banner_html(banner, &api_base_url);
                let paragraph = Self::setting_usize(
                    &context,
                    "content_insert_after_paragraph",
                    DEFAULT_INSERT_AFTER_PARAGRAPH,
                )
                .await;

                context
                    .hooks
                    .add_filter(
                        names::POST_CONTENT,
                        filter_fn(move |value, _args| {
                            let Some(content) = value.as_str() else {
                                return Ok(value);
                            };
                            Ok(HookValue::String(insert_after_paragraph(
                                content, &markup, paragraph,
                            )))
                        }),
                        20,
                    )
                    .await;
            }
        }

        if Self::setting_bool(&context, "sidebar_enabled", true).await {
            let widget_api_base_url = api_base_url.clone();
            context
                .hooks
                .add_filter(
                    names::SIDEBAR_WIDGETS,
                    filter_fn(move |value, _args| {
                        let mut widgets = match value {
                            Value::Array(widgets) => widgets,
                            other => vec![other],
                        };
                        widgets.push(json!({
                            "id": "sidebar-banner",
                            "title": "",
                            "component": "BannerWidget",
                            "priority": 15,
                            "props": {
                                "position": "sidebar",
                                "apiBaseUrl": widget_api_base_url,
                            },
                        }));
                        Ok(Value::Array(widgets))
                    }),
                    15,
                )
                .await;
        }

        context.logger.info("Banner plugin activated");
        Ok(())
    }

    async fn deactivate(&self) -> AppResult<()> {
        // Registrations are unwound by the context ledger.
        Ok(())
    }
}
