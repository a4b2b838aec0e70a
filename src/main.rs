//! Forumkit extension host.
//!
//! Entry point that wires the extension runtime together: loads
//! configuration, initializes logging, installs the bundled extensions,
//! and keeps the host alive until shutdown.

use std::sync::Arc;

use tracing_subscriber::{fmt, EnvFilter};

use extension_banner_message::{BannerMessagePlugin, StaticBannerProvider};
use forumkit_core::config::AppConfig;
use forumkit_core::error::AppError;
use forumkit_extension::{ExtensionHost, PluginManager, ThemeManager};

#[tokio::main]
async fn main() {
    let config = match load_configuration() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!("Host error: {e}");
        std::process::exit(1);
    }
}

/// Load configuration from file and environment
fn load_configuration() -> Result<AppConfig, AppError> {
    let env = std::env::var("FORUMKIT_ENV").unwrap_or_else(|_| "development".to_string());
    AppConfig::load(&env)
}

fn init_logging(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.logging.level.clone()));

    if config.logging.format == "json" {
        fmt().with_env_filter(filter).json().init();
    } else {
        fmt().with_env_filter(filter).init();
    }
}

async fn run(config: AppConfig) -> Result<(), AppError> {
    let host = Arc::new(ExtensionHost::new());
    let themes = ThemeManager::new(host.clone());
    let plugins = PluginManager::new(host.clone());

    tracing::info!(
        themes_directory = %config.extensions.themes_directory,
        plugins_directory = %config.extensions.plugins_directory,
        "Extension host starting"
    );

    // Bundled extensions. Packaged extension discovery from the configured
    // directories goes through the host's loader integration instead.
    plugins
        .install(
            BannerMessagePlugin::manifest()?,
            Arc::new(BannerMessagePlugin::new(Arc::new(
                StaticBannerProvider::new(),
            ))),
        )
        .await?;

    if config.extensions.auto_activate {
        for id in plugins.installed_ids().await {
            if let Err(e) = plugins.activate(&id).await {
                tracing::warn!(extension_id = %id, error = %e, "Auto-activation failed");
            }
        }
        if let Some(theme_id) = &config.extensions.default_theme {
            if let Err(e) = themes.activate(theme_id).await {
                tracing::warn!(extension_id = %theme_id, error = %e, "Default theme activation failed");
            }
        }
    }

    tracing::info!(
        active_plugins = plugins.active_ids().await.len(),
        "Extension host ready"
    );

    tokio::signal::ctrl_c()
        .await
        .map_err(|e| AppError::internal(format!("Failed to listen for shutdown signal: {e}")))?;

    tracing::info!("Shutting down");
    plugins.deactivate_all().await?;
    themes.deactivate().await?;

    Ok(())
}
