//! Extension system configuration.

use serde::{Deserialize, Serialize};

/// Extension system configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtensionConfig {
    /// Directory containing theme packages.
    #[serde(default = "default_themes_directory")]
    pub themes_directory: String,
    /// Directory containing plugin packages.
    #[serde(default = "default_plugins_directory")]
    pub plugins_directory: String,
    /// Whether to automatically activate installed extensions on startup.
    #[serde(default = "default_true")]
    pub auto_activate: bool,
    /// Theme activated when no other theme is configured.
    #[serde(default)]
    pub default_theme: Option<String>,
}

fn default_themes_directory() -> String {
    "./themes".to_string()
}

fn default_plugins_directory() -> String {
    "./plugins".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for ExtensionConfig {
    fn default() -> Self {
        Self {
            themes_directory: default_themes_directory(),
            plugins_directory: default_plugins_directory(),
            auto_activate: true,
            default_theme: None,
        }
    }
}
