//! Extension manifest types.
//!
//! Manifest files are parsed and validated by an external loader; this
//! runtime only consumes the already-deserialized [`ExtensionManifestInfo`]
//! and re-checks the fields it cannot function without.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use forumkit_core::{AppError, AppResult};

/// Capabilities an extension may request in its manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Permission {
    #[serde(rename = "posts:read")]
    PostsRead,
    #[serde(rename = "posts:write")]
    PostsWrite,
    #[serde(rename = "posts:delete")]
    PostsDelete,
    #[serde(rename = "comments:read")]
    CommentsRead,
    #[serde(rename = "comments:write")]
    CommentsWrite,
    #[serde(rename = "comments:delete")]
    CommentsDelete,
    #[serde(rename = "users:read")]
    UsersRead,
    #[serde(rename = "users:write")]
    UsersWrite,
    #[serde(rename = "users:delete")]
    UsersDelete,
    #[serde(rename = "settings:read")]
    SettingsRead,
    #[serde(rename = "settings:write")]
    SettingsWrite,
    #[serde(rename = "files:read")]
    FilesRead,
    #[serde(rename = "files:write")]
    FilesWrite,
    #[serde(rename = "files:delete")]
    FilesDelete,
    #[serde(rename = "api:external")]
    ApiExternal,
    #[serde(rename = "database:read")]
    DatabaseRead,
    #[serde(rename = "database:write")]
    DatabaseWrite,
    #[serde(rename = "network:fetch")]
    NetworkFetch,
    #[serde(rename = "network:websocket")]
    NetworkWebsocket,
}

impl Permission {
    /// Returns the manifest string form (`"posts:read"`, …).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PostsRead => "posts:read",
            Self::PostsWrite => "posts:write",
            Self::PostsDelete => "posts:delete",
            Self::CommentsRead => "comments:read",
            Self::CommentsWrite => "comments:write",
            Self::CommentsDelete => "comments:delete",
            Self::UsersRead => "users:read",
            Self::UsersWrite => "users:write",
            Self::UsersDelete => "users:delete",
            Self::SettingsRead => "settings:read",
            Self::SettingsWrite => "settings:write",
            Self::FilesRead => "files:read",
            Self::FilesWrite => "files:write",
            Self::FilesDelete => "files:delete",
            Self::ApiExternal => "api:external",
            Self::DatabaseRead => "database:read",
            Self::DatabaseWrite => "database:write",
            Self::NetworkFetch => "network:fetch",
            Self::NetworkWebsocket => "network:websocket",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Whether a manifest describes a theme or a plugin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtensionKind {
    /// Mutually exclusive: at most one theme is active.
    Theme,
    /// Any number may be active simultaneously.
    Plugin,
}

/// Input widget type for a declared setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SettingType {
    String,
    Number,
    Boolean,
    Select,
    Textarea,
    Url,
    Color,
    Email,
}

/// An option in a `select` setting field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SettingOption {
    /// Bare value doubling as its own label.
    Plain(String),
    /// Separate display label and stored value.
    Labeled { label: String, value: String },
}

/// Schema for a single manifest-declared setting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettingField {
    /// Input widget type.
    #[serde(rename = "type")]
    pub field_type: SettingType,
    /// Display label in the admin UI.
    pub label: String,
    /// Optional help text.
    #[serde(default)]
    pub description: Option<String>,
    /// Default value when the admin has not set one.
    #[serde(default)]
    pub default: Option<Value>,
    /// Whether the admin must supply a value.
    #[serde(default)]
    pub required: bool,
    /// Choices for `select` fields.
    #[serde(default)]
    pub options: Option<Vec<SettingOption>>,
    /// Minimum for `number` fields.
    #[serde(default)]
    pub min: Option<f64>,
    /// Maximum for `number` fields.
    #[serde(default)]
    pub max: Option<f64>,
    /// Input placeholder text.
    #[serde(default)]
    pub placeholder: Option<String>,
}

/// A UI component declared in a theme manifest, registered automatically
/// at activation through the component loader.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentDefinition {
    /// Component id; for layouts this is the layout id being overridden.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Slot to render into. When absent, the component is registered as a
    /// layout override under `id` instead.
    #[serde(default)]
    pub slot: Option<String>,
    /// Loader path of the component within the extension package.
    pub path: String,
    /// Render priority within the slot.
    #[serde(default = "default_component_priority")]
    pub priority: i32,
}

fn default_component_priority() -> i32 {
    10
}

/// The manifest fields this runtime consumes. Immutable once loaded; owned
/// by the lifecycle manager for the duration of an activation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtensionManifestInfo {
    /// Unique extension identifier.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Semantic version string (`major.minor.patch`).
    pub version: String,
    /// Optional description.
    #[serde(default)]
    pub description: Option<String>,
    /// Theme or plugin.
    pub kind: ExtensionKind,
    /// Capabilities the extension requests.
    #[serde(default)]
    pub permissions: Vec<Permission>,
    /// Declared settings schema, keyed by setting name.
    #[serde(default)]
    pub settings: HashMap<String, SettingField>,
    /// Declared UI components (themes mostly; empty for code-only plugins).
    #[serde(default)]
    pub components: Vec<ComponentDefinition>,
}

impl ExtensionManifestInfo {
    /// Validates the fields the runtime cannot function without.
    ///
    /// Must pass before a context is constructed: a malformed manifest
    /// fails here, before any hook or slot registration can happen.
    pub fn validate(&self) -> AppResult<()> {
        let mut missing = Vec::new();
        if self.id.trim().is_empty() {
            missing.push("id");
        }
        if self.name.trim().is_empty() {
            missing.push("name");
        }
        if self.version.trim().is_empty() {
            missing.push("version");
        }
        if !missing.is_empty() {
            return Err(AppError::manifest(format!(
                "Invalid extension manifest: missing fields {}",
                missing.join(", ")
            )));
        }

        if !version_is_semver(&self.version) {
            return Err(AppError::manifest(format!(
                "Invalid version format: {}",
                self.version
            )));
        }

        Ok(())
    }

    /// Returns the default value for every setting that declares one.
    pub fn default_settings(&self) -> HashMap<String, Value> {
        self.settings
            .iter()
            .filter_map(|(key, field)| field.default.clone().map(|v| (key.clone(), v)))
            .collect()
    }
}

/// Checks that a version string starts with `major.minor.patch` numerals.
fn version_is_semver(version: &str) -> bool {
    let core = version.split(['-', '+']).next().unwrap_or("");
    let parts: Vec<&str> = core.split('.').collect();
    parts.len() >= 3
        && parts[..3]
            .iter()
            .all(|p| !p.is_empty() && p.chars().all(|c| c.is_ascii_digit()))
}
