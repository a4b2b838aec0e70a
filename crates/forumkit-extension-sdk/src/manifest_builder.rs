//! Fluent builder for extension manifests.
//!
//! Hand-writing [`ExtensionManifestInfo`] literals in extension crates gets
//! noisy once settings and components come in; this builder keeps the
//! declaration readable and validates the result in one place.

use std::collections::HashMap;

use serde_json::Value;

use forumkit_core::AppResult;
use forumkit_extension::manifest::{
    ComponentDefinition, ExtensionKind, ExtensionManifestInfo, Permission, SettingField,
    SettingType,
};

/// Builds a validated [`ExtensionManifestInfo`].
#[derive(Debug, Clone)]
pub struct ManifestBuilder {
    id: String,
    name: String,
    version: String,
    description: Option<String>,
    kind: ExtensionKind,
    permissions: Vec<Permission>,
    settings: HashMap<String, SettingField>,
    components: Vec<ComponentDefinition>,
}

impl ManifestBuilder {
    /// Starts a plugin manifest.
    pub fn plugin(id: &str, name: &str, version: &str) -> Self {
        Self::new(id, name, version, ExtensionKind::Plugin)
    }

    /// Starts a theme manifest.
    pub fn theme(id: &str, name: &str, version: &str) -> Self {
        Self::new(id, name, version, ExtensionKind::Theme)
    }

    fn new(id: &str, name: &str, version: &str, kind: ExtensionKind) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            version: version.to_string(),
            description: None,
            kind,
            permissions: Vec::new(),
            settings: HashMap::new(),
            components: Vec::new(),
        }
    }

    /// Sets the description.
    pub fn description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    /// Requests a permission.
    pub fn permission(mut self, permission: Permission) -> Self {
        self.permissions.push(permission);
        self
    }

    /// Declares a setting with a default value.
    pub fn setting(
        mut self,
        key: &str,
        field_type: SettingType,
        label: &str,
        default: Value,
    ) -> Self {
        self.settings.insert(
            key.to_string(),
            SettingField {
                field_type,
                label: label.to_string(),
                description: None,
                default: Some(default),
                required: false,
                options: None,
                min: None,
                max: None,
                placeholder: None,
            },
        );
        self
    }

    /// Declares a setting from a fully specified field schema.
    pub fn setting_field(mut self, key: &str, field: SettingField) -> Self {
        self.settings.insert(key.to_string(), field);
        self
    }

    /// Declares a component rendered into a UI slot.
    pub fn slot_component(mut self, id: &str, name: &str, slot: &str, path: &str, priority: i32) -> Self {
        self.components.push(ComponentDefinition {
            id: id.to_string(),
            name: name.to_string(),
            slot: Some(slot.to_string()),
            path: path.to_string(),
            priority,
        });
        self
    }

    /// Declares a layout override component for layout id `id`.
    pub fn layout_component(mut self, id: &str, name: &str, path: &str) -> Self {
        self.components.push(ComponentDefinition {
            id: id.to_string(),
            name: name.to_string(),
            slot: None,
            path: path.to_string(),
            priority: 10,
        });
        self
    }

    /// Finalizes and validates the manifest.
    pub fn build(self) -> AppResult<ExtensionManifestInfo> {
        let manifest = ExtensionManifestInfo {
            id: self.id,
            name: self.name,
            version: self.version,
            description: self.description,
            kind: self.kind,
            permissions: self.permissions,
            settings: self.settings,
            components: self.components,
        };
        manifest.validate()?;
        Ok(manifest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_builds_valid_plugin_manifest() {
        let manifest = ManifestBuilder::plugin("banner", "Banner", "1.0.0")
            .description("Shows banners")
            .permission(Permission::NetworkFetch)
            .setting("enabled", SettingType::Boolean, "Enabled", json!(true))
            .build()
            .unwrap();

        assert_eq!(manifest.kind, ExtensionKind::Plugin);
        assert_eq!(manifest.permissions, vec![Permission::NetworkFetch]);
        assert_eq!(
            manifest.settings["enabled"].default,
            Some(json!(true))
        );
    }

    #[test]
    fn test_theme_with_components() {
        let manifest = ManifestBuilder::theme("dark", "Dark Theme", "2.1.0")
            .slot_component("hdr", "Header", "header", "components/header", 5)
            .layout_component("post-list", "Post list", "layouts/post-list")
            .build()
            .unwrap();

        assert_eq!(manifest.components.len(), 2);
        assert_eq!(manifest.components[0].slot.as_deref(), Some("header"));
        assert!(manifest.components[1].slot.is_none());
    }

    #[test]
    fn test_invalid_version_rejected() {
        assert!(ManifestBuilder::plugin("x", "X", "not-a-version")
            .build()
            .is_err());
    }
}
