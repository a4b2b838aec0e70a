//! Convenience macros for extension development.

/// Builds an [`crate::manifest::ExtensionManifestInfo`] with empty
/// permission, setting, and component lists.
///
/// # Example
/// ```rust,ignore
/// let manifest = manifest_info!(
///     id: "banner-message",
///     name: "Banner Message",
///     version: "1.0.0",
///     kind: ExtensionKind::Plugin
/// );
/// ```
#[macro_export]
macro_rules! manifest_info {
    (
        id: $id:expr,
        name: $name:expr,
        version: $version:expr,
        kind: $kind:expr
    ) => {
        $crate::manifest::ExtensionManifestInfo {
            id: $id.to_string(),
            name: $name.to_string(),
            version: $version.to_string(),
            description: None,
            kind: $kind,
            permissions: Vec::new(),
            settings: std::collections::HashMap::new(),
            components: Vec::new(),
        }
    };
    (
        id: $id:expr,
        name: $name:expr,
        version: $version:expr,
        kind: $kind:expr,
        description: $desc:expr
    ) => {
        $crate::manifest::ExtensionManifestInfo {
            id: $id.to_string(),
            name: $name.to_string(),
            version: $version.to_string(),
            description: Some($desc.to_string()),
            kind: $kind,
            permissions: Vec::new(),
            settings: std::collections::HashMap::new(),
            components: Vec::new(),
        }
    };
}

/// Exports the `create_extension` symbol a dynamically loaded extension
/// must provide. The expression must evaluate to a type implementing
/// [`crate::extension::Extension`].
///
/// # Example
/// ```rust,ignore
/// export_extension!(BannerMessagePlugin::new());
/// ```
#[macro_export]
macro_rules! export_extension {
    ($constructor:expr) => {
        #[unsafe(no_mangle)]
        pub extern "C" fn create_extension() -> *mut dyn $crate::extension::Extension {
            // The loader reconstructs this with Arc::from_raw.
            let extension: std::sync::Arc<dyn $crate::extension::Extension> =
                std::sync::Arc::new($constructor);
            std::sync::Arc::into_raw(extension) as *mut dyn $crate::extension::Extension
        }
    };
}
