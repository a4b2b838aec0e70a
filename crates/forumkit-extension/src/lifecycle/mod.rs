//! Extension lifecycle management.
//!
//! Two managers share one [`crate::host::ExtensionHost`]: themes are
//! mutually exclusive (activating one deactivates the previous), plugins
//! stack freely. Both follow the same activation protocol: validate, grant
//! permissions, build an isolated context, auto-register manifest
//! components, run the extension's `activate`, and on any failure unwind
//! the context ledger so no partial registrations survive.

pub mod plugins;
pub mod themes;

use std::sync::Arc;

use tracing::warn;

use crate::context::ExtensionContext;
use crate::loader::ComponentLoader;
use crate::manifest::ExtensionManifestInfo;

/// Registers every manifest-declared component through the extension's
/// context. Components with a `slot` go into the multi-occupancy slot
/// registry; components without one are layout overrides under their id.
///
/// Best-effort: a component that fails to load is logged and skipped, the
/// rest still register. A broken component never aborts an activation.
pub(crate) async fn register_manifest_components(
    context: &ExtensionContext,
    manifest: &ExtensionManifestInfo,
    loader: Option<&Arc<dyn ComponentLoader>>,
) {
    if manifest.components.is_empty() {
        return;
    }
    let Some(loader) = loader else {
        warn!(
            extension_id = %manifest.id,
            "Manifest declares components but no component loader is configured"
        );
        return;
    };

    for definition in &manifest.components {
        let handle = match loader.load(&manifest.id, &definition.path).await {
            Ok(handle) => handle,
            Err(e) => {
                warn!(
                    extension_id = %manifest.id,
                    component = %definition.id,
                    error = %e,
                    "Component failed to load, skipping"
                );
                continue;
            }
        };
        match &definition.slot {
            Some(slot) => {
                context
                    .ui
                    .register_slot(slot, handle, definition.priority)
                    .await;
            }
            None => context.ui.register_layout(&definition.id, handle).await,
        }
    }
}
