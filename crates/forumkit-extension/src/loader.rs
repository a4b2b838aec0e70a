//! Component loading abstraction.
//!
//! The runtime never reads extension packages itself. A host-provided
//! [`ComponentLoader`] resolves manifest-declared component paths to opaque
//! handles, which the registries store and the renderer downcasts.

use std::any::Any;
use std::sync::Arc;

use async_trait::async_trait;

use forumkit_core::AppResult;

/// Opaque renderable unit produced by a loader. The runtime stores and
/// routes these without inspecting them.
pub type ComponentHandle = Arc<dyn Any + Send + Sync>;

/// Resolves a manifest-declared component reference to a renderable unit.
#[async_trait]
pub trait ComponentLoader: Send + Sync {
    /// Loads the component at `path` within the extension package
    /// identified by `extension_id`.
    async fn load(&self, extension_id: &str, path: &str) -> AppResult<ComponentHandle>;
}

/// Dynamic extension loading via shared libraries (feature-gated).
#[cfg(feature = "dynamic")]
pub mod dynamic_loader {
    use std::path::Path;
    use std::sync::Arc;

    use tracing::info;

    use crate::extension::Extension;
    use forumkit_core::{AppError, AppResult};

    /// Type of the creation function exported by dynamic extensions.
    ///
    /// Dynamic extensions must export:
    /// `extern "C" fn create_extension() -> *mut dyn Extension`
    pub type CreateExtensionFn = unsafe extern "C" fn() -> *mut dyn Extension;

    /// Loads extensions from shared libraries (.so / .dll / .dylib).
    pub struct DynamicLoader {
        /// Loaded libraries (kept alive for the lifetime of the loader).
        _libraries: Vec<libloading::Library>,
    }

    impl DynamicLoader {
        /// Creates a new dynamic loader.
        pub fn new() -> Self {
            Self {
                _libraries: Vec::new(),
            }
        }

        /// Loads an extension from the given shared library path.
        ///
        /// # Safety
        /// This function loads arbitrary code from a shared library.
        /// Only load trusted extensions.
        pub unsafe fn load_from_path(&mut self, path: &Path) -> AppResult<Arc<dyn Extension>> {
            let lib = unsafe { libloading::Library::new(path) }.map_err(|e| {
                AppError::component(format!(
                    "Failed to load extension library '{}': {}",
                    path.display(),
                    e
                ))
            })?;

            let create_fn: libloading::Symbol<CreateExtensionFn> =
                unsafe { lib.get(b"create_extension") }.map_err(|e| {
                    AppError::component(format!(
                        "Extension '{}' missing 'create_extension' symbol: {}",
                        path.display(),
                        e
                    ))
                })?;

            let raw = unsafe { create_fn() };
            let extension = unsafe { Arc::from_raw(raw) };

            info!(path = %path.display(), "Dynamic extension loaded");

            self._libraries.push(lib);

            Ok(extension)
        }
    }

    impl Default for DynamicLoader {
        fn default() -> Self {
            Self::new()
        }
    }

    impl std::fmt::Debug for DynamicLoader {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("DynamicLoader")
                .field("loaded_count", &self._libraries.len())
                .finish()
        }
    }
}

#[cfg(feature = "dynamic")]
pub use dynamic_loader::DynamicLoader;
