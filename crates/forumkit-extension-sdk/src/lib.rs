//! # forumkit-extension-sdk
//!
//! SDK for developing Forumkit themes and plugins.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use forumkit_extension_sdk::prelude::*;
//!
//! #[derive(Debug)]
//! struct MyPlugin;
//!
//! #[async_trait]
//! impl Extension for MyPlugin {
//!     async fn activate(&self, context: Arc<ExtensionContext>) -> AppResult<()> {
//!         context
//!             .hooks
//!             .add_filter("post_content", filter_fn(|v, _| Ok(v)), DEFAULT_PRIORITY)
//!             .await;
//!         Ok(())
//!     }
//!
//!     async fn deactivate(&self) -> AppResult<()> {
//!         Ok(())
//!     }
//! }
//! ```

pub mod manifest_builder;

pub use manifest_builder::ManifestBuilder;

/// Prelude for convenient imports.
pub mod prelude {
    pub use std::sync::Arc;

    pub use async_trait::async_trait;
    pub use serde_json::{json, Value};

    pub use forumkit_core::{AppError, AppResult};
    pub use forumkit_extension::prelude::*;
    pub use forumkit_extension::{export_extension, manifest_info};

    pub use crate::manifest_builder::ManifestBuilder;
}
