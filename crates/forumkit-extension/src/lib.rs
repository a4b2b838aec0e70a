//! # forumkit-extension
//!
//! Extension runtime for Forumkit. Provides:
//!
//! - Priority-ordered action/filter hook bus with error isolation
//! - Layered override registries (core/theme/plugin) for layouts and UI slots
//! - Per-extension isolated contexts with scoped hooks, settings, and permissions
//! - Theme lifecycle (single active) and plugin lifecycle (many active)
//! - Optional dynamic loading via `libloading`
//!
//! Extensions never touch the shared registries directly: everything they
//! register goes through their [`ExtensionContext`], which keeps a private
//! ledger so that deactivation removes exactly what the extension added.

pub mod context;
pub mod extension;
pub mod hooks;
pub mod host;
pub mod lifecycle;
pub mod loader;
pub mod macros;
pub mod manifest;
pub mod permissions;
pub mod registry;

pub use context::ExtensionContext;
pub use extension::Extension;
pub use hooks::bus::{HookBus, HookKind, HookValue};
pub use host::ExtensionHost;
pub use lifecycle::plugins::PluginManager;
pub use lifecycle::themes::ThemeManager;
pub use loader::{ComponentHandle, ComponentLoader};
pub use manifest::{ExtensionKind, ExtensionManifestInfo, Permission};
pub use permissions::{PermissionChecker, PermissionManager};
pub use registry::{MultiOccupancyRegistry, SingleWinnerRegistry, SourceRank};

/// Common imports for host and extension code.
pub mod prelude {
    pub use crate::context::{ExtensionContext, SettingsChangeCallback};
    pub use crate::extension::Extension;
    pub use crate::hooks::bus::{
        action_fn, filter_fn, ActionCallback, FilterCallback, HookBus, HookKind, HookValue,
        DEFAULT_PRIORITY,
    };
    pub use crate::hooks::names;
    pub use crate::host::ExtensionHost;
    pub use crate::lifecycle::plugins::PluginManager;
    pub use crate::lifecycle::themes::ThemeManager;
    pub use crate::loader::{ComponentHandle, ComponentLoader};
    pub use crate::manifest::{
        ComponentDefinition, ExtensionKind, ExtensionManifestInfo, Permission, SettingField,
        SettingOption, SettingType,
    };
    pub use crate::permissions::{PermissionChecker, PermissionManager, RiskLevel};
    pub use crate::registry::SourceRank;
}
