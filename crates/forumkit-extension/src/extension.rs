//! The trait all extensions implement.

use std::sync::Arc;

use async_trait::async_trait;

use crate::context::ExtensionContext;
use forumkit_core::AppResult;

/// Entry points exported by a theme or plugin.
///
/// `activate` receives the extension's isolated [`ExtensionContext`]; every
/// hook, slot, and layout the extension registers must go through it so the
/// lifecycle manager can undo the registrations exactly at deactivation.
///
/// Both calls may perform asynchronous work; the lifecycle manager does not
/// consider the extension active until `activate` resolves.
#[async_trait]
pub trait Extension: Send + Sync + std::fmt::Debug {
    /// Called once per activation with a freshly built context.
    ///
    /// An error here aborts the activation: the lifecycle manager tears the
    /// context down before surfacing the failure, so no partial
    /// registrations survive.
    async fn activate(&self, context: Arc<ExtensionContext>) -> AppResult<()>;

    /// Called at deactivation, before the runtime revokes the extension's
    /// registrations. Best-effort: an error is logged, cleanup proceeds.
    async fn deactivate(&self) -> AppResult<()>;
}
