//! Extension permission management.
//!
//! Applies least privilege: an extension holds only the capabilities its
//! manifest requested and the administrator granted. Checks are boolean
//! outcomes, never errors: extension code branches on the result and
//! skips the privileged operation.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::warn;

use crate::manifest::Permission;

/// Permissions flagged for an installation warning in the admin UI.
pub const DANGEROUS_PERMISSIONS: &[Permission] = &[
    Permission::DatabaseWrite,
    Permission::UsersWrite,
    Permission::UsersDelete,
    Permission::FilesDelete,
    Permission::NetworkFetch,
    Permission::NetworkWebsocket,
    Permission::ApiExternal,
];

/// Answers "does extension X hold capability Y". The runtime consumes this
/// contract; [`PermissionManager`] is the in-memory implementation.
#[async_trait]
pub trait PermissionChecker: Send + Sync {
    /// Returns whether `extension_id` holds `permission`.
    async fn check(&self, extension_id: &str, permission: Permission) -> bool;

    /// Returns every permission granted to `extension_id`.
    async fn granted(&self, extension_id: &str) -> Vec<Permission>;
}

/// Permission required to register a given hook, if any.
///
/// Hooks absent from this mapping are allowed without a permission check.
pub fn required_permission(hook_name: &str) -> Option<Permission> {
    match hook_name {
        "post_created" | "post_updated" | "before_post_save" | "after_post_save" => {
            Some(Permission::PostsWrite)
        }
        "post_deleted" => Some(Permission::PostsDelete),
        "post_title" | "post_content" | "post_list" => Some(Permission::PostsRead),
        "comment_created" | "comment_updated" => Some(Permission::CommentsWrite),
        "comment_deleted" => Some(Permission::CommentsDelete),
        "comment_content" => Some(Permission::CommentsRead),
        "user_registered" | "user_updated" => Some(Permission::UsersWrite),
        "user_deleted" => Some(Permission::UsersDelete),
        "user_login" | "user_logout" => Some(Permission::UsersRead),
        "file_uploaded" | "before_file_upload" => Some(Permission::FilesWrite),
        "file_deleted" => Some(Permission::FilesDelete),
        "settings_updated" => Some(Permission::SettingsWrite),
        "settings_loaded" => Some(Permission::SettingsRead),
        _ => None,
    }
}

/// One permission decision, retained for auditing.
#[derive(Debug, Clone)]
pub struct AuditEntry {
    /// When the check happened.
    pub timestamp: DateTime<Utc>,
    /// Extension the check was scoped to.
    pub extension_id: String,
    /// Permission that was required.
    pub permission: Permission,
    /// What the extension was trying to do (e.g. `hook:post_created`).
    pub action: String,
    /// Whether the permission was held.
    pub granted: bool,
}

/// Overall risk of a manifest's requested permissions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

/// Breakdown of a permission list into dangerous and safe subsets.
#[derive(Debug, Clone)]
pub struct RiskReport {
    /// Permissions on the dangerous list.
    pub dangerous: Vec<Permission>,
    /// Remaining permissions.
    pub safe: Vec<Permission>,
    /// Aggregated risk level.
    pub risk_level: RiskLevel,
}

/// In-memory grant store with a bounded audit log.
#[derive(Debug)]
pub struct PermissionManager {
    granted: RwLock<HashMap<String, HashSet<Permission>>>,
    audit_log: RwLock<Vec<AuditEntry>>,
}

/// Audit log retention bound.
const MAX_AUDIT_LOG: usize = 1000;

impl PermissionManager {
    /// Creates a new empty permission manager.
    pub fn new() -> Self {
        Self {
            granted: RwLock::new(HashMap::new()),
            audit_log: RwLock::new(Vec::new()),
        }
    }

    /// Grants `permissions` to an extension, on top of any existing grants.
    pub async fn grant(&self, extension_id: &str, permissions: &[Permission]) {
        let mut granted = self.granted.write().await;
        granted
            .entry(extension_id.to_string())
            .or_default()
            .extend(permissions.iter().copied());
    }

    /// Revokes every permission held by an extension.
    pub async fn revoke(&self, extension_id: &str) {
        let mut granted = self.granted.write().await;
        granted.remove(extension_id);
    }

    /// Checks whether an extension may register the named hook.
    ///
    /// Hooks in the hook-permission mapping require the mapped capability;
    /// unmapped hooks are always allowed. Denials are logged and audited
    /// but never raised as errors; the registration is simply skipped.
    pub async fn check_hook(&self, extension_id: &str, hook_name: &str) -> bool {
        let Some(permission) = required_permission(hook_name) else {
            return true;
        };

        let granted = self.check(extension_id, permission).await;
        self.record(extension_id, permission, &format!("hook:{hook_name}"), granted)
            .await;

        if !granted {
            warn!(
                extension_id = %extension_id,
                hook = %hook_name,
                permission = %permission,
                "Hook registration denied, missing permission"
            );
        }
        granted
    }

    /// Classifies a manifest's requested permissions by risk.
    pub fn analyze(permissions: &[Permission]) -> RiskReport {
        let (dangerous, safe): (Vec<Permission>, Vec<Permission>) = permissions
            .iter()
            .copied()
            .partition(|p| DANGEROUS_PERMISSIONS.contains(p));

        let risk_level = match dangerous.len() {
            0 => RiskLevel::Low,
            1..=2 => RiskLevel::Medium,
            _ => RiskLevel::High,
        };

        RiskReport {
            dangerous,
            safe,
            risk_level,
        }
    }

    /// Returns the audit log, optionally filtered to one extension.
    pub async fn audit_log(&self, extension_id: Option<&str>) -> Vec<AuditEntry> {
        let log = self.audit_log.read().await;
        match extension_id {
            Some(id) => log.iter().filter(|e| e.extension_id == id).cloned().collect(),
            None => log.clone(),
        }
    }

    /// Drops all grants and the audit log. Tests and full teardown only.
    pub async fn clear_all(&self) {
        self.granted.write().await.clear();
        self.audit_log.write().await.clear();
    }

    async fn record(&self, extension_id: &str, permission: Permission, action: &str, granted: bool) {
        let mut log = self.audit_log.write().await;
        log.push(AuditEntry {
            timestamp: Utc::now(),
            extension_id: extension_id.to_string(),
            permission,
            action: action.to_string(),
            granted,
        });

        if log.len() > MAX_AUDIT_LOG {
            let excess = log.len() - MAX_AUDIT_LOG;
            log.drain(..excess);
        }
    }
}

impl Default for PermissionManager {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PermissionChecker for PermissionManager {
    async fn check(&self, extension_id: &str, permission: Permission) -> bool {
        let granted = self.granted.read().await;
        granted
            .get(extension_id)
            .map(|perms| perms.contains(&permission))
            .unwrap_or(false)
    }

    async fn granted(&self, extension_id: &str) -> Vec<Permission> {
        let granted = self.granted.read().await;
        granted
            .get(extension_id)
            .map(|perms| perms.iter().copied().collect())
            .unwrap_or_default()
    }
}
