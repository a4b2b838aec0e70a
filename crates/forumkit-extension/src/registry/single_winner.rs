//! Single-winner override registry.
//!
//! Core, the active theme, and plugins may each register an implementation
//! for the same logical id (a layout name, for instance). Resolution picks
//! the candidate with the highest [`SourceRank`]; registration order across
//! sources never matters, so a theme activated after a plugin cannot shadow
//! it.

use std::collections::HashMap;

use tokio::sync::RwLock;
use tracing::debug;

use super::SourceRank;

/// A registered override candidate.
#[derive(Debug, Clone)]
pub struct OverrideEntry<P> {
    /// Rank of the registering source.
    pub source: SourceRank,
    /// The opaque payload (typically a component handle).
    pub payload: P,
}

/// Registry resolving many candidates per id to one winner by source rank.
///
/// Invariant: at most one candidate exists per `(id, source)` pair.
/// Registering a duplicate pair is a silent no-op; first writer wins.
#[derive(Debug)]
pub struct SingleWinnerRegistry<P> {
    entries: RwLock<HashMap<String, Vec<OverrideEntry<P>>>>,
}

impl<P: Clone + Send + Sync> SingleWinnerRegistry<P> {
    /// Creates a new empty registry.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Registers a candidate for `id`.
    ///
    /// Returns `true` if the candidate was inserted, `false` if an entry
    /// with the same `(id, source)` already existed (idempotent no-op).
    pub async fn register(&self, id: &str, source: SourceRank, payload: P) -> bool {
        let mut entries = self.entries.write().await;
        let candidates = entries.entry(id.to_string()).or_default();
        if candidates.iter().any(|e| e.source == source) {
            debug!(id = %id, source = %source, "Duplicate override registration ignored");
            return false;
        }
        candidates.push(OverrideEntry { source, payload });
        true
    }

    /// Resolves the winning candidate for `id` (`plugin > theme > core`).
    ///
    /// If `id` has no candidates and `fallback_id` is supplied, the fallback
    /// id is resolved instead. Returns `None` when neither resolves.
    pub async fn resolve(&self, id: &str, fallback_id: Option<&str>) -> Option<OverrideEntry<P>> {
        let entries = self.entries.read().await;
        Self::winner(&entries, id).or_else(|| fallback_id.and_then(|f| Self::winner(&entries, f)))
    }

    /// Returns the resolved (winning) entry for every id with at least one
    /// candidate, for administrative listing.
    pub async fn list_resolved(&self) -> Vec<(String, OverrideEntry<P>)> {
        let entries = self.entries.read().await;
        entries
            .keys()
            .filter_map(|id| Self::winner(&entries, id).map(|e| (id.clone(), e)))
            .collect()
    }

    /// Removes the candidate registered by `source` for a single id.
    ///
    /// Returns `true` if a candidate was removed. Used by the context ledger
    /// for exact deactivation cleanup.
    pub async fn remove(&self, id: &str, source: SourceRank) -> bool {
        let mut entries = self.entries.write().await;
        let Some(candidates) = entries.get_mut(id) else {
            return false;
        };
        let before = candidates.len();
        candidates.retain(|e| e.source != source);
        let removed = candidates.len() < before;
        if candidates.is_empty() {
            entries.remove(id);
        }
        removed
    }

    /// Strips every candidate registered by `source` across all ids; ids
    /// left without candidates are removed entirely.
    pub async fn remove_by_source(&self, source: SourceRank) {
        let mut entries = self.entries.write().await;
        for candidates in entries.values_mut() {
            candidates.retain(|e| e.source != source);
        }
        entries.retain(|_, candidates| !candidates.is_empty());
    }

    /// Returns all ids with at least one candidate.
    pub async fn ids(&self) -> Vec<String> {
        let entries = self.entries.read().await;
        entries.keys().cloned().collect()
    }

    fn winner(
        entries: &HashMap<String, Vec<OverrideEntry<P>>>,
        id: &str,
    ) -> Option<OverrideEntry<P>> {
        entries
            .get(id)
            .and_then(|candidates| candidates.iter().max_by_key(|e| e.source))
            .cloned()
    }
}

impl<P: Clone + Send + Sync> Default for SingleWinnerRegistry<P> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_idempotent_registration() {
        let registry = SingleWinnerRegistry::new();
        assert!(registry.register("x", SourceRank::Core, "A").await);
        assert!(!registry.register("x", SourceRank::Core, "B").await);

        // First writer wins.
        let entry = registry.resolve("x", None).await.unwrap();
        assert_eq!(entry.payload, "A");
    }

    #[tokio::test]
    async fn test_resolution_precedence() {
        let registry = SingleWinnerRegistry::new();
        registry.register("x", SourceRank::Core, "A").await;
        registry.register("x", SourceRank::Theme, "B").await;
        registry.register("x", SourceRank::Plugin, "C").await;

        assert_eq!(registry.resolve("x", None).await.unwrap().payload, "C");

        registry.remove_by_source(SourceRank::Plugin).await;
        assert_eq!(registry.resolve("x", None).await.unwrap().payload, "B");

        registry.remove_by_source(SourceRank::Theme).await;
        assert_eq!(registry.resolve("x", None).await.unwrap().payload, "A");
    }

    #[tokio::test]
    async fn test_precedence_independent_of_registration_order() {
        let registry = SingleWinnerRegistry::new();
        registry.register("x", SourceRank::Plugin, "C").await;
        registry.register("x", SourceRank::Theme, "B").await;

        // Theme registered last must not shadow the plugin.
        assert_eq!(registry.resolve("x", None).await.unwrap().payload, "C");
    }

    #[tokio::test]
    async fn test_fallback_resolution() {
        let registry = SingleWinnerRegistry::new();
        registry.register("compact", SourceRank::Core, "compact-layout").await;

        let entry = registry.resolve("missing-id", Some("compact")).await.unwrap();
        assert_eq!(entry.payload, "compact-layout");

        assert!(registry.resolve("missing-id", Some("also-missing")).await.is_none());
        assert!(registry.resolve("missing-id", None).await.is_none());
    }

    #[tokio::test]
    async fn test_exact_removal() {
        let registry = SingleWinnerRegistry::new();
        registry.register("x", SourceRank::Core, "A").await;
        registry.register("x", SourceRank::Plugin, "C").await;

        assert!(registry.remove("x", SourceRank::Plugin).await);
        assert!(!registry.remove("x", SourceRank::Plugin).await);
        assert_eq!(registry.resolve("x", None).await.unwrap().payload, "A");
    }

    #[tokio::test]
    async fn test_empty_ids_pruned() {
        let registry = SingleWinnerRegistry::new();
        registry.register("x", SourceRank::Plugin, "C").await;
        registry.remove_by_source(SourceRank::Plugin).await;

        assert!(registry.ids().await.is_empty());
    }

    #[tokio::test]
    async fn test_list_resolved() {
        let registry = SingleWinnerRegistry::new();
        registry.register("x", SourceRank::Core, "A").await;
        registry.register("x", SourceRank::Theme, "B").await;
        registry.register("y", SourceRank::Core, "D").await;

        let mut resolved = registry.list_resolved().await;
        resolved.sort_by(|a, b| a.0.cmp(&b.0));
        assert_eq!(resolved.len(), 2);
        assert_eq!(resolved[0].1.payload, "B");
        assert_eq!(resolved[1].1.payload, "D");
    }
}
