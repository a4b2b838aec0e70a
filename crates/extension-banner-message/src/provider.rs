//! Banner sources.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::models::{Banner, BannerPosition};
use forumkit_core::AppResult;

/// Supplies the banners for a position. The production host backs this
/// with its banner API; tests and static deployments use
/// [`StaticBannerProvider`].
#[async_trait]
pub trait BannerProvider: Send + Sync {
    /// Returns the banners for `position`, highest priority first.
    async fn banners(&self, position: BannerPosition) -> AppResult<Vec<Banner>>;
}

/// Fixed in-memory banner set.
#[derive(Debug, Default)]
pub struct StaticBannerProvider {
    by_position: RwLock<HashMap<BannerPosition, Vec<Banner>>>,
}

impl StaticBannerProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a banner under its own position.
    pub async fn add(&self, banner: Banner) {
        let mut by_position = self.by_position.write().await;
        let banners = by_position.entry(banner.position).or_default();
        banners.push(banner);
        banners.sort_by_key(|b| std::cmp::Reverse(b.priority));
    }
}

#[async_trait]
impl BannerProvider for StaticBannerProvider {
    async fn banners(&self, position: BannerPosition) -> AppResult<Vec<Banner>> {
        let by_position = self.by_position.read().await;
        Ok(by_position.get(&position).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LinkTarget;

    fn banner(id: u64, position: BannerPosition, priority: i32) -> Banner {
        Banner {
            id,
            title: format!("banner-{id}"),
            image_url: "https://cdn.example.com/b.png".to_string(),
            link_url: "https://example.com".to_string(),
            position,
            alt_text: None,
            target: LinkTarget::NewTab,
            priority,
        }
    }

    #[tokio::test]
    async fn test_banners_sorted_by_priority_descending() {
        let provider = StaticBannerProvider::new();
        provider.add(banner(1, BannerPosition::Header, 5)).await;
        provider.add(banner(2, BannerPosition::Header, 50)).await;
        provider.add(banner(3, BannerPosition::Sidebar, 10)).await;

        let header = provider.banners(BannerPosition::Header).await.unwrap();
        assert_eq!(header.iter().map(|b| b.id).collect::<Vec<_>>(), vec![2, 1]);
        assert!(provider
            .banners(BannerPosition::Footer)
            .await
            .unwrap()
            .is_empty());
    }
}
