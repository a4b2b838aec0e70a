//! # Banner Message Plugin
//!
//! A Forumkit plugin that injects position-based advertising banners:
//!
//! - Header banners, rendered as a `header` UI slot component
//! - Content banners, inserted into post bodies after a configurable
//!   paragraph through the `post_content` filter
//! - Sidebar banners, appended as a widget through the `sidebar_widgets`
//!   filter
//!
//! Banners are fetched once at activation through a [`BannerProvider`];
//! hook callbacks only read the captured snapshot.

pub mod models;
pub mod plugin;
pub mod provider;
pub mod render;

pub use models::{Banner, BannerPosition, LinkTarget};
pub use plugin::BannerMessagePlugin;
pub use provider::{BannerProvider, StaticBannerProvider};
