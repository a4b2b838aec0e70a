//! Well-known hook names reserved by the host.
//!
//! Payload shapes are owned by the host and opaque to the runtime; these
//! constants only pin down the names so extensions and the lifecycle
//! managers agree on them.

/// Fired after a theme finishes activating. Args: `[theme_id]`.
pub const THEME_ACTIVATED: &str = "theme_activated";

/// Fired after a theme finishes deactivating. Args: `[theme_id]`.
pub const THEME_DEACTIVATED: &str = "theme_deactivated";

/// Fired after a plugin finishes activating. Args: `[plugin_id]`.
pub const PLUGIN_ACTIVATED: &str = "plugin_activated";

/// Fired after a plugin finishes deactivating. Args: `[plugin_id]`.
pub const PLUGIN_DEACTIVATED: &str = "plugin_deactivated";

/// Fired before the host renders a page.
pub const BEFORE_PAGE_RENDER: &str = "before_page_render";

/// Fired after the host renders a page.
pub const AFTER_PAGE_RENDER: &str = "after_page_render";

/// Filter over rendered post body HTML. Extra args: `[post]`.
pub const POST_CONTENT: &str = "post_content";

/// Filter over a post title. Extra args: `[post]`.
pub const POST_TITLE: &str = "post_title";

/// Filter over the page title.
pub const PAGE_TITLE: &str = "page_title";

/// Filter over the sidebar widget list.
pub const SIDEBAR_WIDGETS: &str = "sidebar_widgets";

/// Filter over the post list before rendering.
pub const POST_LIST: &str = "post_list";

/// Filter over rendered comment body HTML. Extra args: `[comment]`.
pub const COMMENT_CONTENT: &str = "comment_content";
