//! Banner HTML rendering and content insertion.

use crate::models::Banner;

/// Builds the click-tracking URL for a banner.
pub fn click_url(api_base_url: &str, banner_id: u64) -> String {
    format!("{api_base_url}/banners/{banner_id}/click")
}

/// Renders a banner as a tracked image link.
pub fn banner_html(banner: &Banner, api_base_url: &str) -> String {
    let href = click_url(api_base_url, banner.id);
    let alt = banner.alt_text.as_deref().unwrap_or(&banner.title);
    format!(
        r#"<a href="{href}" target="{target}" class="banner-link" data-banner-id="{id}"><img src="{src}" alt="{alt}" class="banner-image" loading="lazy" /></a>"#,
        target = banner.target.as_str(),
        id = banner.id,
        src = banner.image_url,
    )
}

/// Inserts `banner_markup` into `content` after the given paragraph.
///
/// Content is treated as HTML with `</p>` paragraph terminators. When the
/// content has fewer paragraphs than requested, the banner is appended at
/// the end instead.
pub fn insert_after_paragraph(content: &str, banner_markup: &str, paragraph: usize) -> String {
    let container = format!(r#"<div class="content-banner-container">{banner_markup}</div>"#);

    let mut paragraphs: Vec<&str> = content.split("</p>").collect();
    // The split leaves a trailing remainder after the last </p>; only the
    // pieces before it count as paragraphs.
    let paragraph_count = paragraphs.len().saturating_sub(1);

    if paragraph == 0 || paragraph_count <= paragraph {
        let mut result = content.to_string();
        result.push_str(&container);
        return result;
    }

    let mut rebuilt = String::new();
    for (index, piece) in paragraphs.drain(..).enumerate() {
        rebuilt.push_str(piece);
        if index < paragraph_count {
            rebuilt.push_str("</p>");
        }
        if index + 1 == paragraph {
            rebuilt.push_str(&container);
        }
    }
    rebuilt
}
