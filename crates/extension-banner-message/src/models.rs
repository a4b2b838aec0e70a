//! Banner data model.

use serde::{Deserialize, Serialize};

/// Where on the page a banner renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BannerPosition {
    Header,
    Sidebar,
    Content,
    Footer,
}

/// Anchor target for a banner link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LinkTarget {
    #[serde(rename = "_self")]
    SameTab,
    #[serde(rename = "_blank")]
    NewTab,
}

impl LinkTarget {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SameTab => "_self",
            Self::NewTab => "_blank",
        }
    }
}

/// One banner as served by the host's banner API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Banner {
    pub id: u64,
    pub title: String,
    #[serde(rename = "imageUrl")]
    pub image_url: String,
    #[serde(rename = "linkUrl")]
    pub link_url: String,
    pub position: BannerPosition,
    #[serde(rename = "altText", default)]
    pub alt_text: Option<String>,
    pub target: LinkTarget,
    #[serde(default)]
    pub priority: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_banner_deserializes_api_shape() {
        let banner: Banner = serde_json::from_str(
            r#"{
                "id": 7,
                "title": "Sale",
                "imageUrl": "https://cdn.example.com/sale.png",
                "linkUrl": "https://example.com/sale",
                "position": "header",
                "target": "_blank"
            }"#,
        )
        .unwrap();

        assert_eq!(banner.position, BannerPosition::Header);
        assert_eq!(banner.target, LinkTarget::NewTab);
        assert_eq!(banner.alt_text, None);
        assert_eq!(banner.priority, 0);
    }
}
