use serde::{Deserialize, Serialize};

/// Thumbnail used for audio items that don't carry their own
pub const DEFAULT_THUMBNAIL: &str = "/assets/images/logo.png";

/// A single story record from a section data resource.
///
/// `locked` and `access_url` are only meaningful for the gated section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentItem {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub locked: bool,
    #[serde(
        default,
        rename = "accessUrl",
        alias = "spotifyUrl",
        skip_serializing_if = "Option::is_none"
    )]
    pub access_url: Option<String>,
}

impl ContentItem {
    /// URL to open this item outside the app
    pub fn watch_url(&self) -> String {
        match self.access_url {
            Some(ref url) => url.clone(),
            None => format!("https://www.youtube.com/watch?v={}", self.id),
        }
    }

    /// Embed URL for the in-app player; audio items have none
    pub fn embed_url(&self) -> Option<String> {
        if self.access_url.is_some() {
            return None;
        }
        Some(format!(
            "https://www.youtube.com/embed/{}?autoplay=1&rel=0&modestbranding=1&playsinline=1",
            self.id
        ))
    }

    pub fn thumbnail_or_default(&self) -> String {
        match (&self.thumbnail, &self.access_url) {
            (Some(thumb), _) if !thumb.is_empty() => thumb.clone(),
            (_, Some(_)) => DEFAULT_THUMBNAIL.to_string(),
            _ => format!("https://i.ytimg.com/vi/{}/hqdefault.jpg", self.id),
        }
    }

    pub fn display_duration(&self) -> &str {
        self.duration.as_deref().unwrap_or("--:--")
    }
}
