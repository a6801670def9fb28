//! Built-in items used when the data endpoint cannot be reached at all.
//!
//! These keep the catalog usable without a server and share the exact
//! record shape of real payloads.

use crate::models::{ContentItem, Section};

pub fn items(section: Section) -> Vec<ContentItem> {
    match section {
        Section::Horror => vec![ContentItem {
            id: "PCKNptxYuSw".to_string(),
            title: "सह्याद्री की परछाइयाँ".to_string(),
            description: "हंसी-मज़ाक से शुरू हुई बाइक यात्रा, पर अंधेरी रात ने इसे बदल दिया एक भयानक कहानी में…"
                .to_string(),
            thumbnail: Some("https://i.ytimg.com/vi/PCKNptxYuSw/maxresdefault.jpg".to_string()),
            duration: Some("12:45".to_string()),
            category: "horror".to_string(),
            locked: false,
            access_url: None,
        }],
        Section::Mysterious => vec![ContentItem {
            id: "example123".to_string(),
            title: "रहस्यमय घटना".to_string(),
            description: "एक अनसुलझी रहस्यमय घटना जो आज भी लोगों को हैरान करती है...".to_string(),
            thumbnail: Some("https://i.ytimg.com/vi/example123/maxresdefault.jpg".to_string()),
            duration: Some("15:30".to_string()),
            category: "mysterious".to_string(),
            locked: false,
            access_url: None,
        }],
        Section::Spotify => vec![ContentItem {
            id: "spotify-track-1".to_string(),
            title: "भूतिया आवाज़ें".to_string(),
            description: "रात की गहराई में सुनाई देने वाली रहस्यमय आवाज़ों की कहानी".to_string(),
            thumbnail: Some("/assets/images/logo.png".to_string()),
            duration: Some("18:22".to_string()),
            category: "spotify".to_string(),
            locked: true,
            access_url: Some("https://open.spotify.com/episode/example".to_string()),
        }],
    }
}
