use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Content categories, each presented as a navigable tab
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Section {
    #[default]
    Horror,
    Mysterious,
    Spotify,
}

/// Copy shown when a section loads successfully but has no items
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmptyState {
    pub title: &'static str,
    pub description: &'static str,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown section: {0}")]
pub struct ParseSectionError(String);

impl Section {
    pub const ALL: [Section; 3] = [Section::Horror, Section::Mysterious, Section::Spotify];

    /// Identifier used in data paths and config
    pub fn id(&self) -> &'static str {
        match self {
            Section::Horror => "horror",
            Section::Mysterious => "mysterious",
            Section::Spotify => "spotify",
        }
    }

    /// Get the display title for this section.
    pub fn title(&self) -> &'static str {
        match self {
            Section::Horror => "Horror",
            Section::Mysterious => "Mysterious",
            Section::Spotify => "Audio Stories",
        }
    }

    /// Site-relative path of this section's data resource
    pub fn data_path(&self) -> String {
        format!("/data/{}.json", self.id())
    }

    /// Only the audio section has locked items behind the unlock gate
    pub fn is_gated(&self) -> bool {
        matches!(self, Section::Spotify)
    }

    pub fn empty_state(&self) -> EmptyState {
        match self {
            Section::Horror => EmptyState {
                title: "No Horror Stories",
                description: "New scary content coming soon!",
            },
            Section::Mysterious => EmptyState {
                title: "No Mysteries Yet",
                description: "Mysterious tales will appear here",
            },
            Section::Spotify => EmptyState {
                title: "No Audio Stories",
                description: "Audio content will be available soon",
            },
        }
    }

    /// Get the next section (wrapping around)
    pub fn next(&self) -> Self {
        match self {
            Section::Horror => Section::Mysterious,
            Section::Mysterious => Section::Spotify,
            Section::Spotify => Section::Horror,
        }
    }

    /// Get the previous section (wrapping around)
    pub fn prev(&self) -> Self {
        match self {
            Section::Horror => Section::Spotify,
            Section::Mysterious => Section::Horror,
            Section::Spotify => Section::Mysterious,
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Section {
    type Err = ParseSectionError;

    /// Accepts the section id with or without a leading `#`, as found in page hashes
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim().trim_start_matches('#');
        Section::ALL
            .into_iter()
            .find(|section| section.id().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| ParseSectionError(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_section_next_wraps() {
        assert_eq!(Section::Horror.next(), Section::Mysterious);
        assert_eq!(Section::Mysterious.next(), Section::Spotify);
        assert_eq!(Section::Spotify.next(), Section::Horror);
    }

    #[test]
    fn test_section_prev_wraps() {
        assert_eq!(Section::Horror.prev(), Section::Spotify);
        assert_eq!(Section::Spotify.prev(), Section::Mysterious);
        assert_eq!(Section::Mysterious.prev(), Section::Horror);
    }

    #[test]
    fn test_section_from_str() {
        assert_eq!("horror".parse::<Section>(), Ok(Section::Horror));
        assert_eq!("#spotify".parse::<Section>(), Ok(Section::Spotify));
        assert_eq!("Mysterious".parse::<Section>(), Ok(Section::Mysterious));
        assert!("comedy".parse::<Section>().is_err());
        assert!("".parse::<Section>().is_err());
    }

    #[test]
    fn test_data_path() {
        assert_eq!(Section::Horror.data_path(), "/data/horror.json");
        assert_eq!(Section::Spotify.data_path(), "/data/spotify.json");
    }

    #[test]
    fn test_only_spotify_is_gated() {
        let gated: Vec<_> = Section::ALL.into_iter().filter(Section::is_gated).collect();
        assert_eq!(gated, vec![Section::Spotify]);
    }
}
