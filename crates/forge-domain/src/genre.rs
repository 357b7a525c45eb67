//! Genre module - content-domain hints for extraction prompting

use std::fmt;

/// A content-domain hint that adjusts extraction prompts and terminology
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Genre {
    /// Real-world historical material
    Historical,

    /// Fantasy settings
    Fantasy,

    /// Science fiction settings
    SciFi,

    /// Contemporary settings
    Modern,

    /// No domain assumption
    Generic,
}

impl Genre {
    /// Parse a genre from its surface form (case-insensitive)
    ///
    /// Unrecognized input falls back to `Generic`.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "historical" => Self::Historical,
            "fantasy" => Self::Fantasy,
            "scifi" | "sci-fi" | "sci_fi" => Self::SciFi,
            "modern" => Self::Modern,
            _ => Self::Generic,
        }
    }

    /// The canonical surface form of this genre
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Historical => "historical",
            Self::Fantasy => "fantasy",
            Self::SciFi => "scifi",
            Self::Modern => "modern",
            Self::Generic => "generic",
        }
    }

    /// All genres, for CLI help and prompt libraries
    pub fn all() -> [Genre; 5] {
        [
            Self::Historical,
            Self::Fantasy,
            Self::SciFi,
            Self::Modern,
            Self::Generic,
        ]
    }
}

impl Default for Genre {
    fn default() -> Self {
        Self::Generic
    }
}

impl fmt::Display for Genre {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
