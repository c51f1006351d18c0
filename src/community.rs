//! Community (subreddit) name parsing and validation
//!
//! Names end up both in request URLs and as directory names under the output
//! root, so only the characters Reddit itself allows are accepted.

use std::fmt;

/// Maximum length of a subreddit name
const MAX_NAME_LEN: usize = 21;

/// Validated subreddit name
///
/// # Examples
///
/// ```
/// use reddit_images::community::CommunityName;
///
/// let name = CommunityName::parse("r/EarthPorn").unwrap();
/// assert_eq!(name.as_str(), "EarthPorn");
/// assert!(CommunityName::parse("../etc").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CommunityName(String);

impl CommunityName {
    /// Parse a community name, accepting an optional `r/` or `/r/` prefix
    ///
    /// # Errors
    ///
    /// Returns an error if the name is empty, longer than 21 characters, or
    /// contains anything other than ASCII letters, digits and underscores.
    pub fn parse(s: &str) -> Result<Self, CommunityError> {
        let trimmed = s.trim();
        let name = trimmed
            .strip_prefix("/r/")
            .or_else(|| trimmed.strip_prefix("r/"))
            .unwrap_or(trimmed);

        if name.is_empty() {
            return Err(CommunityError::Empty);
        }

        if name.len() > MAX_NAME_LEN {
            return Err(CommunityError::TooLong {
                name: name.to_string(),
                max: MAX_NAME_LEN,
            });
        }

        if let Some(c) = name
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || *c == '_'))
        {
            return Err(CommunityError::InvalidCharacter {
                name: name.to_string(),
                character: c,
            });
        }

        Ok(Self(name.to_string()))
    }

    /// Name without any `r/` prefix
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CommunityName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for CommunityName {
    type Err = CommunityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Community name validation errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommunityError {
    /// Empty name
    #[error("community name cannot be empty")]
    Empty,

    /// Name longer than Reddit allows
    #[error("community name '{name}' exceeds {max} characters")]
    TooLong {
        /// Offending name
        name: String,
        /// Maximum allowed length
        max: usize,
    },

    /// Character outside `[A-Za-z0-9_]`
    #[error("community name '{name}' contains invalid character '{character}'")]
    InvalidCharacter {
        /// Offending name
        name: String,
        /// First invalid character
        character: char,
    },
}
