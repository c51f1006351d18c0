//! Filename stems for downloaded images
//!
//! Every stored image is named `{stem}.{ext}` inside its community directory:
//!
//! ```text
//! subreddits/{community}/{created}_{short_title}_{id}.{ext}
//! ```
//!
//! The stem identifies the image independently of its extension, which is
//! only known after the bytes have been sniffed. Stems are what the
//! [`super::ledger::ExistingSet`] compares, so they must be a pure function of
//! the post.
//!
//! # Usage Example
//!
//! ```rust
//! use reddit_images::output::{sanitize_title, DownloadStem};
//!
//! let short = sanitize_title("A/B:C*D?E");
//! assert_eq!(short, "ABCDE");
//!
//! let stem = DownloadStem::new(1700000000, &short, "17xyz");
//! assert_eq!(stem.as_str(), "1700000000_ABCDE_17xyz");
//! ```

use std::fmt;
use std::path::{Path, PathBuf};

use crate::downloader::config::{SHORT_TITLE_MAX_LEN, UNNAMED_PLACEHOLDER};
use crate::{GalleryItem, Post};

/// Characters removed from titles
const STRIPPED_CHARS: &[char] = &['/', '\\', ':', '*', '?', '"', '<', '>', '|', ',', ';', '\0'];

/// Deterministic, extension-free name of one downloaded image
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DownloadStem(String);

impl DownloadStem {
    /// Build a stem from its parts
    pub fn new(created_epoch_secs: i64, short_title: &str, id: &str) -> Self {
        Self(format!("{created_epoch_secs}_{short_title}_{id}"))
    }

    /// Stem of a single-image post
    pub fn for_post(post: &Post) -> Self {
        Self::new(post.created_epoch_secs(), &sanitize_title(&post.title), &post.id)
    }

    /// Stem of one image of a gallery post
    pub fn for_gallery_item(post: &Post, item: &GalleryItem) -> Self {
        Self::new(
            post.created_epoch_secs(),
            &sanitize_title(&post.title),
            &item.media_id,
        )
    }

    /// Wrap a stem taken from an existing filename
    pub fn from_existing(stem: impl Into<String>) -> Self {
        Self(stem.into())
    }

    /// Stem as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Filename for this stem with the given extension (without leading dot)
    pub fn file_name(&self, extension: &str) -> String {
        format!("{}.{}", self.0, extension)
    }

    /// Full path of this stem inside `dir`
    pub fn path_in(&self, dir: &Path, extension: &str) -> PathBuf {
        dir.join(self.file_name(extension))
    }
}

impl fmt::Display for DownloadStem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Shorten and sanitize a post title for use in a filename
///
/// - keeps at most the first 32 bytes (cut back to a character boundary)
/// - removes path separators, quotes, wildcards and other unsafe characters
/// - replaces spaces with `-`
/// - drops non-ASCII and control characters
/// - substitutes `unnamed_file` when nothing is left
pub fn sanitize_title(title: &str) -> String {
    let short = truncate_at_char_boundary(title, SHORT_TITLE_MAX_LEN);

    let cleaned: String = short
        .chars()
        .filter(|c| !STRIPPED_CHARS.contains(c))
        .map(|c| if c == ' ' { '-' } else { c })
        .filter(|c| c.is_ascii() && !c.is_ascii_control())
        .collect();

    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        UNNAMED_PLACEHOLDER.to_string()
    } else {
        cleaned.to_string()
    }
}

/// Longest prefix of `s` that is at most `max_len` bytes and valid UTF-8
fn truncate_at_char_boundary(s: &str, max_len: usize) -> &str {
    if s.len() <= max_len {
        return s;
    }
    let mut end = max_len;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Split a filename into its stem, dropping the last extension
///
/// `"123_title_abc.jpg"` gives `"123_title_abc"`; a name without a dot is
/// returned unchanged.
pub fn stem_of_file_name(file_name: &str) -> &str {
    match file_name.rfind('.') {
        Some(idx) => &file_name[..idx],
        None => file_name,
    }
}
