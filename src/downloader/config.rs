//! Download configuration constants

use std::time::Duration;

/// User agent sent with every request.
/// Reddit throttles generic agents far more aggressively than identified ones.
pub const USER_AGENT: &str = "linux:reddit-images:0.1";

/// Response header carrying the number of requests used in the current window
pub const HEADER_RATELIMIT_USED: &str = "x-ratelimit-used";

/// Response header carrying the number of requests left in the current window
pub const HEADER_RATELIMIT_REMAINING: &str = "x-ratelimit-remaining";

/// Response header carrying the seconds until the window resets
pub const HEADER_RATELIMIT_RESET: &str = "x-ratelimit-reset";

/// Requests assumed available before the first response reports otherwise
pub const INITIAL_REMAINING: i64 = 100;

/// Reset delay used after a 429 when the server gave no usable reset time.
pub const THROTTLE_FALLBACK_SECS: i64 = 450;

/// Total attempts for a listing page (initial request included)
pub const LISTING_MAX_ATTEMPTS: u32 = 3;

/// Fixed delay between listing attempts
pub const LISTING_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Posts requested per listing page (the API maximum)
pub const LISTING_PAGE_SIZE: u32 = 100;

/// Default API root for listings
pub const DEFAULT_API_BASE: &str = "https://reddit.com";

/// Host serving gallery images by media id
pub const DEFAULT_MEDIA_HOST: &str = "https://i.redd.it";

/// Substring of `url_overridden_by_dest` identifying a gallery post
pub const GALLERY_MARKER: &str = "www.reddit.com/gallery";

/// Accept header used when downloading images
pub const IMAGE_ACCEPT: &str = "image/*";

/// Maximum title length (bytes) kept in a filename stem
pub const SHORT_TITLE_MAX_LEN: usize = 32;

/// Stem fragment used when a title sanitizes to nothing
pub const UNNAMED_PLACEHOLDER: &str = "unnamed_file";

/// Extension used when the content type cannot be sniffed
pub const UNKNOWN_EXTENSION: &str = "bin";

/// Default interval between full sweeps (30 minutes)
pub const DEFAULT_EVERY_SECS: u64 = 60 * 30;

/// Longest accepted interval between sweeps (one year)
pub const MAX_EVERY_SECS: u64 = 365 * 24 * 60 * 60;

/// Default output root
pub const DEFAULT_OUT_DIR: &str = "subreddits";
