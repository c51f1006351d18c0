//! Image output: naming, the on-disk ledger and file writes

use std::path::PathBuf;

pub mod ledger;
pub mod path;

pub use ledger::{sniff_extension, write_image, ExistingSet};
pub use path::{sanitize_title, stem_of_file_name, DownloadStem};

/// Output errors
#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    /// Community directory could not be created
    #[error("failed to create directory {}: {source}", path.display())]
    CreateDir {
        /// Directory path
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// Community directory could not be listed
    #[error("failed to read directory {}: {source}", path.display())]
    ReadDir {
        /// Directory path
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// Image could not be written
    #[error("failed to write {}: {source}", path.display())]
    Write {
        /// Target file path
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;
