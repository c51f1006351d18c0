//! The community directory as download ledger
//!
//! There is no index file: the stems of the files present in a community
//! directory are the set of images already downloaded. Writes go to a synced
//! temporary `.part` file that is persisted into place, so a file with a given
//! stem only ever exists once its content is complete and on disk.

use std::collections::HashSet;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::path::{stem_of_file_name, DownloadStem};
use super::{OutputError, OutputResult};
use crate::downloader::config::UNKNOWN_EXTENSION;

/// Prefix of files still being written
const PART_PREFIX: &str = ".";

/// Suffix of files still being written
const PART_SUFFIX: &str = ".part";

/// Stems of images already present in a community directory
#[derive(Debug, Default, Clone)]
pub struct ExistingSet {
    stems: HashSet<DownloadStem>,
}

impl ExistingSet {
    /// Create `dir` (and parents) if needed
    pub fn ensure_dir(dir: &Path) -> OutputResult<()> {
        std::fs::create_dir_all(dir).map_err(|source| OutputError::CreateDir {
            path: dir.to_path_buf(),
            source,
        })
    }

    /// Build the set from the regular files in `dir`
    ///
    /// Subdirectories are ignored. Leftover `.part` files from an interrupted
    /// write are removed and not counted.
    pub fn load(dir: &Path) -> OutputResult<Self> {
        let read_dir_err = |source| OutputError::ReadDir {
            path: dir.to_path_buf(),
            source,
        };

        let mut stems = HashSet::new();
        for entry in std::fs::read_dir(dir).map_err(read_dir_err)? {
            let entry = entry.map_err(read_dir_err)?;
            if entry.file_type().map_err(read_dir_err)?.is_dir() {
                continue;
            }

            let file_name = entry.file_name();
            let file_name = file_name.to_string_lossy();

            if file_name.ends_with(PART_SUFFIX) {
                match std::fs::remove_file(entry.path()) {
                    Ok(()) => info!(path = %entry.path().display(), "removed incomplete download"),
                    Err(e) => warn!(path = %entry.path().display(), error = %e, "failed to remove incomplete download"),
                }
                continue;
            }

            stems.insert(DownloadStem::from_existing(stem_of_file_name(&file_name)));
        }

        debug!(dir = %dir.display(), existing = stems.len(), "loaded existing downloads");
        Ok(Self { stems })
    }

    /// Whether `stem` has already been downloaded
    pub fn contains(&self, stem: &DownloadStem) -> bool {
        self.stems.contains(stem)
    }

    /// Record a completed download
    pub fn insert(&mut self, stem: DownloadStem) -> bool {
        self.stems.insert(stem)
    }

    /// Number of known stems
    pub fn len(&self) -> usize {
        self.stems.len()
    }

    /// Whether the set is empty
    pub fn is_empty(&self) -> bool {
        self.stems.is_empty()
    }
}

/// File extension (without dot) for the given content
///
/// Detected from magic bytes; `bin` when the type is unknown.
pub fn sniff_extension(bytes: &[u8]) -> &'static str {
    infer::get(bytes)
        .map(|kind| kind.extension())
        .unwrap_or(UNKNOWN_EXTENSION)
}

/// Write image bytes as `{dir}/{stem}.{sniffed ext}`
///
/// The bytes are written to a temporary file in `dir`, synced, then
/// persisted under the final name, and the directory itself is synced.
/// Returns the final path.
pub async fn write_image(dir: &Path, stem: &DownloadStem, bytes: &[u8]) -> OutputResult<PathBuf> {
    let path = stem.path_in(dir, sniff_extension(bytes));
    info!(path = %path.display(), bytes = bytes.len(), "write");

    let dir = dir.to_path_buf();
    let target = path.clone();
    let bytes = bytes.to_vec();
    tokio::task::spawn_blocking(move || persist_atomically(&dir, &target, &bytes))
        .await
        .map_err(std::io::Error::other)
        .and_then(|result| result)
        .map_err(|source| OutputError::Write {
            path: path.clone(),
            source,
        })?;

    Ok(path)
}

fn persist_atomically(dir: &Path, path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut temp_file = tempfile::Builder::new()
        .prefix(PART_PREFIX)
        .suffix(PART_SUFFIX)
        .tempfile_in(dir)?;

    temp_file.write_all(bytes)?;
    temp_file.flush()?;
    temp_file.as_file().sync_all()?;

    temp_file.persist(path).map_err(|e| e.error)?;

    // Make the rename itself durable
    if let Ok(dir) = std::fs::File::open(dir) {
        let _ = dir.sync_all();
    }
    Ok(())
}
