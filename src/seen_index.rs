use std::collections::{BTreeMap, BTreeSet};
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::utils::error::{AppError, Result};

/// On-disk shape: `{ "<searchUrl>": { "<itemUrl>": true, ... }, ... }`.
type SnapshotFormat = BTreeMap<String, BTreeMap<String, bool>>;

/// Per-search record of listing URLs that have already been reported.
///
/// The in-memory map is the source of truth while the process runs. The file
/// at `path` (when set) is a recovery snapshot rewritten after every new
/// entry.
#[derive(Debug, Clone, Default)]
pub struct SeenIndex {
    searches: BTreeMap<String, BTreeSet<String>>,
    path: Option<PathBuf>,
}

impl SeenIndex {
    /// An index that is never written to disk.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Load the snapshot at `path`, falling back to an empty index when the
    /// file is missing or unreadable. Subsequent [`SeenIndex::record`] calls
    /// persist back to the same path.
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let searches = match std::fs::read_to_string(path) {
            Ok(content) => match serde_json::from_str::<SnapshotFormat>(&content) {
                Ok(snapshot) => snapshot
                    .into_iter()
                    .map(|(search, urls)| {
                        let seen = urls
                            .into_iter()
                            .filter_map(|(url, seen)| seen.then_some(url))
                            .collect();
                        (search, seen)
                    })
                    .collect(),
                Err(e) => {
                    tracing::warn!("Not using data in {}: {}", path.display(), e);
                    BTreeMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("No seen index at {}, starting empty", path.display());
                BTreeMap::new()
            }
            Err(e) => {
                tracing::warn!("Could not read {}: {}", path.display(), e);
                BTreeMap::new()
            }
        };

        let index = Self {
            searches,
            path: Some(path.to_path_buf()),
        };
        tracing::debug!(
            "Loaded seen index with {} searches and {} urls",
            index.searches.len(),
            index.len()
        );
        index
    }

    pub fn has(&self, search: &str, url: &str) -> bool {
        self.searches
            .get(search)
            .is_some_and(|urls| urls.contains(url))
    }

    /// Insert `url` under `search`. Returns `false` if it was already present.
    pub fn mark_seen(&mut self, search: &str, url: &str) -> bool {
        self.searches
            .entry(search.to_string())
            .or_default()
            .insert(url.to_string())
    }

    /// Mark `url` as seen and, when the index has a backing file, persist it.
    ///
    /// The in-memory entry is kept even if the write fails.
    pub fn record(&mut self, search: &str, url: &str) -> Result<()> {
        if !self.mark_seen(search, url) {
            return Ok(());
        }
        match self.path.clone() {
            Some(path) => self.persist(&path),
            None => Ok(()),
        }
    }

    /// Write the whole index to `path`.
    ///
    /// The snapshot is written to a temporary file next to `path` and renamed
    /// over it, so a crash mid-write leaves the previous snapshot in place.
    pub fn persist(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let snapshot: SnapshotFormat = self
            .searches
            .iter()
            .map(|(search, urls)| {
                let urls = urls.iter().map(|url| (url.clone(), true)).collect();
                (search.clone(), urls)
            })
            .collect();

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let write_snapshot = || -> std::result::Result<(), Box<dyn std::error::Error>> {
            std::fs::create_dir_all(dir)?;
            let mut file = NamedTempFile::new_in(dir)?;
            serde_json::to_writer(&mut file, &snapshot)?;
            file.flush()?;
            file.persist(path)?;
            Ok(())
        };

        write_snapshot().map_err(|e| AppError::Persistence(format!("could not write {}: {}", path.display(), e)))
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Total number of seen URLs across all searches.
    pub fn len(&self) -> usize {
        self.searches.values().map(BTreeSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
