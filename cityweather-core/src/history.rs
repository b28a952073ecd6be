//! Bounded list of previously resolved city names, persisted as a pretty JSON array.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::{Config, error::HistoryError};

/// Maximum number of names kept. The oldest entry is evicted first.
pub const HISTORY_CAPACITY: usize = 10;

/// Ordered, duplicate-free, at most [`HISTORY_CAPACITY`] names, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct HistoryList(Vec<String>);

impl HistoryList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `name` unless it is empty or already present (no promotion).
    /// Evicts from the front while the list is over capacity.
    #[must_use]
    pub fn record(mut self, name: &str) -> Self {
        if name.is_empty() || self.contains(name) {
            return self;
        }
        self.0.push(name.to_string());
        while self.0.len() > HISTORY_CAPACITY {
            self.0.remove(0);
        }
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|n| n == name)
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &str> + ExactSizeIterator {
        self.0.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

// A hand-edited file may carry duplicates or too many names; replaying it
// through `record` restores the invariants.
impl From<Vec<String>> for HistoryList {
    fn from(names: Vec<String>) -> Self {
        names.iter().fold(HistoryList::new(), |list, name| list.record(name))
    }
}

impl From<HistoryList> for Vec<String> {
    fn from(list: HistoryList) -> Self {
        list.0
    }
}

/// File-backed storage for a [`HistoryList`].
#[derive(Debug, Clone)]
pub struct HistoryStore {
    path: PathBuf,
}

impl HistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        Ok(Self::new(config.history_file_path()?))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Best effort: a missing, unreadable or malformed file yields an empty list.
    pub fn load(&self) -> HistoryList {
        match self.try_load() {
            Ok(Some(list)) => {
                tracing::debug!(path = %self.path.display(), entries = list.len(), "loaded history");
                list
            }
            Ok(None) => HistoryList::new(),
            Err(e) => {
                tracing::warn!("ignoring search history: {e}");
                HistoryList::new()
            }
        }
    }

    /// Like [`load`](Self::load) but reports why a present file could not be used.
    /// `Ok(None)` means there is no file yet.
    pub fn try_load(&self) -> Result<Option<HistoryList>, HistoryError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(HistoryError::Read { path: self.path.clone(), source }),
        };

        serde_json::from_str(&contents)
            .map(Some)
            .map_err(|source| HistoryError::Parse { path: self.path.clone(), source })
    }

    /// Write the list verbatim, in order, as pretty-printed UTF-8 JSON.
    pub fn save(&self, list: &HistoryList) -> Result<(), HistoryError> {
        let body = serde_json::to_string_pretty(list).map_err(HistoryError::Serialize)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|source| HistoryError::Write { path: parent.to_path_buf(), source })?;
        }

        fs::write(&self.path, body)
            .map_err(|source| HistoryError::Write { path: self.path.clone(), source })?;

        tracing::debug!(path = %self.path.display(), entries = list.len(), "saved history");
        Ok(())
    }
}
