use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use pagewise::{ItemId, SelectionSet};

use crate::Result;
use crate::selection::SelectionSync;

/// Key holding the selected ids as a JSON array.
pub const SELECTED_ITEMS_KEY: &str = "selectedItems";
/// Key holding the raw search term.
pub const SEARCH_TERM_KEY: &str = "searchTerm";
/// Key holding the selection sync marker as JSON `{version, dirty}`.
pub const SELECTION_SYNC_KEY: &str = "selectionSync";

/// Durable string key/value storage that survives a restart of the client.
pub trait LocalStore {
    fn get(&self, key: &str) -> Result<Option<String>>;

    fn set(&mut self, key: &str, value: &str) -> Result<()>;

    fn remove(&mut self, key: &str) -> Result<()>;
}

/// Non-durable store, for tests and embedders that persist elsewhere.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LocalStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }
}

/// A JSON object on disk; every write rewrites the file.
#[derive(Clone, Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl FileStore {
    /// Opens `path`, starting empty if the file does not exist yet.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let entries = match fs::read(&path) {
            Ok(bytes) if bytes.is_empty() => BTreeMap::new(),
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self { path, entries })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(&self.entries)?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, bytes)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl LocalStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        self.flush()
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        if self.entries.remove(key).is_some() {
            self.flush()?;
        }
        Ok(())
    }
}

/// What a previous session left behind.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SavedSession {
    pub selected: SelectionSet,
    pub search: String,
    pub sync: SelectionSync,
}

impl SavedSession {
    /// Reads the session entries. Missing or unreadable entries fall back to empty values.
    pub fn load<S: LocalStore + ?Sized>(store: &S) -> Result<Self> {
        let selected = match store.get(SELECTED_ITEMS_KEY)? {
            Some(raw) => match serde_json::from_str::<Vec<ItemId>>(&raw) {
                Ok(ids) => ids.into_iter().collect(),
                Err(e) => {
                    tracing::warn!(target: "pagewise_client", error = %e, "ignoring corrupt saved selection");
                    SelectionSet::new()
                }
            },
            None => SelectionSet::new(),
        };
        let sync = match store.get(SELECTION_SYNC_KEY)? {
            Some(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                tracing::warn!(target: "pagewise_client", error = %e, "ignoring corrupt sync marker");
                // Without a marker the saved selection cannot be trusted over the server's.
                SelectionSync::default()
            }),
            None if selected.is_empty() => SelectionSync::default(),
            // A selection saved without a marker was never confirmed.
            None => SelectionSync {
                version: None,
                dirty: true,
            },
        };
        let search = store.get(SEARCH_TERM_KEY)?.unwrap_or_default();
        Ok(Self {
            selected,
            search,
            sync,
        })
    }
}

pub(crate) fn save_selection<S: LocalStore + ?Sized>(
    store: &mut S,
    selected: &SelectionSet,
    sync: &SelectionSync,
) -> Result<()> {
    store.set(SELECTED_ITEMS_KEY, &serde_json::to_string(selected)?)?;
    store.set(SELECTION_SYNC_KEY, &serde_json::to_string(sync)?)
}

pub(crate) fn save_search<S: LocalStore + ?Sized>(store: &mut S, search: &str) -> Result<()> {
    store.set(SEARCH_TERM_KEY, search)
}
