use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use palaver_core::store::KeyValueStore;

/// A [`KeyValueStore`] persisted as a flat JSON object.
///
/// The file is read once when opened and rewritten on every `set`.
/// Read and write failures are logged and otherwise ignored, so a broken
/// file behaves like an empty one.
///
/// I/O is blocking. The orchestrator only writes while it is being built
/// (two small markers), which is fine on a runtime thread; a store that
/// may block for long should do its writes elsewhere.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: Mutex<HashMap<String, String>>,
}

impl FileStore {
    /// Opens the store at `path`. The file is created on the first write.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = load_entries(&path);
        Self {
            path,
            entries: Mutex::new(entries),
        }
    }

    /// The default preference file, `palaver/prefs.json` under the user's
    /// config directory.
    pub fn default_path() -> Option<PathBuf> {
        Some(dirs::config_dir()?.join("palaver").join("prefs.json"))
    }

    /// The file backing this store.
    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save(&self, entries: &HashMap<String, String>) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(entries)?;
        fs::write(&self.path, content)
    }
}

fn load_entries(path: &Path) -> HashMap<String, String> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return HashMap::new();
        }
        Err(err) => {
            warn!("failed to read {}: {err}", path.display());
            return HashMap::new();
        }
    };
    serde_json::from_str(&content).unwrap_or_else(|err| {
        warn!("ignoring malformed {}: {err}", path.display());
        HashMap::new()
    })
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        let mut entries =
            self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.insert(key.to_owned(), value.to_owned());
        if let Err(err) = self.save(&entries) {
            warn!("failed to write {}: {err}", self.path.display());
        }
    }
}
