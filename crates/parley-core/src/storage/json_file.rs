use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use super::{decode, encode, PersistedState, StateStore};
use crate::error::{ParleyError, Result};

/// Stores the chat state as `<dir>/<key>.json`.
///
/// Writes go to a sibling `.json.tmp` file which is synced and then renamed
/// over the record, so a crash mid-write leaves the previous record intact.
/// On unix the directory is synced after the rename as well.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl AsRef<Path>, key: &str) -> Self {
        Self {
            path: dir.as_ref().join(format!("{key}.json")),
        }
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn tmp_path(&self) -> PathBuf {
        self.path.with_extension("json.tmp")
    }

    fn write_record(&self, contents: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                ParleyError::persistence(format!("Failed to create storage directory: {e}"))
            })?;
        }

        let tmp_path = self.tmp_path();
        let mut file = File::create(&tmp_path).map_err(|e| {
            ParleyError::persistence(format!("Failed to create temporary state file: {e}"))
        })?;
        file.write_all(contents.as_bytes()).map_err(|e| {
            ParleyError::persistence(format!("Failed to write temporary state file: {e}"))
        })?;
        file.sync_all().map_err(|e| {
            ParleyError::persistence(format!("Failed to sync temporary state file: {e}"))
        })?;
        drop(file);

        fs::rename(&tmp_path, &self.path).map_err(|e| {
            ParleyError::persistence(format!("Failed to replace state file: {e}"))
        })?;

        self.sync_parent_dir()
    }

    /// Flush the directory entry so the rename survives a power loss.
    #[cfg(unix)]
    fn sync_parent_dir(&self) -> Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        File::open(dir).and_then(|handle| handle.sync_all()).map_err(|e| {
            ParleyError::persistence(format!("Failed to sync storage directory: {e}"))
        })
    }

    #[cfg(not(unix))]
    fn sync_parent_dir(&self) -> Result<()> {
        Ok(())
    }
}

impl StateStore for JsonFileStore {
    fn load(&self) -> PersistedState {
        if !self.path.exists() {
            tracing::debug!("No chat state at {}, starting fresh", self.path.display());
            return PersistedState::default();
        }

        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) => {
                tracing::warn!("Failed to read chat state {}: {}", self.path.display(), e);
                return PersistedState::default();
            }
        };

        match decode(&contents) {
            Ok(state) => {
                tracing::debug!(
                    messages = state.messages.len(),
                    dialogs = state.dialog_history.len(),
                    "Loaded chat state from {}",
                    self.path.display()
                );
                state
            }
            Err(e) => {
                tracing::warn!("Discarding unreadable chat state {}: {}", self.path.display(), e);
                PersistedState::default()
            }
        }
    }

    fn save(&self, state: &PersistedState) -> Result<()> {
        let contents = encode(state)?;
        self.write_record(&contents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::{Message, Sender};
    use tempfile::TempDir;

    fn state_with(text: &str) -> PersistedState {
        PersistedState {
            messages: vec![Message {
                id: "m1".to_string(),
                text: text.to_string(),
                sender: Sender::User,
                timestamp: 42,
            }],
            dialog_history: Vec::new(),
        }
    }

    #[test]
    fn test_missing_file_loads_empty() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path(), "chat-storage");
        assert!(store.load().is_empty());
    }

    #[test]
    fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path(), "chat-storage");
        let state = state_with("Hi");

        store.save(&state).unwrap();
        assert_eq!(store.path(), dir.path().join("chat-storage.json"));
        assert_eq!(store.load(), state);
        assert!(!store.tmp_path().exists());
    }

    #[test]
    fn test_save_creates_nested_directory() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path().join("a").join("b"), "state");
        store.save(&state_with("nested")).unwrap();
        assert_eq!(store.load().messages[0].text, "nested");
    }

    #[test]
    fn test_corrupt_file_loads_empty() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path(), "chat-storage");
        fs::write(store.path(), "{\"state\": [truncated").unwrap();
        assert!(store.load().is_empty());
    }

    #[test]
    fn test_leftover_tmp_file_is_ignored() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path(), "chat-storage");
        store.save(&state_with("durable")).unwrap();

        // Simulate a crash after the temporary file was partly written.
        fs::write(store.tmp_path(), "{\"state\": {\"mess").unwrap();

        assert_eq!(store.load().messages[0].text, "durable");

        store.save(&state_with("next")).unwrap();
        assert_eq!(store.load().messages[0].text, "next");
    }

    #[test]
    fn test_repeated_saves_leave_only_the_record() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path(), "chat-storage");
        for text in ["one", "two", "three"] {
            store.save(&state_with(text)).unwrap();
        }
        store.sync_parent_dir().unwrap();

        let entries: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec![std::ffi::OsString::from("chat-storage.json")]);
        assert_eq!(store.load().messages[0].text, "three");
    }

    #[test]
    fn test_save_fails_when_directory_is_a_file() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "not a directory").unwrap();

        let store = JsonFileStore::new(&blocker, "chat-storage");
        let err = store.save(&state_with("lost")).unwrap_err();
        assert!(err.is_persistence());
    }
}
