use std::sync::Arc;

use super::message::{now_millis, Dialog, Message};
use crate::error::{ParleyError, Result};
use crate::id::{IdGenerator, UuidGenerator};

/// Saved dialogs, most recent first.
pub struct DialogArchive {
    dialogs: Vec<Dialog>,
    ids: Arc<dyn IdGenerator>,
}

impl DialogArchive {
    pub fn new() -> Self {
        Self::with_ids(Arc::new(UuidGenerator))
    }

    pub fn with_ids(ids: Arc<dyn IdGenerator>) -> Self {
        Self {
            dialogs: Vec::new(),
            ids,
        }
    }

    pub fn from_dialogs(dialogs: Vec<Dialog>, ids: Arc<dyn IdGenerator>) -> Self {
        Self { dialogs, ids }
    }

    /// Archive a conversation snapshot as a new dialog at the front.
    ///
    /// An empty snapshot is rejected and the archive is left untouched.
    pub fn save(&mut self, messages: Vec<Message>) -> Result<Dialog> {
        if messages.is_empty() {
            return Err(ParleyError::precondition("cannot archive an empty conversation"));
        }

        let dialog = Dialog {
            id: self.ids.next_id(),
            messages,
            timestamp: now_millis(),
        };
        self.dialogs.insert(0, dialog.clone());
        Ok(dialog)
    }

    /// Remove a dialog by id. Returns whether anything was removed.
    pub fn delete(&mut self, dialog_id: &str) -> bool {
        match self.dialogs.iter().position(|d| d.id == dialog_id) {
            Some(index) => {
                self.dialogs.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn clear_all(&mut self) {
        self.dialogs.clear();
    }

    pub fn find(&self, dialog_id: &str) -> Option<&Dialog> {
        self.dialogs.iter().find(|d| d.id == dialog_id)
    }

    pub fn dialogs(&self) -> &[Dialog] {
        &self.dialogs
    }

    pub fn len(&self) -> usize {
        self.dialogs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dialogs.is_empty()
    }
}

impl Default for DialogArchive {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::{ConversationStore, Sender};
    use crate::id::SequentialIds;

    fn archive() -> DialogArchive {
        DialogArchive::with_ids(Arc::new(SequentialIds::new("dlg")))
    }

    fn conversation(texts: &[&str]) -> Vec<Message> {
        let mut store = ConversationStore::new();
        for text in texts {
            store.append(Sender::User, *text).unwrap();
        }
        store.snapshot()
    }

    #[test]
    fn test_save_inserts_most_recent_first() {
        let mut archive = archive();
        archive.save(conversation(&["one"])).unwrap();
        archive.save(conversation(&["two"])).unwrap();
        archive.save(conversation(&["three"])).unwrap();

        let ids: Vec<&str> = archive.dialogs().iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["dlg-3", "dlg-2", "dlg-1"]);
    }

    #[test]
    fn test_save_empty_is_rejected() {
        let mut archive = archive();
        archive.save(conversation(&["keep"])).unwrap();

        let err = archive.save(Vec::new()).unwrap_err();
        assert!(err.is_precondition());
        assert_eq!(archive.len(), 1);
    }

    #[test]
    fn test_saved_dialog_is_frozen_copy() {
        let mut store = ConversationStore::new();
        store.append(Sender::User, "Hi").unwrap();
        store.append(Sender::Bot, "Hello").unwrap();

        let mut archive = archive();
        let dialog = archive.save(store.snapshot()).unwrap();
        store.append(Sender::User, "after").unwrap();
        store.clear();

        assert_eq!(dialog.messages.len(), 2);
        assert_eq!(archive.find(&dialog.id).unwrap().messages.len(), 2);
    }

    #[test]
    fn test_delete_missing_returns_false() {
        let mut archive = archive();
        archive.save(conversation(&["a"])).unwrap();
        let before = archive.dialogs().to_vec();

        assert!(!archive.delete("nope"));
        assert_eq!(archive.dialogs(), before.as_slice());
    }

    #[test]
    fn test_delete_keeps_relative_order() {
        let mut archive = archive();
        for text in ["a", "b", "c", "d"] {
            archive.save(conversation(&[text])).unwrap();
        }

        assert!(archive.delete("dlg-3"));
        let ids: Vec<&str> = archive.dialogs().iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["dlg-4", "dlg-2", "dlg-1"]);
        assert!(archive.find("dlg-3").is_none());
    }

    #[test]
    fn test_clear_all() {
        let mut archive = archive();
        archive.save(conversation(&["a"])).unwrap();
        archive.save(conversation(&["b"])).unwrap();
        archive.clear_all();
        assert!(archive.is_empty());
    }
}
