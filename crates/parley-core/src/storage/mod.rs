//! Durable storage for the chat state.
//!
//! The whole state (active conversation plus dialog history) lives in a
//! single versioned JSON record. Stores are write-through: the session calls
//! [`StateStore::save`] after every mutation.

mod json_file;
mod memory;

pub use json_file::JsonFileStore;
pub use memory::MemoryStore;

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::chat::{Dialog, Message};
use crate::error::{ParleyError, Result};

/// Storage key used when none is configured.
pub const DEFAULT_STORAGE_KEY: &str = "chat-storage";

/// Layout version written into every record.
pub const STATE_VERSION: u32 = 0;

/// Everything that survives a restart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedState {
    #[serde(default)]
    pub messages: Vec<Message>,
    #[serde(default, rename = "dialogHistory")]
    pub dialog_history: Vec<Dialog>,
}

impl PersistedState {
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty() && self.dialog_history.is_empty()
    }

    /// Check the invariants every reachable state holds: no blank message
    /// text, unique message ids within a message list, no empty dialogs and
    /// unique dialog ids.
    pub fn validate(&self) -> Result<()> {
        check_messages("conversation", &self.messages)?;

        let mut dialog_ids = HashSet::new();
        for dialog in &self.dialog_history {
            if dialog.messages.is_empty() {
                return Err(ParleyError::persistence(format!(
                    "Dialog {} has no messages",
                    dialog.id
                )));
            }
            if !dialog_ids.insert(dialog.id.as_str()) {
                return Err(ParleyError::persistence(format!(
                    "Duplicate dialog id {}",
                    dialog.id
                )));
            }
            check_messages(&format!("dialog {}", dialog.id), &dialog.messages)?;
        }
        Ok(())
    }
}

fn check_messages(owner: &str, messages: &[Message]) -> Result<()> {
    let mut ids = HashSet::new();
    for message in messages {
        if message.text.trim().is_empty() {
            return Err(ParleyError::persistence(format!(
                "Blank message {} in {owner}",
                message.id
            )));
        }
        if !ids.insert(message.id.as_str()) {
            return Err(ParleyError::persistence(format!(
                "Duplicate message id {} in {owner}",
                message.id
            )));
        }
    }
    Ok(())
}

#[derive(Serialize)]
struct EnvelopeRef<'a> {
    state: &'a PersistedState,
    version: u32,
}

#[derive(Deserialize)]
struct Envelope {
    state: PersistedState,
    #[serde(default)]
    version: u32,
}

/// Serialize a state into the on-disk record format.
pub fn encode(state: &PersistedState) -> Result<String> {
    let envelope = EnvelopeRef {
        state,
        version: STATE_VERSION,
    };
    serde_json::to_string_pretty(&envelope)
        .map_err(|e| ParleyError::persistence(format!("Failed to serialize chat state: {e}")))
}

/// Parse a record. Records written by a newer layout, or holding a state no
/// session could have produced, are rejected.
pub fn decode(contents: &str) -> Result<PersistedState> {
    let envelope: Envelope = serde_json::from_str(contents)
        .map_err(|e| ParleyError::persistence(format!("Failed to parse chat state: {e}")))?;

    if envelope.version > STATE_VERSION {
        return Err(ParleyError::persistence(format!(
            "Unsupported chat state version {} (expected <= {})",
            envelope.version, STATE_VERSION
        )));
    }

    envelope.state.validate()?;
    Ok(envelope.state)
}

/// Durable home of the chat state.
pub trait StateStore: Send + Sync {
    /// Read the last fully written state. Missing or unreadable storage
    /// yields the empty state.
    fn load(&self) -> PersistedState;

    /// Replace the stored state. Must leave either the old or the new record
    /// readable if the process dies midway.
    fn save(&self, state: &PersistedState) -> Result<()>;
}
