//! The chat session: single owner of the active conversation and the dialog
//! archive.
//!
//! Every mutating method changes the in-memory state first and then writes
//! the whole state through to the [`StateStore`]. A failed write never rolls
//! the in-memory change back; it is reported through [`Committed`], a host
//! notification and a [`SessionEvent::PersistFailed`] event.
//!
//! The session is a cheap clonable handle. The state lock is never held
//! across the provider call, so clearing or archiving stays possible while a
//! reply is pending.

use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::mpsc::UnboundedSender;

use crate::chat::{ConversationStore, Dialog, DialogArchive, Message, Sender};
use crate::error::{ParleyError, Result};
use crate::i18n::{Locale, TextKey};
use crate::id::{IdGenerator, UuidGenerator};
use crate::notify::{LogNotifier, Notifier};
use crate::provider::{CompletionProvider, FALLBACK_REPLY};
use crate::storage::{PersistedState, StateStore};

/// State change notifications for the presentation layer.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    MessageAppended(Message),
    ConversationCleared,
    DialogSaved { id: String },
    DialogDeleted { id: String },
    DialogRestored { id: String },
    HistoryCleared,
    ResponsePending,
    ResponseSettled,
    ResponseDiscarded,
    PersistFailed(String),
}

#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub discard_stale_responses: bool,
    pub fallback_reply: String,
    pub locale: Locale,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            discard_stale_responses: false,
            fallback_reply: FALLBACK_REPLY.to_string(),
            locale: Locale::En,
        }
    }
}

/// Result of a mutation that has been applied in memory. `persist_error` is
/// set when the write-through that followed it failed.
#[derive(Debug)]
#[must_use]
pub struct Committed<T> {
    pub value: T,
    pub persist_error: Option<ParleyError>,
}

impl<T> Committed<T> {
    pub fn is_durable(&self) -> bool {
        self.persist_error.is_none()
    }

    pub fn into_value(self) -> T {
        self.value
    }

    /// Treat a failed write as an error.
    pub fn into_result(self) -> Result<T> {
        match self.persist_error {
            Some(e) => Err(e),
            None => Ok(self.value),
        }
    }
}

/// How a pending send was resolved.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// The provider answered and the reply was appended.
    Answered(Message),
    /// The provider failed; the fallback text was appended instead.
    Fallback(Message),
    /// The conversation changed while waiting and the reply was dropped.
    Discarded,
}

impl Reply {
    pub fn message(&self) -> Option<&Message> {
        match self {
            Reply::Answered(m) | Reply::Fallback(m) => Some(m),
            Reply::Discarded => None,
        }
    }
}

#[derive(Debug)]
pub struct SendOutcome {
    pub user: Message,
    pub reply: Reply,
    /// Write-through failures hit while the exchange was recorded.
    pub persist_errors: Vec<ParleyError>,
}

struct SessionState {
    conversation: ConversationStore,
    archive: DialogArchive,
    pending: bool,
    /// Bumped whenever the conversation is replaced (clear, archive, restore).
    epoch: u64,
}

impl SessionState {
    fn persisted(&self) -> PersistedState {
        PersistedState {
            messages: self.conversation.snapshot(),
            dialog_history: self.archive.dialogs().to_vec(),
        }
    }

    fn reset_conversation(&mut self) {
        self.conversation.clear();
        self.epoch += 1;
    }
}

/// Clears the pending flag if a send is abandoned mid-flight.
struct PendingGuard {
    state: Arc<Mutex<SessionState>>,
    armed: bool,
}

impl PendingGuard {
    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        if self.armed {
            let mut state = self.state.lock().unwrap_or_else(|p| p.into_inner());
            state.pending = false;
        }
    }
}

#[derive(Clone)]
pub struct ChatSession {
    state: Arc<Mutex<SessionState>>,
    store: Arc<dyn StateStore>,
    provider: Arc<dyn CompletionProvider>,
    notifier: Arc<dyn Notifier>,
    events: Option<UnboundedSender<SessionEvent>>,
    options: SessionOptions,
}

impl ChatSession {
    /// Rehydrate a session from `store`. Unreadable storage starts empty.
    pub fn load(store: Arc<dyn StateStore>, provider: Arc<dyn CompletionProvider>) -> Self {
        Self::load_with_ids(store, provider, Arc::new(UuidGenerator))
    }

    pub fn load_with_ids(
        store: Arc<dyn StateStore>,
        provider: Arc<dyn CompletionProvider>,
        ids: Arc<dyn IdGenerator>,
    ) -> Self {
        let persisted = store.load();
        tracing::info!(
            messages = persisted.messages.len(),
            dialogs = persisted.dialog_history.len(),
            "Chat session loaded"
        );

        let state = SessionState {
            conversation: ConversationStore::from_messages(persisted.messages, ids.clone()),
            archive: DialogArchive::from_dialogs(persisted.dialog_history, ids),
            pending: false,
            epoch: 0,
        };

        Self {
            state: Arc::new(Mutex::new(state)),
            store,
            provider,
            notifier: Arc::new(LogNotifier),
            events: None,
            options: SessionOptions::default(),
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_events(mut self, events: UnboundedSender<SessionEvent>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn with_options(mut self, options: SessionOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    pub fn messages(&self) -> Vec<Message> {
        self.lock().conversation.snapshot()
    }

    pub fn dialogs(&self) -> Vec<Dialog> {
        self.lock().archive.dialogs().to_vec()
    }

    pub fn find_dialog(&self, dialog_id: &str) -> Option<Dialog> {
        self.lock().archive.find(dialog_id).cloned()
    }

    /// Frozen copy of the active conversation.
    pub fn snapshot(&self) -> Vec<Message> {
        self.lock().conversation.snapshot()
    }

    pub fn is_pending(&self) -> bool {
        self.lock().pending
    }

    /// Append a finalized message to the active conversation.
    ///
    /// User messages are refused while a reply is pending.
    pub fn append(&self, sender: Sender, text: impl Into<String>) -> Result<Committed<Message>> {
        let mut state = self.lock();
        if sender == Sender::User && state.pending {
            return Err(ParleyError::precondition("a reply is still pending"));
        }
        let message = state.conversation.append(sender, text)?;
        self.emit(SessionEvent::MessageAppended(message.clone()));
        let persist_error = self.write_through(&state);
        Ok(Committed {
            value: message,
            persist_error,
        })
    }

    /// Empty the active conversation. Does not cancel a pending reply.
    pub fn clear(&self) -> Committed<()> {
        let mut state = self.lock();
        state.reset_conversation();
        self.emit(SessionEvent::ConversationCleared);
        let persist_error = self.write_through(&state);
        Committed {
            value: (),
            persist_error,
        }
    }

    /// Archive a copy of the active conversation, leaving it in place.
    pub fn save_dialog(&self) -> Result<Committed<Dialog>> {
        let mut state = self.lock();
        let snapshot = state.conversation.snapshot();
        let dialog = state.archive.save(snapshot)?;
        self.emit(SessionEvent::DialogSaved {
            id: dialog.id.clone(),
        });
        self.notifier
            .notify(self.options.locale.text(TextKey::DialogSaved));
        let persist_error = self.write_through(&state);
        Ok(Committed {
            value: dialog,
            persist_error,
        })
    }

    /// Archive the active conversation and start a fresh one. Both changes
    /// land in a single write.
    pub fn archive_conversation(&self) -> Result<Committed<Dialog>> {
        let mut state = self.lock();
        let snapshot = state.conversation.snapshot();
        let dialog = state.archive.save(snapshot)?;
        state.reset_conversation();
        self.emit(SessionEvent::DialogSaved {
            id: dialog.id.clone(),
        });
        self.emit(SessionEvent::ConversationCleared);
        self.notifier
            .notify(self.options.locale.text(TextKey::DialogSaved));
        let persist_error = self.write_through(&state);
        Ok(Committed {
            value: dialog,
            persist_error,
        })
    }

    /// Remove an archived dialog. Storage is only touched when something was
    /// removed.
    pub fn delete_dialog(&self, dialog_id: &str) -> Committed<bool> {
        let mut state = self.lock();
        if !state.archive.delete(dialog_id) {
            return Committed {
                value: false,
                persist_error: None,
            };
        }
        self.emit(SessionEvent::DialogDeleted {
            id: dialog_id.to_string(),
        });
        let persist_error = self.write_through(&state);
        Committed {
            value: true,
            persist_error,
        }
    }

    pub fn clear_history(&self) -> Committed<()> {
        let mut state = self.lock();
        state.archive.clear_all();
        self.emit(SessionEvent::HistoryCleared);
        let persist_error = self.write_through(&state);
        Committed {
            value: (),
            persist_error,
        }
    }

    /// Replace the active conversation with the contents of an archived
    /// dialog. Messages are re-appended with fresh ids; the dialog stays in
    /// the archive. Returns `None` for an unknown id.
    pub fn restore_dialog(&self, dialog_id: &str) -> Option<Committed<Vec<Message>>> {
        let mut state = self.lock();
        let source = state.archive.find(dialog_id)?.messages.clone();

        state.reset_conversation();
        let mut restored = Vec::with_capacity(source.len());
        for message in source {
            match state.conversation.append(message.sender, message.text) {
                Ok(m) => restored.push(m),
                Err(e) => tracing::warn!("Skipping unrestorable message {}: {}", message.id, e),
            }
        }

        self.emit(SessionEvent::DialogRestored {
            id: dialog_id.to_string(),
        });
        let persist_error = self.write_through(&state);
        Some(Committed {
            value: restored,
            persist_error,
        })
    }

    /// Send a user message and record the assistant's reply.
    ///
    /// Provider failures never escape: the fallback reply is appended and the
    /// host is notified. The reply goes to whichever conversation is active
    /// when it arrives, unless stale replies are configured to be discarded.
    pub async fn send(&self, text: &str) -> Result<SendOutcome> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ParleyError::precondition("message text must not be empty"));
        }

        let mut persist_errors = Vec::new();
        let (user, context, epoch_at_send) = {
            let mut state = self.lock();
            if state.pending {
                return Err(ParleyError::precondition("a reply is still pending"));
            }
            let user = state.conversation.append(Sender::User, text)?;
            state.pending = true;
            self.emit(SessionEvent::MessageAppended(user.clone()));
            self.emit(SessionEvent::ResponsePending);
            persist_errors.extend(self.write_through(&state));
            (user, state.conversation.snapshot(), state.epoch)
        };

        let mut guard = PendingGuard {
            state: self.state.clone(),
            armed: true,
        };

        let result = self.provider.complete(&context).await;

        let mut state = self.lock();
        guard.disarm();
        state.pending = false;
        self.emit(SessionEvent::ResponseSettled);

        let (reply_text, failed) = match result {
            Ok(reply) if !reply.trim().is_empty() => (reply, false),
            Ok(_) => {
                tracing::warn!("Provider returned an empty reply");
                (self.fallback_text(), true)
            }
            Err(e) => {
                tracing::warn!("Provider failed: {}", e);
                (self.fallback_text(), true)
            }
        };
        if failed {
            self.notifier
                .notify(self.options.locale.text(TextKey::ProviderFailed));
        }

        if self.options.discard_stale_responses && state.epoch != epoch_at_send {
            tracing::debug!("Conversation changed while waiting; dropping reply");
            self.emit(SessionEvent::ResponseDiscarded);
            return Ok(SendOutcome {
                user,
                reply: Reply::Discarded,
                persist_errors,
            });
        }

        let bot = state.conversation.append(Sender::Bot, reply_text)?;
        self.emit(SessionEvent::MessageAppended(bot.clone()));
        persist_errors.extend(self.write_through(&state));

        let reply = if failed {
            Reply::Fallback(bot)
        } else {
            Reply::Answered(bot)
        };
        Ok(SendOutcome {
            user,
            reply,
            persist_errors,
        })
    }

    /// Configured fallback text, or [`FALLBACK_REPLY`] when it is blank.
    fn fallback_text(&self) -> String {
        if self.options.fallback_reply.trim().is_empty() {
            FALLBACK_REPLY.to_string()
        } else {
            self.options.fallback_reply.clone()
        }
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn emit(&self, event: SessionEvent) {
        if let Some(ref tx) = self.events {
            let _ = tx.send(event);
        }
    }

    /// Flush the full state to storage. Called with the state lock held so
    /// writes land in mutation order.
    fn write_through(&self, state: &SessionState) -> Option<ParleyError> {
        match self.store.save(&state.persisted()) {
            Ok(()) => None,
            Err(e) => {
                tracing::warn!("Failed to persist chat state: {}", e);
                self.emit(SessionEvent::PersistFailed(e.to_string()));
                self.notifier
                    .notify(self.options.locale.text(TextKey::PersistFailed));
                Some(e)
            }
        }
    }
}
