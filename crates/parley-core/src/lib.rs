pub mod chat;
pub mod config;
pub mod error;
pub mod i18n;
pub mod id;
pub mod notify;
pub mod provider;
pub mod reveal;
pub mod session;
pub mod storage;

// Re-export key types
pub use chat::{ConversationStore, Dialog, DialogArchive, Message, Sender};
pub use config::Settings;
pub use error::{ParleyError, Result};
pub use i18n::{Locale, TextKey};
pub use id::{IdGenerator, SequentialIds, UuidGenerator};
pub use notify::{LogNotifier, Notifier};
pub use provider::{CompletionProvider, GeminiProvider, FALLBACK_REPLY};
pub use session::{ChatSession, Committed, Reply, SendOutcome, SessionEvent, SessionOptions};
pub use storage::{JsonFileStore, MemoryStore, PersistedState, StateStore};
