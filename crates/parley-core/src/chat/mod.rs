mod archive;
mod conversation;
mod message;

pub use archive::DialogArchive;
pub use conversation::ConversationStore;
pub use message::{Dialog, Message, Sender};
