// Library interface for parley-cli so integration tests can reach the
// command parser and the input dispatcher.

pub mod app;
pub mod commands;

pub use app::{App, Step};
pub use commands::{handle_command, CommandResult};
