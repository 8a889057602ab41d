use parley_core::Locale;

/// Result of processing a slash command.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandResult {
    /// Display a message to the user.
    Message(String),
    /// Quit the application.
    Quit,
    /// Clear the active conversation.
    Clear,
    /// Archive a copy of the conversation and keep chatting.
    SaveDialog,
    /// Archive the conversation and start a new one.
    Archive,
    /// List saved dialogs.
    ListHistory,
    /// Replace the conversation with a saved dialog.
    LoadDialog(String),
    /// Delete a saved dialog.
    DeleteDialog(String),
    /// Delete all saved dialogs.
    ClearHistory,
    /// Switch interface language.
    SetLocale(Locale),
    /// Not a command - treat as regular input.
    NotACommand,
}

pub fn handle_command(input: &str) -> CommandResult {
    let input = input.trim();
    let parts: Vec<&str> = input.splitn(2, ' ').collect();
    let cmd = parts[0];
    let arg = parts.get(1).map(|s| s.trim()).unwrap_or("");

    match cmd {
        "/help" | "/h" => show_help(),
        "/exit" | "/quit" | "/q" => CommandResult::Quit,
        "/clear" => CommandResult::Clear,
        "/save" => CommandResult::SaveDialog,
        "/archive" | "/new" => CommandResult::Archive,
        "/history" => CommandResult::ListHistory,
        "/load" => {
            if arg.is_empty() {
                CommandResult::Message("Usage: /load <dialog-id>".into())
            } else {
                CommandResult::LoadDialog(arg.to_string())
            }
        }
        "/delete" => {
            if arg.is_empty() {
                CommandResult::Message("Usage: /delete <dialog-id>".into())
            } else {
                CommandResult::DeleteDialog(arg.to_string())
            }
        }
        "/clear-history" => CommandResult::ClearHistory,
        "/lang" => {
            if arg.is_empty() {
                let codes: Vec<&str> = Locale::all().iter().map(|l| l.code()).collect();
                CommandResult::Message(format!(
                    "Available languages: {}\nUsage: /lang <code>",
                    codes.join(", ")
                ))
            } else {
                match arg.parse::<Locale>() {
                    Ok(locale) => CommandResult::SetLocale(locale),
                    Err(e) => CommandResult::Message(e),
                }
            }
        }
        "/version" => CommandResult::Message(format!("Parley v{}", env!("CARGO_PKG_VERSION"))),
        _ => {
            if input.starts_with('/') {
                CommandResult::Message(format!("Unknown command: {cmd}. Type /help for commands."))
            } else {
                CommandResult::NotACommand
            }
        }
    }
}

fn show_help() -> CommandResult {
    CommandResult::Message(
        "Parley Commands:\n\
         \x20 /help              Show this help\n\
         \x20 /clear             Clear the current conversation\n\
         \x20 /save              Save the conversation to history\n\
         \x20 /archive, /new     Save the conversation and start a new one\n\
         \x20 /history           List saved dialogs\n\
         \x20 /load <id>         Load a saved dialog\n\
         \x20 /delete <id>       Delete a saved dialog\n\
         \x20 /clear-history     Delete all saved dialogs\n\
         \x20 /lang <code>       Switch language (en, ru)\n\
         \x20 /version           Show version\n\
         \x20 /quit              Exit"
            .into(),
    )
}
