use parley_cli::commands::{handle_command, CommandResult};
use parley_core::Locale;

// ========================================================================
// Command Parsing Tests (commands.rs)
// ========================================================================

#[test]
fn test_help_command() {
    let result = handle_command("/help");
    match result {
        CommandResult::Message(msg) => {
            assert!(msg.contains("Parley Commands"));
            assert!(msg.contains("/history"));
        }
        other => panic!("expected help text, got {other:?}"),
    }
}

#[test]
fn test_quit_aliases() {
    for cmd in ["/quit", "/exit", "/q"] {
        assert_eq!(handle_command(cmd), CommandResult::Quit);
    }
}

#[test]
fn test_conversation_commands() {
    assert_eq!(handle_command("/clear"), CommandResult::Clear);
    assert_eq!(handle_command("/save"), CommandResult::SaveDialog);
    assert_eq!(handle_command("/archive"), CommandResult::Archive);
    assert_eq!(handle_command("/new"), CommandResult::Archive);
}

#[test]
fn test_history_commands() {
    assert_eq!(handle_command("/history"), CommandResult::ListHistory);
    assert_eq!(handle_command("/clear-history"), CommandResult::ClearHistory);
    assert_eq!(
        handle_command("/load abc-123"),
        CommandResult::LoadDialog("abc-123".to_string())
    );
    assert_eq!(
        handle_command("/delete   abc-123  "),
        CommandResult::DeleteDialog("abc-123".to_string())
    );
}

#[test]
fn test_commands_needing_argument_show_usage() {
    assert!(matches!(handle_command("/load"), CommandResult::Message(ref m) if m.starts_with("Usage")));
    assert!(matches!(handle_command("/delete"), CommandResult::Message(ref m) if m.starts_with("Usage")));
}

#[test]
fn test_lang_command() {
    assert_eq!(handle_command("/lang ru"), CommandResult::SetLocale(Locale::Ru));
    assert!(matches!(handle_command("/lang"), CommandResult::Message(ref m) if m.contains("en, ru")));
    assert!(matches!(handle_command("/lang fr"), CommandResult::Message(ref m) if m.contains("Unsupported")));
}

#[test]
fn test_unknown_command() {
    match handle_command("/frobnicate") {
        CommandResult::Message(msg) => assert!(msg.contains("Unknown command: /frobnicate")),
        other => panic!("expected message, got {other:?}"),
    }
}

#[test]
fn test_plain_text_is_not_a_command() {
    assert_eq!(handle_command("hello there"), CommandResult::NotACommand);
    assert_eq!(handle_command("what does /clear do?"), CommandResult::NotACommand);
}
