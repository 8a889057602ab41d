use std::io::Write;
use std::time::Duration;

use futures::StreamExt;
use parley_core::reveal::stream_reveal;
use parley_core::{ChatSession, Dialog, Locale, Message, Notifier, SessionOptions, Settings, TextKey};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::commands::{handle_command, CommandResult};

/// Length of the dialog preview shown in `/history`.
const PREVIEW_CHARS: usize = 30;

/// Prints host notifications to stderr.
pub struct TerminalNotifier;

impl Notifier for TerminalNotifier {
    fn notify(&self, message: &str) {
        eprintln!("[!] {message}");
    }
}

/// What the loop should do after a line of input.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    Idle,
    Output(String),
    Send(String),
    Quit,
}

pub struct App {
    session: ChatSession,
    locale: Locale,
    reveal_chunk: usize,
    reveal_delay: Duration,
}

impl App {
    pub fn new(session: ChatSession, settings: &Settings) -> Self {
        Self {
            session,
            locale: settings.ui.locale,
            reveal_chunk: settings.ui.reveal_chunk_chars,
            reveal_delay: Duration::from_millis(settings.ui.reveal_delay_ms),
        }
    }

    pub fn session(&self) -> &ChatSession {
        &self.session
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    /// Interpret one line of input. Slash commands run immediately; anything
    /// else is handed back to be sent.
    pub fn dispatch(&mut self, input: &str) -> Step {
        let input = input.trim();
        if input.is_empty() {
            return Step::Idle;
        }

        match handle_command(input) {
            CommandResult::NotACommand => Step::Send(input.to_string()),
            CommandResult::Quit => Step::Quit,
            CommandResult::Message(text) => Step::Output(text),
            CommandResult::Clear => {
                self.session.clear().into_value();
                Step::Output(self.locale.text(TextKey::ClearContext).to_string())
            }
            CommandResult::SaveDialog => match self.session.save_dialog() {
                Ok(committed) => Step::Output(format!(
                    "{} {}",
                    self.locale.text(TextKey::SavedAs),
                    committed.into_value().id
                )),
                Err(e) => Step::Output(e.to_string()),
            },
            CommandResult::Archive => match self.session.archive_conversation() {
                Ok(committed) => Step::Output(format!(
                    "{}: {}",
                    self.locale.text(TextKey::NewDialog),
                    committed.into_value().id
                )),
                Err(e) => Step::Output(e.to_string()),
            },
            CommandResult::ListHistory => {
                Step::Output(render_history(&self.session.dialogs(), self.locale))
            }
            CommandResult::LoadDialog(id) => match self.session.restore_dialog(&id) {
                Some(committed) => Step::Output(render_conversation(&committed.into_value())),
                None => Step::Output(self.dialog_not_found(&id)),
            },
            CommandResult::DeleteDialog(id) => {
                if self.session.delete_dialog(&id).into_value() {
                    Step::Output(format!("{} {id}", self.locale.text(TextKey::DialogDeleted)))
                } else {
                    Step::Output(self.dialog_not_found(&id))
                }
            }
            CommandResult::ClearHistory => {
                self.session.clear_history().into_value();
                Step::Output(self.locale.text(TextKey::ClearHistory).to_string())
            }
            CommandResult::SetLocale(locale) => {
                self.locale = locale;
                let options = SessionOptions {
                    locale,
                    ..self.session.options().clone()
                };
                self.session = self.session.clone().with_options(options);
                Step::Output(format!("{}: {}", locale.text(TextKey::Language), locale.code()))
            }
        }
    }

    fn dialog_not_found(&self, id: &str) -> String {
        format!("{} {id}", self.locale.text(TextKey::DialogNotFound))
    }

    /// Send a message and reveal the reply as it "types".
    pub async fn exchange(&self, text: &str) -> anyhow::Result<()> {
        let outcome = self.session.send(text).await?;
        if let Some(reply) = outcome.reply.message() {
            self.reveal(&reply.text).await?;
        }
        Ok(())
    }

    async fn reveal(&self, text: &str) -> anyhow::Result<()> {
        let mut stdout = std::io::stdout();
        let mut frames = stream_reveal(text.to_string(), self.reveal_chunk, self.reveal_delay);
        let mut shown = 0;
        write!(stdout, "bot> ")?;
        while let Some(frame) = frames.next().await {
            write!(stdout, "{}", &frame[shown..])?;
            stdout.flush()?;
            shown = frame.len();
        }
        writeln!(stdout)?;
        Ok(())
    }
}

pub fn render_message(message: &Message) -> String {
    let who = if message.is_user() { "you" } else { "bot" };
    format!("{who}> {}", message.text)
}

pub fn render_conversation(messages: &[Message]) -> String {
    messages
        .iter()
        .map(render_message)
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_history(dialogs: &[Dialog], locale: Locale) -> String {
    if dialogs.is_empty() {
        return locale.text(TextKey::NoHistory).to_string();
    }

    let mut out = format!("{}:", locale.text(TextKey::History));
    for dialog in dialogs {
        let when = chrono::DateTime::from_timestamp_millis(dialog.timestamp)
            .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_default();
        out.push_str(&format!(
            "\n  {}  {}  ({})  {}",
            dialog.id,
            when,
            dialog.message_count(),
            dialog.preview(PREVIEW_CHARS)
        ));
    }
    out
}

/// Interactive loop over stdin until EOF or `/quit`.
pub async fn run_repl(mut app: App) -> anyhow::Result<()> {
    let existing = app.session().messages();
    if !existing.is_empty() {
        println!("{}", render_conversation(&existing));
    }
    println!("{}  (/help)", app.locale().text(TextKey::TypeMessage));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };

        match app.dispatch(&line) {
            Step::Idle => {}
            Step::Output(text) => println!("{text}"),
            Step::Send(text) => app.exchange(&text).await?,
            Step::Quit => break,
        }
    }

    Ok(())
}

pub async fn run_single_prompt(app: &App, prompt: &str) -> anyhow::Result<()> {
    app.exchange(prompt).await
}
