//! Typewriter-style reveal of a finalized reply.
//!
//! Purely presentational: the partial strings produced here are for display
//! only and are never appended to a conversation.

use futures::channel::mpsc;
use std::time::Duration;

/// Iterator over growing prefixes of `text`, `step` characters at a time.
/// The last item is always the full text. Empty text yields nothing.
pub struct Typewriter<'a> {
    text: &'a str,
    step: usize,
    pos: usize,
}

impl<'a> Typewriter<'a> {
    pub fn new(text: &'a str, step: usize) -> Self {
        Self {
            text,
            step: step.max(1),
            pos: 0,
        }
    }
}

impl<'a> Iterator for Typewriter<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos >= self.text.len() {
            return None;
        }
        let rest = &self.text[self.pos..];
        let advance = rest
            .char_indices()
            .nth(self.step)
            .map_or(rest.len(), |(offset, _)| offset);
        self.pos += advance;
        Some(&self.text[..self.pos])
    }
}

/// Pace a [`Typewriter`] over time. Each prefix is sent on the returned
/// channel, `delay` apart; the channel closes after the full text.
pub fn stream_reveal(text: String, step: usize, delay: Duration) -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded();
    tokio::spawn(async move {
        let mut first = true;
        for partial in Typewriter::new(&text, step) {
            if !first {
                tokio::time::sleep(delay).await;
            }
            first = false;
            if tx.unbounded_send(partial.to_string()).is_err() {
                break;
            }
        }
    });
    rx
}
