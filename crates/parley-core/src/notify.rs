/// Host-side popup primitive used to tell the user about failures and
/// confirmations. Nothing flows back into chat state.
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str);
}

/// Writes notifications to the log. Default when no host is attached.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, message: &str) {
        tracing::info!("notification: {}", message);
    }
}
