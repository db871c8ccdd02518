//! User-visible error surface

use parking_lot::Mutex;

/// Receives messages that should be shown to the user.
pub trait ErrorReporter: Send + Sync {
    /// Shows `message` to the user
    fn set_error_message(&self, message: &str);
}

/// Reporter that only writes messages to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogErrorReporter;

impl ErrorReporter for LogErrorReporter {
    fn set_error_message(&self, message: &str) {
        tracing::error!("{}", message);
    }
}

/// Reporter that keeps every message it receives
#[derive(Debug, Default)]
pub struct ErrorLog {
    messages: Mutex<Vec<String>>,
}

impl ErrorLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// All messages reported so far, oldest first
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().clone()
    }

    /// The most recent message, if any
    pub fn last(&self) -> Option<String> {
        self.messages.lock().last().cloned()
    }
}

impl ErrorReporter for ErrorLog {
    fn set_error_message(&self, message: &str) {
        tracing::warn!("{}", message);
        self.messages.lock().push(message.to_string());
    }
}
