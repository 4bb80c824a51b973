//! User messaging collaborator.
//!
//! The engine surfaces only fatal per-movie failures to the user; how they
//! are displayed (dialog, toast, log window) is the embedder's business.

use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageLevel {
    Info,
    Warn,
    Error,
}

/// Push-style notification seam.
pub trait Messenger: Send + Sync {
    fn push(&self, level: MessageLevel, subject: &str, detail: &str);
}

/// Default messenger that forwards everything to the log.
#[derive(Debug, Default)]
pub struct LogMessenger;

impl Messenger for LogMessenger {
    fn push(&self, level: MessageLevel, subject: &str, detail: &str) {
        match level {
            MessageLevel::Info => info!(subject, "{detail}"),
            MessageLevel::Warn => warn!(subject, "{detail}"),
            MessageLevel::Error => error!(subject, "{detail}"),
        }
    }
}
