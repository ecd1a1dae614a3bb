//! User-visible notifications.
//!
//! A GUI would show `warn` as a toast and `alert` as a modal dialog. The CLI
//! prints both to stderr. Tests record them.

use std::sync::Mutex;

use log::{error, warn};

/// Shown when the consultant photo is far from square.
pub const SQUARE_PHOTO_WARNING: &str =
    "Lütfen kare formatına yakın bir danışman fotoğrafı yükleyin.";

/// Shown when the story image could not be produced.
pub const EXPORT_FAILED_ALERT: &str = "Görsel oluşturulurken bir hata oluştu!";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Warning(String),
    Alert(String),
}

pub trait Notifier: Send + Sync {
    /// Non-blocking warning; the operation that raised it continues.
    fn warn(&self, message: &str);

    /// Blocking failure message.
    fn alert(&self, message: &str);
}

/// Writes notices to stderr.
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn warn(&self, message: &str) {
        warn!("user warning: {}", message);
        eprintln!("Uyarı: {}", message);
    }

    fn alert(&self, message: &str) {
        error!("user alert: {}", message);
        eprintln!("Hata: {}", message);
    }
}

/// Keeps notices in memory.
#[derive(Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().map(|n| n.clone()).unwrap_or_default()
    }

    fn push(&self, notice: Notice) {
        if let Ok(mut n) = self.notices.lock() {
            n.push(notice);
        }
    }
}

impl Notifier for RecordingNotifier {
    fn warn(&self, message: &str) {
        self.push(Notice::Warning(message.to_string()));
    }

    fn alert(&self, message: &str) {
        self.push(Notice::Alert(message.to_string()));
    }
}
