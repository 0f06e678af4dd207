//! Notification recorder.

use meetlocal_core::notification::{Notification, Notifier, NotifyError};
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// Notifier that captures everything it is asked to send
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Notification>>,
    fail: AtomicBool,
}

impl RecordingNotifier {
    /// Creates a recorder that delivers everything
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes subsequent sends fail, for best-effort-path tests
    pub fn fail_deliveries(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Everything sent so far
    #[allow(clippy::missing_panics_doc, clippy::unwrap_used)] // mutex cannot be poisoned
    #[must_use]
    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().unwrap().clone()
    }

    /// Number of sent notifications using the given template
    #[must_use]
    pub fn sent_with_template(&self, template: &str) -> usize {
        self.sent().iter().filter(|n| n.template() == template).count()
    }
}

#[allow(clippy::unwrap_used)] // mutex cannot be poisoned: no panics while held
impl Notifier for RecordingNotifier {
    fn send(
        &self,
        notification: Notification,
    ) -> Pin<Box<dyn Future<Output = Result<(), NotifyError>> + Send + '_>> {
        Box::pin(async move {
            if self.fail.load(Ordering::SeqCst) {
                return Err(NotifyError("injected delivery failure".to_string()));
            }
            self.sent.lock().unwrap().push(notification);
            Ok(())
        })
    }
}
