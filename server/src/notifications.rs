//! Development notification transport.
//!
//! Writes every outbound notification to the log instead of a mail
//! provider. The engine treats delivery as best-effort either way.

use meetlocal_core::notification::{Notification, Notifier, NotifyError};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Notifier that logs deliveries instead of sending mail
#[derive(Clone, Debug, Default)]
pub struct LoggingNotifier;

impl LoggingNotifier {
    /// Creates the notifier
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Creates an Arc-wrapped instance for sharing
    #[must_use]
    pub fn shared() -> Arc<dyn Notifier> {
        Arc::new(Self::new())
    }
}

impl Notifier for LoggingNotifier {
    fn send(
        &self,
        notification: Notification,
    ) -> Pin<Box<dyn Future<Output = Result<(), NotifyError>> + Send + '_>> {
        Box::pin(async move {
            tracing::info!(
                template = notification.template(),
                recipient = %notification.recipient().email,
                locale = %notification.recipient().locale,
                "notification dispatched"
            );
            Ok(())
        })
    }
}
