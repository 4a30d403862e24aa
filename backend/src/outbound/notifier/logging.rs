//! Notifier that only records what would have been sent.

use async_trait::async_trait;
use tracing::info;

use crate::domain::Notification;
use crate::domain::ports::{Notifier, NotifierError};

/// Writes each notification to the log instead of delivering it.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingNotifier;

#[async_trait]
impl Notifier for LoggingNotifier {
    async fn notify(&self, notification: &Notification) -> Result<(), NotifierError> {
        info!(
            template = %notification.template,
            recipients = notification.player_ids.len(),
            "push dispatcher not configured; notification logged only"
        );
        Ok(())
    }
}
