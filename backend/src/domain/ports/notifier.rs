//! Port for the push notification dispatcher.

use async_trait::async_trait;

use crate::domain::Notification;

use super::define_port_error;

define_port_error! {
    /// Errors raised by notifier adapters.
    pub enum NotifierError {
        /// The dispatcher could not be reached.
        Transport { message: String } =>
            "notification transport failed: {message}",
        /// The dispatcher refused the message.
        Rejected { status: u16, message: String } =>
            "notification rejected with status {status}: {message}",
    }
}

/// Fire-and-forget push dispatch.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Send a templated notification to its player ids.
    async fn notify(&self, notification: &Notification) -> Result<(), NotifierError>;
}

/// Fixture implementation that drops every notification.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureNotifier;

#[async_trait]
impl Notifier for FixtureNotifier {
    async fn notify(&self, _notification: &Notification) -> Result<(), NotifierError> {
        Ok(())
    }
}
