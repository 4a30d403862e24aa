//! Push notification payloads and best-effort dispatch.
//!
//! Notifications are fire-and-forget: a missing device id skips the send and
//! a dispatcher failure is logged, never propagated to the caller.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use super::ports::Notifier;

/// Message templates known to the push dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NotificationTemplate {
    NewRequest,
    BookingPending,
    BookingAccepted,
    BookingRejected,
    PaymentPending,
    PaymentReceived,
    BookingInProgress,
    BookingCompleted,
    BookingConfirmed,
    ReviewPending,
    TalentReviewPending,
    ClientReviewPending,
    BookingCanceledByUser,
    BookingCanceledByTalent,
    RescheduleRequestedByUser,
    RescheduleRequestedByTalent,
    Rescheduled,
    RescheduleApproved,
    RescheduleRejected,
}

impl NotificationTemplate {
    /// Template key sent to the dispatcher.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NewRequest => "newRequest",
            Self::BookingPending => "bookingPending",
            Self::BookingAccepted => "bookingAccepted",
            Self::BookingRejected => "bookingRejected",
            Self::PaymentPending => "paymentPending",
            Self::PaymentReceived => "paymentReceived",
            Self::BookingInProgress => "bookingInProgress",
            Self::BookingCompleted => "bookingCompleted",
            Self::BookingConfirmed => "bookingConfirmed",
            Self::ReviewPending => "reviewPending",
            Self::TalentReviewPending => "talentReviewPending",
            Self::ClientReviewPending => "clientReviewPending",
            Self::BookingCanceledByUser => "bookingCanceledByUser",
            Self::BookingCanceledByTalent => "bookingCanceledByTalent",
            Self::RescheduleRequestedByUser => "rescheduleRequestedByUser",
            Self::RescheduleRequestedByTalent => "rescheduleRequestedByTalent",
            Self::Rescheduled => "rescheduled",
            Self::RescheduleApproved => "rescheduleApproved",
            Self::RescheduleRejected => "rescheduleRejected",
        }
    }
}

impl fmt::Display for NotificationTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A templated push message addressed to one or more devices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub template: NotificationTemplate,
    pub player_ids: Vec<String>,
    pub variables: BTreeMap<String, String>,
    pub data: Value,
}

impl Notification {
    /// Start a notification with no recipients.
    pub fn new(template: NotificationTemplate) -> Self {
        Self {
            template,
            player_ids: Vec::new(),
            variables: BTreeMap::new(),
            data: Value::Null,
        }
    }

    /// Add a device when one is registered.
    #[must_use]
    pub fn to_player(mut self, player_id: Option<&str>) -> Self {
        if let Some(id) = player_id {
            if !self.player_ids.iter().any(|existing| existing == id) {
                self.player_ids.push(id.to_owned());
            }
        }
        self
    }

    /// Set a template variable.
    #[must_use]
    pub fn with_variable(mut self, key: &str, value: impl Into<String>) -> Self {
        self.variables.insert(key.to_owned(), value.into());
        self
    }

    /// Attach structured metadata for the client app.
    #[must_use]
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = data;
        self
    }
}

/// Send `notification`, skipping it when nobody can receive it.
pub async fn dispatch(notifier: &dyn Notifier, notification: Notification) {
    if notification.player_ids.is_empty() {
        debug!(
            template = %notification.template,
            "skipping notification without registered devices"
        );
        return;
    }
    if let Err(error) = notifier.notify(&notification).await {
        warn!(
            template = %notification.template,
            recipients = notification.player_ids.len(),
            error = %error,
            "notification dispatch failed"
        );
    }
}
