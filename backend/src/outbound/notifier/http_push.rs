//! HTTP push dispatcher client.
//!
//! `notify` hands the POST to a spawned task and returns at once, so a slow
//! or failing dispatcher never delays the request that triggered it. Delivery
//! failures are logged from the task.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use tracing::{debug, warn};
use zeroize::Zeroizing;

use crate::domain::ports::{Notifier, NotifierError};
use crate::domain::{Notification, TraceId};

const API_KEY_HEADER: &str = "x-api-key";

/// Dispatcher endpoint and credentials.
pub struct HttpPushConfig {
    pub endpoint: Url,
    pub api_key: Option<Zeroizing<String>>,
    pub timeout: Duration,
}

impl fmt::Debug for HttpPushConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpPushConfig")
            .field("endpoint", &self.endpoint.as_str())
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Notifier posting `{template, playerIds, variables, data}` to the dispatcher.
#[derive(Clone)]
pub struct HttpPushNotifier {
    client: Client,
    endpoint: Url,
    api_key: Option<Zeroizing<String>>,
}

impl HttpPushNotifier {
    /// Build the notifier with a client bounded by `config.timeout`.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(config: HttpPushConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            client,
            endpoint: config.endpoint,
            api_key: config.api_key,
        })
    }

    /// Deliver one notification and wait for the dispatcher's answer.
    ///
    /// # Errors
    ///
    /// Returns [`NotifierError`] on transport failure or a non-success status.
    pub async fn send(&self, notification: &Notification) -> Result<(), NotifierError> {
        let mut request = self.client.post(self.endpoint.clone()).json(notification);
        if let Some(key) = &self.api_key {
            request = request.header(API_KEY_HEADER, key.as_str());
        }
        let response = request
            .send()
            .await
            .map_err(|error| NotifierError::transport(error.without_url().to_string()))?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(NotifierError::rejected(
            status.as_u16(),
            body.chars().take(160).collect::<String>(),
        ))
    }
}

#[async_trait]
impl Notifier for HttpPushNotifier {
    async fn notify(&self, notification: &Notification) -> Result<(), NotifierError> {
        let notifier = self.clone();
        let notification = notification.clone();
        let delivery = async move {
            match notifier.send(&notification).await {
                Ok(()) => debug!(template = %notification.template, "push delivered"),
                Err(error) => warn!(
                    template = %notification.template,
                    recipients = notification.player_ids.len(),
                    error = %error,
                    "push delivery failed"
                ),
            }
        };
        match TraceId::current() {
            Some(trace_id) => tokio::spawn(TraceId::scope(trace_id, delivery)),
            None => tokio::spawn(delivery),
        };
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use serde_json::json;

    use super::*;
    use crate::domain::NotificationTemplate;

    #[rstest]
    fn config_debug_hides_the_api_key() {
        let config = HttpPushConfig {
            endpoint: Url::parse("https://push.example.test/notify").expect("url"),
            api_key: Some(Zeroizing::new("push-secret".to_owned())),
            timeout: Duration::from_secs(5),
        };
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("push-secret"));
    }

    #[rstest]
    fn wire_payload_uses_dispatcher_field_names() {
        let notification = Notification::new(NotificationTemplate::RescheduleApproved)
            .to_player(Some("device-1"))
            .with_variable("date", "2025-09-21")
            .with_data(json!({ "bookingId": "b-1" }));
        let payload = serde_json::to_value(&notification).expect("serialise");
        assert_eq!(
            payload,
            json!({
                "template": "rescheduleApproved",
                "playerIds": ["device-1"],
                "variables": { "date": "2025-09-21" },
                "data": { "bookingId": "b-1" },
            })
        );
    }

    #[tokio::test]
    async fn unreachable_dispatcher_does_not_fail_notify() {
        let notifier = HttpPushNotifier::new(HttpPushConfig {
            endpoint: Url::parse("http://127.0.0.1:9/notify").expect("url"),
            api_key: None,
            timeout: Duration::from_millis(200),
        })
        .expect("client builds");
        let notification =
            Notification::new(NotificationTemplate::NewRequest).to_player(Some("device-1"));
        notifier
            .notify(&notification)
            .await
            .expect("notify returns before delivery");
    }
}
