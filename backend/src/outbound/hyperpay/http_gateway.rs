//! Reqwest-backed HyperPay gateway adapter.
//!
//! This adapter owns transport details only: form encoding, bearer
//! authentication, the client timeout, HTTP status mapping and JSON decoding.
//! The access token is sent as a header and never appears in errors or logs.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use tracing::debug;
use zeroize::Zeroizing;

use super::dto::{checkout_form, decode};
use crate::domain::payment_service::CHECKOUT_PATH_PREFIX;
use crate::domain::ports::{PaymentGateway, PaymentGatewayError};
use crate::domain::{CheckoutRequest, CheckoutSession, PaymentLookup, PaymentResult};

/// Default bound on a provider round trip.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Connection settings for the HyperPay API.
pub struct HyperPayConfig {
    /// API origin, e.g. `https://eu-test.oppwa.com`.
    pub base_url: Url,
    /// Merchant entity id sent with every call.
    pub entity_id: String,
    /// Bearer token; wiped on drop.
    pub access_token: Zeroizing<String>,
    pub timeout: Duration,
}

impl fmt::Debug for HyperPayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HyperPayConfig")
            .field("base_url", &self.base_url.as_str())
            .field("entity_id", &self.entity_id)
            .field("access_token", &"<redacted>")
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Payment gateway speaking the COPYandPAY checkout API.
pub struct HyperPayGateway {
    client: Client,
    base_url: Url,
    entity_id: String,
    access_token: Zeroizing<String>,
}

impl HyperPayGateway {
    /// Build the gateway with a client bounded by `config.timeout`.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(config: HyperPayConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            client,
            base_url: config.base_url,
            entity_id: config.entity_id,
            access_token: config.access_token,
        })
    }

    fn lookup_url(&self, lookup: &PaymentLookup) -> Result<Url, PaymentGatewayError> {
        let path = match lookup {
            PaymentLookup::ResourcePath(path) => {
                let Some(rest) = path.strip_prefix(CHECKOUT_PATH_PREFIX) else {
                    return Err(PaymentGatewayError::invalid_request(format!(
                        "resource path must start with {CHECKOUT_PATH_PREFIX}"
                    )));
                };
                if !rest.split('/').all(is_safe_segment) {
                    return Err(PaymentGatewayError::invalid_request(
                        "resource path contains unsupported characters",
                    ));
                }
                path.clone()
            }
            PaymentLookup::CheckoutId(id) => {
                if !is_safe_segment(id) {
                    return Err(PaymentGatewayError::invalid_request(
                        "checkout id contains unsupported characters",
                    ));
                }
                format!("{CHECKOUT_PATH_PREFIX}{id}/payment")
            }
        };
        let mut url = self
            .base_url
            .join(&path)
            .map_err(|error| PaymentGatewayError::invalid_request(error.to_string()))?;
        url.query_pairs_mut()
            .append_pair("entityId", &self.entity_id);
        Ok(url)
    }

    fn checkouts_url(&self) -> Result<Url, PaymentGatewayError> {
        self.base_url
            .join("/v1/checkouts")
            .map_err(|error| PaymentGatewayError::invalid_request(error.to_string()))
    }
}

fn is_safe_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'.' | b'-' | b'_'))
        && segment != "."
        && segment != ".."
}

#[async_trait]
impl PaymentGateway for HyperPayGateway {
    async fn create_checkout(
        &self,
        request: &CheckoutRequest,
    ) -> Result<CheckoutSession, PaymentGatewayError> {
        let response = self
            .client
            .post(self.checkouts_url()?)
            .bearer_auth(self.access_token.as_str())
            .form(&checkout_form(&self.entity_id, request))
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let body = response.bytes().await.map_err(map_transport_error)?;
        if !status.is_success() {
            return Err(map_status_error(status, body.as_ref()));
        }

        let decoded = decode(body.as_ref()).map_err(PaymentGatewayError::decode)?;
        let checkout_id = decoded
            .dto
            .id
            .clone()
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| PaymentGatewayError::decode("checkout response lacks an id"))?;
        debug!(
            merchant_transaction_id = %request.merchant_transaction_id,
            checkout_id = %checkout_id,
            "provider checkout created"
        );
        Ok(CheckoutSession {
            checkout_id,
            raw: decoded.raw,
        })
    }

    async fn fetch_result(
        &self,
        lookup: &PaymentLookup,
    ) -> Result<PaymentResult, PaymentGatewayError> {
        let response = self
            .client
            .get(self.lookup_url(lookup)?)
            .bearer_auth(self.access_token.as_str())
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let body = response.bytes().await.map_err(map_transport_error)?;
        // Declined payments come back as 4xx with a result code; those are
        // verdicts, not transport failures.
        if status.is_success() || status.is_client_error() {
            if let Ok(decoded) = decode(body.as_ref()) {
                if decoded.dto.result.is_some() {
                    return decoded
                        .into_payment_result()
                        .map_err(PaymentGatewayError::decode);
                }
            }
        }
        if !status.is_success() {
            return Err(map_status_error(status, body.as_ref()));
        }
        decode(body.as_ref())
            .and_then(|decoded| decoded.into_payment_result())
            .map_err(PaymentGatewayError::decode)
    }
}

fn map_transport_error(error: reqwest::Error) -> PaymentGatewayError {
    let timed_out = error.is_timeout();
    let message = error.without_url().to_string();
    if timed_out {
        PaymentGatewayError::timeout(message)
    } else {
        PaymentGatewayError::transport(message)
    }
}

fn map_status_error(status: StatusCode, body: &[u8]) -> PaymentGatewayError {
    let message = decode(body)
        .ok()
        .and_then(|decoded| decoded.dto.result)
        .map(|result| format!("{} {}", result.code, result.description).trim().to_owned())
        .unwrap_or_else(|| body_preview(body));
    PaymentGatewayError::status(status.as_u16(), message)
}

fn body_preview(body: &[u8]) -> String {
    const PREVIEW_CHAR_LIMIT: usize = 160;

    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview: String = compact.chars().take(PREVIEW_CHAR_LIMIT).collect();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}
