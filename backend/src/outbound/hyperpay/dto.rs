//! Wire shapes of the HyperPay COPYandPAY API.
//!
//! Only the fields the adapter reads are typed; the full response is kept as
//! raw JSON for audit.

use serde::Deserialize;
use serde_json::Value;

use crate::domain::{BillingDetails, CheckoutRequest, PaymentResult};

/// `result` object present on every provider response.
#[derive(Debug, Deserialize)]
pub(super) struct ResultDto {
    pub(super) code: String,
    #[serde(default)]
    pub(super) description: String,
}

/// Envelope of checkout creation and status responses.
#[derive(Debug, Deserialize)]
pub(super) struct ResponseDto {
    pub(super) id: Option<String>,
    pub(super) result: Option<ResultDto>,
}

/// Decoded body with the raw payload alongside.
pub(super) struct DecodedResponse {
    pub(super) dto: ResponseDto,
    pub(super) raw: Value,
}

pub(super) fn decode(body: &[u8]) -> Result<DecodedResponse, String> {
    let raw: Value =
        serde_json::from_slice(body).map_err(|error| format!("invalid provider JSON: {error}"))?;
    let dto: ResponseDto = serde_json::from_value(raw.clone())
        .map_err(|error| format!("unexpected provider payload: {error}"))?;
    Ok(DecodedResponse { dto, raw })
}

impl DecodedResponse {
    /// Provider verdict; a body without `result.code` is a decode failure.
    pub(super) fn into_payment_result(self) -> Result<PaymentResult, String> {
        let result = self
            .dto
            .result
            .ok_or_else(|| "provider response lacks result.code".to_owned())?;
        Ok(PaymentResult {
            code: result.code,
            description: result.description,
            raw: self.raw,
        })
    }
}

/// Form fields of a checkout creation request.
pub(super) fn checkout_form(
    entity_id: &str,
    request: &CheckoutRequest,
) -> Vec<(&'static str, String)> {
    let BillingDetails {
        given_name,
        surname,
        email,
        street,
        city,
        state,
        country,
        postcode,
    } = &request.billing;
    vec![
        ("entityId", entity_id.to_owned()),
        ("amount", request.amount.to_string()),
        ("currency", request.currency.clone()),
        ("paymentType", "DB".to_owned()),
        ("merchantTransactionId", request.merchant_transaction_id.clone()),
        ("customer.email", email.clone()),
        ("customer.givenName", given_name.clone()),
        ("customer.surname", surname.clone()),
        ("billing.street1", street.clone()),
        ("billing.city", city.clone()),
        ("billing.state", state.clone()),
        ("billing.country", country.clone()),
        ("billing.postcode", postcode.clone()),
    ]
}
