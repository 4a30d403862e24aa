//! HyperPay outbound adapter.
//!
//! Implements the `PaymentGateway` port over the provider's hosted checkout
//! HTTP API.

mod dto;
mod http_gateway;

pub use http_gateway::{DEFAULT_TIMEOUT, HyperPayConfig, HyperPayGateway};
