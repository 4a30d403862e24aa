//! Push notification adapters.
//!
//! [`HttpPushNotifier`] posts templated messages to the push dispatcher;
//! [`LoggingNotifier`] stands in when no dispatcher is configured.

mod http_push;
mod logging;

pub use http_push::{HttpPushConfig, HttpPushNotifier};
pub use logging::LoggingNotifier;
