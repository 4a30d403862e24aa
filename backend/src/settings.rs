//! Runtime configuration loaded via OrthoConfig.
//!
//! Each section reads its own environment prefix (`SERVER_`, `PAYMENT_`,
//! `NOTIFIER_`, `BOOKING_`) plus any discovered configuration file. Accessors
//! apply defaults and turn raw strings into the typed configs the adapters
//! and services take.

use std::ffi::OsString;
use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use actix_web::cookie::SameSite;
use ortho_config::OrthoConfig;
use serde::Deserialize;
use url::Url;
use zeroize::Zeroizing;

use crate::domain::{BillingDetails, BookingServiceConfig, PaymentServiceConfig};
use crate::inbound::http::state::PaymentRedirectUrls;
use crate::outbound::hyperpay::HyperPayConfig;
use crate::outbound::notifier::HttpPushConfig;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_POOL_SIZE: u32 = 10;
const DEFAULT_SESSION_KEY_FILE: &str = "/var/run/secrets/session_key";
const DEFAULT_HYPERPAY_BASE_URL: &str = "https://eu-test.oppwa.com";
const DEFAULT_CURRENCY: &str = "SAR";
const DEFAULT_PAYMENT_TIMEOUT_SECS: u64 = 15;
const DEFAULT_NOTIFIER_TIMEOUT_SECS: u64 = 5;

/// Failures turning raw settings into typed configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettingsError {
    /// A section could not be read from the environment or files.
    #[error("failed to load {section} settings: {message}")]
    Load {
        section: &'static str,
        message: String,
    },
    /// A mandatory value is absent.
    #[error("{key} must be set")]
    Missing { key: &'static str },
    /// A value is present but unusable.
    #[error("{key} is invalid: {message}")]
    Invalid { key: &'static str, message: String },
}

impl SettingsError {
    fn invalid(key: &'static str, message: impl fmt::Display) -> Self {
        Self::Invalid {
            key,
            message: message.to_string(),
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn parse_url(key: &'static str, raw: &str) -> Result<Url, SettingsError> {
    Url::parse(raw).map_err(|error| SettingsError::invalid(key, error))
}

/// HTTP listener, database and session settings.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "SERVER")]
pub struct ServerSettings {
    /// Listen address, default `0.0.0.0:8080`.
    pub bind_addr: Option<String>,
    /// PostgreSQL connection URL.
    pub database_url: Option<String>,
    /// Maximum pooled connections.
    pub pool_max_size: Option<u32>,
    /// File holding the session signing key material.
    pub session_key_file: Option<PathBuf>,
    /// Mark the session cookie `Secure`.
    #[ortho_config(default = true)]
    pub cookie_secure: bool,
    /// `lax`, `strict` or `none`.
    pub cookie_same_site: Option<String>,
    /// Accept a generated session key when the key file is unreadable.
    #[ortho_config(default = false)]
    pub session_allow_ephemeral: bool,
    /// Run embedded migrations before serving.
    #[ortho_config(default = true)]
    pub run_migrations: bool,
}

impl ServerSettings {
    /// Socket address to bind.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Invalid`] when the address does not parse.
    pub fn bind_addr(&self) -> Result<SocketAddr, SettingsError> {
        non_empty(self.bind_addr.as_deref())
            .unwrap_or(DEFAULT_BIND_ADDR)
            .parse()
            .map_err(|error| SettingsError::invalid("SERVER_BIND_ADDR", error))
    }

    /// Database URL; startup fails without one.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Missing`] when unset.
    pub fn database_url(&self) -> Result<&str, SettingsError> {
        non_empty(self.database_url.as_deref()).ok_or(SettingsError::Missing {
            key: "SERVER_DATABASE_URL",
        })
    }

    pub fn pool_max_size(&self) -> u32 {
        self.pool_max_size.unwrap_or(DEFAULT_POOL_SIZE)
    }

    pub fn session_key_file(&self) -> PathBuf {
        self.session_key_file
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SESSION_KEY_FILE))
    }

    /// `SameSite` attribute of the session cookie, default `Lax`.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Invalid`] for unknown values.
    pub fn cookie_same_site(&self) -> Result<SameSite, SettingsError> {
        match non_empty(self.cookie_same_site.as_deref())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            None | Some("lax") => Ok(SameSite::Lax),
            Some("strict") => Ok(SameSite::Strict),
            Some("none") => Ok(SameSite::None),
            Some(other) => Err(SettingsError::invalid(
                "SERVER_COOKIE_SAME_SITE",
                format!("expected lax, strict or none, got {other}"),
            )),
        }
    }
}

/// HyperPay credentials, currency, redirects and billing fallbacks.
#[derive(Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "PAYMENT")]
pub struct PaymentSettings {
    /// Provider API origin.
    pub base_url: Option<String>,
    pub entity_id: Option<String>,
    pub access_token: Option<String>,
    /// ISO 4217 code, default `SAR`.
    pub currency: Option<String>,
    /// Provider call timeout in seconds.
    pub timeout_secs: Option<u64>,
    pub success_url: Option<String>,
    pub failure_url: Option<String>,
    pub error_url: Option<String>,
    pub billing_email: Option<String>,
    pub billing_street: Option<String>,
    pub billing_city: Option<String>,
    pub billing_state: Option<String>,
    pub billing_country: Option<String>,
    pub billing_postcode: Option<String>,
}

impl fmt::Debug for PaymentSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PaymentSettings")
            .field("base_url", &self.base_url)
            .field("entity_id", &self.entity_id)
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .field("currency", &self.currency)
            .field("timeout_secs", &self.timeout_secs)
            .finish_non_exhaustive()
    }
}

impl PaymentSettings {
    /// Gateway configuration for [`crate::outbound::hyperpay::HyperPayGateway`].
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError`] when credentials are missing or the base URL
    /// does not parse.
    pub fn hyperpay_config(&self) -> Result<HyperPayConfig, SettingsError> {
        let base_url = parse_url(
            "PAYMENT_BASE_URL",
            non_empty(self.base_url.as_deref()).unwrap_or(DEFAULT_HYPERPAY_BASE_URL),
        )?;
        let entity_id = non_empty(self.entity_id.as_deref()).ok_or(SettingsError::Missing {
            key: "PAYMENT_ENTITY_ID",
        })?;
        let access_token =
            non_empty(self.access_token.as_deref()).ok_or(SettingsError::Missing {
                key: "PAYMENT_ACCESS_TOKEN",
            })?;
        Ok(HyperPayConfig {
            base_url,
            entity_id: entity_id.to_owned(),
            access_token: Zeroizing::new(access_token.to_owned()),
            timeout: Duration::from_secs(
                self.timeout_secs.unwrap_or(DEFAULT_PAYMENT_TIMEOUT_SECS),
            ),
        })
    }

    /// Currency and billing fallbacks for the payment service.
    pub fn service_config(&self) -> PaymentServiceConfig {
        let defaults = BillingDetails::default();
        let pick = |value: &Option<String>, fallback: String| {
            non_empty(value.as_deref()).map_or(fallback, str::to_owned)
        };
        PaymentServiceConfig {
            currency: non_empty(self.currency.as_deref())
                .unwrap_or(DEFAULT_CURRENCY)
                .to_ascii_uppercase(),
            billing_defaults: BillingDetails {
                email: pick(&self.billing_email, defaults.email),
                street: pick(&self.billing_street, defaults.street),
                city: pick(&self.billing_city, defaults.city),
                state: pick(&self.billing_state, defaults.state),
                country: pick(&self.billing_country, defaults.country),
                postcode: pick(&self.billing_postcode, defaults.postcode),
                given_name: defaults.given_name,
                surname: defaults.surname,
            },
        }
    }

    /// Browser targets after the provider redirect.
    pub fn redirect_urls(&self) -> PaymentRedirectUrls {
        let defaults = PaymentRedirectUrls::default();
        let pick = |value: &Option<String>, fallback: String| {
            non_empty(value.as_deref()).map_or(fallback, str::to_owned)
        };
        PaymentRedirectUrls {
            success: pick(&self.success_url, defaults.success),
            failure: pick(&self.failure_url, defaults.failure),
            error: pick(&self.error_url, defaults.error),
        }
    }
}

/// Push dispatcher endpoint; notifications are only logged without one.
#[derive(Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "NOTIFIER")]
pub struct NotifierSettings {
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    pub timeout_secs: Option<u64>,
}

impl fmt::Debug for NotifierSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotifierSettings")
            .field("endpoint", &self.endpoint)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl NotifierSettings {
    /// HTTP push configuration, or `None` when no endpoint is configured.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Invalid`] when the endpoint does not parse.
    pub fn push_config(&self) -> Result<Option<HttpPushConfig>, SettingsError> {
        let Some(endpoint) = non_empty(self.endpoint.as_deref()) else {
            return Ok(None);
        };
        Ok(Some(HttpPushConfig {
            endpoint: parse_url("NOTIFIER_ENDPOINT", endpoint)?,
            api_key: non_empty(self.api_key.as_deref())
                .map(|key| Zeroizing::new(key.to_owned())),
            timeout: Duration::from_secs(
                self.timeout_secs.unwrap_or(DEFAULT_NOTIFIER_TIMEOUT_SECS),
            ),
        }))
    }
}

/// Booking lifecycle switches.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "BOOKING")]
pub struct BookingSettings {
    /// Reject status changes outside the transition table.
    #[ortho_config(default = true)]
    pub enforce_transitions: bool,
}

impl BookingSettings {
    pub fn service_config(&self) -> BookingServiceConfig {
        BookingServiceConfig {
            enforce_transitions: self.enforce_transitions,
        }
    }
}

/// Every settings section.
#[derive(Debug, Clone)]
pub struct AppSettings {
    pub server: ServerSettings,
    pub payment: PaymentSettings,
    pub notifier: NotifierSettings,
    pub booking: BookingSettings,
}

impl AppSettings {
    /// Load every section from the environment and configuration files.
    ///
    /// Command-line arguments are not consulted; the binary takes none.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Load`] naming the section that failed.
    pub fn load() -> Result<Self, SettingsError> {
        fn args() -> [OsString; 1] {
            [OsString::from("booking-backend")]
        }
        fn load_error<E: fmt::Display>(section: &'static str) -> impl FnOnce(E) -> SettingsError {
            move |error| SettingsError::Load {
                section,
                message: error.to_string(),
            }
        }

        Ok(Self {
            server: ServerSettings::load_from_iter(args()).map_err(load_error("server"))?,
            payment: PaymentSettings::load_from_iter(args()).map_err(load_error("payment"))?,
            notifier: NotifierSettings::load_from_iter(args()).map_err(load_error("notifier"))?,
            booking: BookingSettings::load_from_iter(args()).map_err(load_error("booking"))?,
        })
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for settings parsing and defaults.

    use super::*;

    use env_lock::lock_env;
    use rstest::rstest;

    const SERVER_KEYS: [&str; 4] = [
        "SERVER_BIND_ADDR",
        "SERVER_DATABASE_URL",
        "SERVER_COOKIE_SECURE",
        "SERVER_COOKIE_SAME_SITE",
    ];
    const PAYMENT_KEYS: [&str; 6] = [
        "PAYMENT_BASE_URL",
        "PAYMENT_ENTITY_ID",
        "PAYMENT_ACCESS_TOKEN",
        "PAYMENT_CURRENCY",
        "PAYMENT_SUCCESS_URL",
        "PAYMENT_BILLING_CITY",
    ];

    fn cleared(keys: &[&'static str]) -> Vec<(&'static str, Option<String>)> {
        keys.iter().map(|key| (*key, None)).collect()
    }

    fn with(
        mut vars: Vec<(&'static str, Option<String>)>,
        key: &'static str,
        value: &str,
    ) -> Vec<(&'static str, Option<String>)> {
        vars.retain(|(existing, _)| *existing != key);
        vars.push((key, Some(value.to_owned())));
        vars
    }

    fn server() -> ServerSettings {
        ServerSettings::load_from_iter([OsString::from("backend")]).expect("server settings")
    }

    fn payment() -> PaymentSettings {
        PaymentSettings::load_from_iter([OsString::from("backend")]).expect("payment settings")
    }

    #[rstest]
    fn server_defaults_apply() {
        let _guard = lock_env(cleared(&SERVER_KEYS));

        let settings = server();
        assert_eq!(
            settings.bind_addr().expect("bind addr"),
            DEFAULT_BIND_ADDR.parse::<SocketAddr>().expect("addr")
        );
        assert!(settings.cookie_secure);
        assert_eq!(settings.cookie_same_site().expect("same site"), SameSite::Lax);
        assert_eq!(settings.pool_max_size(), DEFAULT_POOL_SIZE);
        assert_eq!(
            settings.database_url(),
            Err(SettingsError::Missing {
                key: "SERVER_DATABASE_URL"
            })
        );
    }

    #[rstest]
    fn server_environment_overrides_are_respected() {
        let vars = with(cleared(&SERVER_KEYS), "SERVER_BIND_ADDR", "127.0.0.1:9090");
        let vars = with(vars, "SERVER_DATABASE_URL", "postgres://localhost/bookings");
        let vars = with(vars, "SERVER_COOKIE_SECURE", "false");
        let vars = with(vars, "SERVER_COOKIE_SAME_SITE", "Strict");
        let _guard = lock_env(vars);

        let settings = server();
        assert_eq!(
            settings.bind_addr().expect("bind addr").to_string(),
            "127.0.0.1:9090"
        );
        assert_eq!(
            settings.database_url().expect("database url"),
            "postgres://localhost/bookings"
        );
        assert!(!settings.cookie_secure);
        assert_eq!(
            settings.cookie_same_site().expect("same site"),
            SameSite::Strict
        );
    }

    #[rstest]
    fn payment_requires_credentials() {
        let _guard = lock_env(cleared(&PAYMENT_KEYS));

        let error = payment().hyperpay_config().expect_err("missing entity id");
        assert_eq!(
            error,
            SettingsError::Missing {
                key: "PAYMENT_ENTITY_ID"
            }
        );
    }

    #[rstest]
    fn payment_settings_build_typed_configs() {
        let vars = with(cleared(&PAYMENT_KEYS), "PAYMENT_ENTITY_ID", "8a8294174b7ecb28");
        let vars = with(vars, "PAYMENT_ACCESS_TOKEN", "secret-token");
        let vars = with(vars, "PAYMENT_CURRENCY", "usd");
        let vars = with(vars, "PAYMENT_SUCCESS_URL", "https://app.example/paid");
        let vars = with(vars, "PAYMENT_BILLING_CITY", "Jeddah");
        let _guard = lock_env(vars);

        let settings = payment();
        let gateway = settings.hyperpay_config().expect("gateway config");
        assert_eq!(gateway.base_url.as_str(), "https://eu-test.oppwa.com/");
        assert_eq!(gateway.entity_id, "8a8294174b7ecb28");
        assert_eq!(gateway.timeout, Duration::from_secs(15));

        let service = settings.service_config();
        assert_eq!(service.currency, "USD");
        assert_eq!(service.billing_defaults.city, "Jeddah");
        assert_eq!(service.billing_defaults.country, "SA");

        let urls = settings.redirect_urls();
        assert_eq!(urls.success, "https://app.example/paid");
        assert_eq!(urls.error, PaymentRedirectUrls::default().error);

        assert!(!format!("{settings:?}").contains("secret-token"));
    }

    #[rstest]
    fn notifier_without_endpoint_is_disabled() {
        let _guard = lock_env([
            ("NOTIFIER_ENDPOINT", None::<String>),
            ("NOTIFIER_API_KEY", None::<String>),
        ]);

        let settings = NotifierSettings::load_from_iter([OsString::from("backend")])
            .expect("notifier settings");
        assert!(settings.push_config().expect("push config").is_none());
    }

    #[rstest]
    fn notifier_rejects_malformed_endpoints() {
        let _guard = lock_env([("NOTIFIER_ENDPOINT", Some("not a url".to_owned()))]);

        let settings = NotifierSettings::load_from_iter([OsString::from("backend")])
            .expect("notifier settings");
        assert!(matches!(
            settings.push_config(),
            Err(SettingsError::Invalid {
                key: "NOTIFIER_ENDPOINT",
                ..
            })
        ));
    }

    #[rstest]
    fn transitions_are_enforced_by_default() {
        let _guard = lock_env([("BOOKING_ENFORCE_TRANSITIONS", None::<String>)]);

        let settings =
            BookingSettings::load_from_iter([OsString::from("backend")]).expect("booking settings");
        assert!(settings.service_config().enforce_transitions);
    }
}
