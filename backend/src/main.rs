//! Backend entry-point: loads settings, migrates the database and serves the
//! booking API.

mod server;

use actix_web::cookie::Key;
use actix_web::web;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use backend::inbound::http::health::HealthState;
use backend::outbound::persistence::{DbPool, PoolConfig, run_pending_migrations};
use backend::settings::{AppSettings, ServerSettings};
use server::{ServerConfig, build_http_state, create_server};

/// `Key::derive_from` needs at least 256 bits of material.
const MIN_KEY_MATERIAL: usize = 32;

fn io_error(error: impl std::fmt::Display) -> std::io::Error {
    std::io::Error::other(error.to_string())
}

/// Session key from the key file, or a generated one in development.
fn load_session_key(settings: &ServerSettings) -> std::io::Result<Key> {
    let key_path = settings.session_key_file();
    match std::fs::read(&key_path) {
        Ok(bytes) if bytes.len() >= MIN_KEY_MATERIAL => Ok(Key::derive_from(&bytes)),
        Ok(bytes) => Err(std::io::Error::other(format!(
            "session key at {} holds {} bytes; at least {MIN_KEY_MATERIAL} required",
            key_path.display(),
            bytes.len()
        ))),
        Err(e) => {
            if cfg!(debug_assertions) || settings.session_allow_ephemeral {
                warn!(
                    path = %key_path.display(),
                    error = %e,
                    "using temporary session key (dev only)"
                );
                Ok(Key::generate())
            } else {
                Err(std::io::Error::other(format!(
                    "failed to read session key at {}: {e}",
                    key_path.display()
                )))
            }
        }
    }
}

/// Application bootstrap.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = AppSettings::load().map_err(io_error)?;
    let key = load_session_key(&settings.server)?;
    let database_url = settings.server.database_url().map_err(io_error)?;

    if settings.server.run_migrations {
        run_pending_migrations(database_url)
            .await
            .map_err(io_error)?;
    }

    let pool = DbPool::new(
        PoolConfig::new(database_url).with_max_size(settings.server.pool_max_size()),
    )
    .await
    .map_err(io_error)?;

    let http_state = build_http_state(&pool, &settings)?;
    let config = ServerConfig::new(
        key,
        settings.server.cookie_secure,
        settings.server.cookie_same_site().map_err(io_error)?,
        settings.server.bind_addr().map_err(io_error)?,
        http_state,
    );
    info!(bind_addr = %config.bind_addr(), "starting booking backend");

    let health_state = web::Data::new(HealthState::new());
    let server = create_server(health_state, config)?;
    server.await
}
