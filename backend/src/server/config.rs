//! HTTP server configuration object and helpers.

use actix_web::cookie::{Key, SameSite};
use backend::inbound::http::state::HttpState;
use std::net::SocketAddr;

/// Builder-style configuration for creating the HTTP server.
pub struct ServerConfig {
    pub(crate) key: Key,
    pub(crate) cookie_secure: bool,
    pub(crate) same_site: SameSite,
    pub(crate) bind_addr: SocketAddr,
    pub(crate) http_state: HttpState,
}

impl ServerConfig {
    /// Construct a server configuration around fully wired handler state.
    #[must_use]
    pub fn new(
        key: Key,
        cookie_secure: bool,
        same_site: SameSite,
        bind_addr: SocketAddr,
        http_state: HttpState,
    ) -> Self {
        Self {
            key,
            cookie_secure,
            same_site,
            bind_addr,
            http_state,
        }
    }

    /// Return the socket address the server will bind to.
    #[must_use]
    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
    }
}
