use axum::http::Request;
use std::fmt;
use std::net::IpAddr;
use tower_governor::{GovernorError, key_extractor::KeyExtractor};

use crate::services::session::SessionStore;

/// Rate limit key: the login session when the cookie names a live one,
/// otherwise the client IP. The IP is taken from X-Forwarded-For, X-Real-IP,
/// then the peer address, then falls back to localhost.
#[derive(Clone)]
pub struct SessionOrIpKeyExtractor {
    sessions: SessionStore,
}

impl SessionOrIpKeyExtractor {
    #[must_use]
    pub fn new(sessions: SessionStore) -> Self {
        Self { sessions }
    }
}

impl fmt::Debug for SessionOrIpKeyExtractor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionOrIpKeyExtractor").finish_non_exhaustive()
    }
}

impl KeyExtractor for SessionOrIpKeyExtractor {
    type Key = String;

    fn extract<T>(&self, req: &Request<T>) -> Result<Self::Key, GovernorError> {
        // Unknown tokens are free to mint, so they share the IP bucket
        if let Some(token) = self.sessions.live_token(req.headers()) {
            return Ok(format!("session:{token}"));
        }
        Ok(format!("ip:{}", client_ip(req)))
    }
}

fn client_ip<T>(req: &Request<T>) -> IpAddr {
    // Reverse proxies put the client first in the chain
    if let Some(ip) = req
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .and_then(|first| first.trim().parse::<IpAddr>().ok())
    {
        return ip;
    }

    if let Some(ip) = req
        .headers()
        .get("x-real-ip")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<IpAddr>().ok())
    {
        return ip;
    }

    if let Some(connect_info) = req
        .extensions()
        .get::<axum::extract::ConnectInfo<std::net::SocketAddr>>()
    {
        return connect_info.0.ip();
    }

    // Requests without identifiable IP share one bucket
    IpAddr::V4(std::net::Ipv4Addr::LOCALHOST)
}
