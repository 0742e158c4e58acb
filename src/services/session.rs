use axum::http::{HeaderMap, HeaderValue, header};
use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::config::Config;

/// Login sessions: opaque cookie token to user id. Entries expire after the
/// configured TTL and are lost on restart.
#[derive(Clone)]
pub struct SessionStore {
    tokens: Cache<String, i32>,
    cookie_name: Arc<str>,
    ttl: Duration,
}

impl SessionStore {
    #[must_use]
    pub fn new(config: &Config) -> Self {
        let ttl = Duration::from_secs(config.session_ttl_seconds);
        Self {
            tokens: Cache::builder()
                .max_capacity(config.session_max_entries)
                .time_to_live(ttl)
                .build(),
            cookie_name: Arc::from(config.session_cookie_name.as_str()),
            ttl,
        }
    }

    /// Start a session for `user_id` and return its token.
    pub async fn issue(&self, user_id: i32) -> String {
        let token = Uuid::new_v4().to_string();
        self.tokens.insert(token.clone(), user_id).await;
        tracing::debug!(user_id, "Session issued");
        token
    }

    pub async fn user_id(&self, token: &str) -> Option<i32> {
        self.tokens.get(token).await
    }

    /// User bound to the session cookie of a request, if any.
    pub async fn current_user(&self, headers: &HeaderMap) -> Option<i32> {
        let token = cookie_value(headers, &self.cookie_name)?;
        self.user_id(&token).await
    }

    /// Session cookie of a request, only if it names a live session.
    #[must_use]
    pub fn live_token(&self, headers: &HeaderMap) -> Option<String> {
        cookie_value(headers, &self.cookie_name).filter(|token| self.tokens.contains_key(token))
    }

    /// `Set-Cookie` value binding `token` to the client.
    #[must_use]
    pub fn cookie(&self, token: &str) -> Option<HeaderValue> {
        HeaderValue::from_str(&format!(
            "{}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
            self.cookie_name,
            self.ttl.as_secs()
        ))
        .ok()
    }
}

/// Value of cookie `name` in the request's `Cookie` headers.
#[must_use]
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_string())
}
