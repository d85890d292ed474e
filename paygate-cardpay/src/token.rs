//! Access tokens and their cache

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Body returned by the token endpoint
#[derive(Clone, Deserialize)]
pub struct TokenResponse {
    pub token_type: String,
    pub access_token: String,
    pub refresh_token: String,
    /// Access token lifetime in seconds
    pub expires_in: i64,
    /// Refresh token lifetime in seconds
    pub refresh_expires_in: i64,
}

/// Cached provider token with absolute expiry instants
#[derive(Clone, PartialEq, Eq)]
pub struct Token {
    pub token_type: String,
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
    pub refresh_expires_in: i64,
    pub access_expires_at: DateTime<Utc>,
    pub refresh_expires_at: DateTime<Utc>,
}

impl Token {
    /// Anchor a token response at the instant it was received
    pub fn from_response(response: TokenResponse, issued_at: DateTime<Utc>) -> Self {
        Self {
            access_expires_at: expiry(issued_at, response.expires_in),
            refresh_expires_at: expiry(issued_at, response.refresh_expires_in),
            token_type: response.token_type,
            access_token: response.access_token,
            refresh_token: response.refresh_token,
            expires_in: response.expires_in,
            refresh_expires_in: response.refresh_expires_in,
        }
    }

    pub fn is_access_valid(&self, now: DateTime<Utc>) -> bool {
        now < self.access_expires_at
    }

    pub fn is_refresh_valid(&self, now: DateTime<Utc>) -> bool {
        now < self.refresh_expires_at
    }

    /// `Authorization` header value, with the token type title-cased
    pub fn authorization(&self) -> String {
        format!("{} {}", title_case(&self.token_type), self.access_token)
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Token")
            .field("token_type", &self.token_type)
            .field("access_expires_at", &self.access_expires_at)
            .field("refresh_expires_at", &self.refresh_expires_at)
            .finish_non_exhaustive()
    }
}

// Lifetimes that are negative or overflow collapse to `issued_at`
fn expiry(issued_at: DateTime<Utc>, seconds: i64) -> DateTime<Utc> {
    Duration::try_seconds(seconds.max(0))
        .and_then(|lifetime| issued_at.checked_add_signed(lifetime))
        .unwrap_or(issued_at)
}

fn title_case(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Tokens keyed by payment method external code.
///
/// Readers share a read lock. Anyone about to refresh or re-authenticate a
/// key must hold that key's exchange lock, so at most one exchange per key
/// is in flight.
#[derive(Default)]
pub struct TokenStore {
    tokens: RwLock<HashMap<String, Token>>,
    exchange_locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl TokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, key: &str) -> Option<Token> {
        self.tokens.read().await.get(key).cloned()
    }

    pub async fn insert(&self, key: &str, token: Token) {
        self.tokens.write().await.insert(key.to_string(), token);
    }

    pub async fn remove(&self, key: &str) -> Option<Token> {
        self.tokens.write().await.remove(key)
    }

    /// Lock serializing token exchanges for `key`
    pub fn exchange_lock(&self, key: &str) -> Arc<tokio::sync::Mutex<()>> {
        self.exchange_locks
            .lock()
            .entry(key.to_string())
            .or_default()
            .clone()
    }
}

impl fmt::Debug for TokenStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenStore").finish_non_exhaustive()
    }
}
