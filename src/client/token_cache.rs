//! # Token Cache
//!
//! Caches the OAuth access token used for document delivery and refreshes it shortly before
//! it expires.
//!
//! A token is reused while `elapsed <= lifetime - buffer`. Once the elapsed time since the
//! token was issued strictly exceeds that threshold, the next request exchanges the refresh
//! credential for a new token. A failed exchange propagates to the caller and leaves the
//! cached state untouched.
//!
//! Concurrent callers serialize on a single async mutex, so at most one exchange is in
//! flight at a time.

use crate::config::{ConfigurationError, GoogleConfig};
use crate::error::{FulfillmentError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Source of time for expiry decisions
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Access token returned by an exchange
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AccessToken {
    pub access_token: String,
    /// Lifetime in seconds
    pub expires_in: i64,
    #[serde(default)]
    pub token_type: Option<String>,
}

/// Exchanges the long-lived refresh credential for an access token
#[async_trait]
pub trait TokenExchange: Send + Sync {
    async fn exchange(&self) -> Result<AccessToken>;
}

#[derive(Serialize)]
struct RefreshGrant<'a> {
    grant_type: &'static str,
    client_id: &'a str,
    client_secret: &'a str,
    refresh_token: &'a str,
}

/// OAuth refresh-token grant against the identity provider's `token` endpoint
pub struct OAuthRefreshExchange {
    http: Client,
    token_url: Url,
    client_id: String,
    client_secret: String,
    refresh_token: String,
}

impl std::fmt::Debug for OAuthRefreshExchange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthRefreshExchange")
            .field("token_url", &self.token_url.as_str())
            .field("client_id", &self.client_id)
            .finish_non_exhaustive()
    }
}

impl OAuthRefreshExchange {
    pub fn new(config: &GoogleConfig, timeout: Duration) -> Result<Self> {
        let token_url = Url::parse(&config.oauth_base_url)
            .and_then(|base| base.join("token"))
            .map_err(|e| {
                ConfigurationError::invalid_value(
                    "google.oauth_base_url",
                    &config.oauth_base_url,
                    e.to_string(),
                )
            })?;

        Ok(Self {
            http: Client::builder().timeout(timeout).build()?,
            token_url,
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            refresh_token: config.refresh_token.clone(),
        })
    }
}

#[async_trait]
impl TokenExchange for OAuthRefreshExchange {
    async fn exchange(&self) -> Result<AccessToken> {
        let grant = RefreshGrant {
            grant_type: "refresh_token",
            client_id: &self.client_id,
            client_secret: &self.client_secret,
            refresh_token: &self.refresh_token,
        };

        let response = self
            .http
            .post(self.token_url.clone())
            .json(&grant)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FulfillmentError::Authentication(format!(
                "token exchange returned status {status}"
            )));
        }

        let token: AccessToken = response.json().await.map_err(|e| {
            FulfillmentError::Authentication(format!("malformed token response: {e}"))
        })?;

        if token.access_token.is_empty() {
            return Err(FulfillmentError::Authentication(
                "token response has no access_token".to_string(),
            ));
        }

        Ok(token)
    }
}

#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    issued_at: DateTime<Utc>,
    lifetime_seconds: i64,
}

impl CachedToken {
    fn needs_refresh(&self, now: DateTime<Utc>, buffer_seconds: i64) -> bool {
        let elapsed_ms = (now - self.issued_at).num_milliseconds();
        let usable_ms = (self.lifetime_seconds - buffer_seconds).saturating_mul(1000);
        elapsed_ms > usable_ms
    }
}

pub struct TokenCache {
    exchange: Arc<dyn TokenExchange>,
    buffer_seconds: i64,
    clock: Clock,
    state: Mutex<Option<CachedToken>>,
}

impl std::fmt::Debug for TokenCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCache")
            .field("buffer_seconds", &self.buffer_seconds)
            .finish_non_exhaustive()
    }
}

impl TokenCache {
    pub fn new(exchange: Arc<dyn TokenExchange>, buffer_seconds: i64) -> Self {
        Self::with_clock(exchange, buffer_seconds, Arc::new(Utc::now))
    }

    pub fn with_clock(exchange: Arc<dyn TokenExchange>, buffer_seconds: i64, clock: Clock) -> Self {
        Self {
            exchange,
            buffer_seconds,
            clock,
            state: Mutex::new(None),
        }
    }

    /// `Bearer <token>`, refreshing the token first when it is missing or near expiry
    pub async fn get_auth_header(&self) -> Result<String> {
        let mut state = self.state.lock().await;
        let now = (self.clock)();

        let stale = match state.as_ref() {
            Some(token) => token.needs_refresh(now, self.buffer_seconds),
            None => true,
        };

        if stale {
            let fresh = self.exchange.exchange().await?;
            info!(expires_in = fresh.expires_in, "Refreshed delivery access token");
            *state = Some(CachedToken {
                access_token: fresh.access_token,
                issued_at: now,
                lifetime_seconds: fresh.expires_in,
            });
        } else {
            debug!("Reusing cached delivery access token");
        }

        match state.as_ref() {
            Some(token) => Ok(format!("Bearer {}", token.access_token)),
            None => Err(FulfillmentError::Authentication(
                "no access token available".to_string(),
            )),
        }
    }

    /// Drop the cached token so the next request exchanges a new one
    pub async fn invalidate(&self) {
        *self.state.lock().await = None;
    }
}
