use crate::error::Result;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

/// Reachability check for production image URLs
#[async_trait]
pub trait UrlProbe: Send + Sync {
    async fn is_reachable(&self, url: &str) -> Result<bool>;
}

#[derive(Debug, Clone)]
pub struct HttpUrlProbe {
    http: Client,
}

impl HttpUrlProbe {
    pub fn new(timeout: Duration) -> Result<Self> {
        Ok(Self {
            http: Client::builder().timeout(timeout).build()?,
        })
    }
}

#[async_trait]
impl UrlProbe for HttpUrlProbe {
    /// A transport failure means unreachable, not an error
    async fn is_reachable(&self, url: &str) -> Result<bool> {
        match self.http.get(url).send().await {
            Ok(response) => Ok(response.status().is_success()),
            Err(e) => {
                tracing::debug!(url, error = %e, "Production URL probe failed");
                Ok(false)
            }
        }
    }
}
