//! # Delivery Client
//!
//! Hands a rendered document to the print-delivery script, which copies it into the
//! destination printer folder under a deterministic file name.
//!
//! The script is invoked as `GET exec?q={document_url}&q={file_name}&q={printer}` with a
//! bearer token from the [`TokenCache`]. Any 2xx response counts as delivered.

use super::token_cache::TokenCache;
use crate::config::{ConfigurationError, GoogleConfig};
use crate::error::Result;
use crate::models::DeliveryTarget;
use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::{Client, Url};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

#[async_trait]
pub trait DeliveryClient: Send + Sync {
    /// Deliver `document_url` into `destination`; `Ok(false)` when the endpoint refused it
    async fn deliver(
        &self,
        document_url: &str,
        destination: &str,
        target: &DeliveryTarget,
    ) -> Result<bool>;
}

pub struct ScriptDeliveryClient {
    http: Client,
    exec_url: Url,
    tokens: Arc<TokenCache>,
}

impl std::fmt::Debug for ScriptDeliveryClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptDeliveryClient")
            .field("exec_url", &self.exec_url.as_str())
            .finish_non_exhaustive()
    }
}

impl ScriptDeliveryClient {
    pub fn new(config: &GoogleConfig, tokens: Arc<TokenCache>, timeout: Duration) -> Result<Self> {
        let exec_url = Url::parse(&config.script_base_url)
            .and_then(|base| base.join("exec"))
            .map_err(|e| {
                ConfigurationError::invalid_value(
                    "google.script_base_url",
                    &config.script_base_url,
                    e.to_string(),
                )
            })?;

        Ok(Self {
            http: Client::builder().timeout(timeout).build()?,
            exec_url,
            tokens,
        })
    }

    pub fn request_url(&self, document_url: &str, destination: &str, target: &DeliveryTarget) -> Url {
        delivery_request_url(&self.exec_url, document_url, destination, target)
    }
}

fn delivery_request_url(
    exec_url: &Url,
    document_url: &str,
    destination: &str,
    target: &DeliveryTarget,
) -> Url {
    let mut url = exec_url.clone();
    url.query_pairs_mut()
        .append_pair("q", document_url)
        .append_pair("q", &target.file_name())
        .append_pair("q", destination);
    url
}

#[async_trait]
impl DeliveryClient for ScriptDeliveryClient {
    async fn deliver(
        &self,
        document_url: &str,
        destination: &str,
        target: &DeliveryTarget,
    ) -> Result<bool> {
        let auth = self.tokens.get_auth_header().await?;
        let url = self.request_url(document_url, destination, target);

        let response = self
            .http
            .get(url)
            .header(AUTHORIZATION, auth)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            debug!(file_name = %target.file_name(), destination, "Delivered document");
            Ok(true)
        } else {
            warn!(
                file_name = %target.file_name(),
                destination,
                status = %status,
                "Delivery endpoint refused document"
            );
            Ok(false)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::token_cache::{AccessToken, TokenExchange};
    use crate::error::FulfillmentError;
    use uuid::Uuid;

    #[test]
    fn test_request_url_carries_three_ordered_q_params() {
        let exec_url = Url::parse("https://script.example.com/macros/s/abc/exec").unwrap();
        let target = DeliveryTarget {
            guid: Uuid::nil(),
            sequence_no: Some(12),
        };

        let url = delivery_request_url(&exec_url, "https://pdf/doc 1.pdf", "Printer1", &target);
        let values: Vec<String> = url
            .query_pairs()
            .filter(|(k, _)| k == "q")
            .map(|(_, v)| v.into_owned())
            .collect();

        assert_eq!(
            values,
            vec![
                "https://pdf/doc 1.pdf".to_string(),
                "[12]00000000-0000-0000-0000-000000000000.pdf".to_string(),
                "Printer1".to_string(),
            ]
        );
    }

    #[test]
    fn test_missing_script_base_is_a_configuration_error() {
        struct Never;
        #[async_trait]
        impl TokenExchange for Never {
            async fn exchange(&self) -> Result<AccessToken> {
                Err(FulfillmentError::Authentication("unused".into()))
            }
        }

        let tokens = Arc::new(TokenCache::new(Arc::new(Never), 600));
        let result = ScriptDeliveryClient::new(&GoogleConfig::default(), tokens, Duration::from_secs(5));
        assert!(result.is_err());
    }
}
