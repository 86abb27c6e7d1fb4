//! # Template Render Client
//!
//! Adapter over the external document-rendering service. A render unit's payload is posted
//! to `create?template_id=...`; a 2xx response carrying a download URL is a rendered
//! document, anything else is a [`FulfillmentError::Render`].
//!
//! The adapter never retries. A unit that fails to render keeps its items' status, so the
//! next run picks them up again.

use crate::config::{ApiTemplateConfig, ConfigurationError};
use crate::error::{FulfillmentError, Result};
use crate::models::{RenderResponse, RenderUnit, RenderedDocument};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, Url};
use std::time::Duration;
use tracing::{debug, instrument};

const API_KEY_HEADER: &str = "X-API-KEY";

#[async_trait]
pub trait TemplateRenderClient: Send + Sync {
    async fn render(&self, unit: &RenderUnit) -> Result<RenderedDocument>;
}

/// HTTP client for the rendering service
#[derive(Clone)]
pub struct ApiTemplateClient {
    http: Client,
    create_url: Url,
}

impl std::fmt::Debug for ApiTemplateClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiTemplateClient")
            .field("create_url", &self.create_url.as_str())
            .finish()
    }
}

impl ApiTemplateClient {
    pub fn new(config: &ApiTemplateConfig, timeout: Duration) -> Result<Self> {
        let base_url = Url::parse(&config.base_url).map_err(|e| {
            ConfigurationError::invalid_value("api_template.base_url", &config.base_url, e.to_string())
        })?;
        let create_url = base_url.join("create").map_err(|e| {
            ConfigurationError::invalid_value("api_template.base_url", &config.base_url, e.to_string())
        })?;

        let mut headers = HeaderMap::new();
        let api_key = HeaderValue::from_str(&config.api_key).map_err(|_| {
            ConfigurationError::invalid_value(
                "api_template.api_key",
                "[MASKED]",
                "not a valid header value",
            )
        })?;
        headers.insert(API_KEY_HEADER, api_key);

        let http = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self { http, create_url })
    }
}

#[async_trait]
impl TemplateRenderClient for ApiTemplateClient {
    #[instrument(skip(self, unit), fields(kind = unit.kind(), template_id = unit.template_id()))]
    async fn render(&self, unit: &RenderUnit) -> Result<RenderedDocument> {
        let body = unit.request_body()?;

        let response = self
            .http
            .post(self.create_url.clone())
            .query(&[("template_id", unit.template_id())])
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FulfillmentError::Render(format!(
                "rendering service returned status {status}"
            )));
        }

        let parsed: RenderResponse = response.json().await.map_err(|e| {
            FulfillmentError::Render(format!("malformed rendering response: {e}"))
        })?;

        let document = rendered_document_from(parsed)?;
        debug!(
            transaction_ref = document.transaction_ref.as_deref(),
            "Rendered document"
        );
        Ok(document)
    }
}

/// A response without a download URL is malformed
pub fn rendered_document_from(response: RenderResponse) -> Result<RenderedDocument> {
    match response.download_url {
        Some(url) if !url.trim().is_empty() => Ok(RenderedDocument {
            document_url: url,
            template_id: response.template_id,
            transaction_ref: response.transaction_ref,
        }),
        _ => Err(FulfillmentError::Render(format!(
            "rendering response has no download_url (status: {})",
            response.status.as_deref().unwrap_or("unknown")
        ))),
    }
}
