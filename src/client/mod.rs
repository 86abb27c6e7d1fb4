//! # External Service Clients
//!
//! Thin adapters over the services the pipeline talks to. Each adapter sits behind a trait
//! so the orchestration layer can be driven by scripted fakes in tests.
//!
//! - [`TemplateRenderClient`] - renders a unit's payload into a downloadable document
//! - [`DeliveryClient`] - drops a rendered document into a printer folder
//! - [`TokenCache`] - bearer tokens for the delivery endpoint
//! - [`UrlProbe`] - production image URL reachability

pub mod delivery;
pub mod template_render;
pub mod token_cache;
pub mod url_probe;

pub use delivery::{DeliveryClient, ScriptDeliveryClient};
pub use template_render::{ApiTemplateClient, TemplateRenderClient};
pub use token_cache::{AccessToken, Clock, OAuthRefreshExchange, TokenCache, TokenExchange};
pub use url_probe::{HttpUrlProbe, UrlProbe};
