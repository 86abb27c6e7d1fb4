//! Scripted stand-ins for the external services and a recording receipt sink.
//!
//! [`ScriptedRenderClient`] names each document after its member ids
//! (`https://render.test/documents/1-2-3.pdf`) so [`ScriptedDeliveryClient`] can refuse or
//! fail deliveries by member id without knowing about units.

use crate::client::{AccessToken, DeliveryClient, TemplateRenderClient, TokenExchange, UrlProbe};
use crate::error::{FulfillmentError, Result};
use crate::models::{DeliveryReceipt, DeliveryTarget, RenderUnit, RenderedDocument};
use crate::orchestration::ReceiptSink;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

const DOCUMENT_BASE: &str = "https://render.test/documents/";

/// Document URL the scripted render client returns for a unit with these members
pub fn document_url_for(member_ids: &[i64]) -> String {
    let ids: Vec<String> = member_ids.iter().map(i64::to_string).collect();
    format!("{DOCUMENT_BASE}{}.pdf", ids.join("-"))
}

fn member_ids_from(document_url: &str) -> Vec<i64> {
    document_url
        .strip_prefix(DOCUMENT_BASE)
        .and_then(|rest| rest.strip_suffix(".pdf"))
        .map(|ids| ids.split('-').filter_map(|id| id.parse().ok()).collect())
        .unwrap_or_default()
}

#[derive(Debug, Default)]
pub struct ScriptedRenderClient {
    failing_members: Mutex<HashSet<i64>>,
    rendered: Mutex<Vec<RenderUnit>>,
    fail_all: AtomicBool,
}

impl ScriptedRenderClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail any unit containing `member_id`
    pub fn fail_for_member(&self, member_id: i64) {
        self.failing_members.lock().insert(member_id);
    }

    pub fn fail_all(&self, fail: bool) {
        self.fail_all.store(fail, Ordering::SeqCst);
    }

    /// Render calls made, failed ones included
    pub fn rendered_count(&self) -> usize {
        self.rendered.lock().len()
    }

    pub fn rendered_units(&self) -> Vec<RenderUnit> {
        self.rendered.lock().clone()
    }
}

#[async_trait]
impl TemplateRenderClient for ScriptedRenderClient {
    async fn render(&self, unit: &RenderUnit) -> Result<RenderedDocument> {
        self.rendered.lock().push(unit.clone());

        let member_ids = unit.member_ids();
        let failing = self.fail_all.load(Ordering::SeqCst) || {
            let failing_members = self.failing_members.lock();
            member_ids.iter().any(|id| failing_members.contains(id))
        };
        if failing {
            return Err(FulfillmentError::Render(
                "rendering service returned status 500 Internal Server Error".to_string(),
            ));
        }

        Ok(RenderedDocument {
            document_url: document_url_for(&member_ids),
            template_id: Some(unit.template_id().to_string()),
            transaction_ref: Some(format!("tx-{}", unit.delivery_target().guid)),
        })
    }
}

/// One delivery attempt as seen by the scripted delivery client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryRecord {
    pub document_url: String,
    pub destination: String,
    pub file_name: String,
}

#[derive(Debug, Default)]
pub struct ScriptedDeliveryClient {
    refused_members: Mutex<HashSet<i64>>,
    erroring_members: Mutex<HashSet<i64>>,
    refuse_all: AtomicBool,
    attempts: Mutex<Vec<DeliveryRecord>>,
}

impl ScriptedDeliveryClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer with a non-success status for documents containing `member_id`
    pub fn refuse_document_for_member(&self, member_id: i64) {
        self.refused_members.lock().insert(member_id);
    }

    /// Fail with a delivery error for documents containing `member_id`
    pub fn error_for_member(&self, member_id: i64) {
        self.erroring_members.lock().insert(member_id);
    }

    pub fn refuse_all(&self, refuse: bool) {
        self.refuse_all.store(refuse, Ordering::SeqCst);
    }

    pub fn attempt_count(&self) -> usize {
        self.attempts.lock().len()
    }

    /// Successful deliveries only
    pub fn deliveries(&self) -> Vec<DeliveryRecord> {
        let refused = self.refused_members.lock().clone();
        let erroring = self.erroring_members.lock().clone();
        let refuse_all = self.refuse_all.load(Ordering::SeqCst);
        self.attempts
            .lock()
            .iter()
            .filter(|record| {
                let ids = member_ids_from(&record.document_url);
                !refuse_all
                    && !ids.iter().any(|id| refused.contains(id) || erroring.contains(id))
            })
            .cloned()
            .collect()
    }
}

#[async_trait]
impl DeliveryClient for ScriptedDeliveryClient {
    async fn deliver(
        &self,
        document_url: &str,
        destination: &str,
        target: &DeliveryTarget,
    ) -> Result<bool> {
        self.attempts.lock().push(DeliveryRecord {
            document_url: document_url.to_string(),
            destination: destination.to_string(),
            file_name: target.file_name(),
        });

        let ids = member_ids_from(document_url);
        if ids.iter().any(|id| self.erroring_members.lock().contains(id)) {
            return Err(FulfillmentError::Delivery(
                "script endpoint unreachable".to_string(),
            ));
        }
        if self.refuse_all.load(Ordering::SeqCst)
            || ids.iter().any(|id| self.refused_members.lock().contains(id))
        {
            return Ok(false);
        }
        Ok(true)
    }
}

/// Token exchange that hands out `token-1`, `token-2`, ... with a fixed lifetime
#[derive(Debug)]
pub struct ScriptedTokenExchange {
    lifetime_seconds: i64,
    calls: AtomicUsize,
    fail: AtomicBool,
}

impl ScriptedTokenExchange {
    pub fn new(lifetime_seconds: i64) -> Self {
        Self {
            lifetime_seconds,
            calls: AtomicUsize::new(0),
            fail: AtomicBool::new(false),
        }
    }

    pub fn fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TokenExchange for ScriptedTokenExchange {
    async fn exchange(&self) -> Result<AccessToken> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail.load(Ordering::SeqCst) {
            return Err(FulfillmentError::Authentication(
                "token exchange returned status 400 Bad Request".to_string(),
            ));
        }
        Ok(AccessToken {
            access_token: format!("token-{call}"),
            expires_in: self.lifetime_seconds,
            token_type: Some("Bearer".to_string()),
        })
    }
}

/// URL probe answering from a script; unknown URLs use the default answer
#[derive(Debug, Default)]
pub struct ScriptedUrlProbe {
    default_reachable: bool,
    unreachable: Mutex<HashSet<String>>,
    failing: Mutex<HashSet<String>>,
    probes: AtomicUsize,
}

impl ScriptedUrlProbe {
    pub fn reachable() -> Self {
        Self {
            default_reachable: true,
            ..Default::default()
        }
    }

    pub fn unreachable(&self, url: &str) {
        self.unreachable.lock().insert(url.to_string());
    }

    pub fn failing(&self, url: &str) {
        self.failing.lock().insert(url.to_string());
    }

    pub fn probe_count(&self) -> usize {
        self.probes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl UrlProbe for ScriptedUrlProbe {
    async fn is_reachable(&self, url: &str) -> Result<bool> {
        self.probes.fetch_add(1, Ordering::SeqCst);
        if self.failing.lock().contains(url) {
            return Err(FulfillmentError::Validation(format!("cannot probe {url}")));
        }
        Ok(self.default_reachable && !self.unreachable.lock().contains(url))
    }
}

/// Sink that records each committed chunk; can be told to fail after N commits
#[derive(Debug, Default)]
pub struct RecordingSink {
    committed: Mutex<Vec<Vec<DeliveryReceipt>>>,
    fail_after: Option<usize>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_after(successful_commits: usize) -> Self {
        Self {
            committed: Mutex::new(Vec::new()),
            fail_after: Some(successful_commits),
        }
    }

    /// Member ids of every successful commit, one entry per chunk
    pub fn committed_ids(&self) -> Vec<Vec<i64>> {
        self.committed
            .lock()
            .iter()
            .map(|receipts| {
                receipts
                    .iter()
                    .flat_map(|receipt| receipt.member_ids.iter().copied())
                    .collect()
            })
            .collect()
    }
}

#[async_trait]
impl ReceiptSink for RecordingSink {
    async fn commit(&self, receipts: &[DeliveryReceipt]) -> Result<usize> {
        let mut committed = self.committed.lock();
        if let Some(limit) = self.fail_after {
            if committed.len() >= limit {
                return Err(FulfillmentError::repository(
                    "commit",
                    "injected checkpoint failure",
                ));
            }
        }
        committed.push(receipts.to_vec());
        Ok(receipts.iter().map(|receipt| receipt.member_ids.len()).sum())
    }
}
