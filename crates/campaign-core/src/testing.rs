//! In-memory test doubles shared with downstream crates through the `testing` feature.

use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;

use crate::api::{AdvertisingApi, BannerLink, NewAdvertiser, NewBanner, NewCampaign, RemoteResource};
use crate::error::{CampaignError, CampaignResult};
use crate::hooks::{EventDispatcher, HookCatalog, HookEvent, HookOutput};
use crate::integration::{HookBinding, Integration};

/// Integration that counts its `echo` calls and fails on `fail`
pub struct EchoIntegration {
    name: &'static str,
    catalog: Arc<HookCatalog>,
    bindings: Vec<HookBinding>,
    calls: AtomicUsize,
}

impl EchoIntegration {
    pub fn new(
        name: &'static str,
        catalog: Arc<HookCatalog>,
        bindings: Vec<HookBinding>,
    ) -> Arc<Self> {
        Arc::new(Self {
            name,
            catalog,
            bindings,
            calls: AtomicUsize::new(0),
        })
    }

    /// Echo integration with a private catalog and no bindings
    pub fn unbound(name: &'static str) -> Arc<Self> {
        Self::new(
            name,
            Arc::new(HookCatalog::new(Arc::new(EventDispatcher::new()))),
            Vec::new(),
        )
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Integration for EchoIntegration {
    fn name(&self) -> &'static str {
        self.name
    }

    fn catalog(&self) -> &Arc<HookCatalog> {
        &self.catalog
    }

    fn bindings(&self) -> Vec<HookBinding> {
        self.bindings.clone()
    }

    async fn handle(&self, method: &str, _event: &HookEvent) -> CampaignResult<HookOutput> {
        match method {
            "echo" => {
                self.calls.fetch_add(1, Ordering::SeqCst);
                Ok(HookOutput::Handled(true))
            }
            "fail" => Err(CampaignError::Internal(format!("{} failed", self.name))),
            _ => Ok(HookOutput::None),
        }
    }
}

/// A call received by [`RecordingApi`]
#[derive(Debug, Clone, PartialEq)]
pub enum ApiCall {
    CreateAdvertiser(NewAdvertiser),
    CreateCampaign(NewCampaign),
    CreateBanner(NewBanner),
    LinkBanner(BannerLink),
}

impl ApiCall {
    pub fn operation(&self) -> &'static str {
        match self {
            ApiCall::CreateAdvertiser(_) => "create_advertiser",
            ApiCall::CreateCampaign(_) => "create_campaign",
            ApiCall::CreateBanner(_) => "create_banner",
            ApiCall::LinkBanner(_) => "link_banner_to_campaign",
        }
    }
}

/// Advertising API double that records calls and hands out sequential ids
pub struct RecordingApi {
    calls: Mutex<Vec<ApiCall>>,
    next_id: AtomicI64,
    fail_on: Mutex<Option<(&'static str, String)>>,
    id_override: Mutex<Option<Value>>,
    yielding: bool,
}

impl Default for RecordingApi {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingApi {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            next_id: AtomicI64::new(100),
            fail_on: Mutex::new(None),
            id_override: Mutex::new(None),
            yielding: false,
        }
    }

    /// Builder: yield to the scheduler before answering, the way a network call would
    pub fn yielding(mut self) -> Self {
        self.yielding = true;
        self
    }

    /// Builder: fail every call to `operation` with `message`
    pub fn failing(self, operation: &'static str, message: impl Into<String>) -> Self {
        if let Ok(mut fail_on) = self.fail_on.lock() {
            *fail_on = Some((operation, message.into()));
        }
        self
    }

    /// Builder: answer every call with this `id` value instead of a sequential number
    pub fn returning_id(self, id: Value) -> Self {
        if let Ok(mut id_override) = self.id_override.lock() {
            *id_override = Some(id);
        }
        self
    }

    pub fn calls(&self) -> Vec<ApiCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Operation names in call order
    pub fn operations(&self) -> Vec<&'static str> {
        self.calls().iter().map(ApiCall::operation).collect()
    }

    pub fn count(&self, operation: &str) -> usize {
        self.operations().iter().filter(|op| **op == operation).count()
    }

    async fn pause(&self) {
        if self.yielding {
            tokio::task::yield_now().await;
        }
    }

    fn record(&self, call: ApiCall) -> CampaignResult<RemoteResource> {
        let operation = call.operation();
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }

        if let Ok(fail_on) = self.fail_on.lock() {
            if let Some((failing, message)) = fail_on.as_ref() {
                if *failing == operation {
                    return Err(CampaignError::Remote(message.clone()));
                }
            }
        }

        if let Ok(id_override) = self.id_override.lock() {
            if let Some(id) = id_override.as_ref() {
                return Ok(RemoteResource::with_id(id.clone()));
            }
        }

        Ok(RemoteResource::with_id(
            self.next_id.fetch_add(1, Ordering::SeqCst),
        ))
    }
}

#[async_trait]
impl AdvertisingApi for RecordingApi {
    async fn create_advertiser(
        &self,
        advertiser: &NewAdvertiser,
    ) -> CampaignResult<RemoteResource> {
        self.pause().await;
        self.record(ApiCall::CreateAdvertiser(advertiser.clone()))
    }

    async fn create_campaign(&self, campaign: &NewCampaign) -> CampaignResult<RemoteResource> {
        self.pause().await;
        self.record(ApiCall::CreateCampaign(campaign.clone()))
    }

    async fn create_banner(&self, banner: &NewBanner) -> CampaignResult<RemoteResource> {
        self.pause().await;
        self.record(ApiCall::CreateBanner(banner.clone()))
    }

    async fn link_banner_to_campaign(&self, link: &BannerLink) -> CampaignResult<RemoteResource> {
        self.pause().await;
        self.record(ApiCall::LinkBanner(link.clone()))
    }

    fn provider_name(&self) -> &'static str {
        "recording"
    }
}
