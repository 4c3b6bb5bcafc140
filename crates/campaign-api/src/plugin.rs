//! # Plugin
//!
//! Composition root. Takes a resolved [`DependencyInjector`], builds every integration
//! with the collaborators it needs, registers their bindings and keeps them alive for
//! as long as events may be delivered.
//!
//! Registration order: content type, advertiser, campaign, banner, payments,
//! email notifications, settings. Execution order within an event is decided by
//! priority, not by this order.

use std::sync::Arc;

use campaign_adbutler::{
    CreateAdvertiserIntegration, CreateBannerIntegration, CreateCampaignIntegration,
};
use campaign_core::{
    add_all_hooks, capability, AllowAll, AssetConfig, CampaignResult, ContentHost,
    DependencyInjector, DispatchReport, EmailNotificationsIntegration, HookCatalog, HookEvent,
    HookFilter, HookSummary, Integration, PaymentsIntegration, SettingsIntegration,
};
use tracing::{info, instrument, warn};

use crate::content_type::ContentTypeIntegration;
use crate::locks::KeyedLocks;

/// Extension points fixed at construction
#[derive(Clone)]
pub struct PluginPolicy {
    /// Decides which optional operations are registered
    pub filter: Arc<dyn HookFilter>,
    /// Roles granted the contributor capability set on activation
    pub additional_roles: Vec<String>,
    /// Declare the creative field group on `init`
    pub declare_fields: bool,
    /// Placeholder creatives and the sandbox payment script
    pub test_mode: bool,
}

impl PluginPolicy {
    pub fn new() -> Self {
        Self {
            filter: Arc::new(AllowAll),
            additional_roles: Vec::new(),
            declare_fields: false,
            test_mode: true,
        }
    }

    /// Builder: set the optional-operation filter
    pub fn with_filter(mut self, filter: Arc<dyn HookFilter>) -> Self {
        self.filter = filter;
        self
    }

    /// Builder: add roles that receive contributor capabilities
    pub fn with_additional_roles(mut self, roles: Vec<String>) -> Self {
        self.additional_roles = roles;
        self
    }

    /// Builder: declare creative fields on `init`
    pub fn with_declared_fields(mut self, declare_fields: bool) -> Self {
        self.declare_fields = declare_fields;
        self
    }

    /// Builder: switch test mode on or off
    pub fn with_test_mode(mut self, test_mode: bool) -> Self {
        self.test_mode = test_mode;
        self
    }
}

impl Default for PluginPolicy {
    fn default() -> Self {
        Self::new()
    }
}

/// Operations one integration registered
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct RegisteredIntegration {
    pub name: &'static str,
    pub operations: Vec<&'static str>,
}

/// What a dispatch holds exclusively while it runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum WorkKey {
    /// The user whose advertiser may be created
    User(u64),
    /// The item being saved
    Item(u64),
}

pub struct Plugin {
    host: Arc<dyn ContentHost>,
    injector: DependencyInjector,
    catalog: Arc<HookCatalog>,
    policy: PluginPolicy,
    integrations: Vec<Arc<dyn Integration>>,
    registered: Vec<RegisteredIntegration>,
    locks: KeyedLocks<WorkKey>,
}

impl Plugin {
    /// Wire every integration. Returns `None`, leaving the host untouched, when a
    /// required dependency did not resolve.
    pub async fn bootstrap(
        host: Arc<dyn ContentHost>,
        injector: DependencyInjector,
        policy: PluginPolicy,
        assets: AssetConfig,
    ) -> CampaignResult<Option<Self>> {
        if !injector.ensure_dependencies() {
            warn!("Dependencies missing, plugin not wired: {:?}", injector.missing());
            return Ok(None);
        }

        let catalog = injector.catalog()?;
        let api = injector.client()?;
        let creative_meta = injector.creative_meta()?;

        let integrations: Vec<Arc<dyn Integration>> = vec![
            Arc::new(
                ContentTypeIntegration::new(
                    catalog.clone(),
                    host.clone(),
                    Some(creative_meta.clone()),
                )
                .with_declared_fields(policy.declare_fields),
            ),
            Arc::new(CreateAdvertiserIntegration::new(
                catalog.clone(),
                host.clone(),
                api.clone(),
            )),
            Arc::new(CreateCampaignIntegration::new(
                catalog.clone(),
                host.clone(),
                api.clone(),
            )),
            Arc::new(
                CreateBannerIntegration::new(
                    catalog.clone(),
                    host.clone(),
                    api,
                    Some(creative_meta),
                )
                .with_test_mode(policy.test_mode),
            ),
            Arc::new(PaymentsIntegration::new(
                catalog.clone(),
                host.clone(),
                Some(injector.payment()?),
                assets.with_test_mode(policy.test_mode),
            )),
            Arc::new(EmailNotificationsIntegration::new(
                catalog.clone(),
                Some(injector.email()?),
            )),
            Arc::new(SettingsIntegration::new(
                catalog.clone(),
                Some(injector.options()?),
            )),
        ];

        let mut registered = Vec::with_capacity(integrations.len());
        for integration in &integrations {
            let operations = add_all_hooks(integration, policy.filter.as_ref()).await?;
            registered.push(RegisteredIntegration {
                name: integration.name(),
                operations,
            });
        }

        info!(
            "Plugin wired: {} integrations, {} hooks",
            integrations.len(),
            catalog.len().await
        );

        Ok(Some(Self {
            host,
            injector,
            catalog,
            policy,
            integrations,
            registered,
            locks: KeyedLocks::new(),
        }))
    }

    pub fn catalog(&self) -> &Arc<HookCatalog> {
        &self.catalog
    }

    pub fn injector(&self) -> &DependencyInjector {
        &self.injector
    }

    pub fn integrations(&self) -> &[Arc<dyn Integration>] {
        &self.integrations
    }

    pub fn registered(&self) -> &[RegisteredIntegration] {
        &self.registered
    }

    /// Catalog introspection
    pub async fn hooks(&self) -> Vec<HookSummary> {
        self.catalog.summaries().await
    }

    /// Deliver a host event.
    ///
    /// Events touching the same user (saves by one author, profile updates) run one at
    /// a time, and so do saves of the same item.
    #[instrument(skip(self, event), fields(tag = %event.tag()))]
    pub async fn dispatch(&self, event: &HookEvent) -> CampaignResult<DispatchReport> {
        // Users are always locked before items
        let _user = match event.affected_user() {
            Some(user_id) => Some(self.locks.lock(WorkKey::User(user_id)).await),
            None => None,
        };
        let _item = match event.saved_item() {
            Some(post_id) => Some(self.locks.lock(WorkKey::Item(post_id)).await),
            None => None,
        };
        self.catalog.dispatcher().dispatch(event).await
    }

    /// Grant capabilities and install templated emails
    pub async fn activate(&self) -> CampaignResult<()> {
        capability::activate(self.host.as_ref(), &self.policy.additional_roles).await?;
        self.injector.email()?.activate().await?;
        info!("Plugin activated");
        Ok(())
    }

    /// Revoke capabilities
    pub async fn deactivate(&self) -> CampaignResult<()> {
        capability::deactivate(self.host.as_ref(), &self.policy.additional_roles).await?;
        info!("Plugin deactivated");
        Ok(())
    }
}
