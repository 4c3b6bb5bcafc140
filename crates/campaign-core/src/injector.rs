//! # Dependency Injector
//!
//! Capability-indexed registry of the collaborators the plugin needs, populated once
//! at startup and read-only afterwards.
//!
//! `inject` never fails: a missing collaborator is `None`. The typed accessors turn a
//! miss into `CampaignError::MissingDependency`. `ensure_dependencies` is the startup
//! gate over the required names.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::api::AdvertisingApi;
use crate::error::{CampaignError, CampaignResult};
use crate::hooks::HookCatalog;
use crate::providers::{CreativeMetaProvider, EmailProvider, OptionsProvider, PaymentProvider};

/// Names of the collaborators the injector resolves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DependencyName {
    OptionsProvider,
    AdbutlerClient,
    HookCatalog,
    CreativePostMetaProvider,
    PaymentProvider,
    EmailProvider,
}

impl DependencyName {
    pub fn as_str(&self) -> &'static str {
        match self {
            DependencyName::OptionsProvider => "options_provider",
            DependencyName::AdbutlerClient => "adbutler_client",
            DependencyName::HookCatalog => "hook_catalog",
            DependencyName::CreativePostMetaProvider => "creative_post_meta_provider",
            DependencyName::PaymentProvider => "payment_provider",
            DependencyName::EmailProvider => "email_provider",
        }
    }
}

impl std::fmt::Display for DependencyName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A resolved collaborator
#[derive(Clone)]
pub enum Dependency {
    Options(Arc<dyn OptionsProvider>),
    Client(Arc<dyn AdvertisingApi>),
    Catalog(Arc<HookCatalog>),
    CreativeMeta(Arc<dyn CreativeMetaProvider>),
    Payment(Arc<dyn PaymentProvider>),
    Email(Arc<dyn EmailProvider>),
}

impl Dependency {
    /// The name this collaborator satisfies
    pub fn name(&self) -> DependencyName {
        match self {
            Dependency::Options(_) => DependencyName::OptionsProvider,
            Dependency::Client(_) => DependencyName::AdbutlerClient,
            Dependency::Catalog(_) => DependencyName::HookCatalog,
            Dependency::CreativeMeta(_) => DependencyName::CreativePostMetaProvider,
            Dependency::Payment(_) => DependencyName::PaymentProvider,
            Dependency::Email(_) => DependencyName::EmailProvider,
        }
    }
}

impl std::fmt::Debug for Dependency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Dependency({})", self.name())
    }
}

/// Startup registry of collaborators
#[derive(Debug, Default)]
pub struct DependencyInjector {
    required: Vec<DependencyName>,
    dependencies: HashMap<DependencyName, Option<Dependency>>,
}

impl DependencyInjector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a name as required by `ensure_dependencies`
    pub fn require(&mut self, name: DependencyName) -> &mut Self {
        if !self.required.contains(&name) {
            self.required.push(name);
        }
        self
    }

    /// Record the outcome of resolving `name`, which may be nothing
    pub fn provide(&mut self, name: DependencyName, dependency: Option<Dependency>) -> &mut Self {
        if let Some(dep) = &dependency {
            if dep.name() != name {
                warn!("{} provided under the name {}, ignoring", dep.name(), name);
                self.dependencies.insert(name, None);
                return self;
            }
        }
        debug!(dependency = %name, resolved = dependency.is_some(), "Dependency provided");
        self.dependencies.insert(name, dependency);
        self
    }

    /// Require a name and resolve it in one step
    pub fn register(&mut self, name: DependencyName, dependency: Option<Dependency>) -> &mut Self {
        self.require(name).provide(name, dependency)
    }

    /// The resolved collaborator, if any
    pub fn inject(&self, name: DependencyName) -> Option<&Dependency> {
        self.dependencies.get(&name).and_then(Option::as_ref)
    }

    /// True iff every required name resolved to a collaborator
    pub fn ensure_dependencies(&self) -> bool {
        let missing = self.missing();
        if !missing.is_empty() {
            warn!("Unresolved dependencies: {:?}", missing);
        }
        missing.is_empty()
    }

    /// Required names that did not resolve
    pub fn missing(&self) -> Vec<DependencyName> {
        self.required
            .iter()
            .copied()
            .filter(|name| self.inject(*name).is_none())
            .collect()
    }

    pub fn required(&self) -> &[DependencyName] {
        &self.required
    }

    fn missing_dependency(name: DependencyName) -> CampaignError {
        CampaignError::MissingDependency {
            name: name.to_string(),
        }
    }

    pub fn options(&self) -> CampaignResult<Arc<dyn OptionsProvider>> {
        match self.inject(DependencyName::OptionsProvider) {
            Some(Dependency::Options(options)) => Ok(options.clone()),
            _ => Err(Self::missing_dependency(DependencyName::OptionsProvider)),
        }
    }

    pub fn client(&self) -> CampaignResult<Arc<dyn AdvertisingApi>> {
        match self.inject(DependencyName::AdbutlerClient) {
            Some(Dependency::Client(client)) => Ok(client.clone()),
            _ => Err(Self::missing_dependency(DependencyName::AdbutlerClient)),
        }
    }

    pub fn catalog(&self) -> CampaignResult<Arc<HookCatalog>> {
        match self.inject(DependencyName::HookCatalog) {
            Some(Dependency::Catalog(catalog)) => Ok(catalog.clone()),
            _ => Err(Self::missing_dependency(DependencyName::HookCatalog)),
        }
    }

    pub fn creative_meta(&self) -> CampaignResult<Arc<dyn CreativeMetaProvider>> {
        match self.inject(DependencyName::CreativePostMetaProvider) {
            Some(Dependency::CreativeMeta(meta)) => Ok(meta.clone()),
            _ => Err(Self::missing_dependency(DependencyName::CreativePostMetaProvider)),
        }
    }

    pub fn payment(&self) -> CampaignResult<Arc<dyn PaymentProvider>> {
        match self.inject(DependencyName::PaymentProvider) {
            Some(Dependency::Payment(payment)) => Ok(payment.clone()),
            _ => Err(Self::missing_dependency(DependencyName::PaymentProvider)),
        }
    }

    pub fn email(&self) -> CampaignResult<Arc<dyn EmailProvider>> {
        match self.inject(DependencyName::EmailProvider) {
            Some(Dependency::Email(email)) => Ok(email.clone()),
            _ => Err(Self::missing_dependency(DependencyName::EmailProvider)),
        }
    }
}
