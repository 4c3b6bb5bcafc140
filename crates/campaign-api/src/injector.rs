//! # Dependency Setup
//!
//! Resolves the collaborators every integration needs, in a fixed order. Providers
//! with an enhanced variant pick it when the host reports the extension it relies on.

use std::sync::Arc;

use campaign_adbutler::{AdButlerClient, AdButlerConfig};
use campaign_core::{
    AdvertisingApi, AuthorizeNetPaymentProvider, ContentHost, CustomFieldCreativeMeta,
    Dependency, DependencyInjector, DependencyName, EventDispatcher, HookCatalog, HostFeature,
    HostOptionsProvider, MailEmailProvider, NoCreativeMeta, OptionsProvider,
    TemplatedEmailProvider,
};
use tracing::{info, warn};

/// Inputs to [`setup`]
#[derive(Clone)]
pub struct SetupOptions {
    /// Use this API client instead of building one from the stored options
    pub client: Option<Arc<dyn AdvertisingApi>>,
    /// Extra addresses notified when a campaign enters review
    pub admin_recipients: Vec<String>,
}

impl SetupOptions {
    pub fn new() -> Self {
        Self {
            client: None,
            admin_recipients: Vec::new(),
        }
    }

    /// Builder: supply the API client
    pub fn with_client(mut self, client: Arc<dyn AdvertisingApi>) -> Self {
        self.client = Some(client);
        self
    }

    /// Builder: extra admin recipients
    pub fn with_admin_recipients(mut self, recipients: Vec<String>) -> Self {
        self.admin_recipients = recipients;
        self
    }
}

impl Default for SetupOptions {
    fn default() -> Self {
        Self::new()
    }
}

/// Build the injector: options, client, catalog, creative meta, payment, email.
pub async fn setup(host: Arc<dyn ContentHost>, options: SetupOptions) -> DependencyInjector {
    let mut injector = DependencyInjector::new();

    let options_provider = register_options(host.clone());
    injector.register(
        DependencyName::OptionsProvider,
        Some(Dependency::Options(options_provider.clone())),
    );

    let client = match options.client {
        Some(client) => Some(client),
        None => register_client(options_provider.as_ref()).await,
    };
    injector.register(DependencyName::AdbutlerClient, client.map(Dependency::Client));

    injector
        .register(DependencyName::HookCatalog, Some(Dependency::Catalog(register_catalog())))
        .register(
            DependencyName::CreativePostMetaProvider,
            Some(register_creative_meta(host.clone())),
        )
        .register(
            DependencyName::PaymentProvider,
            Some(Dependency::Payment(Arc::new(AuthorizeNetPaymentProvider))),
        )
        .register(
            DependencyName::EmailProvider,
            Some(register_email(host, options.admin_recipients)),
        );

    info!(
        "Dependencies resolved: {}/{}",
        injector.required().len() - injector.missing().len(),
        injector.required().len()
    );
    injector
}

fn register_options(host: Arc<dyn ContentHost>) -> Arc<dyn OptionsProvider> {
    Arc::new(HostOptionsProvider::new(host))
}

/// AdButler client keyed from the stored options, nothing when no key is configured
async fn register_client(options: &dyn OptionsProvider) -> Option<Arc<dyn AdvertisingApi>> {
    let config = match AdButlerConfig::from_options(options).await {
        Ok(config) => config,
        Err(e) => {
            warn!("AdButler client not configured: {}", e);
            return None;
        }
    };

    match AdButlerClient::new(config) {
        Ok(client) => Some(Arc::new(client)),
        Err(e) => {
            warn!("AdButler client could not be built: {}", e);
            None
        }
    }
}

fn register_catalog() -> Arc<HookCatalog> {
    Arc::new(HookCatalog::new(Arc::new(EventDispatcher::new())))
}

fn register_creative_meta(host: Arc<dyn ContentHost>) -> Dependency {
    if host.has_feature(HostFeature::CustomFields) {
        Dependency::CreativeMeta(Arc::new(CustomFieldCreativeMeta::new(host)))
    } else {
        Dependency::CreativeMeta(Arc::new(NoCreativeMeta))
    }
}

fn register_email(host: Arc<dyn ContentHost>, admin_recipients: Vec<String>) -> Dependency {
    if host.has_feature(HostFeature::TemplatedEmail) {
        Dependency::Email(Arc::new(
            TemplatedEmailProvider::new(host).with_admin_recipients(admin_recipients),
        ))
    } else {
        Dependency::Email(Arc::new(
            MailEmailProvider::new(host).with_admin_recipients(admin_recipients),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use campaign_core::testing::RecordingApi;
    use campaign_core::{MemoryHost, API_OPTIONS_NAME};
    use serde_json::json;

    #[tokio::test]
    async fn test_full_setup_with_supplied_client() {
        let host = Arc::new(MemoryHost::new());
        let options = SetupOptions::new().with_client(Arc::new(RecordingApi::new()));
        let injector = setup(host, options).await;

        assert!(injector.ensure_dependencies());
        assert_eq!(
            injector.required(),
            &[
                DependencyName::OptionsProvider,
                DependencyName::AdbutlerClient,
                DependencyName::HookCatalog,
                DependencyName::CreativePostMetaProvider,
                DependencyName::PaymentProvider,
                DependencyName::EmailProvider,
            ]
        );
        assert_eq!(injector.client().unwrap().provider_name(), "recording");
    }

    #[tokio::test]
    async fn test_variants_follow_host_features() {
        let plain = setup(
            Arc::new(MemoryHost::new()),
            SetupOptions::new().with_client(Arc::new(RecordingApi::new())),
        )
        .await;
        assert_eq!(plain.creative_meta().unwrap().name(), "none");
        assert_eq!(plain.email().unwrap().name(), "mail");

        let enhanced = setup(
            Arc::new(
                MemoryHost::new()
                    .with_feature(HostFeature::CustomFields)
                    .with_feature(HostFeature::TemplatedEmail),
            ),
            SetupOptions::new().with_client(Arc::new(RecordingApi::new())),
        )
        .await;
        assert_eq!(enhanced.creative_meta().unwrap().name(), "custom_fields");
        assert_eq!(enhanced.email().unwrap().name(), "templated");
        assert_eq!(enhanced.payment().unwrap().name(), "authorize_net");
    }

    #[tokio::test]
    async fn test_client_built_from_stored_key() {
        let host = Arc::new(
            MemoryHost::new().with_option(API_OPTIONS_NAME, json!({ "api_key": "stored_key" })),
        );
        let injector = setup(host, SetupOptions::new()).await;

        assert!(injector.ensure_dependencies());
        assert_eq!(injector.client().unwrap().provider_name(), "adbutler");
    }
}
