//! # campaign-core
//!
//! Core types and traits for the AdButler campaign integration layer.
//!
//! This crate provides:
//! - `HookDefinition`, `HookCatalog` and `EventDispatcher` for priority-ordered event bindings
//! - The `Integration` contract with its mandatory/optional binding table
//! - `DependencyInjector` for resolving providers at startup
//! - `ContentHost` and `MemoryHost` standing in for the host content store
//! - Provider traits (options, creative metadata, payment, email) and their variants
//! - The Payments, Email-Notifications and Settings integrations
//! - `CampaignError` for typed error handling
//!
//! ## Example
//!
//! ```rust,ignore
//! use campaign_core::{add_all_hooks, AllowAll, EventDispatcher, HookCatalog, HookEvent};
//!
//! let catalog = Arc::new(HookCatalog::new(Arc::new(EventDispatcher::new())));
//! let settings: Arc<dyn Integration> =
//!     Arc::new(SettingsIntegration::new(catalog.clone(), options));
//!
//! // Register every operation the integration declares
//! add_all_hooks(&settings, &AllowAll).await?;
//!
//! // Deliver a host event; callbacks run in priority order
//! let report = catalog.dispatcher().dispatch(&HookEvent::AdminMenu).await?;
//! ```

pub mod api;
pub mod campaign;
pub mod capability;
pub mod error;
pub mod hooks;
pub mod host;
pub mod injector;
pub mod integration;
pub mod integrations;
pub mod providers;
pub mod text;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

// Re-exports for convenience
pub use api::{AdvertisingApi, BannerLink, NewAdvertiser, NewBanner, NewCampaign, RemoteResource};
pub use campaign::{
    numeric_id, CampaignItem, Creative, CreativeImage, PostStatus, SaveContext, StatusTransition,
    Submission, User, ADVERTISEMENT_ID_FIELD, ADVERTISER_ID_META_KEY, CAMPAIGN_ID_META_KEY,
    CAMPAIGN_POST_TYPE, CREATIVES_FIELD,
};
pub use error::{CampaignError, CampaignResult};
pub use hooks::{
    CallbackId, CallbackOutput, DispatchReport, EventDispatcher, HookCallback, HookCatalog,
    HookDefinition, HookEvent, HookOutput, HookSummary, HookTag,
};
pub use host::{ContentHost, HostFeature, MemoryHost};
pub use injector::{Dependency, DependencyInjector, DependencyName};
pub use integration::{
    add_all_hooks, add_hook, get_all_hooks, save_should_cease, AllowAll, BindingKind,
    DisabledOperations, HookBinding, HookFilter, Integration,
};
pub use integrations::{
    AssetConfig, EmailNotificationsIntegration, PaymentsIntegration, SettingsIntegration,
};
pub use providers::{
    AuthorizeNetPaymentProvider, CreativeMetaProvider, CustomFieldCreativeMeta,
    DefaultPaymentProvider, EmailProvider, HostOptionsProvider, MailEmailProvider, NoCreativeMeta,
    OptionsProvider, PaymentProvider, TemplatedEmailProvider, API_OPTIONS_NAME, OPTIONS_PAGE_SLUG,
};
