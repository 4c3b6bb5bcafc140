//! # campaign-adbutler
//!
//! AdButler side of adbutler-campaigns-rs.
//!
//! This crate provides:
//!
//! 1. **AdButlerClient** - `AdvertisingApi` over the AdButler REST API
//!    - Advertisers, banner campaigns, image banners
//!    - Campaign assignments linking banners to campaigns
//!
//! 2. **Creation integrations** bound to the item save event, in priority order
//!    - `CreateAdvertiserIntegration` (10) - one advertiser per author
//!    - `CreateCampaignIntegration` (20) - one campaign per item
//!    - `CreateBannerIntegration` (30) - one banner per creative
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use campaign_adbutler::{AdButlerClient, CreateAdvertiserIntegration};
//!
//! // Create client from environment
//! let api: Arc<dyn AdvertisingApi> = Arc::new(AdButlerClient::from_env()?);
//!
//! let advertiser: Arc<dyn Integration> =
//!     Arc::new(CreateAdvertiserIntegration::new(catalog.clone(), host.clone(), api.clone()));
//! add_all_hooks(&advertiser, &AllowAll).await?;
//!
//! // Saving a campaign item now creates the author's advertiser
//! catalog.dispatcher().dispatch(&save_event).await?;
//! ```

pub mod advertiser;
pub mod banner;
pub mod campaign;
pub mod client;
pub mod config;

// Re-exports
pub use advertiser::{generate_password, CreateAdvertiserIntegration};
pub use banner::CreateBannerIntegration;
pub use campaign::CreateCampaignIntegration;
pub use client::AdButlerClient;
pub use config::{AdButlerConfig, DEFAULT_API_BASE_URL, TEST_IMAGE_URL};
