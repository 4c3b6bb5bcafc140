//! Integrations that need nothing beyond the host and their providers.
//!
//! The advertiser, campaign and banner creation integrations live in
//! `campaign-adbutler` next to the API client they drive.

pub mod notifications;
pub mod payments;
pub mod settings;

pub use notifications::EmailNotificationsIntegration;
pub use payments::{AssetConfig, PaymentsIntegration};
pub use settings::SettingsIntegration;
