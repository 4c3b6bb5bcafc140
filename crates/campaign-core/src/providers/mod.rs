//! # Providers
//!
//! Collaborators integrations borrow for a single event: options, creative metadata,
//! payment and email. Each capability has a default implementation and, where the host
//! offers the extension for it, an enhanced one.

pub mod creative_meta;
pub mod email;
pub mod options;
pub mod payment;

pub use creative_meta::{CreativeMetaProvider, CustomFieldCreativeMeta, NoCreativeMeta};
pub use email::{EmailProvider, MailEmailProvider, TemplatedEmailProvider};
pub use options::{HostOptionsProvider, OptionsProvider, API_OPTIONS_NAME, OPTIONS_PAGE_SLUG};
pub use payment::{AuthorizeNetPaymentProvider, DefaultPaymentProvider, PaymentProvider};
