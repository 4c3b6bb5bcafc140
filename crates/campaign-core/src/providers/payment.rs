//! Payment providers supply the client-side callback behind the payment prompt.

use async_trait::async_trait;

use crate::error::CampaignResult;
use crate::host::ContentHost;

/// Callback used when no payment process is configured
pub const NO_PAYMENT_CALLBACK: &str = r#"alert("No Payment Process Configured")"#;

/// Payment gateway as seen by the edit screen
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    fn name(&self) -> &'static str;

    /// Script run when the user asks to pay
    fn js_callback(&self) -> String {
        NO_PAYMENT_CALLBACK.to_string()
    }

    /// Register any provider-specific scripts
    async fn load_javascript(&self, _host: &dyn ContentHost) -> CampaignResult<()> {
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultPaymentProvider;

#[async_trait]
impl PaymentProvider for DefaultPaymentProvider {
    fn name(&self) -> &'static str {
        "default"
    }
}

/// Hosted Authorize.Net payment page
#[derive(Debug, Clone, Copy, Default)]
pub struct AuthorizeNetPaymentProvider;

#[async_trait]
impl PaymentProvider for AuthorizeNetPaymentProvider {
    fn name(&self) -> &'static str {
        "authorize_net"
    }

    fn js_callback(&self) -> String {
        "window.wp.adbutler_cc.toPaymentPage()".to_string()
    }
}
