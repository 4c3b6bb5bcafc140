//! # Payments Integration
//!
//! Loads the payment scripts on admin screens, exposes the hosted payment form and
//! asks for payment on the edit screen of submitted campaigns.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, instrument};

use crate::campaign::CampaignItem;
use crate::error::{CampaignError, CampaignResult};
use crate::hooks::{HookCatalog, HookEvent, HookOutput, HookTag, PaymentForm, PaymentPrompt};
use crate::host::{ContentHost, ScriptAsset};
use crate::integration::{HookBinding, Integration};
use crate::providers::payment::{PaymentProvider, NO_PAYMENT_CALLBACK};

pub const ACCEPT_JS_HANDLE: &str = "adbutler_cc\\acceptjs";
pub const BUNDLE_HANDLE: &str = "adbutler_cc\\bundle";
pub const ACCEPT_JS_TEST_URL: &str = "https://jstest.authorize.net/v1/Accept.js";
pub const ACCEPT_JS_URL: &str = "https://js.authorize.net/v1/Accept.js";

pub const PAYMENT_FORM_ID: &str = "adbutler_cc--payment-form";
pub const PAYMENT_FORM_ACTION: &str =
    "https://Simplecheckout.authorize.net/payment/CatalogPayment.aspx";
pub const PAYMENT_LINK_ID: &str = "a7cf5c8a-71bd-48d7-9948-36abe11e28fe";

const PAYMENT_MESSAGE: &str = "If you have not already completed payment, you must do so, \
    as your creatives will not be approved until payment is confirmed.  \
    Click on the link below and you will be taken to a secure payment page.";

/// Where plugin assets are served from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetConfig {
    pub plugin_uri: String,
    pub version: String,
    pub test_mode: bool,
}

impl AssetConfig {
    pub fn new(plugin_uri: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            plugin_uri: plugin_uri.into().trim_end_matches('/').to_string(),
            version: version.into(),
            test_mode: true,
        }
    }

    pub fn with_test_mode(mut self, test_mode: bool) -> Self {
        self.test_mode = test_mode;
        self
    }

    /// Accept.js endpoint for the current mode
    pub fn accept_js_url(&self) -> &'static str {
        if self.test_mode {
            ACCEPT_JS_TEST_URL
        } else {
            ACCEPT_JS_URL
        }
    }

    pub fn bundle_url(&self) -> String {
        format!("{}/scripts/bundle.js", self.plugin_uri)
    }
}

pub struct PaymentsIntegration {
    catalog: Arc<HookCatalog>,
    host: Arc<dyn ContentHost>,
    payment: Option<Arc<dyn PaymentProvider>>,
    assets: AssetConfig,
}

impl PaymentsIntegration {
    pub const NAME: &'static str = "payments";

    pub fn new(
        catalog: Arc<HookCatalog>,
        host: Arc<dyn ContentHost>,
        payment: Option<Arc<dyn PaymentProvider>>,
        assets: AssetConfig,
    ) -> Self {
        Self {
            catalog,
            host,
            payment,
            assets,
        }
    }

    async fn register_scripts(&self) -> CampaignResult<HookOutput> {
        self.host
            .register_script(
                ScriptAsset::new(ACCEPT_JS_HANDLE, self.assets.accept_js_url())
                    .with_version(self.assets.version.clone())
                    .in_footer(),
            )
            .await;

        self.host
            .register_script(
                ScriptAsset::new(BUNDLE_HANDLE, self.assets.bundle_url())
                    .with_version(self.assets.version.clone())
                    .in_footer(),
            )
            .await;

        if let Some(payment) = &self.payment {
            payment.load_javascript(self.host.as_ref()).await?;
        }

        debug!(test_mode = self.assets.test_mode, "Payment scripts registered");
        Ok(HookOutput::Handled(true))
    }

    async fn enqueue_scripts(&self) -> CampaignResult<HookOutput> {
        Ok(self.host.enqueue_script(BUNDLE_HANDLE).await.into())
    }

    fn print_payment_form(&self) -> HookOutput {
        HookOutput::PaymentForm(PaymentForm {
            form_id: PAYMENT_FORM_ID.to_string(),
            action: PAYMENT_FORM_ACTION.to_string(),
            link_id: PAYMENT_LINK_ID.to_string(),
            target: "_blank".to_string(),
        })
    }

    /// Payment prompt for submitted campaigns, nothing otherwise
    pub fn ask_for_payment_if_pending(&self, post: &CampaignItem) -> HookOutput {
        if !post.is_tracked() || !post.awaits_payment() {
            return HookOutput::None;
        }

        let js_callback = self
            .payment
            .as_ref()
            .map(|p| p.js_callback())
            .filter(|callback| !callback.is_empty())
            .unwrap_or_else(|| NO_PAYMENT_CALLBACK.to_string());

        HookOutput::PaymentPrompt(PaymentPrompt {
            heading: "Payment".to_string(),
            message: PAYMENT_MESSAGE.to_string(),
            button_text: "Continue to Payment".to_string(),
            js_callback,
        })
    }
}

#[async_trait]
impl Integration for PaymentsIntegration {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn catalog(&self) -> &Arc<HookCatalog> {
        &self.catalog
    }

    fn bindings(&self) -> Vec<HookBinding> {
        vec![
            HookBinding::must(
                "must_init_scripts",
                HookTag::AdminEnqueueScripts,
                "register_scripts",
            ),
            HookBinding::must("must_init_scripts", HookTag::AdminEnqueueScripts, "enqueue_scripts"),
            HookBinding::must(
                "must_print_payment_form",
                HookTag::AdminFooter,
                "print_payment_form",
            ),
            HookBinding::must(
                "must_provide_no_script_payment_alert",
                HookTag::EditFormAfterTitle,
                "ask_for_payment_if_pending",
            ),
        ]
    }

    #[instrument(name = "payments", skip(self, event))]
    async fn handle(&self, method: &str, event: &HookEvent) -> CampaignResult<HookOutput> {
        match (method, event) {
            ("register_scripts", _) => self.register_scripts().await,
            ("enqueue_scripts", _) => self.enqueue_scripts().await,
            ("print_payment_form", _) => Ok(self.print_payment_form()),
            ("ask_for_payment_if_pending", HookEvent::EditFormAfterTitle { post }) => {
                Ok(self.ask_for_payment_if_pending(post))
            }
            ("ask_for_payment_if_pending", _) => Ok(HookOutput::None),
            (other, _) => Err(CampaignError::Internal(format!(
                "{} has no method {}",
                Self::NAME,
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::campaign::PostStatus;
    use crate::hooks::EventDispatcher;
    use crate::host::MemoryHost;
    use crate::integration::{add_all_hooks, AllowAll};
    use crate::providers::AuthorizeNetPaymentProvider;

    fn setup(
        payment: Option<Arc<dyn PaymentProvider>>,
        test_mode: bool,
    ) -> (Arc<MemoryHost>, Arc<HookCatalog>, Arc<dyn Integration>) {
        let host = Arc::new(MemoryHost::new());
        let catalog = Arc::new(HookCatalog::new(Arc::new(EventDispatcher::new())));
        let integration: Arc<dyn Integration> = Arc::new(PaymentsIntegration::new(
            catalog.clone(),
            host.clone(),
            payment,
            AssetConfig::new("https://ads.example.com/plugins/adbutler/", "0.1.0")
                .with_test_mode(test_mode),
        ));
        (host, catalog, integration)
    }

    #[tokio::test]
    async fn test_all_operations_are_mandatory() {
        let (_, catalog, integration) = setup(None, true);
        let added = add_all_hooks(&integration, &AllowAll).await.unwrap();

        assert_eq!(
            added,
            vec![
                "must_init_scripts",
                "must_print_payment_form",
                "must_provide_no_script_payment_alert"
            ]
        );
        assert_eq!(
            catalog.dispatcher().callback_count(HookTag::AdminEnqueueScripts).await,
            2
        );
    }

    #[tokio::test]
    async fn test_scripts_registered_then_enqueued() {
        let (host, catalog, integration) = setup(Some(Arc::new(AuthorizeNetPaymentProvider)), true);
        add_all_hooks(&integration, &AllowAll).await.unwrap();

        let event = HookEvent::AdminEnqueueScripts {
            hook_suffix: "post.php".to_string(),
        };
        catalog.dispatcher().dispatch(&event).await.unwrap();

        let scripts = host.scripts().await;
        assert_eq!(scripts[0].src, ACCEPT_JS_TEST_URL);
        assert_eq!(
            scripts[1].src,
            "https://ads.example.com/plugins/adbutler/scripts/bundle.js"
        );
        assert_eq!(host.enqueued_scripts().await, vec![BUNDLE_HANDLE.to_string()]);
    }

    #[tokio::test]
    async fn test_live_mode_uses_production_accept_js() {
        let (host, _, integration) = setup(None, false);
        integration
            .handle(
                "register_scripts",
                &HookEvent::AdminEnqueueScripts {
                    hook_suffix: String::new(),
                },
            )
            .await
            .unwrap();
        assert_eq!(host.scripts().await[0].src, ACCEPT_JS_URL);
    }

    #[tokio::test]
    async fn test_prompt_only_for_submitted_campaigns() {
        let (_, _, integration) = setup(Some(Arc::new(AuthorizeNetPaymentProvider)), true);

        let pending = HookEvent::EditFormAfterTitle {
            post: CampaignItem::new(1, 2, PostStatus::Pending, "x"),
        };
        match integration.handle("ask_for_payment_if_pending", &pending).await.unwrap() {
            HookOutput::PaymentPrompt(prompt) => {
                assert_eq!(prompt.js_callback, "window.wp.adbutler_cc.toPaymentPage()");
                assert_eq!(prompt.button_text, "Continue to Payment");
            }
            other => panic!("unexpected output {:?}", other),
        }

        let draft = HookEvent::EditFormAfterTitle {
            post: CampaignItem::new(1, 2, PostStatus::Draft, "x"),
        };
        assert_eq!(
            integration.handle("ask_for_payment_if_pending", &draft).await.unwrap(),
            HookOutput::None
        );

        let other_type = HookEvent::EditFormAfterTitle {
            post: CampaignItem::new(1, 2, PostStatus::Publish, "x").with_post_type("post"),
        };
        assert_eq!(
            integration.handle("ask_for_payment_if_pending", &other_type).await.unwrap(),
            HookOutput::None
        );
    }

    #[tokio::test]
    async fn test_prompt_falls_back_without_provider() {
        let (_, _, integration) = setup(None, true);
        let event = HookEvent::EditFormAfterTitle {
            post: CampaignItem::new(1, 2, PostStatus::Publish, "x"),
        };

        match integration.handle("ask_for_payment_if_pending", &event).await.unwrap() {
            HookOutput::PaymentPrompt(prompt) => {
                assert_eq!(prompt.js_callback, NO_PAYMENT_CALLBACK)
            }
            other => panic!("unexpected output {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_payment_form() {
        let (_, _, integration) = setup(None, true);
        match integration.handle("print_payment_form", &HookEvent::AdminFooter).await.unwrap() {
            HookOutput::PaymentForm(form) => {
                assert_eq!(form.form_id, PAYMENT_FORM_ID);
                assert_eq!(form.link_id, PAYMENT_LINK_ID);
            }
            other => panic!("unexpected output {:?}", other),
        }
    }
}
