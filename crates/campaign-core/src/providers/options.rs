//! Options provider backed by the host's option storage.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::campaign::CAMPAIGN_POST_TYPE;
use crate::error::CampaignResult;
use crate::host::{ContentHost, SettingsField, SubmenuPage};

/// Option holding the API settings map
pub const API_OPTIONS_NAME: &str = "adbutler_api_options";

/// Slug of the options page
pub const OPTIONS_PAGE_SLUG: &str = "adbutler_api";

/// Capability required to see the options page
pub const OPTIONS_PAGE_CAPABILITY: &str = "manage_options";

/// Read access to plugin options
#[async_trait]
pub trait OptionsProvider: Send + Sync {
    /// The whole options map
    async fn options(&self) -> Option<Value>;

    /// One key of the options map
    async fn provide(&self, key: &str) -> Option<Value> {
        self.options().await.and_then(|options| options.get(key).cloned())
    }

    /// API credential, when set and non-empty
    async fn api_key(&self) -> Option<String> {
        self.provide("api_key")
            .await
            .and_then(|v| v.as_str().map(str::to_string))
            .filter(|key| !key.trim().is_empty())
    }

    /// Register the options page, its setting and fields. Returns the page hook suffix.
    async fn setup(&self) -> CampaignResult<String>;
}

/// Options stored under [`API_OPTIONS_NAME`] in the host
pub struct HostOptionsProvider {
    host: Arc<dyn ContentHost>,
}

impl HostOptionsProvider {
    pub fn new(host: Arc<dyn ContentHost>) -> Self {
        Self { host }
    }
}

#[async_trait]
impl OptionsProvider for HostOptionsProvider {
    async fn options(&self) -> Option<Value> {
        self.host.option(API_OPTIONS_NAME).await
    }

    async fn setup(&self) -> CampaignResult<String> {
        let hook_suffix = self
            .host
            .add_submenu_page(SubmenuPage {
                parent_slug: format!("edit.php?post_type={}", CAMPAIGN_POST_TYPE),
                page_title: "Options".to_string(),
                menu_title: "Options".to_string(),
                capability: OPTIONS_PAGE_CAPABILITY.to_string(),
                menu_slug: OPTIONS_PAGE_SLUG.to_string(),
            })
            .await;

        self.host
            .register_setting(API_OPTIONS_NAME, API_OPTIONS_NAME)
            .await;

        self.host
            .add_settings_field(SettingsField {
                option_name: API_OPTIONS_NAME.to_string(),
                id: "api_key".to_string(),
                title: "API Key".to_string(),
                input: "password".to_string(),
                page: OPTIONS_PAGE_SLUG.to_string(),
                section: "main".to_string(),
            })
            .await;

        debug!("Options page registered as {}", hook_suffix);
        Ok(hook_suffix)
    }
}
