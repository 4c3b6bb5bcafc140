//! Settings integration: puts the options page in the admin menu.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::error::{CampaignError, CampaignResult};
use crate::hooks::{HookCatalog, HookEvent, HookOutput, HookTag};
use crate::integration::{HookBinding, Integration};
use crate::providers::OptionsProvider;

pub struct SettingsIntegration {
    catalog: Arc<HookCatalog>,
    options: Option<Arc<dyn OptionsProvider>>,
}

impl SettingsIntegration {
    pub const NAME: &'static str = "settings";

    pub fn new(catalog: Arc<HookCatalog>, options: Option<Arc<dyn OptionsProvider>>) -> Self {
        Self { catalog, options }
    }

    pub async fn render_settings_page(&self) -> CampaignResult<bool> {
        let Some(options) = &self.options else {
            debug!("No options provider, settings page not rendered");
            return Ok(false);
        };
        options.setup().await?;
        Ok(true)
    }
}

#[async_trait]
impl Integration for SettingsIntegration {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn catalog(&self) -> &Arc<HookCatalog> {
        &self.catalog
    }

    fn bindings(&self) -> Vec<HookBinding> {
        // Late, so the content type menu exists before the page is attached to it
        vec![HookBinding::maybe(
            "maybe_render_settings_page",
            HookTag::AdminMenu,
            "render_settings_page",
        )
        .with_priority(99)]
    }

    async fn handle(&self, method: &str, _event: &HookEvent) -> CampaignResult<HookOutput> {
        match method {
            "render_settings_page" => Ok(self.render_settings_page().await?.into()),
            other => Err(CampaignError::Internal(format!(
                "{} has no method {}",
                Self::NAME,
                other
            ))),
        }
    }
}
