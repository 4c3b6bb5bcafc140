//! Registers the campaign content type, and optionally its creative fields, on `init`.

use std::sync::Arc;

use async_trait::async_trait;
use campaign_core::capability::capabilities;
use campaign_core::host::PostTypeDefinition;
use campaign_core::{
    CampaignError, CampaignResult, ContentHost, CreativeMetaProvider, HookBinding, HookCatalog,
    HookEvent, HookOutput, HookTag, Integration, CAMPAIGN_POST_TYPE,
};
use tracing::{debug, info};

/// The `adbutler_campaign` content type
pub fn campaign_post_type() -> PostTypeDefinition {
    PostTypeDefinition {
        name: CAMPAIGN_POST_TYPE.to_string(),
        singular_label: "Ad Campaign".to_string(),
        plural_label: "Ad Campaigns".to_string(),
        description: "Adbutler Campaigns".to_string(),
        menu_position: 20,
        exclude_from_search: true,
        public: false,
        show_ui: true,
        supports: vec!["title".to_string(), "author".to_string()],
        taxonomies: Vec::new(),
        capabilities: capabilities()
            .into_iter()
            .map(|(generic, specific)| (generic.to_string(), specific.to_string()))
            .collect(),
    }
}

pub struct ContentTypeIntegration {
    catalog: Arc<HookCatalog>,
    host: Arc<dyn ContentHost>,
    creative_meta: Option<Arc<dyn CreativeMetaProvider>>,
    declare_fields: bool,
}

impl ContentTypeIntegration {
    pub const NAME: &'static str = "content_type";

    pub fn new(
        catalog: Arc<HookCatalog>,
        host: Arc<dyn ContentHost>,
        creative_meta: Option<Arc<dyn CreativeMetaProvider>>,
    ) -> Self {
        Self {
            catalog,
            host,
            creative_meta,
            declare_fields: false,
        }
    }

    /// Builder: declare the creative field group with the host on `init`
    pub fn with_declared_fields(mut self, declare_fields: bool) -> Self {
        self.declare_fields = declare_fields;
        self
    }

    pub async fn register_content_type(&self) -> CampaignResult<bool> {
        self.host.register_post_type(campaign_post_type()).await?;
        info!("Registered content type {}", CAMPAIGN_POST_TYPE);
        Ok(true)
    }

    pub async fn declare_creative_fields(&self) -> CampaignResult<bool> {
        if !self.declare_fields {
            return Ok(false);
        }
        match &self.creative_meta {
            Some(creative_meta) => creative_meta.declare_fields().await,
            None => {
                debug!("No creative metadata provider, fields not declared");
                Ok(false)
            }
        }
    }
}

#[async_trait]
impl Integration for ContentTypeIntegration {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn catalog(&self) -> &Arc<HookCatalog> {
        &self.catalog
    }

    fn bindings(&self) -> Vec<HookBinding> {
        vec![
            HookBinding::must("must_register_content_type", HookTag::Init, "register_content_type")
                .with_arity(0),
            HookBinding::maybe(
                "maybe_declare_creative_fields",
                HookTag::Init,
                "declare_creative_fields",
            )
            .with_priority(11)
            .with_arity(0),
        ]
    }

    async fn handle(&self, method: &str, _event: &HookEvent) -> CampaignResult<HookOutput> {
        match method {
            "register_content_type" => Ok(self.register_content_type().await?.into()),
            "declare_creative_fields" => Ok(self.declare_creative_fields().await?.into()),
            other => Err(CampaignError::Internal(format!(
                "{} has no method {}",
                Self::NAME,
                other
            ))),
        }
    }
}
