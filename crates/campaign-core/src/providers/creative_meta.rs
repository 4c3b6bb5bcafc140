//! Creative metadata providers: where the creatives of a campaign item live.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::campaign::{Creative, ADVERTISEMENT_ID_FIELD, CAMPAIGN_POST_TYPE, CREATIVES_FIELD};
use crate::error::CampaignResult;
use crate::host::{ContentHost, FieldGroup, SubField};

/// Maximum creatives per campaign item
pub const MAX_CREATIVES: usize = 20;

/// Access to the creative sub-records of an item
#[async_trait]
pub trait CreativeMetaProvider: Send + Sync {
    fn name(&self) -> &'static str;

    async fn creatives(&self, post_id: u64) -> CampaignResult<Vec<Creative>>;

    /// Store a remote banner id on the creative at `index` (0-based)
    async fn set_advertisement_id(
        &self,
        post_id: u64,
        index: usize,
        id: i64,
    ) -> CampaignResult<bool>;

    /// Declare the creative field group with the host. Returns false when unsupported.
    async fn declare_fields(&self) -> CampaignResult<bool>;
}

/// Used when no custom field extension is available: items have no creatives
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCreativeMeta;

#[async_trait]
impl CreativeMetaProvider for NoCreativeMeta {
    fn name(&self) -> &'static str {
        "none"
    }

    async fn creatives(&self, _post_id: u64) -> CampaignResult<Vec<Creative>> {
        Ok(Vec::new())
    }

    async fn set_advertisement_id(
        &self,
        _post_id: u64,
        _index: usize,
        _id: i64,
    ) -> CampaignResult<bool> {
        Ok(false)
    }

    async fn declare_fields(&self) -> CampaignResult<bool> {
        Ok(false)
    }
}

/// Creatives stored in the host's repeater field
pub struct CustomFieldCreativeMeta {
    host: Arc<dyn ContentHost>,
}

impl CustomFieldCreativeMeta {
    pub fn new(host: Arc<dyn ContentHost>) -> Self {
        Self { host }
    }

    /// The "Add Your Creatives" repeater group
    pub fn field_group() -> FieldGroup {
        let sub_field = |name: &str, label: &str, kind: &str, required: bool| SubField {
            name: name.to_string(),
            label: label.to_string(),
            kind: kind.to_string(),
            required,
        };

        FieldGroup {
            key: "group_adbutler_campaign_creatives".to_string(),
            title: "Add Your Creatives".to_string(),
            field: CREATIVES_FIELD.to_string(),
            label: "Campaign Creatives".to_string(),
            max_rows: MAX_CREATIVES,
            sub_fields: vec![
                sub_field("name", "Name", "text", true),
                sub_field("creative", "Creative", "image", true),
                sub_field("location", "Location", "url", false),
                sub_field("html_alt_text", "Alt Text", "text", false),
            ],
            post_type: CAMPAIGN_POST_TYPE.to_string(),
        }
    }
}

#[async_trait]
impl CreativeMetaProvider for CustomFieldCreativeMeta {
    fn name(&self) -> &'static str {
        "custom_fields"
    }

    async fn creatives(&self, post_id: u64) -> CampaignResult<Vec<Creative>> {
        self.host.creatives(post_id, CREATIVES_FIELD).await
    }

    async fn set_advertisement_id(
        &self,
        post_id: u64,
        index: usize,
        id: i64,
    ) -> CampaignResult<bool> {
        // Repeater rows are addressed from 1
        self.host
            .update_creative_field(
                post_id,
                CREATIVES_FIELD,
                index + 1,
                ADVERTISEMENT_ID_FIELD,
                &id.to_string(),
            )
            .await
    }

    async fn declare_fields(&self) -> CampaignResult<bool> {
        self.host.register_field_group(Self::field_group()).await?;
        debug!("Creative field group declared");
        Ok(true)
    }
}
