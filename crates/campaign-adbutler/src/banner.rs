//! # Create Banner
//!
//! Turns the creatives of a saved campaign into AdButler image banners and assigns each
//! to the item's campaign. Runs last on the save, after the advertiser and campaign
//! exist. Creatives that already carry a banner id are left alone.
//!
//! Validation is all-or-nothing: one incomplete creative halts the save before any
//! banner is created.

use std::sync::Arc;

use async_trait::async_trait;
use campaign_core::{
    numeric_id, save_should_cease, AdvertisingApi, BannerLink, CampaignError, CampaignItem,
    CampaignResult, ContentHost, Creative, CreativeMetaProvider, HookBinding, HookCatalog,
    HookEvent, HookOutput, HookTag, Integration, NewBanner, Submission, ADVERTISER_ID_META_KEY,
    CAMPAIGN_ID_META_KEY,
};
use tracing::{debug, error, info, instrument};

use crate::config::TEST_IMAGE_URL;

pub struct CreateBannerIntegration {
    catalog: Arc<HookCatalog>,
    host: Arc<dyn ContentHost>,
    api: Arc<dyn AdvertisingApi>,
    creative_meta: Option<Arc<dyn CreativeMetaProvider>>,
    test_mode: bool,
}

impl CreateBannerIntegration {
    pub const NAME: &'static str = "create_banner";

    pub fn new(
        catalog: Arc<HookCatalog>,
        host: Arc<dyn ContentHost>,
        api: Arc<dyn AdvertisingApi>,
        creative_meta: Option<Arc<dyn CreativeMetaProvider>>,
    ) -> Self {
        Self {
            catalog,
            host,
            api,
            creative_meta,
            test_mode: true,
        }
    }

    /// Builder: send the uploaded image instead of the placeholder
    pub fn with_test_mode(mut self, test_mode: bool) -> Self {
        self.test_mode = test_mode;
        self
    }

    /// Create banners for every creative of the item that has none yet.
    ///
    /// Returns true when at least one banner was created.
    #[instrument(skip(self, post, submission))]
    pub async fn create_banner_on_save_post(
        &self,
        post_id: u64,
        post: &CampaignItem,
        submission: &Submission,
    ) -> CampaignResult<bool> {
        if !post.is_tracked() {
            return Ok(false);
        }

        if save_should_cease(self.host.as_ref(), post_id, &submission.context).await? {
            return Ok(false);
        }

        let Some(creative_meta) = &self.creative_meta else {
            debug!("No creative metadata provider, banners not created");
            return Ok(false);
        };

        let creatives = creative_meta.creatives(post_id).await?;
        if creatives.is_empty() {
            return Ok(false);
        }

        let advertiser = self
            .host
            .user_meta(post.author, ADVERTISER_ID_META_KEY)
            .await?;
        let campaign = numeric_id(
            self.host
                .post_meta(post_id, CAMPAIGN_ID_META_KEY)
                .await?
                .as_deref(),
        );
        let advertiser = advertiser.filter(|id| !id.trim().is_empty());
        let (Some(_), Some(campaign)) = (advertiser, campaign) else {
            debug!("Advertiser or campaign missing, banners not created");
            return Ok(false);
        };

        let pending: Vec<(usize, &Creative)> = creatives
            .iter()
            .enumerate()
            .filter(|(_, creative)| !creative.has_remote_id())
            .collect();

        for (index, creative) in &pending {
            let missing = creative.missing_fields();
            if !missing.is_empty() {
                error!(index, ?missing, "Creative is incomplete");
                return Err(CampaignError::MissingCreativeFields {
                    index: *index,
                    fields: missing,
                });
            }
        }

        for (index, creative) in &pending {
            let banner_id = self.create_banner(creative).await?;

            self.api
                .link_banner_to_campaign(&BannerLink::new(campaign, banner_id))
                .await
                .map_err(CampaignError::link)?;

            if !creative_meta
                .set_advertisement_id(post_id, *index, banner_id)
                .await?
            {
                return Err(CampaignError::RemoteIdNotSaved { resource: "banner" });
            }

            info!(index, banner_id, campaign, "Banner created and assigned");
        }

        Ok(!pending.is_empty())
    }

    async fn create_banner(&self, creative: &Creative) -> CampaignResult<i64> {
        let image_url = if self.test_mode {
            TEST_IMAGE_URL
        } else {
            creative.image_url().unwrap_or_default()
        };

        let banner = NewBanner::new(creative.name.clone().unwrap_or_default(), image_url)
            .with_location(creative.location.as_deref().unwrap_or_default())
            .with_alt_text(creative.html_alt_text.as_deref().unwrap_or_default());

        let resource = self
            .api
            .create_banner(&banner)
            .await
            .map_err(CampaignError::client)?;

        resource
            .id()
            .ok_or(CampaignError::RemoteIdNotSaved { resource: "banner" })
    }
}

#[async_trait]
impl Integration for CreateBannerIntegration {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn catalog(&self) -> &Arc<HookCatalog> {
        &self.catalog
    }

    fn bindings(&self) -> Vec<HookBinding> {
        vec![HookBinding::must(
            "must_create_banner_if_not_exists",
            HookTag::SavePost,
            "create_banner_on_save_post",
        )
        .with_priority(30)
        .with_arity(3)]
    }

    async fn handle(&self, method: &str, event: &HookEvent) -> CampaignResult<HookOutput> {
        match (method, event) {
            (
                "create_banner_on_save_post",
                HookEvent::SavePost {
                    post_id,
                    post,
                    submission,
                    ..
                },
            ) => Ok(self
                .create_banner_on_save_post(*post_id, post, submission)
                .await?
                .into()),
            ("create_banner_on_save_post", _) => Ok(HookOutput::None),
            (other, _) => Err(CampaignError::Internal(format!(
                "{} has no method {}",
                Self::NAME,
                other
            ))),
        }
    }
}
