//! # Create Campaign
//!
//! Mirrors each tracked item as an AdButler banner campaign owned by the author's
//! advertiser. Runs after advertiser creation on the same save and backfills the
//! advertiser inline when it is still missing.

use std::sync::Arc;

use async_trait::async_trait;
use campaign_core::text::{esc_html, sanitize_text_field, unslash};
use campaign_core::{
    numeric_id, save_should_cease, AdvertisingApi, CampaignError, CampaignItem, CampaignResult,
    ContentHost, HookBinding, HookCatalog, HookEvent, HookOutput, HookTag, Integration,
    NewCampaign, Submission, CAMPAIGN_ID_META_KEY,
};
use tracing::{debug, info, instrument, warn};

use crate::advertiser::CreateAdvertiserIntegration;

pub struct CreateCampaignIntegration {
    catalog: Arc<HookCatalog>,
    host: Arc<dyn ContentHost>,
    api: Arc<dyn AdvertisingApi>,
    advertisers: CreateAdvertiserIntegration,
}

impl CreateCampaignIntegration {
    pub const NAME: &'static str = "create_campaign";

    pub fn new(
        catalog: Arc<HookCatalog>,
        host: Arc<dyn ContentHost>,
        api: Arc<dyn AdvertisingApi>,
    ) -> Self {
        let advertisers =
            CreateAdvertiserIntegration::new(catalog.clone(), host.clone(), api.clone());
        Self {
            catalog,
            host,
            api,
            advertisers,
        }
    }

    /// Create the remote campaign for a saved item.
    ///
    /// Returns true when a campaign was created.
    #[instrument(skip(self, post, submission))]
    pub async fn create_campaign_on_save_post(
        &self,
        post_id: u64,
        post: &CampaignItem,
        submission: &Submission,
    ) -> CampaignResult<bool> {
        if !post.is_tracked() {
            return Ok(false);
        }
        let Some(raw_title) = submission.title() else {
            return Ok(false);
        };

        if save_should_cease(self.host.as_ref(), post_id, &submission.context).await? {
            return Ok(false);
        }

        let existing = self.host.post_meta(post_id, CAMPAIGN_ID_META_KEY).await?;
        if numeric_id(existing.as_deref()).is_some() {
            debug!("Item already has a campaign");
            return Ok(false);
        }

        let advertiser = match self.advertiser_for(post_id, post, submission).await? {
            Some(id) => id,
            None => {
                warn!(
                    author = post.author,
                    "No advertiser for campaign author, campaign not created"
                );
                return Ok(false);
            }
        };

        let title = sanitize_text_field(&unslash(raw_title));
        let campaign = NewCampaign::new(esc_html(&title), advertiser);
        let resource = self
            .api
            .create_campaign(&campaign)
            .await
            .map_err(CampaignError::client)?;

        let id = resource.id().ok_or(CampaignError::RemoteIdNotSaved {
            resource: "Campaign",
        })?;

        let saved = self
            .host
            .update_post_meta(post_id, CAMPAIGN_ID_META_KEY, &id.to_string())
            .await?;
        if !saved {
            return Err(CampaignError::RemoteIdNotSaved {
                resource: "Campaign",
            });
        }

        info!(campaign_id = id, advertiser, "Campaign created");
        Ok(true)
    }

    /// The author's advertiser id, creating the advertiser first when it is missing
    async fn advertiser_for(
        &self,
        post_id: u64,
        post: &CampaignItem,
        submission: &Submission,
    ) -> CampaignResult<Option<i64>> {
        if let Some(id) = self.advertisers.advertiser_id(post.author).await? {
            return Ok(numeric_id(Some(&id)));
        }

        self.advertisers
            .create_advertiser_on_save_post(post_id, post, submission)
            .await?;

        let id = self.advertisers.advertiser_id(post.author).await?;
        Ok(numeric_id(id.as_deref()))
    }
}

#[async_trait]
impl Integration for CreateCampaignIntegration {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn catalog(&self) -> &Arc<HookCatalog> {
        &self.catalog
    }

    fn bindings(&self) -> Vec<HookBinding> {
        vec![HookBinding::must(
            "must_create_campaign_if_not_exists",
            HookTag::SavePost,
            "create_campaign_on_save_post",
        )
        .with_priority(20)
        .with_arity(3)]
    }

    async fn handle(&self, method: &str, event: &HookEvent) -> CampaignResult<HookOutput> {
        match (method, event) {
            (
                "create_campaign_on_save_post",
                HookEvent::SavePost {
                    post_id,
                    post,
                    submission,
                    ..
                },
            ) => Ok(self
                .create_campaign_on_save_post(*post_id, post, submission)
                .await?
                .into()),
            ("create_campaign_on_save_post", _) => Ok(HookOutput::None),
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
    use campaign_core::capability::EDIT_CAMPAIGN;
    use campaign_core::testing::{ApiCall, RecordingApi};
    use campaign_core::{
        EventDispatcher, MemoryHost, PostStatus, SaveContext, User, ADVERTISER_ID_META_KEY,
    };

    const AUTHOR: u64 = 7;
    const POST: u64 = 3;

    fn base_host() -> MemoryHost {
        MemoryHost::new()
            .with_role_capabilities("contributor", &[EDIT_CAMPAIGN])
            .with_user(User::new(AUTHOR, "jdoe", "jdoe@example.com"), &["contributor"])
    }

    fn integration(host: Arc<MemoryHost>, api: Arc<RecordingApi>) -> CreateCampaignIntegration {
        CreateCampaignIntegration::new(
            Arc::new(HookCatalog::new(Arc::new(EventDispatcher::new()))),
            host,
            api,
        )
    }

    fn save(title: &str) -> (CampaignItem, Submission) {
        (
            CampaignItem::new(POST, AUTHOR, PostStatus::Draft, title),
            Submission::new(title, SaveContext::by_user(AUTHOR)),
        )
    }

    #[tokio::test]
    async fn test_creates_campaign_with_clean_title() {
        let host = Arc::new(base_host().with_user_meta(AUTHOR, ADVERTISER_ID_META_KEY, "55"));
        let api = Arc::new(RecordingApi::new());
        let integration = integration(host.clone(), api.clone());
        let (post, submission) = save(r#"  <b>Tom\'s</b>   Sale & More "#);

        assert!(integration
            .create_campaign_on_save_post(POST, &post, &submission)
            .await
            .unwrap());

        match &api.calls()[..] {
            [ApiCall::CreateCampaign(campaign)] => {
                assert_eq!(campaign.name, "Tom&#039;s Sale &amp; More");
                assert_eq!(campaign.advertiser, 55);
                assert_eq!((campaign.height, campaign.width), (250, 300));
            }
            other => panic!("unexpected calls {:?}", other),
        }
        assert_eq!(
            host.post_meta(POST, CAMPAIGN_ID_META_KEY).await.unwrap().as_deref(),
            Some("100")
        );
    }

    #[tokio::test]
    async fn test_resubmission_never_creates_second_campaign() {
        let host = Arc::new(
            base_host()
                .with_user_meta(AUTHOR, ADVERTISER_ID_META_KEY, "55")
                .with_post_meta(POST, CAMPAIGN_ID_META_KEY, "31"),
        );
        let api = Arc::new(RecordingApi::new());
        let integration = integration(host, api.clone());
        let (post, submission) = save("Spring");

        for _ in 0..2 {
            assert!(!integration
                .create_campaign_on_save_post(POST, &post, &submission)
                .await
                .unwrap());
        }
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_missing_title_is_ignored() {
        let api = Arc::new(RecordingApi::new());
        let integration = integration(Arc::new(base_host()), api.clone());
        let post = CampaignItem::new(POST, AUTHOR, PostStatus::Draft, "");
        let submission = Submission {
            post_title: Some(String::new()),
            context: SaveContext::by_user(AUTHOR),
        };

        assert!(!integration
            .create_campaign_on_save_post(POST, &post, &submission)
            .await
            .unwrap());
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_backfills_advertiser_inline() {
        let host = Arc::new(base_host());
        let api = Arc::new(RecordingApi::new());
        let integration = integration(host.clone(), api.clone());
        let (post, submission) = save("Spring");

        assert!(integration
            .create_campaign_on_save_post(POST, &post, &submission)
            .await
            .unwrap());

        assert_eq!(api.operations(), vec!["create_advertiser", "create_campaign"]);
        match &api.calls()[1] {
            ApiCall::CreateCampaign(campaign) => assert_eq!(campaign.advertiser, 100),
            other => panic!("unexpected call {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_no_resolvable_advertiser_skips_campaign() {
        // Author without a user record: no advertiser can be created
        let host = Arc::new(MemoryHost::new().with_role_capabilities("editor", &[EDIT_CAMPAIGN]));
        host.set_user(User::new(1, "admin", "admin@example.com"), vec!["editor".into()])
            .await;
        let api = Arc::new(RecordingApi::new());
        let integration = integration(host, api.clone());
        let post = CampaignItem::new(POST, 99, PostStatus::Draft, "Spring");
        let submission = Submission::new("Spring", SaveContext::by_user(1));

        assert!(!integration
            .create_campaign_on_save_post(POST, &post, &submission)
            .await
            .unwrap());
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_remote_failure_is_client_error() {
        let host = Arc::new(base_host().with_user_meta(AUTHOR, ADVERTISER_ID_META_KEY, "55"));
        let api = Arc::new(RecordingApi::new().failing("create_campaign", "Advertiser not found"));
        let integration = integration(host.clone(), api);
        let (post, submission) = save("Spring");

        let err = integration
            .create_campaign_on_save_post(POST, &post, &submission)
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Client Error: Advertiser not found");
        assert_eq!(host.post_meta(POST, CAMPAIGN_ID_META_KEY).await.unwrap(), None);
    }
}
