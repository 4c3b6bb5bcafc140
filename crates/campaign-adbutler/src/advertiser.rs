//! # Create Advertiser
//!
//! Associates host users with AdButler advertisers. Banners and campaigns belong to an
//! advertiser, so every author who submits a campaign needs one. The association is
//! stored as user metadata and created at most once per user.

use std::sync::Arc;

use async_trait::async_trait;
use campaign_core::capability::EDIT_CREATIVES;
use campaign_core::text::esc_html;
use campaign_core::{
    save_should_cease, AdvertisingApi, CampaignError, CampaignItem, CampaignResult, ContentHost,
    HookBinding, HookCatalog, HookEvent, HookOutput, HookTag, Integration, NewAdvertiser,
    Submission, ADVERTISER_ID_META_KEY,
};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// Length of generated advertiser passwords
pub const PASSWORD_LENGTH: usize = 12;

/// Random password for a new advertiser account
pub fn generate_password() -> String {
    Uuid::new_v4()
        .simple()
        .to_string()
        .chars()
        .take(PASSWORD_LENGTH)
        .collect()
}

pub struct CreateAdvertiserIntegration {
    catalog: Arc<HookCatalog>,
    host: Arc<dyn ContentHost>,
    api: Arc<dyn AdvertisingApi>,
}

impl CreateAdvertiserIntegration {
    pub const NAME: &'static str = "create_advertiser";

    pub fn new(
        catalog: Arc<HookCatalog>,
        host: Arc<dyn ContentHost>,
        api: Arc<dyn AdvertisingApi>,
    ) -> Self {
        Self { catalog, host, api }
    }

    /// Stored advertiser id of a user, when non-empty
    pub async fn advertiser_id(&self, user_id: u64) -> CampaignResult<Option<String>> {
        Ok(self
            .host
            .user_meta(user_id, ADVERTISER_ID_META_KEY)
            .await?
            .filter(|id| !id.trim().is_empty()))
    }

    /// Make sure the author of a saved campaign has an advertiser.
    ///
    /// Returns true when an advertiser was created.
    #[instrument(skip(self, post, submission), fields(author = post.author))]
    pub async fn create_advertiser_on_save_post(
        &self,
        post_id: u64,
        post: &CampaignItem,
        submission: &Submission,
    ) -> CampaignResult<bool> {
        if !post.is_tracked() || !post.has_author() {
            return Ok(false);
        }

        if save_should_cease(self.host.as_ref(), post_id, &submission.context).await? {
            return Ok(false);
        }

        if self.advertiser_id(post.author).await?.is_some() {
            debug!("Author already has an advertiser");
            return Ok(false);
        }

        let Some(user) = self.host.user(post.author).await? else {
            warn!("Campaign author does not exist");
            return Ok(false);
        };

        self.create_advertiser(user.id, &user.descriptive_name(), &user.email)
            .await?;
        Ok(true)
    }

    /// Make sure a user who may upload creatives has an advertiser.
    ///
    /// Returns true when an advertiser was created.
    #[instrument(skip(self))]
    pub async fn create_advertiser_on_profile_update(&self, user_id: u64) -> CampaignResult<bool> {
        // Gate on the capability, permissions can be granted in many ways besides roles
        if !self.host.user_can(user_id, EDIT_CREATIVES).await {
            return Ok(false);
        }

        if self.advertiser_id(user_id).await?.is_some() {
            return Ok(false);
        }

        let Some(user) = self.host.user(user_id).await? else {
            warn!("Updated user does not exist");
            return Ok(false);
        };

        self.create_advertiser(user.id, &user.login, &user.email).await?;
        Ok(true)
    }

    /// Create the remote advertiser and store its id on the user
    async fn create_advertiser(
        &self,
        user_id: u64,
        name: &str,
        email: &str,
    ) -> CampaignResult<i64> {
        let advertiser = NewAdvertiser::new(esc_html(name), esc_html(email), generate_password());
        let resource = self.api.create_advertiser(&advertiser).await?;

        let id = resource.id().ok_or(CampaignError::RemoteIdNotSaved {
            resource: "advertiser",
        })?;

        let saved = self
            .host
            .update_user_meta(user_id, ADVERTISER_ID_META_KEY, &id.to_string())
            .await?;
        if !saved {
            return Err(CampaignError::RemoteIdNotSaved {
                resource: "advertiser",
            });
        }

        info!(user_id, advertiser_id = id, "Advertiser created via {}", self.api.provider_name());
        Ok(id)
    }
}

#[async_trait]
impl Integration for CreateAdvertiserIntegration {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn catalog(&self) -> &Arc<HookCatalog> {
        &self.catalog
    }

    fn bindings(&self) -> Vec<HookBinding> {
        vec![
            HookBinding::must(
                "must_create_advertiser_if_not_exists",
                HookTag::SavePost,
                "create_advertiser_on_save_post",
            )
            .with_arity(3),
            HookBinding::must(
                "must_create_advertiser_if_not_exists",
                HookTag::ProfileUpdate,
                "create_advertiser_on_profile_update",
            )
            .with_arity(2),
        ]
    }

    async fn handle(&self, method: &str, event: &HookEvent) -> CampaignResult<HookOutput> {
        match (method, event) {
            (
                "create_advertiser_on_save_post",
                HookEvent::SavePost {
                    post_id,
                    post,
                    submission,
                    ..
                },
            ) => Ok(self
                .create_advertiser_on_save_post(*post_id, post, submission)
                .await?
                .into()),
            ("create_advertiser_on_profile_update", HookEvent::ProfileUpdate { user_id, .. }) => {
                Ok(self.create_advertiser_on_profile_update(*user_id).await?.into())
            }
            ("create_advertiser_on_save_post", _) | ("create_advertiser_on_profile_update", _) => {
                Ok(HookOutput::None)
            }
            (other, _) => Err(CampaignError::Internal(format!(
                "{} has no method {}",
                Self::NAME,
                other
            ))),
        }
    }
}
