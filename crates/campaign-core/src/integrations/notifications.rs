//! Email notifications keyed to campaign status transitions.
//!
//! Entering `pending` from any other status notifies the site admins. Moving from
//! `pending` to `publish` notifies the author. No other edge sends anything.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::campaign::{CampaignItem, PostStatus, StatusTransition};
use crate::error::{CampaignError, CampaignResult};
use crate::hooks::{HookCatalog, HookEvent, HookOutput, HookTag};
use crate::integration::{HookBinding, Integration};
use crate::providers::EmailProvider;

pub struct EmailNotificationsIntegration {
    catalog: Arc<HookCatalog>,
    email: Option<Arc<dyn EmailProvider>>,
}

impl EmailNotificationsIntegration {
    pub const NAME: &'static str = "email_notifications";

    pub fn new(catalog: Arc<HookCatalog>, email: Option<Arc<dyn EmailProvider>>) -> Self {
        Self { catalog, email }
    }

    pub async fn notify_site_admin(
        &self,
        new_status: PostStatus,
        old_status: PostStatus,
        post: &CampaignItem,
    ) -> CampaignResult<bool> {
        if !post.is_tracked() || !StatusTransition::new(new_status, old_status).enters_pending() {
            return Ok(false);
        }
        let Some(email) = &self.email else {
            debug!(post_id = post.id, "No email provider, skipping admin notification");
            return Ok(false);
        };

        let sent = email.notify_site_admin(post).await?;
        info!(post_id = post.id, sent, "Site admin notified of pending campaign");
        Ok(sent)
    }

    pub async fn notify_campaign_author(
        &self,
        new_status: PostStatus,
        old_status: PostStatus,
        post: &CampaignItem,
    ) -> CampaignResult<bool> {
        if !post.is_tracked() || !StatusTransition::new(new_status, old_status).approves() {
            return Ok(false);
        }
        let Some(email) = &self.email else {
            debug!(post_id = post.id, "No email provider, skipping author notification");
            return Ok(false);
        };

        let sent = email.notify_campaign_author(post).await?;
        info!(post_id = post.id, sent, "Author notified of approved campaign");
        Ok(sent)
    }
}

#[async_trait]
impl Integration for EmailNotificationsIntegration {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn catalog(&self) -> &Arc<HookCatalog> {
        &self.catalog
    }

    fn bindings(&self) -> Vec<HookBinding> {
        vec![
            HookBinding::maybe(
                "maybe_notify_site_admin_of_pending_campaign",
                HookTag::TransitionPostStatus,
                "notify_site_admin",
            )
            .with_arity(3),
            HookBinding::maybe(
                "maybe_notify_campaign_author_of_approval",
                HookTag::TransitionPostStatus,
                "notify_campaign_author",
            )
            .with_arity(3),
        ]
    }

    async fn handle(&self, method: &str, event: &HookEvent) -> CampaignResult<HookOutput> {
        let HookEvent::TransitionPostStatus {
            new_status,
            old_status,
            post,
        } = event
        else {
            return Ok(HookOutput::None);
        };

        let sent = match method {
            "notify_site_admin" => self.notify_site_admin(*new_status, *old_status, post).await?,
            "notify_campaign_author" => {
                self.notify_campaign_author(*new_status, *old_status, post)
                    .await?
            }
            other => {
                return Err(CampaignError::Internal(format!(
                    "{} has no method {}",
                    Self::NAME,
                    other
                )))
            }
        };
        Ok(sent.into())
    }
}
