//! # Email Providers
//!
//! Notifications sent when a campaign is submitted for review and when it is approved.
//! Authors who can publish campaigns themselves are never notified about either.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::campaign::{CampaignItem, User};
use crate::capability::PUBLISH_CAMPAIGNS;
use crate::error::CampaignResult;
use crate::host::{ContentHost, EmailSituation, Mail};
use crate::text::esc_html;

/// Situation sent to site admins when a campaign enters review
pub const SUBMISSION_SITUATION: &str = "ad_campaign_submission";

/// Situation sent to the author when a campaign is approved
pub const APPROVAL_SITUATION: &str = "ad_campaign_approval";

/// Sends campaign workflow notifications
#[async_trait]
pub trait EmailProvider: Send + Sync {
    fn name(&self) -> &'static str;

    /// Tell site admins a campaign awaits review. Returns whether mail went out.
    async fn notify_site_admin(&self, post: &CampaignItem) -> CampaignResult<bool>;

    /// Tell the author their campaign is live. Returns whether mail went out.
    async fn notify_campaign_author(&self, post: &CampaignItem) -> CampaignResult<bool>;

    /// One-time setup on plugin activation
    async fn activate(&self) -> CampaignResult<()> {
        Ok(())
    }
}

/// Plain mail through the host
pub struct MailEmailProvider {
    host: Arc<dyn ContentHost>,
    extra_admin_recipients: Vec<String>,
}

impl MailEmailProvider {
    pub fn new(host: Arc<dyn ContentHost>) -> Self {
        Self {
            host,
            extra_admin_recipients: Vec::new(),
        }
    }

    /// Builder: additional addresses notified alongside the site admin
    pub fn with_admin_recipients(mut self, recipients: Vec<String>) -> Self {
        self.extra_admin_recipients = recipients;
        self
    }

    /// The author, unless there is none or they can publish on their own
    async fn notifiable_author(&self, post: &CampaignItem) -> CampaignResult<Option<User>> {
        if !post.has_author() {
            return Ok(None);
        }
        let Some(author) = self.host.user(post.author).await? else {
            warn!(post_id = post.id, author = post.author, "Campaign author not found");
            return Ok(None);
        };
        if self.host.user_can(author.id, PUBLISH_CAMPAIGNS).await {
            debug!(post_id = post.id, "Author can publish, no notification needed");
            return Ok(None);
        }
        Ok(Some(author))
    }

    /// Site admin address plus any configured extras
    async fn admin_recipients(&self) -> Vec<String> {
        let mut recipients: Vec<String> = self
            .host
            .option("admin_email")
            .await
            .and_then(|v| v.as_str().map(str::to_string))
            .filter(|email| !email.is_empty())
            .into_iter()
            .collect();
        recipients.extend(self.extra_admin_recipients.iter().cloned());
        recipients
    }
}

#[async_trait]
impl EmailProvider for MailEmailProvider {
    fn name(&self) -> &'static str {
        "mail"
    }

    async fn notify_site_admin(&self, post: &CampaignItem) -> CampaignResult<bool> {
        let Some(author) = self.notifiable_author(post).await? else {
            return Ok(false);
        };

        let mail = Mail {
            to: self.admin_recipients().await,
            subject: format!(
                "{} Has Submitted an Ad Campaign for your Review",
                author.display_name
            ),
            body: format!("Click here to review: {}.", self.host.edit_link(post.id)),
        };
        Ok(self.host.send_mail(mail).await)
    }

    async fn notify_campaign_author(&self, post: &CampaignItem) -> CampaignResult<bool> {
        let Some(author) = self.notifiable_author(post).await? else {
            return Ok(false);
        };

        let mail = Mail {
            to: vec![author.email],
            subject: "Your Ad Campaign is now live!".to_string(),
            body: format!(
                "Your Ad Campaign, {}, was just published.",
                esc_html(&post.title)
            ),
        };
        Ok(self.host.send_mail(mail).await)
    }
}

/// Templated email situations, falling back to plain mail when sending fails
pub struct TemplatedEmailProvider {
    host: Arc<dyn ContentHost>,
    fallback: MailEmailProvider,
}

impl TemplatedEmailProvider {
    pub fn new(host: Arc<dyn ContentHost>) -> Self {
        Self {
            fallback: MailEmailProvider::new(host.clone()),
            host,
        }
    }

    /// Builder: additional addresses notified alongside the site admin
    pub fn with_admin_recipients(mut self, recipients: Vec<String>) -> Self {
        self.fallback = self.fallback.with_admin_recipients(recipients);
        self
    }

    /// Situations installed on activation
    pub fn situations() -> Vec<EmailSituation> {
        vec![
            EmailSituation {
                slug: SUBMISSION_SITUATION.to_string(),
                description: "A contributor submits a new advertising campaign for review."
                    .to_string(),
                subject: "[{{{site.name}}}]: New Ad Campaign".to_string(),
                body: [
                    "[{{{campaign.author}}}] has submitted a new ad campaign for your review:",
                    "Title: [{{{campaign.title}}}]",
                    "Link: [{{{campaign.link}}}]",
                ]
                .join("\n"),
            },
            EmailSituation {
                slug: APPROVAL_SITUATION.to_string(),
                description: "A site administrator approves a submitted advertising campaign."
                    .to_string(),
                subject: "[{{{site.name}}}]: Ad Campaign Approved".to_string(),
                body: [
                    "The campaign [{{{campaign.title}}}] has been approved!",
                    "Link: [{{{campaign.link}}}]",
                ]
                .join("\n"),
            },
        ]
    }

    fn tokens(&self, post: &CampaignItem, author: &User) -> HashMap<String, String> {
        HashMap::from([
            ("site.name".to_string(), self.host.site_name()),
            ("campaign.title".to_string(), post.title.clone()),
            ("campaign.author".to_string(), author.display_name.clone()),
            ("campaign.link".to_string(), self.host.edit_link(post.id)),
        ])
    }
}

#[async_trait]
impl EmailProvider for TemplatedEmailProvider {
    fn name(&self) -> &'static str {
        "templated"
    }

    async fn notify_site_admin(&self, post: &CampaignItem) -> CampaignResult<bool> {
        let Some(author) = self.fallback.notifiable_author(post).await? else {
            return Ok(false);
        };

        let recipients = self.fallback.admin_recipients().await;
        let tokens = self.tokens(post, &author);
        match self
            .host
            .send_templated_email(SUBMISSION_SITUATION, &recipients, &tokens)
            .await
        {
            Ok(sent) => Ok(sent),
            Err(e) => {
                warn!("Templated submission email failed, sending plain mail: {}", e);
                self.fallback.notify_site_admin(post).await
            }
        }
    }

    async fn notify_campaign_author(&self, post: &CampaignItem) -> CampaignResult<bool> {
        let Some(author) = self.fallback.notifiable_author(post).await? else {
            return Ok(false);
        };

        let recipients = vec![author.email.clone()];
        let tokens = self.tokens(post, &author);
        match self
            .host
            .send_templated_email(APPROVAL_SITUATION, &recipients, &tokens)
            .await
        {
            Ok(sent) => Ok(sent),
            Err(e) => {
                warn!("Templated approval email failed, sending plain mail: {}", e);
                self.fallback.notify_campaign_author(post).await
            }
        }
    }

    async fn activate(&self) -> CampaignResult<()> {
        for situation in Self::situations() {
            debug!("Installing email situation {}", situation.slug);
            self.host.install_email_situation(situation).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::campaign::PostStatus;
    use crate::host::{HostFeature, MemoryHost};
    use serde_json::json;

    fn host() -> MemoryHost {
        MemoryHost::new()
            .with_site("Ad Site", "https://ads.example.com")
            .with_option("admin_email", json!("admin@example.com"))
            .with_role_capabilities("editor", &[PUBLISH_CAMPAIGNS])
            .with_user(
                User::new(2, "writer", "writer@example.com").with_display_name("Wendy Writer"),
                &["contributor"],
            )
            .with_user(User::new(3, "ed", "ed@example.com"), &["editor"])
    }

    #[tokio::test]
    async fn test_admin_notification() {
        let host = Arc::new(host());
        let provider = MailEmailProvider::new(host.clone())
            .with_admin_recipients(vec!["ops@example.com".to_string()]);
        let post = CampaignItem::new(8, 2, PostStatus::Pending, "Spring");

        assert!(provider.notify_site_admin(&post).await.unwrap());

        let mail = host.sent_mail().await;
        assert_eq!(mail.len(), 1);
        assert_eq!(mail[0].to, vec!["admin@example.com", "ops@example.com"]);
        assert_eq!(
            mail[0].subject,
            "Wendy Writer Has Submitted an Ad Campaign for your Review"
        );
        assert_eq!(
            mail[0].body,
            "Click here to review: https://ads.example.com/wp-admin/post.php?post=8&action=edit."
        );
    }

    #[tokio::test]
    async fn test_author_notification_escapes_title() {
        let host = Arc::new(host());
        let provider = MailEmailProvider::new(host.clone());
        let post = CampaignItem::new(8, 2, PostStatus::Publish, "Tom & Jerry");

        assert!(provider.notify_campaign_author(&post).await.unwrap());

        let mail = host.sent_mail().await;
        assert_eq!(mail[0].to, vec!["writer@example.com"]);
        assert_eq!(mail[0].subject, "Your Ad Campaign is now live!");
        assert_eq!(
            mail[0].body,
            "Your Ad Campaign, Tom &amp; Jerry, was just published."
        );
    }

    #[tokio::test]
    async fn test_publishers_and_orphans_are_skipped() {
        let host = Arc::new(host());
        let provider = MailEmailProvider::new(host.clone());

        let by_editor = CampaignItem::new(8, 3, PostStatus::Pending, "x");
        let orphan = CampaignItem::new(9, 0, PostStatus::Pending, "x");
        let unknown = CampaignItem::new(10, 99, PostStatus::Pending, "x");

        assert!(!provider.notify_site_admin(&by_editor).await.unwrap());
        assert!(!provider.notify_site_admin(&orphan).await.unwrap());
        assert!(!provider.notify_campaign_author(&unknown).await.unwrap());
        assert!(host.sent_mail().await.is_empty());
    }

    #[tokio::test]
    async fn test_templated_sends_situation() {
        let host = Arc::new(host().with_feature(HostFeature::TemplatedEmail));
        let provider = TemplatedEmailProvider::new(host.clone());
        provider.activate().await.unwrap();
        assert_eq!(host.email_situations().await.len(), 2);

        let post = CampaignItem::new(8, 2, PostStatus::Pending, "Spring");
        assert!(provider.notify_site_admin(&post).await.unwrap());

        let sent = host.sent_templated().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].situation, SUBMISSION_SITUATION);
        assert_eq!(sent[0].tokens["campaign.author"], "Wendy Writer");
        assert_eq!(sent[0].tokens["site.name"], "Ad Site");
        assert!(host.sent_mail().await.is_empty());
    }

    #[tokio::test]
    async fn test_templated_falls_back_to_mail() {
        // Situations never installed, so the templated send fails
        let host = Arc::new(host().with_feature(HostFeature::TemplatedEmail));
        let provider = TemplatedEmailProvider::new(host.clone());
        let post = CampaignItem::new(8, 2, PostStatus::Publish, "Spring");

        assert!(provider.notify_campaign_author(&post).await.unwrap());

        assert!(host.sent_templated().await.is_empty());
        assert_eq!(host.sent_mail().await[0].to, vec!["writer@example.com"]);
    }
}
