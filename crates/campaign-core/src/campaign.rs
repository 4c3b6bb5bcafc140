//! # Campaign Records
//!
//! Host-owned records the integrations read and annotate: the tracked campaign item,
//! its creatives, the users who author them, and the status transitions that drive
//! notifications.

use serde::{Deserialize, Serialize};

/// Content type of the tracked campaign item
pub const CAMPAIGN_POST_TYPE: &str = "adbutler_campaign";

/// User metadata key holding the remote advertiser id
pub const ADVERTISER_ID_META_KEY: &str = "adbutler_advertiser_id";

/// Item metadata key holding the remote campaign id
pub const CAMPAIGN_ID_META_KEY: &str = "adbutler_campaign_id";

/// Repeater field holding the creatives of a campaign item
pub const CREATIVES_FIELD: &str = "adbutler_campaign_creatives";

/// Creative sub-field holding the remote banner id
pub const ADVERTISEMENT_ID_FIELD: &str = "advertisement_id";

/// Publication status of a content item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PostStatus {
    New,
    AutoDraft,
    Draft,
    Pending,
    Publish,
    Future,
    Private,
    Trash,
}

impl PostStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostStatus::New => "new",
            PostStatus::AutoDraft => "auto-draft",
            PostStatus::Draft => "draft",
            PostStatus::Pending => "pending",
            PostStatus::Publish => "publish",
            PostStatus::Future => "future",
            PostStatus::Private => "private",
            PostStatus::Trash => "trash",
        }
    }
}

impl std::fmt::Display for PostStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A status change edge. Side effects key off the edge, never the resulting state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusTransition {
    pub new_status: PostStatus,
    pub old_status: PostStatus,
}

impl StatusTransition {
    pub fn new(new_status: PostStatus, old_status: PostStatus) -> Self {
        Self {
            new_status,
            old_status,
        }
    }

    /// Entering `pending` from any other status
    pub fn enters_pending(&self) -> bool {
        self.new_status == PostStatus::Pending && self.old_status != PostStatus::Pending
    }

    /// Moving from `pending` straight to `publish`
    pub fn approves(&self) -> bool {
        self.old_status == PostStatus::Pending && self.new_status == PostStatus::Publish
    }
}

/// Snapshot of a content item as delivered with an event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignItem {
    pub id: u64,
    #[serde(default = "default_post_type")]
    pub post_type: String,
    /// Author user id, 0 when the item has no author
    #[serde(default)]
    pub author: u64,
    pub status: PostStatus,
    #[serde(default)]
    pub title: String,
}

fn default_post_type() -> String {
    CAMPAIGN_POST_TYPE.to_string()
}

impl CampaignItem {
    /// Create a tracked campaign item
    pub fn new(id: u64, author: u64, status: PostStatus, title: impl Into<String>) -> Self {
        Self {
            id,
            post_type: CAMPAIGN_POST_TYPE.to_string(),
            author,
            status,
            title: title.into(),
        }
    }

    /// Builder: set a different content type
    pub fn with_post_type(mut self, post_type: impl Into<String>) -> Self {
        self.post_type = post_type.into();
        self
    }

    /// Is this item of the tracked campaign type?
    pub fn is_tracked(&self) -> bool {
        self.post_type == CAMPAIGN_POST_TYPE
    }

    pub fn has_author(&self) -> bool {
        self.author != 0
    }

    /// Payment is requested once the campaign has been submitted
    pub fn awaits_payment(&self) -> bool {
        matches!(self.status, PostStatus::Pending | PostStatus::Publish)
    }
}

/// Host user profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub login: String,
    #[serde(default)]
    pub display_name: String,
    pub email: String,
}

impl User {
    pub fn new(id: u64, login: impl Into<String>, email: impl Into<String>) -> Self {
        let login = login.into();
        Self {
            id,
            display_name: login.clone(),
            login,
            email: email.into(),
        }
    }

    /// Builder: set display name
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = name.into();
        self
    }

    /// Advertiser name used when the association is created from a save
    pub fn descriptive_name(&self) -> String {
        format!("{} | {} | {} ", self.display_name, self.login, self.id)
    }
}

/// Uploaded image asset of a creative
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreativeImage {
    pub url: String,
}

/// One banner image and its metadata inside a campaign item
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Creative {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub creative: Option<CreativeImage>,
    /// Click-through destination
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub html_alt_text: Option<String>,
    #[serde(default)]
    pub advertisement_id: Option<String>,
}

impl Creative {
    /// Fields that must be present before a banner can be created
    pub const REQUIRED_FIELDS: [&'static str; 4] =
        ["name", "creative", "location", "html_alt_text"];

    /// Create a creative with every required field filled
    pub fn new(
        name: impl Into<String>,
        image_url: impl Into<String>,
        location: impl Into<String>,
        alt: impl Into<String>,
    ) -> Self {
        Self {
            name: Some(name.into()),
            creative: Some(CreativeImage {
                url: image_url.into(),
            }),
            location: Some(location.into()),
            html_alt_text: Some(alt.into()),
            advertisement_id: None,
        }
    }

    /// Builder: set the remote banner id
    pub fn with_advertisement_id(mut self, id: impl Into<String>) -> Self {
        self.advertisement_id = Some(id.into());
        self
    }

    /// Already mirrored as a remote banner?
    pub fn has_remote_id(&self) -> bool {
        self.advertisement_id
            .as_deref()
            .map(|id| !id.trim().is_empty())
            .unwrap_or(false)
    }

    /// Required fields that are absent
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let present = [
            self.name.is_some(),
            self.creative.is_some(),
            self.location.is_some(),
            self.html_alt_text.is_some(),
        ];
        Self::REQUIRED_FIELDS
            .iter()
            .zip(present)
            .filter(|(_, present)| !present)
            .map(|(field, _)| *field)
            .collect()
    }

    pub fn image_url(&self) -> Option<&str> {
        self.creative.as_ref().map(|image| image.url.as_str())
    }
}

/// Circumstances of a save that decide whether workflows should run at all
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveContext {
    #[serde(default)]
    pub autosave: bool,
    #[serde(default)]
    pub ajax: bool,
    #[serde(default)]
    pub revision: bool,
    /// User performing the save
    #[serde(default)]
    pub acting_user: Option<u64>,
}

impl SaveContext {
    /// An interactive save performed by `user_id`
    pub fn by_user(user_id: u64) -> Self {
        Self {
            acting_user: Some(user_id),
            ..Self::default()
        }
    }
}

/// Form data submitted with a save
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    /// Raw submitted title
    #[serde(default)]
    pub post_title: Option<String>,
    #[serde(default)]
    pub context: SaveContext,
}

impl Submission {
    pub fn new(post_title: impl Into<String>, context: SaveContext) -> Self {
        Self {
            post_title: Some(post_title.into()),
            context,
        }
    }

    /// The submitted title when it is present and non-empty
    pub fn title(&self) -> Option<&str> {
        self.post_title.as_deref().filter(|title| !title.is_empty())
    }
}

/// Parse a stored remote id the way the host's `intval` would, accepting only numerics
pub fn numeric_id(value: Option<&str>) -> Option<i64> {
    value.and_then(|v| v.trim().parse::<i64>().ok())
}
