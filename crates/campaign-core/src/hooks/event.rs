//! Host lifecycle events and the values callbacks hand back.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::definition::{CallbackId, HookTag};
use crate::campaign::{CampaignItem, PostStatus, Submission, User};

/// A lifecycle event delivered by the host, with its positional arguments.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum HookEvent {
    /// Host finished booting
    Init,
    /// An item was saved
    SavePost {
        post_id: u64,
        post: CampaignItem,
        #[serde(default)]
        update: bool,
        #[serde(default)]
        submission: Submission,
    },
    /// A user profile was updated
    ProfileUpdate {
        user_id: u64,
        #[serde(default)]
        old_user: Option<User>,
    },
    /// An item moved between statuses
    TransitionPostStatus {
        new_status: PostStatus,
        old_status: PostStatus,
        post: CampaignItem,
    },
    /// Admin screens are collecting their scripts
    AdminEnqueueScripts {
        #[serde(default)]
        hook_suffix: String,
    },
    /// Admin footer is being rendered
    AdminFooter,
    /// The edit screen body is being rendered, below the title
    EditFormAfterTitle { post: CampaignItem },
    /// The admin menu is being built
    AdminMenu,
}

impl HookEvent {
    /// The tag this event is dispatched under
    pub fn tag(&self) -> HookTag {
        match self {
            HookEvent::Init => HookTag::Init,
            HookEvent::SavePost { .. } => HookTag::SavePost,
            HookEvent::ProfileUpdate { .. } => HookTag::ProfileUpdate,
            HookEvent::TransitionPostStatus { .. } => HookTag::TransitionPostStatus,
            HookEvent::AdminEnqueueScripts { .. } => HookTag::AdminEnqueueScripts,
            HookEvent::AdminFooter => HookTag::AdminFooter,
            HookEvent::EditFormAfterTitle { .. } => HookTag::EditFormAfterTitle,
            HookEvent::AdminMenu => HookTag::AdminMenu,
        }
    }

    /// Item id for save events, used to serialize concurrent saves of one item
    pub fn saved_item(&self) -> Option<u64> {
        match self {
            HookEvent::SavePost { post_id, .. } => Some(*post_id),
            _ => None,
        }
    }

    /// User whose advertiser this event may create, used to serialize work per user
    pub fn affected_user(&self) -> Option<u64> {
        match self {
            HookEvent::SavePost { post, .. } if post.has_author() => Some(post.author),
            HookEvent::ProfileUpdate { user_id, .. } => Some(*user_id),
            _ => None,
        }
    }
}

/// Payment call-to-action shown on the edit screen
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentPrompt {
    pub heading: String,
    pub message: String,
    pub button_text: String,
    pub js_callback: String,
}

/// Hosted payment form the call-to-action submits to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentForm {
    pub form_id: String,
    pub action: String,
    pub link_id: String,
    pub target: String,
}

/// Value produced by a callback
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum HookOutput {
    /// Nothing to report
    None,
    /// Whether the callback acted
    Handled(bool),
    PaymentPrompt(PaymentPrompt),
    PaymentForm(PaymentForm),
}

impl HookOutput {
    /// Did the callback take action?
    pub fn acted(&self) -> bool {
        match self {
            HookOutput::None => false,
            HookOutput::Handled(acted) => *acted,
            HookOutput::PaymentPrompt(_) | HookOutput::PaymentForm(_) => true,
        }
    }
}

impl From<bool> for HookOutput {
    fn from(acted: bool) -> Self {
        HookOutput::Handled(acted)
    }
}

/// Output of one callback within a dispatch
#[derive(Debug, Clone, Serialize)]
pub struct CallbackOutput {
    pub callback: CallbackId,
    pub priority: i32,
    pub output: HookOutput,
}

/// Everything that ran for one event, in execution order
#[derive(Debug, Clone, Serialize)]
pub struct DispatchReport {
    pub tag: HookTag,
    pub outputs: Vec<CallbackOutput>,
    pub dispatched_at: DateTime<Utc>,
}

impl DispatchReport {
    pub fn new(tag: HookTag) -> Self {
        Self {
            tag,
            outputs: Vec::new(),
            dispatched_at: Utc::now(),
        }
    }

    /// Output of a specific callback, if it ran
    pub fn output_of(&self, integration: &str, method: &str) -> Option<&HookOutput> {
        self.outputs
            .iter()
            .find(|o| o.callback.integration == integration && o.callback.method == method)
            .map(|o| &o.output)
    }

    /// Callback ids in the order they ran
    pub fn order(&self) -> Vec<CallbackId> {
        self.outputs.iter().map(|o| o.callback).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_tags() {
        let post = CampaignItem::new(1, 2, PostStatus::Draft, "t");
        assert_eq!(HookEvent::Init.tag(), HookTag::Init);
        assert_eq!(
            HookEvent::EditFormAfterTitle { post: post.clone() }.tag(),
            HookTag::EditFormAfterTitle
        );
        let save = HookEvent::SavePost {
            post_id: 1,
            post,
            update: false,
            submission: Submission::default(),
        };
        assert_eq!(save.tag(), HookTag::SavePost);
        assert_eq!(save.saved_item(), Some(1));
        assert_eq!(save.affected_user(), Some(2));
        assert_eq!(HookEvent::AdminMenu.saved_item(), None);
        assert_eq!(HookEvent::AdminMenu.affected_user(), None);

        let profile = HookEvent::ProfileUpdate {
            user_id: 9,
            old_user: None,
        };
        assert_eq!(profile.saved_item(), None);
        assert_eq!(profile.affected_user(), Some(9));

        let orphan = HookEvent::SavePost {
            post_id: 4,
            post: CampaignItem::new(4, 0, PostStatus::Draft, "t"),
            update: false,
            submission: Submission::default(),
        };
        assert_eq!(orphan.affected_user(), None);
    }

    #[test]
    fn test_event_deserialize() {
        let event: HookEvent = serde_json::from_value(serde_json::json!({
            "event": "transition_post_status",
            "new_status": "pending",
            "old_status": "draft",
            "post": { "id": 5, "author": 3, "status": "pending", "title": "Spring" }
        }))
        .unwrap();

        match event {
            HookEvent::TransitionPostStatus { post, .. } => {
                assert!(post.is_tracked());
                assert_eq!(post.author, 3);
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_output_acted() {
        assert!(!HookOutput::None.acted());
        assert!(!HookOutput::from(false).acted());
        assert!(HookOutput::from(true).acted());
    }
}
