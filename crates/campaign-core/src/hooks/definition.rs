//! # Hook Definitions
//!
//! A hook definition binds one integration method to one host event at a priority.
//! Its only mutable state is whether it is currently attached to the dispatcher.

use std::str::FromStr;
use std::sync::{Arc, Weak};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::dispatcher::EventDispatcher;
use super::event::{HookEvent, HookOutput};
use crate::error::{CampaignError, CampaignResult};
use crate::integration::Integration;

/// Priority used when a binding does not name one
pub const DEFAULT_PRIORITY: i32 = 10;

/// Argument count used when a binding does not name one
pub const DEFAULT_ARITY: usize = 1;

/// Host events an integration can bind to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HookTag {
    Init,
    SavePost,
    ProfileUpdate,
    TransitionPostStatus,
    AdminEnqueueScripts,
    AdminFooter,
    EditFormAfterTitle,
    AdminMenu,
}

impl HookTag {
    pub const ALL: [HookTag; 8] = [
        HookTag::Init,
        HookTag::SavePost,
        HookTag::ProfileUpdate,
        HookTag::TransitionPostStatus,
        HookTag::AdminEnqueueScripts,
        HookTag::AdminFooter,
        HookTag::EditFormAfterTitle,
        HookTag::AdminMenu,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HookTag::Init => "init",
            HookTag::SavePost => "save_post",
            HookTag::ProfileUpdate => "profile_update",
            HookTag::TransitionPostStatus => "transition_post_status",
            HookTag::AdminEnqueueScripts => "admin_enqueue_scripts",
            HookTag::AdminFooter => "admin_footer",
            HookTag::EditFormAfterTitle => "edit_form_after_title",
            HookTag::AdminMenu => "admin_menu",
        }
    }

    /// Number of positional arguments the host passes with this event
    pub fn max_args(&self) -> usize {
        match self {
            HookTag::Init => 0,
            HookTag::SavePost => 3,
            HookTag::ProfileUpdate => 2,
            HookTag::TransitionPostStatus => 3,
            HookTag::AdminEnqueueScripts => 1,
            HookTag::AdminFooter => 1,
            HookTag::EditFormAfterTitle => 1,
            HookTag::AdminMenu => 1,
        }
    }
}

impl std::fmt::Display for HookTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HookTag {
    type Err = CampaignError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        HookTag::ALL
            .iter()
            .copied()
            .find(|tag| tag.as_str() == s)
            .ok_or_else(|| CampaignError::Configuration(format!("Unknown hook tag: {}", s)))
    }
}

/// Identity of a callback: the owning integration and the bound method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct CallbackId {
    pub integration: &'static str,
    pub method: &'static str,
}

impl CallbackId {
    pub const fn new(integration: &'static str, method: &'static str) -> Self {
        Self {
            integration,
            method,
        }
    }
}

impl std::fmt::Display for CallbackId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}::{}", self.integration, self.method)
    }
}

/// A method bound to its integration.
///
/// Holds the integration weakly so catalog entries never keep an integration alive.
#[derive(Clone)]
pub struct HookCallback {
    id: CallbackId,
    target: Weak<dyn Integration>,
}

impl HookCallback {
    pub fn new(target: &Arc<dyn Integration>, method: &'static str) -> Self {
        Self {
            id: CallbackId::new(target.name(), method),
            target: Arc::downgrade(target),
        }
    }

    pub fn id(&self) -> CallbackId {
        self.id
    }

    /// Run the bound method against an event
    pub async fn invoke(&self, event: &HookEvent) -> CampaignResult<HookOutput> {
        match self.target.upgrade() {
            Some(target) => target.handle(self.id.method, event).await,
            None => {
                warn!("Callback {} outlived its integration, skipping", self.id);
                Ok(HookOutput::None)
            }
        }
    }
}

impl std::fmt::Debug for HookCallback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HookCallback").field("id", &self.id).finish()
    }
}

impl PartialEq for HookCallback {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

/// One event binding and its registration state
#[derive(Debug, Clone)]
pub struct HookDefinition {
    tag: HookTag,
    callback: HookCallback,
    priority: i32,
    arity: usize,
    registered: bool,
}

impl HookDefinition {
    pub fn new(tag: HookTag, callback: HookCallback, priority: i32, arity: usize) -> Self {
        Self {
            tag,
            callback,
            priority,
            arity,
            registered: false,
        }
    }

    pub fn tag(&self) -> HookTag {
        self.tag
    }

    pub fn callback(&self) -> &HookCallback {
        &self.callback
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    pub fn arity(&self) -> usize {
        self.arity
    }

    pub fn is_registered(&self) -> bool {
        self.registered
    }

    /// Identity match on (tag, callback)
    pub fn matches(&self, tag: HookTag, callback: &CallbackId) -> bool {
        self.tag == tag && self.callback.id() == *callback
    }

    /// Attach to the dispatcher. A second call on a registered definition is a no-op.
    pub async fn add(&mut self, dispatcher: &EventDispatcher) -> &mut Self {
        if self.registered {
            debug!("Hook {} -> {} already registered", self.tag, self.callback.id());
            return self;
        }
        dispatcher
            .add_filter(self.tag, self.callback.clone(), self.priority, self.arity)
            .await;
        self.registered = true;
        self
    }

    /// Detach from the dispatcher
    pub async fn remove(&mut self, dispatcher: &EventDispatcher) -> &mut Self {
        dispatcher
            .remove_filter(self.tag, &self.callback.id(), self.priority)
            .await;
        self.registered = false;
        self
    }
}

/// Serializable view of a definition for introspection
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HookSummary {
    pub tag: HookTag,
    pub callback: String,
    pub priority: i32,
    pub arity: usize,
    pub registered: bool,
}

impl From<&HookDefinition> for HookSummary {
    fn from(def: &HookDefinition) -> Self {
        Self {
            tag: def.tag,
            callback: def.callback.id().to_string(),
            priority: def.priority,
            arity: def.arity,
            registered: def.registered,
        }
    }
}
