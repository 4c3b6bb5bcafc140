//! # Content Host
//!
//! The host content-management system as seen by integrations and providers: users
//! and their metadata, item metadata, creative sub-records, role capabilities,
//! options, admin assets and mail.
//!
//! [`MemoryHost`] keeps all of it in process. The binary serves it and tests seed it.

use std::collections::{BTreeSet, HashMap, HashSet};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::debug;

use crate::campaign::{Creative, User};
use crate::error::{CampaignError, CampaignResult};

/// Optional host extensions that select enhanced provider variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HostFeature {
    /// Repeater-capable custom field plugin
    CustomFields,
    /// Templated email plugin with named situations
    TemplatedEmail,
}

/// Script registered with the admin screens
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptAsset {
    pub handle: String,
    pub src: String,
    #[serde(default)]
    pub deps: Vec<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub in_footer: bool,
}

impl ScriptAsset {
    pub fn new(handle: impl Into<String>, src: impl Into<String>) -> Self {
        Self {
            handle: handle.into(),
            src: src.into(),
            deps: Vec::new(),
            version: None,
            in_footer: false,
        }
    }

    pub fn with_deps(mut self, deps: &[&str]) -> Self {
        self.deps = deps.iter().map(|d| d.to_string()).collect();
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn in_footer(mut self) -> Self {
        self.in_footer = true;
        self
    }
}

/// Admin submenu page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmenuPage {
    pub parent_slug: String,
    pub page_title: String,
    pub menu_title: String,
    pub capability: String,
    pub menu_slug: String,
}

/// Field rendered on a settings page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingsField {
    pub option_name: String,
    pub id: String,
    pub title: String,
    pub input: String,
    pub page: String,
    pub section: String,
}

/// Content type registration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostTypeDefinition {
    pub name: String,
    pub singular_label: String,
    pub plural_label: String,
    pub description: String,
    pub menu_position: u32,
    pub exclude_from_search: bool,
    pub public: bool,
    pub show_ui: bool,
    pub supports: Vec<String>,
    pub taxonomies: Vec<String>,
    /// Generic capability name to type-specific capability name
    pub capabilities: Vec<(String, String)>,
}

/// One sub-field of a repeater field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubField {
    pub name: String,
    pub label: String,
    pub kind: String,
    pub required: bool,
}

/// Custom field group attached to a content type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldGroup {
    pub key: String,
    pub title: String,
    /// Repeater field name
    pub field: String,
    pub label: String,
    pub max_rows: usize,
    pub sub_fields: Vec<SubField>,
    /// Content type the group is shown on
    pub post_type: String,
}

/// Plain mail message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mail {
    pub to: Vec<String>,
    pub subject: String,
    pub body: String,
}

/// Named situation for templated email, with its default template
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailSituation {
    pub slug: String,
    pub description: String,
    pub subject: String,
    pub body: String,
}

/// A templated email that was sent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplatedEmail {
    pub situation: String,
    pub to: Vec<String>,
    pub tokens: HashMap<String, String>,
}

/// Host content-management system
#[async_trait]
pub trait ContentHost: Send + Sync {
    async fn user(&self, user_id: u64) -> CampaignResult<Option<User>>;

    async fn user_meta(&self, user_id: u64, key: &str) -> CampaignResult<Option<String>>;

    /// Returns false when the value could not be written
    async fn update_user_meta(&self, user_id: u64, key: &str, value: &str) -> CampaignResult<bool>;

    async fn post_meta(&self, post_id: u64, key: &str) -> CampaignResult<Option<String>>;

    /// Returns false when the value could not be written
    async fn update_post_meta(&self, post_id: u64, key: &str, value: &str) -> CampaignResult<bool>;

    /// Rows of a repeater field
    async fn creatives(&self, post_id: u64, field: &str) -> CampaignResult<Vec<Creative>>;

    /// Write one sub-field of one repeater row. `row` is 1-based.
    async fn update_creative_field(
        &self,
        post_id: u64,
        field: &str,
        row: usize,
        sub_field: &str,
        value: &str,
    ) -> CampaignResult<bool>;

    async fn user_can(&self, user_id: u64, capability: &str) -> bool;

    async fn grant_capabilities(&self, role: &str, capabilities: &[&str]) -> CampaignResult<()>;

    async fn revoke_capabilities(&self, role: &str, capabilities: &[&str]) -> CampaignResult<()>;

    async fn option(&self, name: &str) -> Option<Value>;

    async fn register_script(&self, script: ScriptAsset);

    /// Returns false when the handle was never registered
    async fn enqueue_script(&self, handle: &str) -> bool;

    /// Returns the page's hook suffix
    async fn add_submenu_page(&self, page: SubmenuPage) -> String;

    async fn register_setting(&self, group: &str, option_name: &str);

    async fn add_settings_field(&self, field: SettingsField);

    async fn register_post_type(&self, definition: PostTypeDefinition) -> CampaignResult<()>;

    async fn register_field_group(&self, group: FieldGroup) -> CampaignResult<()>;

    async fn send_mail(&self, mail: Mail) -> bool;

    async fn send_templated_email(
        &self,
        situation: &str,
        recipients: &[String],
        tokens: &HashMap<String, String>,
    ) -> CampaignResult<bool>;

    async fn install_email_situation(&self, situation: EmailSituation) -> CampaignResult<()>;

    fn has_feature(&self, feature: HostFeature) -> bool;

    /// Admin edit screen URL of an item
    fn edit_link(&self, post_id: u64) -> String;

    fn site_name(&self) -> String;
}

#[derive(Debug, Default)]
struct HostState {
    users: HashMap<u64, User>,
    user_roles: HashMap<u64, Vec<String>>,
    user_meta: HashMap<(u64, String), String>,
    post_meta: HashMap<(u64, String), String>,
    repeaters: HashMap<(u64, String), Vec<Creative>>,
    role_capabilities: HashMap<String, BTreeSet<String>>,
    options: HashMap<String, Value>,
    scripts: Vec<ScriptAsset>,
    enqueued: Vec<String>,
    submenu_pages: Vec<SubmenuPage>,
    settings: Vec<(String, String)>,
    settings_fields: Vec<SettingsField>,
    post_types: Vec<PostTypeDefinition>,
    field_groups: Vec<FieldGroup>,
    mail: Vec<Mail>,
    templated: Vec<TemplatedEmail>,
    situations: Vec<EmailSituation>,
}

/// In-process content host
#[derive(Debug)]
pub struct MemoryHost {
    site_name: String,
    site_url: String,
    features: HashSet<HostFeature>,
    state: RwLock<HostState>,
}

impl Default for MemoryHost {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryHost {
    pub fn new() -> Self {
        Self {
            site_name: "AdButler Campaigns".to_string(),
            site_url: "http://localhost".to_string(),
            features: HashSet::new(),
            state: RwLock::new(HostState::default()),
        }
    }

    /// Builder: set site name and URL
    pub fn with_site(mut self, name: impl Into<String>, url: impl Into<String>) -> Self {
        self.site_name = name.into();
        self.site_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Builder: report an optional host extension as present
    pub fn with_feature(mut self, feature: HostFeature) -> Self {
        self.features.insert(feature);
        self
    }

    /// Builder: add a user with roles
    pub fn with_user(mut self, user: User, roles: &[&str]) -> Self {
        let state = self.state.get_mut();
        state
            .user_roles
            .insert(user.id, roles.iter().map(|r| r.to_string()).collect());
        state.users.insert(user.id, user);
        self
    }

    /// Builder: grant capabilities to a role
    pub fn with_role_capabilities(mut self, role: &str, capabilities: &[&str]) -> Self {
        self.state
            .get_mut()
            .role_capabilities
            .entry(role.to_string())
            .or_default()
            .extend(capabilities.iter().map(|c| c.to_string()));
        self
    }

    /// Builder: set an option value
    pub fn with_option(mut self, name: impl Into<String>, value: Value) -> Self {
        self.state.get_mut().options.insert(name.into(), value);
        self
    }

    /// Builder: seed user metadata
    pub fn with_user_meta(mut self, user_id: u64, key: &str, value: impl Into<String>) -> Self {
        self.state
            .get_mut()
            .user_meta
            .insert((user_id, key.to_string()), value.into());
        self
    }

    /// Builder: seed item metadata
    pub fn with_post_meta(mut self, post_id: u64, key: &str, value: impl Into<String>) -> Self {
        self.state
            .get_mut()
            .post_meta
            .insert((post_id, key.to_string()), value.into());
        self
    }

    /// Builder: seed repeater rows
    pub fn with_creatives(mut self, post_id: u64, field: &str, creatives: Vec<Creative>) -> Self {
        self.state
            .get_mut()
            .repeaters
            .insert((post_id, field.to_string()), creatives);
        self
    }

    /// Insert or replace a user and their roles
    pub async fn set_user(&self, user: User, roles: Vec<String>) {
        let mut state = self.state.write().await;
        state.user_roles.insert(user.id, roles);
        state.users.insert(user.id, user);
    }

    /// Replace the rows of a repeater field
    pub async fn set_creatives(&self, post_id: u64, field: &str, creatives: Vec<Creative>) {
        self.state
            .write()
            .await
            .repeaters
            .insert((post_id, field.to_string()), creatives);
    }

    pub async fn set_option(&self, name: impl Into<String>, value: Value) {
        self.state.write().await.options.insert(name.into(), value);
    }

    pub async fn roles_of(&self, user_id: u64) -> Vec<String> {
        self.state
            .read()
            .await
            .user_roles
            .get(&user_id)
            .cloned()
            .unwrap_or_default()
    }

    pub async fn role_capabilities(&self, role: &str) -> BTreeSet<String> {
        self.state
            .read()
            .await
            .role_capabilities
            .get(role)
            .cloned()
            .unwrap_or_default()
    }

    pub async fn sent_mail(&self) -> Vec<Mail> {
        self.state.read().await.mail.clone()
    }

    pub async fn sent_templated(&self) -> Vec<TemplatedEmail> {
        self.state.read().await.templated.clone()
    }

    pub async fn email_situations(&self) -> Vec<EmailSituation> {
        self.state.read().await.situations.clone()
    }

    pub async fn scripts(&self) -> Vec<ScriptAsset> {
        self.state.read().await.scripts.clone()
    }

    pub async fn enqueued_scripts(&self) -> Vec<String> {
        self.state.read().await.enqueued.clone()
    }

    pub async fn submenu_pages(&self) -> Vec<SubmenuPage> {
        self.state.read().await.submenu_pages.clone()
    }

    pub async fn settings(&self) -> Vec<(String, String)> {
        self.state.read().await.settings.clone()
    }

    pub async fn settings_fields(&self) -> Vec<SettingsField> {
        self.state.read().await.settings_fields.clone()
    }

    pub async fn post_types(&self) -> Vec<PostTypeDefinition> {
        self.state.read().await.post_types.clone()
    }

    pub async fn field_groups(&self) -> Vec<FieldGroup> {
        self.state.read().await.field_groups.clone()
    }
}

#[async_trait]
impl ContentHost for MemoryHost {
    async fn user(&self, user_id: u64) -> CampaignResult<Option<User>> {
        Ok(self.state.read().await.users.get(&user_id).cloned())
    }

    async fn user_meta(&self, user_id: u64, key: &str) -> CampaignResult<Option<String>> {
        Ok(self
            .state
            .read()
            .await
            .user_meta
            .get(&(user_id, key.to_string()))
            .cloned())
    }

    async fn update_user_meta(&self, user_id: u64, key: &str, value: &str) -> CampaignResult<bool> {
        let mut state = self.state.write().await;
        if !state.users.contains_key(&user_id) {
            return Ok(false);
        }
        state
            .user_meta
            .insert((user_id, key.to_string()), value.to_string());
        debug!(user_id, key, "User meta updated");
        Ok(true)
    }

    async fn post_meta(&self, post_id: u64, key: &str) -> CampaignResult<Option<String>> {
        Ok(self
            .state
            .read()
            .await
            .post_meta
            .get(&(post_id, key.to_string()))
            .cloned())
    }

    async fn update_post_meta(&self, post_id: u64, key: &str, value: &str) -> CampaignResult<bool> {
        self.state
            .write()
            .await
            .post_meta
            .insert((post_id, key.to_string()), value.to_string());
        debug!(post_id, key, "Item meta updated");
        Ok(true)
    }

    async fn creatives(&self, post_id: u64, field: &str) -> CampaignResult<Vec<Creative>> {
        Ok(self
            .state
            .read()
            .await
            .repeaters
            .get(&(post_id, field.to_string()))
            .cloned()
            .unwrap_or_default())
    }

    async fn update_creative_field(
        &self,
        post_id: u64,
        field: &str,
        row: usize,
        sub_field: &str,
        value: &str,
    ) -> CampaignResult<bool> {
        let mut state = self.state.write().await;
        let Some(creative) = state
            .repeaters
            .get_mut(&(post_id, field.to_string()))
            .and_then(|rows| rows.get_mut(row.wrapping_sub(1)))
        else {
            return Ok(false);
        };

        let value = Some(value.to_string());
        match sub_field {
            "name" => creative.name = value,
            "location" => creative.location = value,
            "html_alt_text" => creative.html_alt_text = value,
            "advertisement_id" => creative.advertisement_id = value,
            other => {
                return Err(CampaignError::Host(format!(
                    "Unknown creative field: {}",
                    other
                )))
            }
        }
        debug!(post_id, row, sub_field, "Creative field updated");
        Ok(true)
    }

    async fn user_can(&self, user_id: u64, capability: &str) -> bool {
        let state = self.state.read().await;
        state
            .user_roles
            .get(&user_id)
            .map(|roles| {
                roles.iter().any(|role| {
                    state
                        .role_capabilities
                        .get(role)
                        .map(|caps| caps.contains(capability))
                        .unwrap_or(false)
                })
            })
            .unwrap_or(false)
    }

    async fn grant_capabilities(&self, role: &str, capabilities: &[&str]) -> CampaignResult<()> {
        self.state
            .write()
            .await
            .role_capabilities
            .entry(role.to_string())
            .or_default()
            .extend(capabilities.iter().map(|c| c.to_string()));
        Ok(())
    }

    async fn revoke_capabilities(&self, role: &str, capabilities: &[&str]) -> CampaignResult<()> {
        if let Some(caps) = self.state.write().await.role_capabilities.get_mut(role) {
            for capability in capabilities {
                caps.remove(*capability);
            }
        }
        Ok(())
    }

    async fn option(&self, name: &str) -> Option<Value> {
        self.state.read().await.options.get(name).cloned()
    }

    async fn register_script(&self, script: ScriptAsset) {
        let mut state = self.state.write().await;
        state.scripts.retain(|s| s.handle != script.handle);
        state.scripts.push(script);
    }

    async fn enqueue_script(&self, handle: &str) -> bool {
        let mut state = self.state.write().await;
        if !state.scripts.iter().any(|s| s.handle == handle) {
            return false;
        }
        if !state.enqueued.iter().any(|h| h == handle) {
            state.enqueued.push(handle.to_string());
        }
        true
    }

    async fn add_submenu_page(&self, page: SubmenuPage) -> String {
        let suffix = format!("{}_page_{}", page.parent_slug, page.menu_slug);
        let mut state = self.state.write().await;
        state.submenu_pages.retain(|p| p.menu_slug != page.menu_slug);
        state.submenu_pages.push(page);
        suffix
    }

    async fn register_setting(&self, group: &str, option_name: &str) {
        let entry = (group.to_string(), option_name.to_string());
        let mut state = self.state.write().await;
        if !state.settings.contains(&entry) {
            state.settings.push(entry);
        }
    }

    async fn add_settings_field(&self, field: SettingsField) {
        let mut state = self.state.write().await;
        state
            .settings_fields
            .retain(|f| !(f.option_name == field.option_name && f.id == field.id));
        state.settings_fields.push(field);
    }

    async fn register_post_type(&self, definition: PostTypeDefinition) -> CampaignResult<()> {
        let mut state = self.state.write().await;
        state.post_types.retain(|p| p.name != definition.name);
        state.post_types.push(definition);
        Ok(())
    }

    async fn register_field_group(&self, group: FieldGroup) -> CampaignResult<()> {
        if !self.has_feature(HostFeature::CustomFields) {
            return Err(CampaignError::Host(
                "Custom field groups are not supported by this host".to_string(),
            ));
        }
        let mut state = self.state.write().await;
        state.field_groups.retain(|g| g.key != group.key);
        state.field_groups.push(group);
        Ok(())
    }

    async fn send_mail(&self, mail: Mail) -> bool {
        if mail.to.is_empty() {
            return false;
        }
        debug!(subject = %mail.subject, recipients = mail.to.len(), "Mail sent");
        self.state.write().await.mail.push(mail);
        true
    }

    async fn send_templated_email(
        &self,
        situation: &str,
        recipients: &[String],
        tokens: &HashMap<String, String>,
    ) -> CampaignResult<bool> {
        if !self.has_feature(HostFeature::TemplatedEmail) {
            return Err(CampaignError::Host(
                "Templated email is not supported by this host".to_string(),
            ));
        }

        let mut state = self.state.write().await;
        if !state.situations.iter().any(|s| s.slug == situation) {
            return Err(CampaignError::Host(format!(
                "Unknown email situation: {}",
                situation
            )));
        }

        state.templated.push(TemplatedEmail {
            situation: situation.to_string(),
            to: recipients.to_vec(),
            tokens: tokens.clone(),
        });
        Ok(true)
    }

    async fn install_email_situation(&self, situation: EmailSituation) -> CampaignResult<()> {
        let mut state = self.state.write().await;
        if state.situations.iter().any(|s| s.slug == situation.slug) {
            return Ok(());
        }
        state.situations.push(situation);
        Ok(())
    }

    fn has_feature(&self, feature: HostFeature) -> bool {
        self.features.contains(&feature)
    }

    fn edit_link(&self, post_id: u64) -> String {
        format!(
            "{}/wp-admin/post.php?post={}&action=edit",
            self.site_url, post_id
        )
    }

    fn site_name(&self) -> String {
        self.site_name.clone()
    }
}
