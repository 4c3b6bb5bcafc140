//! # Integration Contract
//!
//! An integration is a unit of business logic that declares its event bindings as a
//! static table and receives the events it bound to through [`Integration::handle`].
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                    Integration (trait)                       │
//! │  ├── name()       owning name used in callback ids           │
//! │  ├── catalog()    shared hook catalog                        │
//! │  ├── bindings()   operation table (must_* / maybe_*)         │
//! │  └── handle()     run a bound method against an event        │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Operations come in two kinds. `Mandatory` operations are always registered.
//! `Optional` operations go through a [`HookFilter`] first, which may switch them off.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::campaign::SaveContext;
use crate::capability::EDIT_CAMPAIGN;
use crate::error::{CampaignError, CampaignResult};
use crate::hooks::{
    HookCallback, HookCatalog, HookDefinition, HookEvent, HookOutput, HookTag, DEFAULT_ARITY,
    DEFAULT_PRIORITY,
};
use crate::host::ContentHost;

/// Whether an operation can be switched off
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingKind {
    /// Always registered
    Mandatory,
    /// Registered unless a filter declines it
    Optional,
}

/// One row of an integration's binding table.
///
/// Several rows may share an operation; they are registered or skipped together.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HookBinding {
    pub operation: &'static str,
    pub kind: BindingKind,
    pub tag: HookTag,
    pub method: &'static str,
    pub priority: i32,
    pub arity: usize,
}

impl HookBinding {
    /// Mandatory binding at the default priority and arity
    pub const fn must(operation: &'static str, tag: HookTag, method: &'static str) -> Self {
        Self {
            operation,
            kind: BindingKind::Mandatory,
            tag,
            method,
            priority: DEFAULT_PRIORITY,
            arity: DEFAULT_ARITY,
        }
    }

    /// Optional binding at the default priority and arity
    pub const fn maybe(operation: &'static str, tag: HookTag, method: &'static str) -> Self {
        Self {
            operation,
            kind: BindingKind::Optional,
            tag,
            method,
            priority: DEFAULT_PRIORITY,
            arity: DEFAULT_ARITY,
        }
    }

    pub const fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub const fn with_arity(mut self, arity: usize) -> Self {
        self.arity = arity;
        self
    }
}

/// Decides whether an optional operation gets registered
pub trait HookFilter: Send + Sync {
    fn allow(&self, integration: &str, operation: &str) -> bool;
}

/// Registers every optional operation
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl HookFilter for AllowAll {
    fn allow(&self, _integration: &str, _operation: &str) -> bool {
        true
    }
}

/// Switches off a fixed set of optional operations by name
#[derive(Debug, Clone, Default)]
pub struct DisabledOperations {
    operations: HashSet<String>,
}

impl DisabledOperations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: switch an operation off
    pub fn disable(mut self, operation: impl Into<String>) -> Self {
        self.operations.insert(operation.into());
        self
    }

    pub fn is_disabled(&self, operation: &str) -> bool {
        self.operations.contains(operation)
    }
}

impl<S: Into<String>> FromIterator<S> for DisabledOperations {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            operations: iter.into_iter().map(Into::into).collect(),
        }
    }
}

impl HookFilter for DisabledOperations {
    fn allow(&self, _integration: &str, operation: &str) -> bool {
        !self.is_disabled(operation)
    }
}

/// A unit of business logic bound to host events
#[async_trait]
pub trait Integration: Send + Sync {
    /// Name used as the integration half of every callback id
    fn name(&self) -> &'static str;

    /// Catalog this integration registers into
    fn catalog(&self) -> &Arc<HookCatalog>;

    /// Declared operations, in registration order
    fn bindings(&self) -> Vec<HookBinding>;

    /// Run `method` against `event`. An `Err` halts the event.
    async fn handle(&self, method: &str, event: &HookEvent) -> CampaignResult<HookOutput>;
}

/// Bind `method` of `integration` to `tag` and add it to the integration's catalog.
///
/// Fails when `arity` exceeds the number of arguments the event supplies.
pub async fn add_hook(
    integration: &Arc<dyn Integration>,
    tag: HookTag,
    method: &'static str,
    priority: i32,
    arity: usize,
) -> CampaignResult<bool> {
    if arity > tag.max_args() {
        return Err(CampaignError::InvalidHook {
            tag: tag.to_string(),
            requested: arity,
            available: tag.max_args(),
        });
    }

    let definition = HookDefinition::new(
        tag,
        HookCallback::new(integration, method),
        priority,
        arity,
    );
    integration.catalog().add_entry(definition).await;
    Ok(true)
}

/// Register every operation in the integration's binding table.
///
/// Returns the operations that were added; optional operations declined by `filter`
/// are left out.
pub async fn add_all_hooks(
    integration: &Arc<dyn Integration>,
    filter: &dyn HookFilter,
) -> CampaignResult<Vec<&'static str>> {
    let name = integration.name();
    let bindings = integration.bindings();

    let mut operations: Vec<&'static str> = Vec::new();
    for binding in &bindings {
        if !operations.contains(&binding.operation) {
            operations.push(binding.operation);
        }
    }

    let mut added = Vec::with_capacity(operations.len());
    for operation in operations {
        let rows: Vec<&HookBinding> = bindings
            .iter()
            .filter(|b| b.operation == operation)
            .collect();

        let optional = rows.iter().any(|b| b.kind == BindingKind::Optional);
        if optional && !filter.allow(name, operation) {
            debug!(integration = name, operation, "Optional operation switched off");
            continue;
        }

        for row in rows {
            add_hook(integration, row.tag, row.method, row.priority, row.arity).await?;
        }
        added.push(operation);
    }

    info!("Integration {} added {} operations", name, added.len());
    Ok(added)
}

/// Catalog entries whose callbacks belong to this integration
pub async fn get_all_hooks(integration: &dyn Integration) -> Vec<HookDefinition> {
    integration.catalog().entries_for(integration.name()).await
}

/// Should a save-triggered workflow stop before doing anything?
///
/// True for autosaves, AJAX saves, revisions, and saves by a user who cannot edit
/// campaigns.
pub async fn save_should_cease(
    host: &dyn ContentHost,
    post_id: u64,
    context: &SaveContext,
) -> CampaignResult<bool> {
    if context.autosave || context.ajax || context.revision {
        debug!(post_id, "Save is automatic, skipping");
        return Ok(true);
    }

    let Some(user_id) = context.acting_user else {
        debug!(post_id, "Save has no acting user, skipping");
        return Ok(true);
    };

    if !host.user_can(user_id, EDIT_CAMPAIGN).await {
        debug!(post_id, user_id, "Acting user cannot edit campaigns, skipping");
        return Ok(true);
    }

    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::EventDispatcher;
    use crate::host::MemoryHost;
    use crate::campaign::User;
    use crate::testing::EchoIntegration;

    fn catalog() -> Arc<HookCatalog> {
        Arc::new(HookCatalog::new(Arc::new(EventDispatcher::new())))
    }

    const BINDINGS: [HookBinding; 3] = [
        HookBinding::must("must_echo", HookTag::AdminFooter, "echo"),
        HookBinding::must("must_echo", HookTag::AdminMenu, "echo").with_priority(5),
        HookBinding::maybe("maybe_echo_on_init", HookTag::Init, "echo").with_arity(0),
    ];

    #[tokio::test]
    async fn test_add_all_hooks_registers_every_operation() {
        let catalog = catalog();
        let echo: Arc<dyn Integration> =
            EchoIntegration::new("echo", catalog.clone(), BINDINGS.to_vec());

        let added = add_all_hooks(&echo, &AllowAll).await.unwrap();

        assert_eq!(added, vec!["must_echo", "maybe_echo_on_init"]);
        assert_eq!(get_all_hooks(echo.as_ref()).await.len(), 3);
        assert_eq!(
            catalog
                .dispatcher()
                .has_filter(HookTag::AdminMenu, &crate::hooks::CallbackId::new("echo", "echo"))
                .await,
            Some(5)
        );
    }

    #[tokio::test]
    async fn test_filter_declines_optional_only() {
        let catalog = catalog();
        let echo: Arc<dyn Integration> =
            EchoIntegration::new("echo", catalog.clone(), BINDINGS.to_vec());
        let filter = DisabledOperations::new()
            .disable("maybe_echo_on_init")
            .disable("must_echo");

        let added = add_all_hooks(&echo, &filter).await.unwrap();

        // Mandatory operations ignore the filter
        assert_eq!(added, vec!["must_echo"]);
        assert_eq!(catalog.dispatcher().callback_count(HookTag::Init).await, 0);
        assert_eq!(catalog.dispatcher().callback_count(HookTag::AdminFooter).await, 1);
    }

    #[tokio::test]
    async fn test_add_hook_rejects_excess_arity() {
        let catalog = catalog();
        let echo: Arc<dyn Integration> = EchoIntegration::new("echo", catalog.clone(), Vec::new());

        let err = add_hook(&echo, HookTag::ProfileUpdate, "echo", 10, 3)
            .await
            .unwrap_err();
        assert!(matches!(err, CampaignError::InvalidHook { requested: 3, available: 2, .. }));
        assert!(catalog.is_empty().await);

        assert!(add_hook(&echo, HookTag::SavePost, "echo", 10, 3).await.unwrap());
        assert_eq!(catalog.len().await, 1);
    }

    #[tokio::test]
    async fn test_get_all_hooks_scoped_to_integration() {
        let catalog = catalog();
        let first: Arc<dyn Integration> =
            EchoIntegration::new("first", catalog.clone(), BINDINGS.to_vec());
        let second: Arc<dyn Integration> =
            EchoIntegration::new("second", catalog.clone(), Vec::new());

        add_all_hooks(&first, &AllowAll).await.unwrap();
        add_hook(&second, HookTag::AdminMenu, "echo", 10, 1).await.unwrap();

        assert_eq!(get_all_hooks(first.as_ref()).await.len(), 3);
        assert_eq!(get_all_hooks(second.as_ref()).await.len(), 1);
    }

    #[tokio::test]
    async fn test_save_should_cease() {
        let host = MemoryHost::new()
            .with_role_capabilities("editor", &[EDIT_CAMPAIGN])
            .with_user(User::new(1, "ed", "ed@example.com"), &["editor"])
            .with_user(User::new(2, "sub", "sub@example.com"), &["subscriber"]);

        let interactive = SaveContext::by_user(1);
        assert!(!save_should_cease(&host, 9, &interactive).await.unwrap());

        let autosave = SaveContext {
            autosave: true,
            ..interactive.clone()
        };
        assert!(save_should_cease(&host, 9, &autosave).await.unwrap());

        let revision = SaveContext {
            revision: true,
            ..interactive.clone()
        };
        assert!(save_should_cease(&host, 9, &revision).await.unwrap());

        assert!(save_should_cease(&host, 9, &SaveContext::by_user(2)).await.unwrap());
        assert!(save_should_cease(&host, 9, &SaveContext::default()).await.unwrap());
    }
}
