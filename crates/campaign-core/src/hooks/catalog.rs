//! # Hook Catalog
//!
//! Insertion-ordered record of every hook definition integrations have declared.
//! Adding an entry attaches it to the dispatcher; removing detaches it.
//!
//! The catalog does not reject duplicate (tag, callback) entries; keeping them out is
//! the caller's job. Duplicates are harmless at dispatch time because the dispatcher
//! attaches a (callback, priority) pair once, and `remove_entry` drops all of them.

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::debug;

use super::definition::{CallbackId, HookDefinition, HookSummary, HookTag};
use super::dispatcher::EventDispatcher;

/// Ordered collection of hook definitions
#[derive(Debug)]
pub struct HookCatalog {
    entries: RwLock<Vec<HookDefinition>>,
    dispatcher: Arc<EventDispatcher>,
}

impl HookCatalog {
    /// Create an empty catalog attached to a dispatcher
    pub fn new(dispatcher: Arc<EventDispatcher>) -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
            dispatcher,
        }
    }

    /// The dispatcher entries are attached to
    pub fn dispatcher(&self) -> &Arc<EventDispatcher> {
        &self.dispatcher
    }

    /// All entries, in insertion order
    pub async fn get_catalog_entries(&self) -> Vec<HookDefinition> {
        self.entries.read().await.clone()
    }

    /// Append a definition and attach it. Returns the full collection.
    pub async fn add_entry(&self, mut definition: HookDefinition) -> Vec<HookDefinition> {
        definition.add(&self.dispatcher).await;

        let mut entries = self.entries.write().await;
        debug!(
            "Catalog entry {} -> {} (priority {})",
            definition.tag(),
            definition.callback().id(),
            definition.priority()
        );
        entries.push(definition);
        entries.clone()
    }

    /// Drop every entry matching (tag, callback), detaching each one.
    /// Returns the remaining collection.
    pub async fn remove_entry(&self, tag: HookTag, callback: &CallbackId) -> Vec<HookDefinition> {
        let mut entries = self.entries.write().await;
        let mut remaining = Vec::with_capacity(entries.len());

        for mut entry in entries.drain(..) {
            if entry.matches(tag, callback) {
                entry.remove(&self.dispatcher).await;
            } else {
                remaining.push(entry);
            }
        }

        *entries = remaining;
        entries.clone()
    }

    /// Entries whose callback belongs to the named integration
    pub async fn entries_for(&self, integration: &str) -> Vec<HookDefinition> {
        self.entries
            .read()
            .await
            .iter()
            .filter(|e| e.callback().id().integration == integration)
            .cloned()
            .collect()
    }

    /// Serializable view of every entry
    pub async fn summaries(&self) -> Vec<HookSummary> {
        self.entries
            .read()
            .await
            .iter()
            .map(HookSummary::from)
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::definition::HookCallback;
    use crate::hooks::event::HookEvent;
    use crate::integration::Integration;
    use crate::testing::EchoIntegration;

    fn catalog() -> HookCatalog {
        HookCatalog::new(Arc::new(EventDispatcher::new()))
    }

    #[tokio::test]
    async fn test_add_entry_registers() {
        let catalog = catalog();
        let target: Arc<dyn Integration> = EchoIntegration::unbound("echo");
        let callback = HookCallback::new(&target, "echo");
        let def = HookDefinition::new(HookTag::AdminMenu, callback, 99, 1);

        let entries = catalog.add_entry(def).await;

        assert_eq!(entries.len(), 1);
        assert!(entries[0].is_registered());
        assert_eq!(
            catalog
                .dispatcher()
                .has_filter(HookTag::AdminMenu, &CallbackId::new("echo", "echo"))
                .await,
            Some(99)
        );
    }

    #[tokio::test]
    async fn test_duplicate_entries_fire_once() {
        let catalog = catalog();
        let echo = EchoIntegration::unbound("echo");
        let target: Arc<dyn Integration> = echo.clone();

        for _ in 0..2 {
            let callback = HookCallback::new(&target, "echo");
            let def = HookDefinition::new(HookTag::AdminMenu, callback, 10, 1);
            catalog.add_entry(def).await;
        }

        // Both entries are kept, the dispatcher attached the pair once
        assert_eq!(catalog.len().await, 2);
        catalog.dispatcher().dispatch(&HookEvent::AdminMenu).await.unwrap();
        assert_eq!(echo.calls(), 1);

        let remaining = catalog
            .remove_entry(HookTag::AdminMenu, &CallbackId::new("echo", "echo"))
            .await;
        assert!(remaining.is_empty());
        assert_eq!(catalog.dispatcher().callback_count(HookTag::AdminMenu).await, 0);
    }

    #[tokio::test]
    async fn test_remove_entry_only_matching() {
        let catalog = catalog();
        let target: Arc<dyn Integration> = EchoIntegration::unbound("echo");

        for tag in [HookTag::AdminMenu, HookTag::AdminFooter] {
            let callback = HookCallback::new(&target, "echo");
            catalog
                .add_entry(HookDefinition::new(tag, callback, 10, 1))
                .await;
        }

        let remaining = catalog
            .remove_entry(HookTag::AdminMenu, &CallbackId::new("echo", "echo"))
            .await;

        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].tag(), HookTag::AdminFooter);
        assert!(remaining[0].is_registered());
        assert_eq!(catalog.entries_for("echo").await.len(), 1);
        assert!(catalog.entries_for("other").await.is_empty());
    }
}
