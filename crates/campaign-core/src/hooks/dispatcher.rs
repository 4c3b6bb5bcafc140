//! # Event Dispatcher
//!
//! In-process stand-in for the host's event system. Callbacks are registered per tag
//! and run in ascending priority order; callbacks sharing a priority run in the order
//! they were registered.
//!
//! Dispatch is sequential: each callback is awaited before the next starts, so a
//! workflow at priority 20 always observes the writes of the workflow at priority 10.
//! The first callback returning `Err` halts the event and the error is returned to
//! whoever delivered it.

use std::collections::HashMap;

use tokio::sync::RwLock;
use tracing::{debug, error, info, instrument};

use super::definition::{CallbackId, HookCallback, HookTag};
use super::event::{CallbackOutput, DispatchReport, HookEvent};
use crate::error::CampaignResult;

/// One callback attached to a tag
#[derive(Debug, Clone)]
struct Registration {
    callback: HookCallback,
    priority: i32,
    arity: usize,
}

/// Priority-ordered registry of callbacks per tag
#[derive(Debug, Default)]
pub struct EventDispatcher {
    registrations: RwLock<HashMap<HookTag, Vec<Registration>>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a callback. The same (callback, priority) pair is attached at most once
    /// per tag; returns false when it was already present.
    pub async fn add_filter(
        &self,
        tag: HookTag,
        callback: HookCallback,
        priority: i32,
        arity: usize,
    ) -> bool {
        let mut registrations = self.registrations.write().await;
        let entries = registrations.entry(tag).or_default();

        if entries
            .iter()
            .any(|r| r.callback == callback && r.priority == priority)
        {
            debug!(
                tag = %tag,
                callback = %callback.id(),
                priority,
                "Callback already attached"
            );
            return false;
        }

        debug!(tag = %tag, callback = %callback.id(), priority, arity, "Attaching callback");
        entries.push(Registration {
            callback,
            priority,
            arity,
        });

        // Stable sort keeps registration order within a priority
        entries.sort_by_key(|r| r.priority);
        true
    }

    /// Detach a callback; returns false when nothing matched
    pub async fn remove_filter(&self, tag: HookTag, callback: &CallbackId, priority: i32) -> bool {
        let mut registrations = self.registrations.write().await;
        let Some(entries) = registrations.get_mut(&tag) else {
            return false;
        };

        let before = entries.len();
        entries.retain(|r| !(r.callback.id() == *callback && r.priority == priority));
        let removed = entries.len() != before;

        if entries.is_empty() {
            registrations.remove(&tag);
        }

        if removed {
            debug!(tag = %tag, callback = %callback, priority, "Detached callback");
        }
        removed
    }

    /// Priority at which a callback is attached, if it is
    pub async fn has_filter(&self, tag: HookTag, callback: &CallbackId) -> Option<i32> {
        let registrations = self.registrations.read().await;
        registrations
            .get(&tag)
            .and_then(|entries| entries.iter().find(|r| r.callback.id() == *callback))
            .map(|r| r.priority)
    }

    /// Number of callbacks attached to a tag
    pub async fn callback_count(&self, tag: HookTag) -> usize {
        let registrations = self.registrations.read().await;
        registrations.get(&tag).map(|e| e.len()).unwrap_or(0)
    }

    /// Callbacks attached to a tag in execution order
    pub async fn callbacks(&self, tag: HookTag) -> Vec<(CallbackId, i32, usize)> {
        let registrations = self.registrations.read().await;
        registrations
            .get(&tag)
            .map(|entries| {
                entries
                    .iter()
                    .map(|r| (r.callback.id(), r.priority, r.arity))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Run every callback attached to the event's tag, in priority order.
    #[instrument(skip(self, event), fields(tag = %event.tag()))]
    pub async fn dispatch(&self, event: &HookEvent) -> CampaignResult<DispatchReport> {
        let tag = event.tag();

        // Snapshot so no lock is held while callbacks run
        let snapshot: Vec<Registration> = {
            let registrations = self.registrations.read().await;
            registrations.get(&tag).cloned().unwrap_or_default()
        };

        let mut report = DispatchReport::new(tag);
        if snapshot.is_empty() {
            debug!("No callbacks attached to {}", tag);
            return Ok(report);
        }

        info!("Dispatching {} to {} callbacks", tag, snapshot.len());

        for registration in snapshot {
            let id = registration.callback.id();
            let output = registration.callback.invoke(event).await.map_err(|e| {
                error!(
                    callback = %id,
                    priority = registration.priority,
                    "Callback halted {}: {}",
                    tag,
                    e
                );
                e
            })?;

            debug!(callback = %id, acted = output.acted(), "Callback finished");
            report.outputs.push(CallbackOutput {
                callback: id,
                priority: registration.priority,
                output,
            });
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::event::HookOutput;
    use crate::integration::Integration;
    use crate::testing::EchoIntegration;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_priority_order_beats_registration_order() {
        let dispatcher = EventDispatcher::new();
        let late: Arc<dyn Integration> = EchoIntegration::unbound("late");
        let early: Arc<dyn Integration> = EchoIntegration::unbound("early");
        let middle: Arc<dyn Integration> = EchoIntegration::unbound("middle");

        dispatcher
            .add_filter(HookTag::AdminMenu, HookCallback::new(&late, "echo"), 30, 1)
            .await;
        dispatcher
            .add_filter(HookTag::AdminMenu, HookCallback::new(&early, "echo"), 10, 1)
            .await;
        dispatcher
            .add_filter(HookTag::AdminMenu, HookCallback::new(&middle, "echo"), 20, 1)
            .await;

        let report = dispatcher.dispatch(&HookEvent::AdminMenu).await.unwrap();
        let order: Vec<&str> = report.order().iter().map(|id| id.integration).collect();
        assert_eq!(order, vec!["early", "middle", "late"]);
    }

    #[tokio::test]
    async fn test_same_priority_keeps_registration_order() {
        let dispatcher = EventDispatcher::new();
        let first: Arc<dyn Integration> = EchoIntegration::unbound("first");
        let second: Arc<dyn Integration> = EchoIntegration::unbound("second");

        dispatcher
            .add_filter(HookTag::AdminFooter, HookCallback::new(&first, "echo"), 10, 1)
            .await;
        dispatcher
            .add_filter(HookTag::AdminFooter, HookCallback::new(&second, "echo"), 10, 1)
            .await;

        let report = dispatcher.dispatch(&HookEvent::AdminFooter).await.unwrap();
        let order: Vec<&str> = report.order().iter().map(|id| id.integration).collect();
        assert_eq!(order, vec!["first", "second"]);
    }

    #[tokio::test]
    async fn test_duplicate_attach_is_ignored() {
        let dispatcher = EventDispatcher::new();
        let target: Arc<dyn Integration> = EchoIntegration::unbound("echo");

        assert!(
            dispatcher
                .add_filter(HookTag::Init, HookCallback::new(&target, "echo"), 10, 0)
                .await
        );
        assert!(
            !dispatcher
                .add_filter(HookTag::Init, HookCallback::new(&target, "echo"), 10, 0)
                .await
        );
        // Different priority is a distinct registration
        assert!(
            dispatcher
                .add_filter(HookTag::Init, HookCallback::new(&target, "echo"), 11, 0)
                .await
        );
        assert_eq!(dispatcher.callback_count(HookTag::Init).await, 2);
    }

    #[tokio::test]
    async fn test_error_halts_remaining_callbacks() {
        let dispatcher = EventDispatcher::new();
        let failing: Arc<dyn Integration> = EchoIntegration::unbound("failing");
        let after = EchoIntegration::unbound("after");
        let after_target: Arc<dyn Integration> = after.clone();

        dispatcher
            .add_filter(HookTag::AdminMenu, HookCallback::new(&failing, "fail"), 10, 1)
            .await;
        dispatcher
            .add_filter(HookTag::AdminMenu, HookCallback::new(&after_target, "echo"), 20, 1)
            .await;

        let result = dispatcher.dispatch(&HookEvent::AdminMenu).await;
        assert!(result.is_err());

        assert_eq!(after.calls(), 0);
    }

    #[tokio::test]
    async fn test_remove_filter() {
        let dispatcher = EventDispatcher::new();
        let target: Arc<dyn Integration> = EchoIntegration::unbound("echo");
        let callback = HookCallback::new(&target, "echo");

        dispatcher
            .add_filter(HookTag::AdminMenu, callback.clone(), 99, 1)
            .await;
        assert_eq!(
            dispatcher.has_filter(HookTag::AdminMenu, &callback.id()).await,
            Some(99)
        );

        assert!(!dispatcher.remove_filter(HookTag::AdminMenu, &callback.id(), 10).await);
        assert!(dispatcher.remove_filter(HookTag::AdminMenu, &callback.id(), 99).await);
        assert_eq!(dispatcher.has_filter(HookTag::AdminMenu, &callback.id()).await, None);

        let report = dispatcher.dispatch(&HookEvent::AdminMenu).await.unwrap();
        assert!(report.outputs.is_empty());
        assert_eq!(report.output_of("echo", "echo"), None::<&HookOutput>);
    }
}
