//! # Hooks
//!
//! Local model of event bindings and their registry.
//!
//! ```text
//! Integration ──add_hook──▶ HookCatalog ──add()──▶ EventDispatcher ◀──dispatch── host event
//!                              │                        │
//!                        HookDefinition[]         priority-ordered
//!                     (tag, callback, prio,        callbacks per tag
//!                       arity, registered)
//! ```

pub mod catalog;
pub mod definition;
pub mod dispatcher;
pub mod event;

pub use catalog::HookCatalog;
pub use definition::{
    CallbackId, HookCallback, HookDefinition, HookSummary, HookTag, DEFAULT_ARITY,
    DEFAULT_PRIORITY,
};
pub use dispatcher::EventDispatcher;
pub use event::{CallbackOutput, DispatchReport, HookEvent, HookOutput, PaymentForm, PaymentPrompt};
