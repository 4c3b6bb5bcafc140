//! # campaign-api
//!
//! Composition root and HTTP surface for adbutler-campaigns-rs.
//!
//! This crate provides:
//! - `setup()`, resolving every collaborator into a `DependencyInjector`
//! - `Plugin`, which builds and registers every integration
//! - The campaign content type, registered on `init`
//! - Axum-based HTTP server delivering host lifecycle events
//!
//! ## Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | GET | `/health` | Health check |
//! | GET | `/api/v1/hooks` | Catalog introspection |
//! | POST | `/api/v1/events/save-post` | Item saved |
//! | POST | `/api/v1/events/profile-update` | User profile updated |
//! | POST | `/api/v1/events/transition-status` | Status transition |
//! | POST | `/api/v1/events/{tag}` | Render events |
//! | POST | `/api/v1/plugin/activate` | Grant capabilities |
//! | POST | `/api/v1/plugin/deactivate` | Revoke capabilities |

pub mod content_type;
pub mod handlers;
pub mod injector;
pub mod locks;
pub mod plugin;
pub mod routes;
pub mod state;

pub use content_type::{campaign_post_type, ContentTypeIntegration};
pub use injector::{setup, SetupOptions};
pub use plugin::{Plugin, PluginPolicy, RegisteredIntegration};
pub use routes::create_router;
pub use state::{AppConfig, AppState};
