//! # AdButler Campaigns RS
//!
//! Advertising campaign workflows driven by host lifecycle events.
//!
//! ## Usage
//!
//! ```bash
//! # Set environment variables
//! export ADBUTLER_API_KEY=...
//! export ADBUTLER_TEST_MODE=true
//!
//! # Seed host options and users (optional)
//! $EDITOR config/options.toml
//!
//! # Run the server
//! adbutler-campaigns
//! ```

use campaign_api::{routes, state::AppState};
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(Level::INFO.into())
                .from_env_lossy(),
        )
        .init();

    // Print banner
    print_banner();

    // Initialize application state
    let state = AppState::new().await?;

    let addr = state.config.socket_addr()?;
    let is_prod = state.config.is_production();

    info!("Environment: {}", state.config.environment);
    info!("Test mode: {}", state.config.test_mode);
    info!(
        "Integrations: {:?}",
        state
            .plugin
            .registered()
            .iter()
            .map(|integration| integration.name)
            .collect::<Vec<_>>()
    );

    // Create router
    let app = routes::create_router(state);

    // Start server
    info!("AdButler Campaigns starting on http://{}", addr);

    if !is_prod {
        info!("Hooks: GET http://{}/api/v1/hooks", addr);
        info!("Save event: POST http://{}/api/v1/events/save-post", addr);
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn print_banner() {
    println!(
        r#"
  AdButler Campaigns RS
  ━━━━━━━━━━━━━━━━━━━━━━━
  Campaign workflows for AdButler
  Version: {}

"#,
        env!("CARGO_PKG_VERSION")
    );
}
