//! # Application State
//!
//! Shared state for the Axum application.
//! Holds the wired plugin, the host store it writes to, and configuration.

use std::collections::HashMap;
use std::net::{AddrParseError, SocketAddr};
use std::sync::Arc;

use campaign_core::{AssetConfig, HostFeature, MemoryHost, User};
use serde::Deserialize;

use crate::injector::{setup, SetupOptions};
use crate::plugin::{Plugin, PluginPolicy};

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Environment (development, staging, production)
    pub environment: String,
    /// Public URL the plugin's scripts are served from
    pub plugin_uri: String,
    /// Version appended to script URLs
    pub version: String,
    /// Placeholder creatives and sandbox payment script
    pub test_mode: bool,
    /// Declare the creative field group on `init`
    pub declare_fields: bool,
    /// Roles granted contributor capabilities on activation
    pub additional_roles: Vec<String>,
    /// Extra addresses notified of pending campaigns
    pub admin_recipients: Vec<String>,
}

impl AppConfig {
    /// Load from environment variables
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
            plugin_uri: std::env::var("PLUGIN_URI")
                .unwrap_or_else(|_| "http://localhost:8080/plugin".to_string()),
            version: std::env::var("PLUGIN_VERSION")
                .unwrap_or_else(|_| env!("CARGO_PKG_VERSION").to_string()),
            test_mode: env_flag("ADBUTLER_TEST_MODE").unwrap_or(true),
            declare_fields: env_flag("ADBUTLER_DECLARE_FIELDS").unwrap_or(false),
            additional_roles: env_list("ADBUTLER_ADDITIONAL_ROLES"),
            admin_recipients: env_list("ADBUTLER_ADMIN_RECIPIENTS"),
        }
    }

    /// Get the socket address to bind to
    pub fn socket_addr(&self) -> Result<SocketAddr, AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn assets(&self) -> AssetConfig {
        AssetConfig::new(&self.plugin_uri, &self.version)
    }

    pub fn policy(&self) -> PluginPolicy {
        PluginPolicy::new()
            .with_test_mode(self.test_mode)
            .with_declared_fields(self.declare_fields)
            .with_additional_roles(self.additional_roles.clone())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

fn env_flag(name: &str) -> Option<bool> {
    let value = std::env::var(name).ok()?;
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn env_list(name: &str) -> Vec<String> {
    std::env::var(name)
        .map(|value| {
            value
                .split(',')
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Contents of `config/options.toml`, used to seed the host store
#[derive(Debug, Default, Deserialize)]
pub struct HostSeed {
    #[serde(default)]
    pub site: Option<SiteSeed>,
    #[serde(default)]
    pub features: Vec<HostFeature>,
    #[serde(default)]
    pub options: HashMap<String, toml::Value>,
    #[serde(default)]
    pub users: Vec<UserSeed>,
}

#[derive(Debug, Deserialize)]
pub struct SiteSeed {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct UserSeed {
    pub id: u64,
    pub login: String,
    pub email: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub roles: Vec<String>,
}

impl HostSeed {
    /// Build the host store this seed describes
    pub fn into_host(self) -> anyhow::Result<MemoryHost> {
        let mut host = MemoryHost::new();

        if let Some(site) = self.site {
            host = host.with_site(site.name, site.url);
        }
        for feature in self.features {
            host = host.with_feature(feature);
        }
        for (name, value) in self.options {
            let value = serde_json::to_value(value)
                .map_err(|e| anyhow::anyhow!("Option {} is not representable: {}", name, e))?;
            host = host.with_option(name, value);
        }
        for seed in self.users {
            let mut user = User::new(seed.id, seed.login, seed.email);
            if let Some(display_name) = seed.display_name {
                user = user.with_display_name(display_name);
            }
            let roles: Vec<&str> = seed.roles.iter().map(String::as_str).collect();
            host = host.with_user(user, &roles);
        }

        Ok(host)
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Wired plugin
    pub plugin: Arc<Plugin>,
    /// Host store the integrations read and write
    pub host: Arc<MemoryHost>,
    /// Application config
    pub config: AppConfig,
}

impl AppState {
    /// Create a new AppState from the environment and the seeded host store
    pub async fn new() -> anyhow::Result<Self> {
        let config = AppConfig::from_env();
        let host = Arc::new(load_host_seed()?.into_host()?);
        Self::with_host(host, config, SetupOptions::new()).await
    }

    /// Wire the plugin against an existing host store
    pub async fn with_host(
        host: Arc<MemoryHost>,
        config: AppConfig,
        options: SetupOptions,
    ) -> anyhow::Result<Self> {
        let options = options.with_admin_recipients(config.admin_recipients.clone());
        let injector = setup(host.clone(), options).await;
        let missing = injector.missing();

        let plugin = Plugin::bootstrap(host.clone(), injector, config.policy(), config.assets())
            .await
            .map_err(|e| anyhow::anyhow!("Failed to wire plugin: {}", e))?
            .ok_or_else(|| anyhow::anyhow!("Plugin dependencies missing: {:?}", missing))?;

        Ok(Self {
            plugin: Arc::new(plugin),
            host,
            config,
        })
    }
}

/// Load the host seed from config file
fn load_host_seed() -> anyhow::Result<HostSeed> {
    let config_paths = [
        "config/options.toml",
        "../config/options.toml",
        "../../config/options.toml",
    ];

    for path in config_paths {
        if let Ok(content) = std::fs::read_to_string(path) {
            let seed: HostSeed = toml::from_str(&content)
                .map_err(|e| anyhow::anyhow!("Failed to parse {}: {}", path, e))?;
            tracing::info!(
                "Loaded {} options and {} users from {}",
                seed.options.len(),
                seed.users.len(),
                path
            );
            return Ok(seed);
        }
    }

    tracing::warn!("No host options found, using empty store");
    Ok(HostSeed::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use campaign_core::testing::RecordingApi;
    use campaign_core::{ContentHost, API_OPTIONS_NAME};

    fn test_config() -> AppConfig {
        AppConfig {
            host: "0.0.0.0".to_string(),
            port: 3000,
            environment: "test".to_string(),
            plugin_uri: "https://ads.example.com/plugin".to_string(),
            version: "0.1.0".to_string(),
            test_mode: true,
            declare_fields: false,
            additional_roles: vec!["author".to_string()],
            admin_recipients: Vec::new(),
        }
    }

    #[test]
    fn test_app_config_defaults() {
        // Clear env vars for test
        std::env::remove_var("HOST");
        std::env::remove_var("PORT");
        std::env::remove_var("ADBUTLER_ADDITIONAL_ROLES");

        let config = AppConfig::from_env();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 8080);
        assert!(config.additional_roles.is_empty());
    }

    #[test]
    fn test_socket_addr() {
        let addr = test_config().socket_addr().unwrap();
        assert_eq!(addr.to_string(), "0.0.0.0:3000");

        let bad = AppConfig {
            host: "not a host".to_string(),
            ..test_config()
        };
        assert!(bad.socket_addr().is_err());
    }

    #[test]
    fn test_policy_carries_config() {
        let policy = AppConfig {
            test_mode: false,
            declare_fields: true,
            ..test_config()
        }
        .policy();

        assert!(!policy.test_mode);
        assert!(policy.declare_fields);
        assert_eq!(policy.additional_roles, vec!["author".to_string()]);
    }

    #[test]
    fn test_env_flag() {
        std::env::set_var("ADBUTLER_STATE_FLAG_ON", " Yes ");
        std::env::set_var("ADBUTLER_STATE_FLAG_OFF", "0");
        std::env::set_var("ADBUTLER_STATE_FLAG_BAD", "maybe");
        std::env::remove_var("ADBUTLER_STATE_FLAG_UNSET");

        assert_eq!(env_flag("ADBUTLER_STATE_FLAG_ON"), Some(true));
        assert_eq!(env_flag("ADBUTLER_STATE_FLAG_OFF"), Some(false));
        assert_eq!(env_flag("ADBUTLER_STATE_FLAG_BAD"), None);
        assert_eq!(env_flag("ADBUTLER_STATE_FLAG_UNSET"), None);
    }

    #[tokio::test]
    async fn test_host_seed() {
        let seed: HostSeed = toml::from_str(
            r#"
            features = ["custom_fields"]

            [site]
            name = "Ad Site"
            url = "https://ads.example.com/"

            [options.adbutler_api_options]
            api_key = "seeded_key"

            [[users]]
            id = 7
            login = "jdoe"
            email = "jdoe@example.com"
            roles = ["contributor"]
            "#,
        )
        .unwrap();

        let host = seed.into_host().unwrap();

        assert!(host.has_feature(HostFeature::CustomFields));
        assert_eq!(host.site_name(), "Ad Site");
        assert_eq!(
            host.option(API_OPTIONS_NAME).await.unwrap()["api_key"],
            "seeded_key"
        );
        assert_eq!(host.user(7).await.unwrap().unwrap().login, "jdoe");
    }

    #[tokio::test]
    async fn test_state_wires_plugin() {
        let state = AppState::with_host(
            Arc::new(MemoryHost::new()),
            test_config(),
            SetupOptions::new().with_client(Arc::new(RecordingApi::new())),
        )
        .await
        .unwrap();

        assert_eq!(state.plugin.registered().len(), 7);
        assert!(!state.plugin.hooks().await.is_empty());
    }
}
