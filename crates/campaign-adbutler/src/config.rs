//! # AdButler Configuration
//!
//! Configuration for the AdButler REST API.
//! The API key comes from the plugin options first and the environment second.

use campaign_core::{CampaignError, OptionsProvider};
use std::env;

/// Default AdButler API host
pub const DEFAULT_API_BASE_URL: &str = "https://api.adbutler.com";

/// Placeholder creative sent instead of uploaded images while in test mode
pub const TEST_IMAGE_URL: &str = "http://www.lipsum.com/images/banners/black_300x250.gif";

/// AdButler API configuration
#[derive(Debug, Clone)]
pub struct AdButlerConfig {
    /// Account API key
    pub api_key: String,

    /// API base URL (for testing/mocking)
    pub api_base_url: String,

    /// API version path segment
    pub api_version: String,
}

impl AdButlerConfig {
    /// Load configuration from environment variables.
    ///
    /// Required env vars:
    /// - `ADBUTLER_API_KEY`
    ///
    /// Optional:
    /// - `ADBUTLER_API_BASE_URL` (default `https://api.adbutler.com`)
    pub fn from_env() -> Result<Self, CampaignError> {
        dotenvy::dotenv().ok();

        let api_key = env::var("ADBUTLER_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| CampaignError::Configuration("ADBUTLER_API_KEY not set".to_string()))?;

        Ok(Self::new(api_key).with_env_overrides())
    }

    /// Load configuration using the key stored in the plugin options,
    /// falling back to the environment when the option is unset.
    pub async fn from_options(options: &dyn OptionsProvider) -> Result<Self, CampaignError> {
        match options.api_key().await {
            Some(api_key) => {
                dotenvy::dotenv().ok();
                Ok(Self::new(api_key).with_env_overrides())
            }
            None => Self::from_env(),
        }
    }

    /// Create config with explicit values (for testing)
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            api_version: "v1".to_string(),
        }
    }

    fn with_env_overrides(mut self) -> Self {
        if let Ok(url) = env::var("ADBUTLER_API_BASE_URL") {
            if !url.trim().is_empty() {
                self.api_base_url = url;
            }
        }
        self
    }

    /// Get authorization header value
    pub fn auth_header(&self) -> String {
        format!("Basic {}", self.api_key)
    }

    /// Full URL of an API resource path
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}/{}",
            self.api_base_url.trim_end_matches('/'),
            self.api_version,
            path.trim_start_matches('/')
        )
    }

    /// Builder: set custom API base URL (for testing)
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use campaign_core::CampaignResult;
    use serde_json::{json, Value};

    struct FixedOptions(Option<Value>);

    #[async_trait]
    impl OptionsProvider for FixedOptions {
        async fn options(&self) -> Option<Value> {
            self.0.clone()
        }

        async fn setup(&self) -> CampaignResult<String> {
            Ok(String::new())
        }
    }

    #[test]
    fn test_defaults() {
        let config = AdButlerConfig::new("key_123");
        assert_eq!(config.api_version, "v1");
        assert_eq!(config.api_base_url, "https://api.adbutler.com");
        assert_eq!(config.auth_header(), "Basic key_123");
    }

    #[test]
    fn test_endpoint() {
        let config = AdButlerConfig::new("k").with_api_base_url("http://localhost:9000/");
        assert_eq!(config.endpoint("advertisers"), "http://localhost:9000/v1/advertisers");
        assert_eq!(
            config.endpoint("/campaigns/banner"),
            "http://localhost:9000/v1/campaigns/banner"
        );
    }

    #[tokio::test]
    async fn test_options_key_wins() {
        let options = FixedOptions(Some(json!({ "api_key": "from_options" })));
        let config = AdButlerConfig::from_options(&options).await.unwrap();
        assert_eq!(config.api_key, "from_options");
    }

    #[test]
    fn test_from_env_missing_key() {
        env::remove_var("ADBUTLER_API_KEY");

        let result = AdButlerConfig::from_env();
        assert!(result.is_err());
    }
}
