//! # AdButler Client
//!
//! HTTP implementation of [`AdvertisingApi`] against the AdButler REST API.
//!
//! ## Flow
//!
//! 1. Serialize the request body as JSON
//! 2. POST it to `{base}/{version}/{resource}` with the account key
//! 3. Return the created object, or the error message AdButler reported

use crate::config::AdButlerConfig;
use async_trait::async_trait;
use campaign_core::{
    AdvertisingApi, BannerLink, CampaignError, CampaignResult, NewAdvertiser, NewBanner,
    NewCampaign, RemoteResource,
};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, info, instrument};

/// AdButler API client
pub struct AdButlerClient {
    config: AdButlerConfig,
    client: Client,
}

impl AdButlerClient {
    /// Create a new AdButler client
    pub fn new(config: AdButlerConfig) -> CampaignResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| CampaignError::Configuration(format!("HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    /// Create from environment variables
    pub fn from_env() -> CampaignResult<Self> {
        let config = AdButlerConfig::from_env()?;
        Self::new(config)
    }

    pub fn config(&self) -> &AdButlerConfig {
        &self.config
    }

    async fn post<T: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &T,
    ) -> CampaignResult<RemoteResource> {
        let url = self.config.endpoint(path);
        debug!("POST {}", url);

        let response = self
            .client
            .post(&url)
            .header("Authorization", self.config.auth_header())
            .json(body)
            .send()
            .await
            .map_err(|e| CampaignError::NetworkError(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| CampaignError::NetworkError(e.to_string()))?;

        if !status.is_success() {
            error!("AdButler API error: status={}, body={}", status, body);

            if let Ok(error_response) = serde_json::from_str::<AdButlerErrorResponse>(&body) {
                if let Some(message) = error_response.message() {
                    return Err(CampaignError::Remote(message));
                }
            }

            return Err(CampaignError::Remote(format!("HTTP {}: {}", status, body)));
        }

        serde_json::from_str(&body).map_err(|e| {
            error!("Failed to parse AdButler response: {}", e);
            CampaignError::Serialization(e.to_string())
        })
    }
}

#[async_trait]
impl AdvertisingApi for AdButlerClient {
    #[instrument(skip(self, advertiser), fields(email = %advertiser.email))]
    async fn create_advertiser(
        &self,
        advertiser: &NewAdvertiser,
    ) -> CampaignResult<RemoteResource> {
        let resource = self.post("advertisers", advertiser).await?;
        info!("Created advertiser {:?}", resource.id());
        Ok(resource)
    }

    #[instrument(skip(self, campaign), fields(advertiser = campaign.advertiser))]
    async fn create_campaign(&self, campaign: &NewCampaign) -> CampaignResult<RemoteResource> {
        let resource = self.post("campaigns/banner", campaign).await?;
        info!("Created banner campaign {:?}", resource.id());
        Ok(resource)
    }

    #[instrument(skip(self, banner), fields(name = %banner.name))]
    async fn create_banner(&self, banner: &NewBanner) -> CampaignResult<RemoteResource> {
        let resource = self.post("banners/image", banner).await?;
        info!("Created image banner {:?}", resource.id());
        Ok(resource)
    }

    #[instrument(
        skip(self, link),
        fields(campaign = link.campaign, banner = link.advertisement.id)
    )]
    async fn link_banner_to_campaign(&self, link: &BannerLink) -> CampaignResult<RemoteResource> {
        let resource = self.post("campaign-assignments", link).await?;
        info!("Assigned banner {} to campaign {}", link.advertisement.id, link.campaign);
        Ok(resource)
    }
}

// =============================================================================
// AdButler API Types (internal)
// =============================================================================

#[derive(Debug, Deserialize)]
struct AdButlerErrorResponse {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    errors: Vec<AdButlerFieldError>,
}

#[derive(Debug, Deserialize)]
struct AdButlerFieldError {
    message: String,
}

impl AdButlerErrorResponse {
    fn message(self) -> Option<String> {
        self.message
            .filter(|m| !m.is_empty())
            .or_else(|| self.errors.into_iter().next().map(|e| e.message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn client_for(server: &MockServer) -> AdButlerClient {
        AdButlerClient::new(AdButlerConfig::new("key_123").with_api_base_url(server.uri())).unwrap()
    }

    #[tokio::test]
    async fn test_create_advertiser() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/advertisers"))
            .and(header("Authorization", "Basic key_123"))
            .and(body_json(json!({
                "name": "Jane | jdoe | 7 ",
                "email": "jdoe@example.com",
                "password": "abcdefghijkl",
                "can_change_password": true,
                "can_add_banners": true
            })))
            .respond_with(
                ResponseTemplate::new(201)
                    .set_body_json(json!({ "object": "advertiser", "id": 4471 })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let advertiser = NewAdvertiser::new("Jane | jdoe | 7 ", "jdoe@example.com", "abcdefghijkl");
        let resource = client.create_advertiser(&advertiser).await.unwrap();

        assert_eq!(resource.id(), Some(4471));
        assert_eq!(resource.data()["object"], "advertiser");
    }

    #[tokio::test]
    async fn test_campaign_and_banner_paths() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/campaigns/banner"))
            .and(body_json(json!({
                "name": "Spring",
                "advertiser": 9,
                "height": 250,
                "width": 300
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": 31 })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/banners/image"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "77" })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/campaign-assignments"))
            .and(body_json(json!({
                "campaign": 31,
                "advertisement": { "id": 77, "type": "banner" },
                "weight": 2,
                "active": true
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": 5 })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server).await;

        let campaign = client.create_campaign(&NewCampaign::new("Spring", 9)).await.unwrap();
        assert_eq!(campaign.id(), Some(31));

        let banner = client
            .create_banner(&NewBanner::new("A", "http://img/a.png").with_location("http://a"))
            .await
            .unwrap();
        assert_eq!(banner.id(), Some(77));

        client
            .link_banner_to_campaign(&BannerLink::new(31, 77))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_error_message_is_surfaced() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/advertisers"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "object": "error",
                "message": "The email has already been taken."
            })))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let err = client
            .create_advertiser(&NewAdvertiser::new("a", "a@example.com", "p"))
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "The email has already been taken.");
        assert!(err.is_remote());
    }

    #[tokio::test]
    async fn test_unparseable_error_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/banners/image"))
            .respond_with(ResponseTemplate::new(500).set_body_string("upstream down"))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let err = client
            .create_banner(&NewBanner::new("A", "http://img/a.png"))
            .await
            .unwrap_err();

        match err {
            CampaignError::Remote(message) => {
                assert!(message.starts_with("HTTP 500"));
                assert!(message.contains("upstream down"));
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_field_errors_use_first_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/campaigns/banner"))
            .respond_with(ResponseTemplate::new(422).set_body_json(json!({
                "errors": [{ "field": "advertiser", "message": "Advertiser not found" }]
            })))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let err = client.create_campaign(&NewCampaign::new("x", 1)).await.unwrap_err();
        assert_eq!(err.to_string(), "Advertiser not found");
    }

    #[tokio::test]
    async fn test_unreachable_server_is_network_error() {
        let client = AdButlerClient::new(
            AdButlerConfig::new("k").with_api_base_url("http://127.0.0.1:1"),
        )
        .unwrap();

        let err = client.create_campaign(&NewCampaign::new("x", 1)).await.unwrap_err();
        assert!(matches!(err, CampaignError::NetworkError(_)));
    }
}
