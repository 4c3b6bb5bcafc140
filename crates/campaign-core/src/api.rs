//! # Advertising API
//!
//! Operations the creation integrations need from the remote advertising platform.
//! The HTTP client lives in `campaign-adbutler`; anything implementing
//! [`AdvertisingApi`] can stand in for it.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::CampaignResult;

/// Fixed creative height for banners and campaigns
pub const BANNER_HEIGHT: u32 = 250;

/// Fixed creative width for banners and campaigns
pub const BANNER_WIDTH: u32 = 300;

/// Request body for advertiser creation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAdvertiser {
    pub name: String,
    pub email: String,
    pub password: String,
    pub can_change_password: bool,
    pub can_add_banners: bool,
}

impl NewAdvertiser {
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            password: password.into(),
            can_change_password: true,
            can_add_banners: true,
        }
    }
}

/// Request body for banner campaign creation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCampaign {
    pub name: String,
    pub advertiser: i64,
    pub height: u32,
    pub width: u32,
}

impl NewCampaign {
    pub fn new(name: impl Into<String>, advertiser: i64) -> Self {
        Self {
            name: name.into(),
            advertiser,
            height: BANNER_HEIGHT,
            width: BANNER_WIDTH,
        }
    }
}

/// Request body for image banner creation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBanner {
    pub name: String,
    pub creative_url: String,
    pub height: u32,
    pub width: u32,
    pub html_target: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html_alt_text: Option<String>,
}

impl NewBanner {
    pub fn new(name: impl Into<String>, creative_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            creative_url: creative_url.into(),
            height: BANNER_HEIGHT,
            width: BANNER_WIDTH,
            html_target: "_blank".to_string(),
            location: None,
            html_alt_text: None,
        }
    }

    /// Builder: set click-through URL, ignored when empty
    pub fn with_location(mut self, location: &str) -> Self {
        self.location = Some(location.to_string()).filter(|l| !l.is_empty());
        self
    }

    /// Builder: set alt text, ignored when empty
    pub fn with_alt_text(mut self, alt: &str) -> Self {
        self.html_alt_text = Some(alt.to_string()).filter(|a| !a.is_empty());
        self
    }
}

/// Reference to the advertisement being assigned
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdvertisementRef {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: String,
}

/// Request body assigning a banner to a campaign
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BannerLink {
    pub campaign: i64,
    pub advertisement: AdvertisementRef,
    pub weight: u32,
    pub active: bool,
}

impl BannerLink {
    pub fn new(campaign: i64, banner: i64) -> Self {
        Self {
            campaign,
            advertisement: AdvertisementRef {
                id: banner,
                kind: "banner".to_string(),
            },
            weight: 2,
            active: true,
        }
    }
}

/// Object returned by every remote operation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RemoteResource {
    data: Map<String, Value>,
}

impl RemoteResource {
    pub fn new(data: Map<String, Value>) -> Self {
        Self { data }
    }

    /// Resource holding just an id
    pub fn with_id(id: impl Into<Value>) -> Self {
        let mut data = Map::new();
        data.insert("id".to_string(), id.into());
        Self { data }
    }

    pub fn data(&self) -> &Map<String, Value> {
        &self.data
    }

    /// The `id` field when it is numeric, as a number or a numeric string
    pub fn id(&self) -> Option<i64> {
        match self.data.get("id")? {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

/// Remote advertising platform
#[async_trait]
pub trait AdvertisingApi: Send + Sync {
    async fn create_advertiser(&self, advertiser: &NewAdvertiser) -> CampaignResult<RemoteResource>;

    async fn create_campaign(&self, campaign: &NewCampaign) -> CampaignResult<RemoteResource>;

    async fn create_banner(&self, banner: &NewBanner) -> CampaignResult<RemoteResource>;

    async fn link_banner_to_campaign(&self, link: &BannerLink) -> CampaignResult<RemoteResource>;

    /// Provider name for logging
    fn provider_name(&self) -> &'static str {
        "adbutler"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_resource_id_forms() {
        assert_eq!(RemoteResource::with_id(42).id(), Some(42));
        assert_eq!(RemoteResource::with_id("17").id(), Some(17));
        assert_eq!(RemoteResource::with_id("abc").id(), None);
        assert_eq!(RemoteResource::default().id(), None);
    }

    #[test]
    fn test_banner_payload_omits_empty_optionals() {
        let banner = NewBanner::new("Banner A", "http://img/x.png")
            .with_location("http://dest")
            .with_alt_text("");

        let body = serde_json::to_value(&banner).unwrap();
        assert_eq!(
            body,
            json!({
                "name": "Banner A",
                "creative_url": "http://img/x.png",
                "height": 250,
                "width": 300,
                "html_target": "_blank",
                "location": "http://dest"
            })
        );
    }

    #[test]
    fn test_link_payload() {
        let body = serde_json::to_value(BannerLink::new(5, 9)).unwrap();
        assert_eq!(
            body,
            json!({
                "campaign": 5,
                "advertisement": { "id": 9, "type": "banner" },
                "weight": 2,
                "active": true
            })
        );
    }
}
