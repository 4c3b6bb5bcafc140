//! # Request Handlers
//!
//! Axum request handlers that turn host lifecycle deliveries into dispatched events.
//! Every dispatch answers with the outputs of the callbacks that ran; a halted event
//! answers with the halting error's status and message.

use std::str::FromStr;

use crate::plugin::RegisteredIntegration;
use crate::state::AppState;
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use campaign_core::{
    CampaignError, CampaignItem, DispatchReport, HookEvent, HookSummary, HookTag, PostStatus,
    Submission, User,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument, warn};

// =============================================================================
// Request/Response Types
// =============================================================================

/// Item saved
#[derive(Debug, Deserialize)]
pub struct SavePostRequest {
    pub post_id: u64,
    pub post: CampaignItem,
    /// Whether this is an update of an existing item
    #[serde(default)]
    pub update: bool,
    /// Submitted form data
    #[serde(default)]
    pub submission: Submission,
}

/// User profile updated
#[derive(Debug, Deserialize)]
pub struct ProfileUpdateRequest {
    pub user_id: u64,
    #[serde(default)]
    pub old_user: Option<User>,
}

/// Item moved between statuses
#[derive(Debug, Deserialize)]
pub struct TransitionStatusRequest {
    pub new_status: PostStatus,
    pub old_status: PostStatus,
    pub post: CampaignItem,
}

/// Arguments for render events, all optional
#[derive(Debug, Default, Deserialize)]
pub struct RenderEventRequest {
    /// Admin page suffix for `admin_enqueue_scripts`
    #[serde(default)]
    pub hook_suffix: Option<String>,
    /// Item being edited for `edit_form_after_title`
    #[serde(default)]
    pub post: Option<CampaignItem>,
}

/// Catalog introspection
#[derive(Debug, Serialize)]
pub struct HooksResponse {
    pub integrations: Vec<RegisteredIntegration>,
    pub hooks: Vec<HookSummary>,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, code: u16) -> Self {
        Self {
            error: error.into(),
            code,
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);

fn campaign_error_to_response(err: CampaignError) -> ApiError {
    let code = err.status_code();
    let mut response = ErrorResponse::new(err.to_string(), code);
    if let CampaignError::MissingCreativeFields { index, fields } = &err {
        response = response.with_details(format!("Creative {}: {}", index + 1, fields.join(", ")));
    }
    (StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR), Json(response))
}

fn bad_request(message: impl Into<String>) -> ApiError {
    (StatusCode::BAD_REQUEST, Json(ErrorResponse::new(message, 400)))
}

// =============================================================================
// Handlers
// =============================================================================

/// Health check endpoint
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "adbutler-campaigns",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// Registered integrations and every catalog entry
pub async fn list_hooks(State(state): State<AppState>) -> Json<HooksResponse> {
    Json(HooksResponse {
        integrations: state.plugin.registered().to_vec(),
        hooks: state.plugin.hooks().await,
    })
}

/// Deliver an item save
#[instrument(skip(state, request), fields(post_id = request.post_id))]
pub async fn save_post(
    State(state): State<AppState>,
    Json(request): Json<SavePostRequest>,
) -> Result<Json<DispatchReport>, ApiError> {
    let event = HookEvent::SavePost {
        post_id: request.post_id,
        post: request.post,
        update: request.update,
        submission: request.submission,
    };
    dispatch(&state, event).await
}

/// Deliver a profile update
#[instrument(skip(state, request), fields(user_id = request.user_id))]
pub async fn profile_update(
    State(state): State<AppState>,
    Json(request): Json<ProfileUpdateRequest>,
) -> Result<Json<DispatchReport>, ApiError> {
    let event = HookEvent::ProfileUpdate {
        user_id: request.user_id,
        old_user: request.old_user,
    };
    dispatch(&state, event).await
}

/// Deliver a status transition
#[instrument(skip(state, request), fields(post_id = request.post.id))]
pub async fn transition_status(
    State(state): State<AppState>,
    Json(request): Json<TransitionStatusRequest>,
) -> Result<Json<DispatchReport>, ApiError> {
    let event = HookEvent::TransitionPostStatus {
        new_status: request.new_status,
        old_status: request.old_status,
        post: request.post,
    };
    dispatch(&state, event).await
}

/// Deliver a render event by tag. The body is optional.
#[instrument(skip(state, body))]
pub async fn render_event(
    State(state): State<AppState>,
    Path(tag): Path<String>,
    body: Bytes,
) -> Result<Json<DispatchReport>, ApiError> {
    let tag = HookTag::from_str(&tag).map_err(|e| {
        (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::new(e.to_string(), 404)),
        )
    })?;

    let request: RenderEventRequest = if body.is_empty() {
        RenderEventRequest::default()
    } else {
        serde_json::from_slice(&body).map_err(|e| bad_request(format!("Invalid body: {}", e)))?
    };

    dispatch(&state, render_event_for(tag, request)?).await
}

/// Build the event a render tag stands for
fn render_event_for(tag: HookTag, request: RenderEventRequest) -> Result<HookEvent, ApiError> {
    match tag {
        HookTag::Init => Ok(HookEvent::Init),
        HookTag::AdminFooter => Ok(HookEvent::AdminFooter),
        HookTag::AdminMenu => Ok(HookEvent::AdminMenu),
        HookTag::AdminEnqueueScripts => Ok(HookEvent::AdminEnqueueScripts {
            hook_suffix: request.hook_suffix.unwrap_or_default(),
        }),
        HookTag::EditFormAfterTitle => request
            .post
            .map(|post| HookEvent::EditFormAfterTitle { post })
            .ok_or_else(|| bad_request("edit_form_after_title requires a post")),
        HookTag::SavePost | HookTag::ProfileUpdate | HookTag::TransitionPostStatus => Err(
            bad_request(format!("{} is delivered through its own endpoint", tag)),
        ),
    }
}

/// Grant capabilities and install templated emails
pub async fn activate(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.plugin.activate().await.map_err(|e| {
        error!("Activation failed: {}", e);
        campaign_error_to_response(e)
    })?;
    Ok(Json(serde_json::json!({ "status": "activated" })))
}

/// Revoke capabilities
pub async fn deactivate(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.plugin.deactivate().await.map_err(|e| {
        error!("Deactivation failed: {}", e);
        campaign_error_to_response(e)
    })?;
    Ok(Json(serde_json::json!({ "status": "deactivated" })))
}

async fn dispatch(state: &AppState, event: HookEvent) -> Result<Json<DispatchReport>, ApiError> {
    let tag = event.tag();
    match state.plugin.dispatch(&event).await {
        Ok(report) => {
            info!("Dispatched {}: {} callbacks ran", tag, report.outputs.len());
            Ok(Json(report))
        }
        Err(e) => {
            warn!("Dispatch of {} halted: {}", tag, e);
            Err(campaign_error_to_response(e))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_response() {
        let err = ErrorResponse::new("Test error", 400);
        assert_eq!(err.error, "Test error");
        assert_eq!(err.code, 400);
    }

    #[test]
    fn test_campaign_error_conversion() {
        let err = CampaignError::Client {
            message: "Bad advertiser".to_string(),
        };
        let (status, Json(body)) = campaign_error_to_response(err);
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body.error, "Client Error: Bad advertiser");

        let err = CampaignError::MissingCreativeFields {
            index: 1,
            fields: vec!["name", "url"],
        };
        let (status, Json(body)) = campaign_error_to_response(err);
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body.error, "Missing fields on Creative");
        assert_eq!(body.details.as_deref(), Some("Creative 2: name, url"));
    }

    #[test]
    fn test_render_event_for() {
        assert!(matches!(
            render_event_for(HookTag::AdminMenu, RenderEventRequest::default()),
            Ok(HookEvent::AdminMenu)
        ));

        let (status, _) =
            render_event_for(HookTag::EditFormAfterTitle, RenderEventRequest::default())
                .unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) =
            render_event_for(HookTag::SavePost, RenderEventRequest::default()).unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
