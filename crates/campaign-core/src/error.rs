//! # Campaign Error Types
//!
//! Typed error handling for the campaign integration layer.
//! Every workflow returns `Result<T, CampaignError>`; an `Err` coming out of a hook
//! callback halts the event that triggered it and its message is shown to the user.

use thiserror::Error;

/// Core error type for all integration operations
#[derive(Debug, Error)]
pub enum CampaignError {
    /// Configuration errors (missing keys, invalid config)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A collaborator required at startup was never resolved
    #[error("Missing dependency: {name}")]
    MissingDependency { name: String },

    /// A hook was declared with an argument count its event cannot supply
    #[error("Invalid hook {tag}: requested {requested} arguments, event supplies {available}")]
    InvalidHook {
        tag: String,
        requested: usize,
        available: usize,
    },

    /// Raw failure reported by the remote advertising API
    #[error("{0}")]
    Remote(String),

    /// Remote failure while creating a campaign or banner
    #[error("Client Error: {message}")]
    Client { message: String },

    /// Remote failure while linking a banner to its campaign
    #[error("Link Error: {message}")]
    Link { message: String },

    /// A creative is missing one of its required fields
    #[error("Missing fields on Creative")]
    MissingCreativeFields {
        index: usize,
        fields: Vec<&'static str>,
    },

    /// The remote id could not be read from the response or persisted locally
    #[error("Could not save AdButler {resource} ID.  Please try again.")]
    RemoteIdNotSaved { resource: &'static str },

    /// Network/HTTP error communicating with the remote API
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Error reported by the host content store
    #[error("Host error: {0}")]
    Host(String),

    /// Internal error (should not happen)
    #[error("Internal error: {0}")]
    Internal(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl CampaignError {
    /// Returns true if the failure came from the remote API
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            CampaignError::Remote(_)
                | CampaignError::Client { .. }
                | CampaignError::Link { .. }
                | CampaignError::NetworkError(_)
        )
    }

    /// Returns the HTTP status code appropriate for this error
    pub fn status_code(&self) -> u16 {
        match self {
            CampaignError::Configuration(_) => 500,
            CampaignError::MissingDependency { .. } => 500,
            CampaignError::InvalidHook { .. } => 500,
            CampaignError::Remote(_) => 502,
            CampaignError::Client { .. } => 502,
            CampaignError::Link { .. } => 502,
            CampaignError::MissingCreativeFields { .. } => 422,
            CampaignError::RemoteIdNotSaved { .. } => 500,
            CampaignError::NetworkError(_) => 503,
            CampaignError::Host(_) => 500,
            CampaignError::Internal(_) => 500,
            CampaignError::Serialization(_) => 500,
        }
    }

    /// Wraps a remote failure raised while creating a campaign or banner
    pub fn client(err: CampaignError) -> Self {
        CampaignError::Client {
            message: err.remote_message(),
        }
    }

    /// Wraps a remote failure raised while linking a banner
    pub fn link(err: CampaignError) -> Self {
        CampaignError::Link {
            message: err.remote_message(),
        }
    }

    fn remote_message(&self) -> String {
        match self {
            CampaignError::Remote(message) => message.clone(),
            other => other.to_string(),
        }
    }
}

impl From<serde_json::Error> for CampaignError {
    fn from(err: serde_json::Error) -> Self {
        CampaignError::Serialization(err.to_string())
    }
}

/// Result type alias for campaign operations
pub type CampaignResult<T> = Result<T, CampaignError>;
