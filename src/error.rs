//! Error types for loca.

use std::time::Duration;

use crate::wizard::state::WizardStep;

/// Top-level error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("API error: {0}")]
    Api(#[from] ApiError),

    #[error("Wizard error: {0}")]
    Wizard(#[from] WizardError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Persistence errors for the wizard record store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Connection error: {0}")]
    Pool(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Stored record {key} is malformed: {reason}")]
    Malformed { key: String, reason: String },
}

/// Errors from the external generation and lookup endpoints.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Endpoint {endpoint} is not configured (set {env_var})")]
    MissingEndpoint {
        endpoint: &'static str,
        env_var: &'static str,
    },

    #[error("Request to {endpoint} failed: {reason}")]
    Request {
        endpoint: &'static str,
        reason: String,
    },

    #[error("Request to {endpoint} timed out after {timeout:?}")]
    Timeout {
        endpoint: &'static str,
        timeout: Duration,
    },

    #[error("{endpoint} responded with HTTP {status}")]
    Status { endpoint: &'static str, status: u16 },

    #[error("Malformed response from {endpoint}: {reason}")]
    MalformedResponse {
        endpoint: &'static str,
        reason: String,
    },
}

impl ApiError {
    /// Endpoint name the error originated from.
    pub fn endpoint(&self) -> &'static str {
        match self {
            Self::MissingEndpoint { endpoint, .. }
            | Self::Request { endpoint, .. }
            | Self::Timeout { endpoint, .. }
            | Self::Status { endpoint, .. }
            | Self::MalformedResponse { endpoint, .. } => endpoint,
        }
    }
}

/// Wizard state machine and session errors.
#[derive(Debug, thiserror::Error)]
pub enum WizardError {
    #[error("Wizard has already finished")]
    Finished,

    #[error("Step {step} cannot accept output for {given}")]
    OutputMismatch { step: WizardStep, given: WizardStep },

    #[error("Invalid start step {0}: must be between 1 and 5")]
    InvalidStartStep(u8),

    #[error("Step {step} is still loading")]
    Loading { step: WizardStep },

    #[error("Step {step} has nothing selected")]
    EmptySelection { step: WizardStep },

    #[error("Step {step} does not contain item {item}")]
    UnknownItem { step: WizardStep, item: String },

    #[error("Step {step} does not support {action}")]
    Unsupported {
        step: WizardStep,
        action: &'static str,
    },

    #[error("Going back from step {step} is disabled")]
    BackDisabled { step: WizardStep },

    #[error("Campaign launch is still in progress ({progress:.0}%)")]
    LaunchInProgress { progress: f64 },

    #[error("Wizard session {0} not found")]
    SessionNotFound(uuid::Uuid),
}

/// Business info form validation failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid business info: {}", .fields.join(", "))]
pub struct ValidationError {
    /// The offending form fields (camelCase, as submitted).
    pub fields: Vec<String>,
}

/// Result type alias.
pub type Result<T> = std::result::Result<T, Error>;
