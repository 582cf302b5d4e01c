use std::fmt;
use std::time::Duration;

use axum::http::StatusCode;
use thiserror::Error;

use crate::model::ErrorResponse;

/// Errors that can occur while analyzing a food image
#[derive(Error, Debug)]
pub enum AnalysisError {
    /// The inbound request or the structured model output had the wrong shape
    #[error("{0}")]
    Validation(String),

    /// The vision model call failed or returned something unexpected
    #[error("{0}")]
    VisionService(String),

    /// The structuring model call failed or returned unparsable JSON
    #[error("{message}")]
    NutritionService {
        message: String,
        details: Option<String>,
    },

    /// The end-to-end pipeline deadline expired
    #[error("Processing took longer than {} seconds.", .0.as_secs_f64())]
    Timeout(Duration),

    /// Anything not covered above. The message is logged, never returned to clients.
    #[error("Internal error: {0}")]
    Internal(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(#[from] config::ConfigError),

    /// Builder configuration error
    #[error("Builder error: {0}")]
    BuilderError(String),
}

/// The externally visible failure categories
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Validation,
    Vision,
    Structuring,
    Timeout,
    Internal,
}

impl FailureKind {
    pub fn status_code(self) -> StatusCode {
        match self {
            FailureKind::Validation | FailureKind::Vision | FailureKind::Structuring => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            FailureKind::Timeout => StatusCode::GATEWAY_TIMEOUT,
            FailureKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The `error` field reported to clients
    pub fn category(self) -> &'static str {
        match self {
            FailureKind::Validation => "Validation failed",
            FailureKind::Vision => "Vision analysis failed",
            FailureKind::Structuring => "Nutrition analysis failed",
            FailureKind::Timeout => "Request timed out",
            FailureKind::Internal => "Internal server error",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.category())
    }
}

impl AnalysisError {
    pub fn kind(&self) -> FailureKind {
        match self {
            AnalysisError::Validation(_) => FailureKind::Validation,
            AnalysisError::VisionService(_) => FailureKind::Vision,
            AnalysisError::NutritionService { .. } => FailureKind::Structuring,
            AnalysisError::Timeout(_) => FailureKind::Timeout,
            AnalysisError::Internal(_)
            | AnalysisError::ConfigError(_)
            | AnalysisError::BuilderError(_) => FailureKind::Internal,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        self.kind().status_code()
    }

    /// Render the error as the body returned to clients
    pub fn to_response(&self) -> ErrorResponse {
        let kind = self.kind();
        let (message, details) = match self {
            AnalysisError::NutritionService { message, details } => {
                (message.clone(), details.clone())
            }
            _ if kind == FailureKind::Internal => {
                ("An unexpected error occurred".to_string(), None)
            }
            other => (other.to_string(), None),
        };

        ErrorResponse {
            error: kind.category().to_string(),
            message,
            details,
        }
    }
}
