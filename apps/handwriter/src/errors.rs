use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::model::ModelError;

// ────────────────────────────────────────────────────────────────────────────
// Core taxonomy
// ────────────────────────────────────────────────────────────────────────────

/// Everything that can go wrong between raw text and rendered pages.
///
/// Three families:
/// - validation: detected before any generation starts, nothing is produced
/// - generation: reported per line, sibling lines are unaffected
/// - resource: timeouts and pool failures, safe for the caller to retry
#[derive(Debug, Clone, PartialEq, Error)]
pub enum HandwritingError {
    #[error("Unsupported character {character:?} in line {line} at column {column}")]
    UnsupportedCharacter {
        line: usize,
        column: usize,
        character: char,
    },

    #[error("Word of {length} characters exceeds the {max}-character line limit: {word:?}")]
    WordTooLong {
        word: String,
        length: usize,
        max: usize,
    },

    #[error("Style index {0} is outside the supported range 0..=12")]
    InvalidStyleIndex(usize),

    #[error("Style {0} is not loaded")]
    StyleUnavailable(usize),

    #[error("Expected {expected} {parameter} values (one per line), got {actual}")]
    ParameterCountMismatch {
        parameter: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Bias must be a finite, non-negative number (got {0})")]
    InvalidBias(f32),

    #[error("Stroke width must be a finite, positive number (got {0})")]
    InvalidStrokeWidth(f32),

    #[error("Stroke color cannot be blank (got {0:?})")]
    InvalidStrokeColor(String),

    #[error("Invalid layout configuration: {0}")]
    InvalidLayout(String),

    #[error("No text to write")]
    EmptyDocument,

    #[error("Line {line} reached the {steps}-step generation limit before attention finished")]
    GenerationOverrun { line: usize, steps: usize },

    #[error("Line {line} exceeded its {timeout_ms} ms generation deadline after {steps} steps")]
    GenerationTimeout {
        line: usize,
        steps: usize,
        timeout_ms: u64,
    },

    #[error("Worker pool error: {0}")]
    WorkerPool(String),

    #[error("Model error: {0}")]
    Model(#[from] ModelError),
}

impl HandwritingError {
    /// Stable machine-readable code, used in line reports and HTTP bodies.
    pub fn code(&self) -> &'static str {
        match self {
            HandwritingError::UnsupportedCharacter { .. } => "UNSUPPORTED_CHARACTER",
            HandwritingError::WordTooLong { .. } => "WORD_TOO_LONG",
            HandwritingError::InvalidStyleIndex(_) => "INVALID_STYLE_INDEX",
            HandwritingError::StyleUnavailable(_) => "STYLE_UNAVAILABLE",
            HandwritingError::ParameterCountMismatch { .. } => "PARAMETER_COUNT_MISMATCH",
            HandwritingError::InvalidBias(_) => "INVALID_BIAS",
            HandwritingError::InvalidStrokeWidth(_) => "INVALID_STROKE_WIDTH",
            HandwritingError::InvalidStrokeColor(_) => "INVALID_STROKE_COLOR",
            HandwritingError::InvalidLayout(_) => "INVALID_LAYOUT",
            HandwritingError::EmptyDocument => "EMPTY_DOCUMENT",
            HandwritingError::GenerationOverrun { .. } => "GENERATION_OVERRUN",
            HandwritingError::GenerationTimeout { .. } => "GENERATION_TIMEOUT",
            HandwritingError::WorkerPool(_) => "WORKER_POOL",
            HandwritingError::Model(_) => "MODEL_ERROR",
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            HandwritingError::UnsupportedCharacter { .. }
                | HandwritingError::WordTooLong { .. }
                | HandwritingError::InvalidStyleIndex(_)
                | HandwritingError::StyleUnavailable(_)
                | HandwritingError::ParameterCountMismatch { .. }
                | HandwritingError::InvalidBias(_)
                | HandwritingError::InvalidStrokeWidth(_)
                | HandwritingError::InvalidStrokeColor(_)
                | HandwritingError::InvalidLayout(_)
                | HandwritingError::EmptyDocument
        )
    }

    /// Resource errors. The core never retries these itself.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            HandwritingError::GenerationTimeout { .. } | HandwritingError::WorkerPool(_)
        )
    }
}

// ────────────────────────────────────────────────────────────────────────────
// HTTP mapping
// ────────────────────────────────────────────────────────────────────────────

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {message}")]
    Validation { code: &'static str, message: String },

    #[error("Unprocessable entity: {0}")]
    UnprocessableEntity(String),

    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<HandwritingError> for AppError {
    fn from(err: HandwritingError) -> Self {
        if matches!(err, HandwritingError::StyleUnavailable(_)) {
            AppError::NotFound(err.to_string())
        } else if err.is_validation() {
            AppError::Validation {
                code: err.code(),
                message: err.to_string(),
            }
        } else if err.is_retryable() {
            AppError::Unavailable(err.to_string())
        } else if matches!(err, HandwritingError::GenerationOverrun { .. }) {
            AppError::UnprocessableEntity(err.to_string())
        } else {
            AppError::Internal(anyhow::Error::new(err))
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation { code, message } => {
                (StatusCode::BAD_REQUEST, *code, message.clone())
            }
            AppError::UnprocessableEntity(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "UNPROCESSABLE_ENTITY",
                msg.clone(),
            ),
            AppError::Unavailable(msg) => {
                tracing::warn!("Resource error: {msg}");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "SERVICE_UNAVAILABLE",
                    msg.clone(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_errors_classified() {
        let err = HandwritingError::WordTooLong {
            word: "x".repeat(80),
            length: 80,
            max: 55,
        };
        assert!(err.is_validation());
        assert!(!err.is_retryable());
        assert_eq!(err.code(), "WORD_TOO_LONG");
    }

    #[test]
    fn test_resource_errors_are_retryable() {
        let err = HandwritingError::GenerationTimeout {
            line: 2,
            steps: 40,
            timeout_ms: 100,
        };
        assert!(err.is_retryable());
        assert!(!err.is_validation());
    }

    #[test]
    fn test_overrun_maps_to_unprocessable() {
        let app: AppError = HandwritingError::GenerationOverrun { line: 0, steps: 120 }.into();
        assert!(matches!(app, AppError::UnprocessableEntity(_)));
        let response = app.into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn test_missing_style_maps_to_not_found() {
        let response = AppError::from(HandwritingError::StyleUnavailable(4)).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_unsupported_character_maps_to_bad_request() {
        let app: AppError = HandwritingError::UnsupportedCharacter {
            line: 1,
            column: 3,
            character: '@',
        }
        .into();
        match app {
            AppError::Validation { code, ref message } => {
                assert_eq!(code, "UNSUPPORTED_CHARACTER");
                assert!(message.contains("'@'"));
            }
            other => panic!("expected Validation, got {other:?}"),
        }
    }
}
