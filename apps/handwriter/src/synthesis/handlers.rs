//! Axum route handlers for the Handwriting API.

use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::layout::PageDescription;
use crate::render::to_svg;
use crate::state::AppState;
use crate::synthesis::pipeline::{compose_document, DocumentRequest, LineReport};
use crate::synthesis::primer::STYLE_COUNT;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Json,
    Svg,
}

#[derive(Debug, Deserialize)]
pub struct HandwritingRequest {
    #[serde(flatten)]
    pub document: DocumentRequest,
    #[serde(default)]
    pub format: OutputFormat,
}

#[derive(Debug, Serialize)]
pub struct RenderedPage {
    #[serde(flatten)]
    pub page: PageDescription,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub svg: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HandwritingResponse {
    pub id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub pages: Vec<RenderedPage>,
    pub lines: Vec<LineReport>,
    pub failed_lines: usize,
}

#[derive(Debug, Serialize)]
pub struct StyleSummary {
    pub index: usize,
    pub text: String,
    pub samples: usize,
}

#[derive(Debug, Serialize)]
pub struct StylesResponse {
    pub supported: usize,
    pub styles: Vec<StyleSummary>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/handwriting
///
/// Writes the text out as handwriting and returns one description per page.
/// With `"format": "svg"` each page also carries a standalone SVG document.
pub async fn handle_compose(
    State(state): State<AppState>,
    Json(request): Json<HandwritingRequest>,
) -> Result<Json<HandwritingResponse>, AppError> {
    if request.document.text.trim().is_empty() {
        return Err(AppError::Validation {
            code: "EMPTY_DOCUMENT",
            message: "text cannot be empty".to_string(),
        });
    }

    let document = compose_document(&request.document, &state.layout, &state.synthesis()).await?;

    let pages = document
        .pages
        .into_iter()
        .map(|page| {
            let svg = (request.format == OutputFormat::Svg).then(|| to_svg(&page));
            RenderedPage { page, svg }
        })
        .collect();

    Ok(Json(HandwritingResponse {
        id: document.id,
        generated_at: document.generated_at,
        pages,
        lines: document.lines,
        failed_lines: document.failed_lines,
    }))
}

/// GET /api/v1/styles
///
/// Lists the style primers loaded at startup.
pub async fn handle_list_styles(State(state): State<AppState>) -> Json<StylesResponse> {
    let styles = state
        .styles
        .available()
        .map(|primer| StyleSummary {
            index: primer.index,
            text: primer.text.clone(),
            samples: primer.strokes.len(),
        })
        .collect();

    Json(StylesResponse {
        supported: STYLE_COUNT,
        styles,
    })
}
