use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::export::{self, ExportFormat, LayoutVariant};
use crate::markdown;
use crate::models::resume::{ResumeDocument, ResumeRecord, SaveResumeRequest, SaveResumeResponse};
use crate::scoring::{self, MatchReport};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateResumeRequest {
    pub title: String,
    #[serde(default)]
    pub document: Option<ResumeDocument>,
    /// Markdown source, parsed into a document. Mutually exclusive with `document`.
    #[serde(default)]
    pub markdown: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ExportQuery {
    #[serde(default)]
    pub format: ExportFormat,
    #[serde(default)]
    pub layout: LayoutVariant,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct MatchRequest {
    pub jd_text: String,
}

fn check_size(state: &AppState, document: &ResumeDocument) -> Result<(), AppError> {
    let size = serde_json::to_vec(document)
        .map_err(|e| AppError::Internal(e.into()))?
        .len();
    let limit = state.config.max_document_bytes;
    if size > limit {
        return Err(AppError::PayloadTooLarge { size, limit });
    }
    Ok(())
}

/// POST /api/v1/resumes
pub async fn handle_create(
    State(state): State<AppState>,
    Json(req): Json<CreateResumeRequest>,
) -> Result<(StatusCode, Json<ResumeRecord>), AppError> {
    let title = req.title.trim();
    if title.is_empty() {
        return Err(AppError::Validation("title must not be empty".to_string()));
    }

    let document = match (req.document, req.markdown) {
        (Some(_), Some(_)) => {
            return Err(AppError::Validation(
                "send either document or markdown, not both".to_string(),
            ))
        }
        (Some(document), None) => document,
        (None, Some(source)) => markdown::parse(&source)
            .map_err(|e| AppError::UnprocessableEntity(e.to_string()))?,
        (None, None) => ResumeDocument::default(),
    };
    check_size(&state, &document)?;

    let record = state.store.create(title, document).await?;
    info!("Created resume {} ({})", record.id, record.title);
    Ok((StatusCode::CREATED, Json(record)))
}

/// GET /api/v1/resumes/:id
pub async fn handle_get(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ResumeRecord>, AppError> {
    Ok(Json(state.store.get(id).await?))
}

/// PATCH /api/v1/resumes/:id
///
/// 409 with `current_revision` when `revision` is stale.
pub async fn handle_save(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<SaveResumeRequest>,
) -> Result<Json<SaveResumeResponse>, AppError> {
    check_size(&state, &req.document)?;
    let sent = req.revision.clone();
    let record = state.store.save(id, req).await?;
    info!("Saved resume {id}: {sent} -> {}", record.revision);
    Ok(Json(SaveResumeResponse {
        revision: record.revision,
        updated_at: record.updated_at,
    }))
}

/// GET /api/v1/resumes/:id/export?format=&layout=
pub async fn handle_export(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<ExportQuery>,
) -> Result<Response, AppError> {
    let record = state.store.get(id).await?;
    let rendered = export::render(&record.document, query.format, query.layout)?;
    let disposition = format!(
        "attachment; filename=\"{}.{}\"",
        file_stem(&record.title),
        rendered.extension
    );
    Ok((
        [
            (header::CONTENT_TYPE, rendered.content_type.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        rendered.body,
    )
        .into_response())
}

/// POST /api/v1/resumes/:id/match
pub async fn handle_match(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<MatchRequest>,
) -> Result<Json<MatchReport>, AppError> {
    if req.jd_text.trim().is_empty() {
        return Err(AppError::Validation("jd_text must not be empty".to_string()));
    }
    let record = state.store.get(id).await?;
    Ok(Json(scoring::score_document(&record.document, &req.jd_text)))
}

/// Header-safe file name from a resume title.
fn file_stem(title: &str) -> String {
    let stem: String = title
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '-' })
        .collect();
    let stem = stem
        .split('-')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-");
    if stem.is_empty() {
        "resume".to_string()
    } else {
        stem
    }
}
