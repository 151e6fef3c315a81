use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use bytes::Bytes;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::pipeline::run_generation;
use crate::storage::UploadReceipt;
use crate::state::AppState;
use crate::synthesis::GenerationRequest;
use crate::topic_map::delimited::{export_filename, from_delimited_text, Delimiter};
use crate::topic_map::hierarchy::{build_hierarchy, render_hierarchy, HierarchyNode};
use crate::topic_map::record::TopicRecord;
use crate::topic_map::session::Session;
use crate::topic_map::table::{TableStatistics, TopicFilter, TopicTable};

#[derive(Deserialize)]
pub struct FormatQuery {
    #[serde(default)]
    pub format: Delimiter,
}

#[derive(Deserialize)]
pub struct UploadRequest {
    #[serde(default)]
    pub folder: Option<String>,
    #[serde(default)]
    pub format: Delimiter,
}

#[derive(Serialize)]
pub struct TopicMapResponse {
    #[serde(flatten)]
    pub session: Session,
    pub statistics: TableStatistics,
    pub records: Vec<TopicRecord>,
}

#[derive(Serialize)]
pub struct HierarchyResponse {
    pub tree: HierarchyNode,
    pub text: String,
}

#[derive(Serialize)]
pub struct UploadResponse {
    pub filename: String,
    #[serde(flatten)]
    pub receipt: UploadReceipt,
}

/// POST /api/v1/topic-maps
pub async fn handle_create(
    State(state): State<AppState>,
    Json(req): Json<GenerationRequest>,
) -> Result<(StatusCode, Json<TopicMapResponse>), AppError> {
    let generated = run_generation(
        state.search.as_ref(),
        state.generator.as_ref(),
        &req,
        state.config.research_delay,
    )
    .await?;

    let mut session = Session::new(req.topic.trim());
    session.load(generated.records)?;
    session.research = Some(generated.research);
    session.sources = generated.sources;
    let id = state.sessions.insert(session.clone()).await;
    info!("Created topic map session {id} for '{}'", session.topic);

    Ok((
        StatusCode::CREATED,
        Json(topic_map_response(session, &TopicFilter::default())?),
    ))
}

/// POST /api/v1/topic-maps/:session_id/generate
///
/// Replaces the session's table; on any failure the previous table stays.
pub async fn handle_regenerate(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(req): Json<GenerationRequest>,
) -> Result<Json<TopicMapResponse>, AppError> {
    find_session(&state, session_id).await?;

    let generated = run_generation(
        state.search.as_ref(),
        state.generator.as_ref(),
        &req,
        state.config.research_delay,
    )
    .await?;

    let session = state
        .sessions
        .update(session_id, |session| {
            session.load(generated.records)?;
            session.topic = req.topic.trim().to_string();
            session.research = Some(generated.research);
            session.sources = generated.sources;
            Ok::<_, AppError>(session.clone())
        })
        .await
        .ok_or_else(|| session_not_found(session_id))??;
    info!("Regenerated topic map session {session_id}");

    Ok(Json(topic_map_response(session, &TopicFilter::default())?))
}

/// GET /api/v1/topic-maps/:session_id
///
/// `level`, `intent` and `content_type` may repeat to select several values.
pub async fn handle_get(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Json<TopicMapResponse>, AppError> {
    let filter = TopicFilter::from_query_pairs(&params)
        .map_err(|e| AppError::BadRequest(e.to_string()))?;
    let session = find_session(&state, session_id).await?;
    Ok(Json(topic_map_response(session, &filter)?))
}

/// GET /api/v1/topic-maps/:session_id/stats
pub async fn handle_stats(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<TableStatistics>, AppError> {
    let session = find_session(&state, session_id).await?;
    Ok(Json(loaded_table(&session)?.statistics()))
}

/// GET /api/v1/topic-maps/:session_id/hierarchy
pub async fn handle_hierarchy(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<HierarchyResponse>, AppError> {
    let session = find_session(&state, session_id).await?;
    let tree = build_hierarchy(loaded_table(&session)?).ok_or_else(|| {
        AppError::NotFound(format!("session {session_id} has an empty topic map"))
    })?;
    let text = render_hierarchy(&tree);
    Ok(Json(HierarchyResponse { tree, text }))
}

/// GET /api/v1/topic-maps/:session_id/export?format=csv|tsv
pub async fn handle_export(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Query(query): Query<FormatQuery>,
) -> Result<impl IntoResponse, AppError> {
    let session = find_session(&state, session_id).await?;
    let (filename, body) = export(&session, query.format)?;
    Ok((
        [
            (header::CONTENT_TYPE, query.format.mime_type().to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        body,
    ))
}

/// POST /api/v1/topic-maps/:session_id/import?format=csv|tsv
///
/// The body is delimited text as produced by export.
pub async fn handle_import(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Query(query): Query<FormatQuery>,
    body: String,
) -> Result<Json<TopicMapResponse>, AppError> {
    let records = from_delimited_text(&body, query.format)?;
    let session = state
        .sessions
        .update(session_id, |session| {
            session.load(records)?;
            Ok::<_, AppError>(session.clone())
        })
        .await
        .ok_or_else(|| session_not_found(session_id))??;
    info!(
        "Imported {} records into session {session_id}",
        loaded_table(&session)?.len()
    );

    Ok(Json(topic_map_response(session, &TopicFilter::default())?))
}

/// POST /api/v1/topic-maps/:session_id/upload
pub async fn handle_upload(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(req): Json<UploadRequest>,
) -> Result<Json<UploadResponse>, AppError> {
    let uploader = state.uploader.as_ref().ok_or(AppError::UploadDisabled)?;
    let session = find_session(&state, session_id).await?;
    let (filename, body) = export(&session, req.format)?;

    let receipt = uploader
        .upload(
            req.folder.as_deref().unwrap_or_default(),
            &filename,
            req.format.mime_type(),
            Bytes::from(body),
        )
        .await?;
    Ok(Json(UploadResponse { filename, receipt }))
}

/// DELETE /api/v1/topic-maps/:session_id
pub async fn handle_delete(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if state.sessions.remove(session_id).await {
        info!("Deleted topic map session {session_id}");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(session_not_found(session_id))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Helpers
// ────────────────────────────────────────────────────────────────────────────

fn session_not_found(session_id: Uuid) -> AppError {
    AppError::NotFound(format!("topic map session {session_id} not found"))
}

async fn find_session(state: &AppState, session_id: Uuid) -> Result<Session, AppError> {
    state
        .sessions
        .get(session_id)
        .await
        .ok_or_else(|| session_not_found(session_id))
}

fn loaded_table(session: &Session) -> Result<&TopicTable, AppError> {
    session.table().ok_or_else(|| {
        AppError::NotFound(format!("session {} has no topic map loaded", session.id))
    })
}

fn export(session: &Session, format: Delimiter) -> Result<(String, String), AppError> {
    let body = loaded_table(session)?.to_delimited_text(format);
    let filename = export_filename(&session.topic, format, Utc::now().date_naive());
    Ok((filename, body))
}

fn topic_map_response(
    session: Session,
    filter: &TopicFilter,
) -> Result<TopicMapResponse, AppError> {
    let table = loaded_table(&session)?;
    let statistics = table.statistics();
    let records = table.filter(filter).into_iter().cloned().collect();
    Ok(TopicMapResponse {
        session,
        statistics,
        records,
    })
}
