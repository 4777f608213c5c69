//! Session endpoints: upload, chat, actions and per-message output

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{ApiError, ApiState, SharedSession};
use crate::Error;
use crate::chat::{self, ChatAction, ChatOutcome};
use crate::completion::CompletionClient;
use crate::export::{ExportFormat, export};
use crate::extract::extract_upload;
use crate::session::{SessionState, Turn};
use crate::voice::synthesize_chunked;

/// Largest accepted upload
const MAX_UPLOAD_BYTES: usize = 32 * 1024 * 1024;

/// Build sessions router
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/", post(create_session))
        .route("/{id}", get(get_session).delete(end_session))
        .route(
            "/{id}/document",
            post(upload_document).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route("/{id}/prompt", post(send_prompt))
        .route("/{id}/actions/{action}", post(run_action))
        .route("/{id}/messages/{index}/export/{format}", get(export_message))
        .route("/{id}/messages/{index}/speech", post(speak_message))
        .route("/{id}/messages/{index}/clipboard", post(copy_message))
        .with_state(state)
}

#[derive(Debug, Serialize)]
pub struct CreatedResponse {
    pub session_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub history: Vec<Turn>,
    pub has_document: bool,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub extracted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub characters: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct PromptRequest {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct ReplyResponse {
    pub reply: String,
    pub history: Vec<Turn>,
}

#[derive(Debug, Serialize)]
pub struct CopiedResponse {
    pub copied: bool,
}

async fn create_session(State(state): State<Arc<ApiState>>) -> (StatusCode, Json<CreatedResponse>) {
    let session_id = state.sessions.create().await;
    (StatusCode::CREATED, Json(CreatedResponse { session_id }))
}

async fn get_session(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<String>,
) -> Result<Json<SessionResponse>, ApiError> {
    let session = lookup(&state, &id).await?;
    let guard = session.lock().await;
    Ok(Json(SessionResponse {
        history: guard.history().to_vec(),
        has_document: guard.has_document(),
    }))
}

async fn end_session(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let uuid = parse_id(&id)?;
    if state.sessions.remove(&uuid).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(Error::SessionNotFound(id).into())
    }
}

/// Extract the multipart `file` field into the session document
///
/// Unsupported types are acknowledged with `extracted: false` and leave the
/// current document in place.
async fn upload_document(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<String>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let session = lookup(&state, &id).await?;

    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("invalid multipart body: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let mime = field.content_type().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(format!("failed to read upload: {e}")))?;
        upload = Some((mime, bytes));
        break;
    }

    let (mime, bytes) =
        upload.ok_or_else(|| ApiError::BadRequest("missing `file` field".to_string()))?;

    let extracted = tokio::task::spawn_blocking(move || extract_upload(&mime, &bytes))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))??;

    let Some(text) = extracted else {
        tracing::debug!(session = %id, "unsupported upload ignored");
        return Ok(Json(UploadResponse {
            extracted: false,
            characters: None,
        }));
    };

    let characters = text.chars().count();
    session.lock().await.set_document(text);
    tracing::info!(session = %id, characters, "document extracted");

    Ok(Json(UploadResponse {
        extracted: true,
        characters: Some(characters),
    }))
}

async fn send_prompt(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<String>,
    Json(request): Json<PromptRequest>,
) -> Result<Json<ReplyResponse>, ApiError> {
    let session = lookup(&state, &id).await?;
    let client = completion_client(&state)?;

    let mut guard = session.lock().await;
    let current = guard.clone();
    let (next, outcome) = chat::send_prompt(current, &request.text, client.as_ref()).await;
    reply(&mut guard, next, outcome)
}

async fn run_action(
    State(state): State<Arc<ApiState>>,
    Path((id, action)): Path<(String, String)>,
) -> Result<Json<ReplyResponse>, ApiError> {
    let session = lookup(&state, &id).await?;
    let action = ChatAction::from_name(&action)
        .ok_or_else(|| ApiError::BadRequest(format!("unknown action: {action}")))?;
    let client = completion_client(&state)?;

    let mut guard = session.lock().await;
    let current = guard.clone();
    let (next, outcome) = chat::run_action(current, action, client.as_ref()).await;
    reply(&mut guard, next, outcome)
}

/// Store the finished exchange and answer with the reply
///
/// The slot is only written once the completion returns, so a dropped
/// request leaves the session as it was.
fn reply(
    slot: &mut SessionState,
    next: SessionState,
    outcome: ChatOutcome,
) -> Result<Json<ReplyResponse>, ApiError> {
    *slot = next;
    let reply = outcome?;
    Ok(Json(ReplyResponse {
        reply,
        history: slot.history().to_vec(),
    }))
}

async fn export_message(
    State(state): State<Arc<ApiState>>,
    Path((id, index, format)): Path<(String, usize, String)>,
) -> Result<Response, ApiError> {
    let format = ExportFormat::from_extension(&format)
        .ok_or_else(|| ApiError::BadRequest(format!("unsupported export format: {format}")))?;
    let content = assistant_message(&state, &id, index).await?;

    let bytes = tokio::task::spawn_blocking(move || export(&content, format))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))??;

    let disposition = HeaderValue::from_str(&format!(
        "attachment; filename=\"{}\"",
        format.file_name()
    ))
    .map_err(|e| ApiError::Internal(e.to_string()))?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, HeaderValue::from_static(format.mime_type())),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response())
}

async fn speak_message(
    State(state): State<Arc<ApiState>>,
    Path((id, index)): Path<(String, usize)>,
) -> Result<Response, ApiError> {
    let synthesizer = state
        .synthesizer
        .clone()
        .ok_or(ApiError::NotConfigured("text-to-speech not configured"))?;
    let content = assistant_message(&state, &id, index).await?;

    let audio =
        synthesize_chunked(synthesizer.as_ref(), &content, state.speech_chunk_size).await?;
    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "audio/mpeg")],
        audio,
    )
        .into_response())
}

async fn copy_message(
    State(state): State<Arc<ApiState>>,
    Path((id, index)): Path<(String, usize)>,
) -> Result<Json<CopiedResponse>, ApiError> {
    let clipboard = state
        .clipboard
        .clone()
        .ok_or(ApiError::NotConfigured("clipboard not available"))?;
    let content = assistant_message(&state, &id, index).await?;

    tokio::task::spawn_blocking(move || clipboard.copy(&content))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))??;
    Ok(Json(CopiedResponse { copied: true }))
}

fn parse_id(id: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(id).map_err(|_| Error::SessionNotFound(id.to_string()).into())
}

async fn lookup(state: &ApiState, id: &str) -> Result<SharedSession, ApiError> {
    let uuid = parse_id(id)?;
    state
        .sessions
        .get(&uuid)
        .await
        .ok_or_else(|| Error::SessionNotFound(id.to_string()).into())
}

async fn assistant_message(state: &ApiState, id: &str, index: usize) -> Result<String, ApiError> {
    let session = lookup(state, id).await?;
    let guard = session.lock().await;
    guard
        .assistant_message(index)
        .map(ToString::to_string)
        .ok_or_else(|| Error::MessageNotFound(index).into())
}

fn completion_client(state: &ApiState) -> Result<Arc<dyn CompletionClient>, ApiError> {
    state
        .completion
        .clone()
        .ok_or(ApiError::NotConfigured("completion endpoint not configured"))
}
