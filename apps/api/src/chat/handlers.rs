//! Axum route handlers for the Chat API.

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::chat::prompts::{SCANNED_PDF_WARNING, WELCOME_MESSAGE};
use crate::chat::store::SharedSession;
use crate::chat::Role;
use crate::errors::AppError;
use crate::pdf;
use crate::state::AppState;

/// Multipart field carrying the uploaded resume.
const UPLOAD_FIELD: &str = "file";

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct CreateSessionResponse {
    pub session_id: Uuid,
    pub welcome_message: &'static str,
    pub model: String,
}

#[derive(Debug, Serialize)]
pub struct DisplayMessage {
    pub role: Role,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct SessionView {
    pub session_id: Uuid,
    pub messages: Vec<DisplayMessage>,
    pub message_count: usize,
    pub total_tokens_used: u64,
    pub resume_pending: bool,
    pub awaiting_reply: bool,
    pub welcome_message: &'static str,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ReplyResponse {
    pub reply: String,
    pub message_count: usize,
}

#[derive(Debug, Serialize)]
pub struct ResumeUploadResponse {
    pub extracted: bool,
    pub characters: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<&'static str>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

fn find_session(state: &AppState, id: Uuid) -> Result<SharedSession, AppError> {
    state
        .sessions
        .get(id)
        .ok_or_else(|| AppError::NotFound(format!("Session {id} not found")))
}

/// POST /api/v1/sessions
pub async fn handle_create_session(
    State(state): State<AppState>,
) -> (StatusCode, Json<CreateSessionResponse>) {
    let session_id = state.sessions.create(&state.settings);
    (
        StatusCode::CREATED,
        Json(CreateSessionResponse {
            session_id,
            welcome_message: WELCOME_MESSAGE,
            model: state.llm.model_name().to_string(),
        }),
    )
}

/// GET /api/v1/sessions/:id
///
/// Conversation for display. The system turn is not shown.
pub async fn handle_get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    let session = find_session(&state, id)?;
    let session = session.lock().await;
    let memory = session.memory();

    let messages = memory
        .messages()
        .iter()
        .map(|turn| DisplayMessage {
            role: turn.role(),
            content: turn.text().to_string(),
            created_at: turn.created_at(),
        })
        .collect();

    Ok(Json(SessionView {
        session_id: id,
        messages,
        message_count: memory.message_count(),
        total_tokens_used: session.total_tokens_used(),
        resume_pending: session.has_pending_resume(),
        awaiting_reply: memory.awaiting_reply(),
        welcome_message: WELCOME_MESSAGE,
        created_at: session.created_at(),
    }))
}

/// POST /api/v1/sessions/:id/messages
///
/// On a model failure the user's message stays in the conversation and the
/// error is returned; the client can call `/retry`.
pub async fn handle_send_message(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<SendMessageRequest>,
) -> Result<Json<ReplyResponse>, AppError> {
    let session = find_session(&state, id)?;
    let mut session = session.lock().await;

    let reply = session
        .send(state.llm.as_ref(), &state.settings, &request.message)
        .await?;

    Ok(Json(ReplyResponse {
        reply,
        message_count: session.memory().message_count(),
    }))
}

/// POST /api/v1/sessions/:id/retry
pub async fn handle_retry(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ReplyResponse>, AppError> {
    let session = find_session(&state, id)?;
    let mut session = session.lock().await;

    let reply = session.retry(state.llm.as_ref(), &state.settings).await?;

    Ok(Json(ReplyResponse {
        reply,
        message_count: session.memory().message_count(),
    }))
}

/// POST /api/v1/sessions/:id/resume
///
/// Accepts a multipart PDF upload, extracts its text and holds it for the next message.
/// A rejected document leaves the session untouched. A document with no text
/// layer drops any resume still pending from an earlier upload.
pub async fn handle_upload_resume(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<Json<ResumeUploadResponse>, AppError> {
    let session = find_session(&state, id)?;

    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Malformed upload: {e}")))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let filename = field.file_name().unwrap_or("resume.pdf").to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Failed to read upload: {e}")))?;
        upload = Some((filename, bytes));
        break;
    }

    let (filename, bytes) = upload.ok_or_else(|| {
        AppError::Validation(format!("Missing '{UPLOAD_FIELD}' field in upload"))
    })?;

    info!(session_id = %id, %filename, bytes = bytes.len(), "Resume upload received");

    let text = tokio::task::spawn_blocking(move || pdf::extract(&bytes))
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("PDF extraction task failed: {e}")))??;

    if text.is_empty() {
        warn!(session_id = %id, %filename, "No text layer found in uploaded PDF");
        session.lock().await.clear_resume();
        return Ok(Json(ResumeUploadResponse {
            extracted: false,
            characters: 0,
            warning: Some(SCANNED_PDF_WARNING),
        }));
    }

    let characters = text.chars().count();
    session.lock().await.attach_resume(text);

    Ok(Json(ResumeUploadResponse {
        extracted: true,
        characters,
        warning: None,
    }))
}

/// POST /api/v1/sessions/:id/reset
pub async fn handle_reset_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let session = find_session(&state, id)?;
    session.lock().await.reset();
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/v1/sessions/:id
pub async fn handle_delete_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if state.sessions.remove(id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!("Session {id} not found")))
    }
}
