//! Conversational endpoints

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{
        DefaultBodyLimit, Multipart, State,
        multipart::MultipartRejection,
        rejection::JsonRejection,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
};
use serde::{Deserialize, Serialize};

use super::{ApiError, ApiState};
use crate::companion::{ReplyKind, Turn};
use crate::emotion::Emotion;
use crate::voice::{AudioBlob, encode_audio};

/// Largest accepted upload (10 MiB)
pub const MAX_AUDIO_BYTES: usize = 10 * 1024 * 1024;

/// Multipart field carrying the recording
const AUDIO_FIELD: &str = "audio";

/// Build chat router
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/chat_ai", post(chat_ai))
        .route("/chat_text", post(chat_text))
        .layer(DefaultBodyLimit::max(MAX_AUDIO_BYTES))
        .with_state(state)
}

/// Reply to one turn
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    /// Reply text, also what `audio` speaks
    pub text: String,
    /// What was heard; absent when transcription failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcript: Option<String>,
    pub emotion: Emotion,
    pub kind: ReplyKind,
    /// Base64 MP3
    pub audio: String,
}

/// Body returned when no audio could be produced for the reply
#[derive(Debug, Serialize)]
pub struct UnspokenResponse {
    pub error: String,
    pub text: String,
    pub kind: ReplyKind,
}

/// Typed message request
#[derive(Debug, Deserialize)]
pub struct ChatTextRequest {
    pub text: String,
}

/// Run a voice turn from a multipart upload
async fn chat_ai(
    State(state): State<Arc<ApiState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, ApiError> {
    let audio = read_audio(multipart?).await?;
    let turn = state.companion.respond_to_audio(&audio).await;
    Ok(turn_response(turn))
}

/// Run a turn from typed text
async fn chat_text(
    State(state): State<Arc<ApiState>>,
    request: Result<Json<ChatTextRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = request?;
    let turn = state.companion.respond_to_text(&request.text).await;
    Ok(turn_response(turn))
}

async fn read_audio(mut multipart: Multipart) -> Result<AudioBlob, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("invalid multipart body: {e}")))?
    {
        if field.name() != Some(AUDIO_FIELD) {
            continue;
        }
        let content_type = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(format!("failed to read audio: {e}")))?;
        return Ok(AudioBlob::new(bytes.to_vec(), content_type));
    }

    Err(ApiError::BadRequest(format!("missing '{AUDIO_FIELD}' field")))
}

fn turn_response(turn: Turn) -> Response {
    let Some(audio) = turn.audio else {
        return (
            StatusCode::BAD_GATEWAY,
            Json(UnspokenResponse {
                error: "speech synthesis unavailable".to_string(),
                text: turn.reply,
                kind: turn.kind,
            }),
        )
            .into_response();
    };

    Json(ChatResponse {
        text: turn.reply,
        transcript: turn.transcript.map(|t| t.as_str().to_string()),
        emotion: turn.emotion,
        kind: turn.kind,
        audio: encode_audio(&audio),
    })
    .into_response()
}
