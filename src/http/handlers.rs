use super::state::AppState;
use crate::store::StoreError;
use crate::transcribe::{DispatchOutcome, TranscribeError};
use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use tracing::{error, info};
use uuid::Uuid;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateEntryRequest {
    /// Tenant that owns the entry. Supplied by the auth layer upstream;
    /// trusted as-is here.
    pub client_id: String,

    pub title: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CreateEntryResponse {
    pub entry_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct UploadRecordingResponse {
    pub recording_id: Uuid,
    pub dispatch: DispatchOutcome,
}

#[derive(Debug, Serialize)]
pub struct TranscriptResponse {
    pub transcript: String,
}

#[derive(Debug, Serialize)]
pub struct ImprovedTranscriptResponse {
    pub improved_transcript: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Map a pipeline error to a status code plus the standard JSON error
/// body. The original message is preserved for diagnosis.
fn error_response(e: TranscribeError) -> Response {
    let status = match &e {
        TranscribeError::Store(StoreError::EntryNotFound(_))
        | TranscribeError::Store(StoreError::RecordingNotFound { .. }) => StatusCode::NOT_FOUND,
        TranscribeError::Store(StoreError::AlreadyInProgress(_)) => StatusCode::CONFLICT,
        TranscribeError::TranscriptRequired => StatusCode::UNPROCESSABLE_ENTITY,
        TranscribeError::AudioUnreadable(_) | TranscribeError::Backend(_) => {
            StatusCode::BAD_GATEWAY
        }
        TranscribeError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    (
        status,
        Json(ErrorResponse {
            error: e.to_string(),
        }),
    )
        .into_response()
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /entries
/// Create a bare log entry to attach recordings to
pub async fn create_entry(
    State(state): State<AppState>,
    Json(req): Json<CreateEntryRequest>,
) -> impl IntoResponse {
    match state.service.create_entry(req.client_id, req.title).await {
        Ok(entry) => {
            info!("Created log entry {}", entry.id);
            (StatusCode::CREATED, Json(CreateEntryResponse { entry_id: entry.id }))
                .into_response()
        }
        Err(e) => {
            error!("Failed to create entry: {}", e);
            error_response(e)
        }
    }
}

/// POST /entries/:entry_id/recordings
/// Upload an audio recording and dispatch transcription
pub async fn upload_recording(
    State(state): State<AppState>,
    Path(entry_id): Path<Uuid>,
    mut multipart: Multipart,
) -> impl IntoResponse {
    let mut file: Option<(String, Vec<u8>)> = None;
    let mut duration_seconds: Option<f64> = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(ErrorResponse {
                        error: format!("Malformed multipart body: {}", e),
                    }),
                )
                    .into_response();
            }
        };

        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let filename = field
                    .file_name()
                    .unwrap_or("recording")
                    .to_string();
                match field.bytes().await {
                    Ok(bytes) => file = Some((filename, bytes.to_vec())),
                    Err(e) => {
                        return (
                            StatusCode::BAD_REQUEST,
                            Json(ErrorResponse {
                                error: format!("Failed to read audio upload: {}", e),
                            }),
                        )
                            .into_response();
                    }
                }
            }
            "duration_seconds" => {
                duration_seconds = field
                    .text()
                    .await
                    .ok()
                    .and_then(|t| t.parse::<f64>().ok());
            }
            _ => {}
        }
    }

    let Some((filename, bytes)) = file else {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "Missing 'file' field in multipart upload".to_string(),
            }),
        )
            .into_response();
    };

    info!(
        "Uploading recording '{}' ({} bytes) to entry {}",
        filename,
        bytes.len(),
        entry_id
    );

    match state
        .service
        .ingest_recording(entry_id, &filename, &bytes, duration_seconds)
        .await
    {
        Ok((recording_id, dispatch)) => (
            StatusCode::ACCEPTED,
            Json(UploadRecordingResponse {
                recording_id,
                dispatch,
            }),
        )
            .into_response(),
        Err(e) => {
            error!("Failed to ingest recording: {}", e);
            error_response(e)
        }
    }
}

/// GET /entries/:entry_id/recordings/:recording_id/transcription
/// Poll the transcription state of one recording
pub async fn get_transcription_status(
    State(state): State<AppState>,
    Path((entry_id, recording_id)): Path<(Uuid, Uuid)>,
) -> impl IntoResponse {
    match state.service.get_status(entry_id, recording_id).await {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(e) => error_response(e),
    }
}

/// POST /entries/:entry_id/recordings/:recording_id/transcription
/// Re-request transcription; runs inline and returns the direct outcome
pub async fn request_transcription(
    State(state): State<AppState>,
    Path((entry_id, recording_id)): Path<(Uuid, Uuid)>,
) -> impl IntoResponse {
    match state
        .service
        .request_transcription(entry_id, recording_id)
        .await
    {
        Ok(transcript) => {
            (StatusCode::OK, Json(TranscriptResponse { transcript })).into_response()
        }
        Err(e) => {
            error!(
                "Transcription retry failed for recording {}: {}",
                recording_id, e
            );
            error_response(e)
        }
    }
}

/// POST /entries/:entry_id/recordings/:recording_id/improve
/// Restructure a completed transcript via the generative backend
pub async fn improve_transcript(
    State(state): State<AppState>,
    Path((entry_id, recording_id)): Path<(Uuid, Uuid)>,
) -> impl IntoResponse {
    match state.service.improve_transcript(entry_id, recording_id).await {
        Ok(improved_transcript) => (
            StatusCode::OK,
            Json(ImprovedTranscriptResponse {
                improved_transcript,
            }),
        )
            .into_response(),
        Err(e) => {
            error!(
                "Transcript improvement failed for recording {}: {}",
                recording_id, e
            );
            error_response(e)
        }
    }
}

/// GET /queue/failures
/// Permanently failed transcription jobs retained for diagnosis
pub async fn queue_failures(State(state): State<AppState>) -> impl IntoResponse {
    let failures = state.service.failed_jobs().await;
    (StatusCode::OK, Json(failures)).into_response()
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
