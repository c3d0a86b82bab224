use super::handlers;
use super::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Entry + upload plumbing
        .route("/entries", post(handlers::create_entry))
        .route(
            "/entries/:entry_id/recordings",
            post(handlers::upload_recording),
        )
        // Transcription status + retry
        .route(
            "/entries/:entry_id/recordings/:recording_id/transcription",
            get(handlers::get_transcription_status)
                .post(handlers::request_transcription),
        )
        // Transcript post-processing
        .route(
            "/entries/:entry_id/recordings/:recording_id/improve",
            post(handlers::improve_transcript),
        )
        // Queue introspection
        .route("/queue/failures", get(handlers::queue_failures))
        // Add tracing middleware for request logging
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
