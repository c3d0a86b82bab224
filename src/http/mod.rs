//! HTTP API for the transcription pipeline:
//! - POST /entries - create a bare log entry
//! - POST /entries/:entry_id/recordings - upload audio and dispatch transcription
//! - GET  /entries/:entry_id/recordings/:recording_id/transcription - poll status
//! - POST /entries/:entry_id/recordings/:recording_id/transcription - retry inline
//! - POST /entries/:entry_id/recordings/:recording_id/improve - post-process transcript
//! - GET  /queue/failures - permanently failed jobs
//! - GET  /health - health check

mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::AppState;
