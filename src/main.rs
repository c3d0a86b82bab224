use anyhow::Result;
use clap::Parser;
use logbook_transcribe::{
    create_router, AppState, AudioParams, AudioStorage, ChatGenerativeBackend, Config,
    HttpSpeechBackend, JobQueue, MemoryEntryStore, TranscriptionQueue, TranscriptionService,
};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Parser)]
#[command(name = "logbook-transcribe", about = "Clinical logbook transcription service")]
struct Args {
    /// Path to the configuration file (without extension)
    #[arg(long, default_value = "config/logbook-transcribe")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args = Args::parse();
    let cfg = Config::load(&args.config)?;

    info!("{} v{}", cfg.service.name, env!("CARGO_PKG_VERSION"));
    info!(
        "HTTP server will bind to {}:{}",
        cfg.service.http.bind, cfg.service.http.port
    );
    info!("Audio storage path: {}", cfg.storage.audio_path);

    let store = Arc::new(MemoryEntryStore::new());
    let storage = AudioStorage::new(&cfg.storage.audio_path);
    let speech = Arc::new(HttpSpeechBackend::new(
        cfg.speech.endpoint.as_str(),
        cfg.speech.api_key.as_str(),
    ));
    let generative = Arc::new(ChatGenerativeBackend::new(
        cfg.llm.endpoint.as_str(),
        cfg.llm.api_key.as_str(),
        cfg.llm.model.as_str(),
    ));
    let audio_params = AudioParams {
        encoding: cfg.speech.encoding.clone(),
        sample_rate: cfg.speech.sample_rate,
        language_code: cfg.speech.language_code.clone(),
    };

    // A configured-but-unreachable broker degrades to queue-disabled mode
    // for the process lifetime; it never prevents startup.
    let mut queue = match &cfg.queue {
        Some(qc) => match TranscriptionQueue::connect(&qc.url, qc.connect_attempts).await {
            Ok(q) => Some(Arc::new(q)),
            Err(e) => {
                warn!("Job queue unavailable, running without it: {:#}", e);
                None
            }
        },
        None => {
            info!("No job queue configured; transcription runs inline");
            None
        }
    };

    let mut subscriber = None;
    if let Some(q) = &queue {
        match q.subscribe().await {
            Ok(s) => subscriber = Some(s),
            Err(e) => {
                warn!("Job queue subscription failed, running without it: {:#}", e);
                queue = None;
            }
        }
    }

    let service = Arc::new(TranscriptionService::new(
        store,
        storage,
        speech,
        generative,
        audio_params,
        queue.clone().map(|q| q as Arc<dyn JobQueue>),
    ));

    if let Some(sub) = subscriber {
        tokio::spawn(Arc::clone(&service).run_queue_consumer(sub));
    }

    let app = create_router(AppState::new(Arc::clone(&service)));
    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("HTTP server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Drain the queue connection so in-flight publishes are not dropped.
    if let Some(q) = &queue {
        q.close().await?;
    }

    info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    info!("Shutdown signal received");
}
