use anyhow::{Context, Result};
use clap::Parser;
use quiz_link::{
    create_router, AppState, Config, DetectionClient, DetectionUpdate, LineRecognizer,
    RecognitionController,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Voice answers and person-detection triggers for the maru/batsu quiz
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Config file (extension optional)
    #[arg(short, long, default_value = "config/quiz-link")]
    config: String,

    /// Override the detection service address
    #[arg(long)]
    url: Option<String>,

    /// Do not start voice input on launch
    #[arg(long)]
    no_voice: bool,

    /// How long voice input stays paused after an answer
    #[arg(long, default_value_t = 2000)]
    feedback_ms: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let mut cfg = Config::load(&args.config)?;
    if let Some(url) = args.url {
        cfg.detection.url = url;
    }

    info!("{} v{}", cfg.service.name, env!("CARGO_PKG_VERSION"));
    info!("Detection service: {}", cfg.detection.url);

    let (detection, mut updates) = DetectionClient::new(cfg.detection_config())?;
    let detection = Arc::new(detection);
    detection.connect().await;

    let recognizer = LineRecognizer::stdin(cfg.silence_timeout());
    let (recognition, mut intents) =
        RecognitionController::new(Box::new(recognizer), cfg.recognition_config())?;
    let recognition = Arc::new(recognition);
    if !args.no_voice {
        info!("Say (type) まる or ばつ");
        recognition.start().await;
    }

    let app = create_router(AppState::new(Arc::clone(&recognition), Arc::clone(&detection)));
    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind HTTP server to {}", addr))?;
    info!("HTTP API listening on {}", addr);

    let server = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            warn!("HTTP server stopped: {}", e);
        }
    });

    let feedback = Duration::from_millis(args.feedback_ms);

    loop {
        tokio::select! {
            Some(intent) = intents.recv() => {
                let Some(correct) = intent.answer() else {
                    continue;
                };
                info!("Answer: {}", if correct { "まる" } else { "ばつ" });

                // Pause voice input while the feedback is on screen
                let recognition = Arc::clone(&recognition);
                tokio::spawn(async move {
                    recognition.stop().await;
                    tokio::time::sleep(feedback).await;
                    recognition.start().await;
                });
            }
            Some(update) = updates.recv() => match update {
                DetectionUpdate::ConnectionStatus(true) => info!("Detection service connected"),
                DetectionUpdate::ConnectionStatus(false) => warn!("Detection service disconnected"),
                DetectionUpdate::PersonDetected(count) => info!("{} detected", count),
                DetectionUpdate::PlayAudio => info!("Play quiz audio"),
            },
            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down");
                break;
            }
        }
    }

    recognition.shutdown().await;
    detection.shutdown().await;
    server.abort();

    Ok(())
}
