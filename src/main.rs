use anyhow::Context;
use clap::Parser;
use log::{error, info, warn};
use std::path::PathBuf;
use std::sync::Arc;

use voice_changer::config::AppConfig;
use voice_changer::routes::{router, AppState};
use voice_changer::services::toolkit::SvcCli;
use voice_changer::services::tts::GoogleTts;
use voice_changer::utils;

/// Voice model training and conversion server
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// JSON config file
    #[arg(long, env = "VOICE_CHANGER_CONFIG")]
    config: Option<PathBuf>,

    #[arg(long)]
    host: Option<String>,

    #[arg(long)]
    port: Option<u16>,

    /// Directory holding files/, trainmodel/ and audio_data/
    #[arg(long)]
    base_dir: Option<PathBuf>,

    /// Worker pool size
    #[arg(long)]
    workers: Option<usize>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Инициализируем логгер с тонкой настройкой
    utils::logger::init_logger();

    let args = Args::parse();

    // CLI flags override the config file and the environment
    let mut config = AppConfig::load(args.config.as_deref())?;
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(base_dir) = args.base_dir {
        config.storage.base_dir = base_dir;
    }
    if let Some(workers) = args.workers {
        config.server.workers = workers;
    }

    config
        .storage
        .ensure_dirs()
        .with_context(|| format!("Failed to prepare {}", config.storage.base_dir.display()))?;
    info!("Storage directory: {}", config.storage.base_dir.display());

    let toolkit_config = config.toolkit.clone();
    match tokio::task::spawn_blocking(move || utils::tools::init_tools(&toolkit_config)).await {
        Ok(Ok(tools)) => info!("{} external tool(s) available", tools.len()),
        Ok(Err(e)) => warn!("Failed to initialize tools: {}", e),
        Err(e) => error!("Tool discovery panicked: {}", e),
    }

    let toolkit = Arc::new(SvcCli::new(&config.toolkit));
    let tts = Arc::new(GoogleTts::new(config.tts.clone())?);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let workers = config.server.workers;
    let app = router(AppState::new(config, toolkit, tts));

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("Server listening on http://{} ({} workers)", addr, workers);
    info!("Endpoints:");
    info!("  POST   /text-to-speech/                 - JSON text -> WAV");
    info!("  POST   /text-file-to-speech/            - .txt/.docx -> WAV");
    info!("  POST   /text-to-speech-and-infer/       - JSON text -> converted WAV");
    info!("  POST   /text-file-to-speech-and-infer/  - .txt/.docx -> converted WAV");
    info!("  POST   /infer-audio/                    - recording -> converted WAV");
    info!("  POST   /train-model/                    - train from one recording");
    info!("  POST   /train-model-file-zip/           - train from a dataset zip");
    info!("  GET    /models                          - trained models");
    info!("  DELETE /models/{{model_id}}               - delete a model");
    info!("  DELETE /models/{{model_id}}/cleanup       - drop intermediate data");
    info!("  GET    /health                          - health check");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}
