//! Axum API server binary.
//!
//! Serves the HTTP API and runs the processing executor in the same process.

use std::net::SocketAddr;
use std::sync::Arc;

use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use reel_api::{create_router, metrics, AppConfig, AppState};
use reel_db::{init_pool, run_migrations, VideoRepository};
use reel_media::FfmpegInspector;
use reel_queue::JobQueue;
use reel_storage::S3BlobClient;
use reel_worker::{JobExecutor, ProcessingContext};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // Required by rustls 0.23+; a second install is harmless
    let _ = rustls::crypto::ring::default_provider().install_default();

    init_tracing();

    info!("Starting reel-api");

    if let Err(e) = run().await {
        error!("Server failed: {}", e);
        std::process::exit(1);
    }

    info!("Server shutdown complete");
}

fn init_tracing() {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("reel=info,info"));

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::from_env()?;
    info!(
        "API config: host={}, port={}, environment={}",
        config.api.host, config.api.port, config.api.environment
    );

    let metrics_handle = if config.api.metrics_enabled {
        info!("Prometheus metrics enabled at /metrics");
        Some(metrics::init_metrics()?)
    } else {
        None
    };

    let pool = init_pool(&config.database).await?;
    run_migrations(&pool).await?;
    let repo = VideoRepository::new(pool);

    let store = Arc::new(S3BlobClient::new(config.storage.clone()).await?);

    let inspector = FfmpegInspector::new();
    if let Err(e) = inspector.check_available() {
        warn!("Media tools unavailable, processing jobs will fail: {}", e);
    }

    let (queue, receiver) = JobQueue::new(config.queue.clone());

    let ctx = ProcessingContext::new(
        config.worker.clone(),
        store.clone(),
        Arc::new(inspector),
        repo.clone(),
    );
    let executor = Arc::new(JobExecutor::new(ctx));
    let executor_handle = {
        let executor = Arc::clone(&executor);
        tokio::spawn(async move { executor.run(receiver).await })
    };

    let state = AppState::new(&config.api, repo, store, queue);
    let app = create_router(state, metrics_handle);

    let addr: SocketAddr = format!("{}:{}", config.api.host, config.api.port).parse()?;
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // The router (and its queue sender) is gone; stop the executor and let
    // in-flight jobs finish.
    executor.shutdown();
    match executor_handle.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => error!("Job executor failed: {}", e),
        Err(e) => error!("Job executor task panicked: {}", e),
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Received shutdown signal");
}
