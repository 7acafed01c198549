//! Research Digest
//!
//! Run with: cargo run -p digest-app -- --config research-digest.toml

mod cli;

use clap::Parser;
use digest_common::DigestConfig;
use digest_db::DigestStore;
use digest_ingestion::DigestPipeline;
use digest_web::{build_router, AppState};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::cli::Args;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialise structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("research_digest=debug,digest_ingestion=debug,info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config_path = DigestConfig::resolve_path(args.config.as_deref());
    let config = DigestConfig::load(&config_path)?;
    info!("Configuration loaded: {} topics, {} feeds, max {} papers/week",
        config.topics.len(), config.rss_feeds.len(), config.max_papers_per_week);

    let store = DigestStore::open(&args.db)?;
    let pipeline = DigestPipeline::with_live_sources(config, store)?;
    let state = AppState::new(pipeline)?;

    if args.once_json {
        let posts = state.ensure_digest(args.refresh_on_start).await?;
        println!("{}", serde_json::to_string_pretty(&posts)?);
        return Ok(());
    }

    info!("🔬 Research Digest starting up...");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    // Warm up so the first page load already has papers when possible
    match state.ensure_digest(args.refresh_on_start).await {
        Ok(posts) => info!("✅ Issue {} ready with {} posts", state.current_week(), posts.len()),
        Err(e)    => error!("Warm-up generation failed: {e:#}"),
    }

    let router = build_router(state);
    let bind_addr = args.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("🌐 Research Digest running at http://{}", bind_addr);
    info!("   JSON API: http://{}/digest.json", bind_addr);
    info!("   Archive:  http://{}/archive", bind_addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Research Digest stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Received Ctrl+C, shutting down"),
        Err(e) => {
            warn!("Could not listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
    }
}
