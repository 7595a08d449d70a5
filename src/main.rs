use anyhow::Context;
use clap::Parser;
use img_captions::{
    logger, server, CaptionService, Captioner, Config, DistilVitCaptioner, ModelCell,
    ModelSettings,
};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    let config = Config::parse();
    logger::init_logger(config.verbose);
    config.validate()?;
    tracing::debug!("Config: {:?}", config);

    let settings = ModelSettings::from(&config);
    let model = ModelCell::new(move || {
        DistilVitCaptioner::load(&settings).map(|c| Arc::new(c) as Arc<dyn Captioner>)
    });

    if config.preload {
        model.get().await.context("model preload failed")?;
    }

    let service = Arc::new(CaptionService::new(&config, model)?);
    let app = server::router(service);

    let addr = config.bind_addr()?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    tracing::info!("🚀 Server running on http://{}", addr);
    tracing::info!("📸 Open in your browser to start captioning!");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("👋 Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
