use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use uiproxy::host::build_demo;
use uiproxy::{Config, GenericHandler, ProxyServer};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // Load environment
    dotenvy::dotenv().ok();
    let config = Config::from_env();

    // Demo tree driven by the generic handler
    let app = build_demo();
    let handler = GenericHandler::with_root(app.window.clone())
        .with_event_pump(Arc::new(app.host.clone()));

    let mut server = ProxyServer::new(config).with_handler(handler).start().await?;
    tracing::info!("uiproxy serving the demo window on port {}", server.port());

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutting down");
    server.stop().await;
    Ok(())
}
