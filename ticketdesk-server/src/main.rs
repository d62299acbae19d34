use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::{info, Level};

use ticketdesk_server::config::Config;
use ticketdesk_server::ingress::event_router;
use ticketdesk_server::platform::DiscordClient;
use ticketdesk_server::{AppState, Dispatcher};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    info!("Starting ticket desk");

    let config = Config::from_env().context("Failed to load configuration")?;
    let port = config.port;

    info!(
        "Serving guild {}, posting applications to channel {}",
        config.guild_id, config.review_channel
    );
    if config.assignable_roles.is_empty() {
        info!("No assignable roles configured; applications can only be denied");
    }

    let mut platform = DiscordClient::new(config.discord_token.clone(), config.guild_id);
    if let Some(base_url) = &config.discord_api_base {
        info!("Using platform API at {}", base_url);
        platform = platform.with_base_url(base_url.clone());
    }
    let platform = Arc::new(platform);
    let app_state = Arc::new(AppState::new(config, platform));
    let dispatcher = Arc::new(Dispatcher::new(app_state));

    let app = event_router(dispatcher)
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()));

    let listener = TcpListener::bind(format!("0.0.0.0:{}", port))
        .await
        .with_context(|| format!("Failed to bind port {}", port))?;
    info!("Server listening on port {}", port);

    axum::serve(listener, app).await?;

    Ok(())
}
