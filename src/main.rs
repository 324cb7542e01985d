//! Live Assist bridge
//!
//! Hands a bot conversation over to a human agent on request and relays
//! messages in both directions until the agent ends the chat.

mod api;
mod config;
mod context_data;
mod gateway;
mod runtime;
mod session_ref;
mod state_machine;
mod transcript;
mod upstream;

use api::{create_router, AppState};
use config::BridgeConfig;
use context_data::ContextDataSigner;
use gateway::{LiveAssistClient, LoggingGateway};
use state_machine::ConvContext;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use upstream::ConnectorClient;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "live_assist_bridge=info,tower_http=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    // Configuration
    let config = BridgeConfig::from_env()?;
    tracing::info!(config = ?config, "Configuration loaded");

    let gateway = LoggingGateway::new(LiveAssistClient::new(&config.live_assist())?);
    let upstream = ConnectorClient::new(config.connector_token.clone(), config.poll_timeout)?;
    let signer = ContextDataSigner::new(&config.context_secret, config.context_data.clone());

    let cancel = CancellationToken::new();
    let (handle, runtime_task) = runtime::spawn(
        ConvContext::new(&config.bot_name, &config.skill),
        gateway,
        upstream,
        Arc::new(signer),
        config.runtime_settings(),
        cancel.clone(),
    );

    let app = create_router(AppState::new(handle));

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Live Assist bridge listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let shutdown = cancel.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => tracing::info!("Shutdown requested"),
                () = shutdown.cancelled() => {}
            }
        })
        .await?;

    cancel.cancel();
    runtime_task.await?;

    Ok(())
}
