//! # Ripple Server
//!
//! Main binary that runs both Ripple services in one process:
//! - REST API (auth, profiles, conversation/message history, presence)
//! - WebSocket Gateway (live presence, message relay, call signaling)
//!
//! The two share a single connection registry and a message-archive channel:
//! the gateway relays live copies and enqueues each message here, where a
//! writer task persists it without the relay ever waiting on the database.

use clap::Parser;
use ripple_api::AppState;
use ripple_db::{Database, repository::messages};
use ripple_gateway::{ConnectionRegistry, GatewayOptions, GatewayState, MessageRecord};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::mpsc;

#[derive(Debug, Parser)]
#[command(name = "ripple", about = "Ripple chat & signaling server")]
struct Cli {
    /// Run pending database migrations and exit.
    #[arg(long)]
    migrate_only: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = ripple_common::config::init()?;

    // Initialize tracing (structured logging)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ripple=debug,tower_http=debug".into()),
        )
        .with_target(true)
        .init();

    tracing::info!("Starting Ripple v{}", env!("CARGO_PKG_VERSION"));

    // Connect to databases and run migrations
    let db = Database::connect(config).await?;
    db.migrate().await?;

    if cli.migrate_only {
        tracing::info!("Migrations applied, exiting (--migrate-only)");
        return Ok(());
    }

    // === Shared presence registry ===
    // Owned here, handed to both the gateway (its source of truth) and the
    // API (REST presence queries).
    let registry = Arc::new(ConnectionRegistry::new());

    // === Message archive channel ===
    // The gateway's sendMessage path enqueues; this task persists. The relay
    // never waits on a write.
    let (archive_tx, archive_rx) = mpsc::channel(config.gateway.archive_buffer);
    tokio::spawn(archive_writer(db.clone(), archive_rx));

    // === REST API Server ===
    let api_router = ripple_api::build_router(AppState {
        db: db.clone(),
        registry: registry.clone(),
    });
    let api_addr = SocketAddr::new(config.server.host.parse()?, config.server.port);

    // === WebSocket Gateway ===
    let gateway_state =
        GatewayState::new(registry, archive_tx, GatewayOptions::from_config(config));
    let gateway_router = ripple_gateway::build_router(gateway_state);
    let gateway_addr = SocketAddr::new(config.server.host.parse()?, config.server.gateway_port);

    tracing::info!("REST API listening on http://{api_addr}");
    tracing::info!("Gateway listening on ws://{gateway_addr}");

    // Run both servers concurrently
    tokio::try_join!(
        async {
            let listener = tokio::net::TcpListener::bind(api_addr).await?;
            axum::serve(listener, api_router).await?;
            Ok::<_, anyhow::Error>(())
        },
        async {
            let listener = tokio::net::TcpListener::bind(gateway_addr).await?;
            axum::serve(listener, gateway_router).await?;
            Ok::<_, anyhow::Error>(())
        },
    )?;

    Ok(())
}

/// Drain the gateway's archive channel into the messages table.
///
/// Records carry client-supplied IDs as strings; anything that doesn't parse
/// or doesn't reference a real conversation is dropped with a log line — the
/// live relay already happened and has no error surface to report into.
async fn archive_writer(db: Database, mut rx: mpsc::Receiver<MessageRecord>) {
    while let Some(record) = rx.recv().await {
        let (Ok(conversation_id), Ok(sender_id)) = (
            record.conversation_id.parse::<uuid::Uuid>(),
            record.sender_id.parse::<uuid::Uuid>(),
        ) else {
            tracing::debug!(
                conversation = %record.conversation_id,
                sender = %record.sender_id,
                "Discarding message with unparseable IDs"
            );
            continue;
        };

        if let Err(e) = messages::append_message(
            &db.pool,
            ripple_common::id::generate_id(),
            conversation_id,
            sender_id,
            &record.text,
        )
        .await
        {
            tracing::warn!(
                conversation = %conversation_id,
                sender = %sender_id,
                "Failed to archive relayed message: {e}"
            );
        }
    }
}
