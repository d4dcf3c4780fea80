//! Snowball Duel - peer-to-peer engine for a two-player snowball fight
//!
//! Two peers run identical local simulations and keep them visually
//! consistent over a reliable ordered channel, with no central authority.
//! This binary runs one headless peer: it hosts or joins a session over
//! TCP (or plays solo against the scripted opponent) and drives the local
//! player with the bot driver.

mod ai;
mod config;
mod game;
mod net;
mod session;
mod util;

use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::ai::BotDriver;
use crate::config::{Config, SessionMode};
use crate::game::{InputAction, InputFrame};
use crate::net::transport::PeerChannel;
use crate::session::{PeerRole, PeerSession};
use crate::util::time::TICK_DURATION_MICROS;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = Config::from_env()?;

    // Initialize tracing
    init_tracing(&config.log_level);

    info!("Starting Snowball Duel peer");

    let base_seed = config.ai_seed.unwrap_or_else(rand::random);

    let session = match config.mode {
        SessionMode::Host => {
            let channel = PeerChannel::host(config.listen_addr).await?;
            PeerSession::online(channel, PeerRole::Primary, config.ai_level)
        }
        SessionMode::Join => {
            let addr = config
                .remote_addr
                .ok_or_else(|| anyhow::anyhow!("REMOTE_ADDR is required to join"))?;
            let channel = PeerChannel::join(addr).await?;
            PeerSession::online(channel, PeerRole::Secondary, config.ai_level)
        }
        SessionMode::Solo => {
            info!(
                level = config.ai_level,
                seed = base_seed,
                "Solo session against the scripted opponent"
            );
            PeerSession::solo(config.ai_level, base_seed)
        }
    };

    let driver = BotDriver::new(config.ai_level, base_seed.wrapping_add(1), config.max_rounds);
    run_session(session, driver).await;

    info!("Session closed");
    Ok(())
}

/// Drive the session at the fixed simulation rate until the player leaves
/// to the menu or a shutdown signal arrives.
async fn run_session(mut session: PeerSession, mut driver: BotDriver) {
    let tick_duration = Duration::from_micros(TICK_DURATION_MICROS);
    let mut ticks = tokio::time::interval(tick_duration);
    ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = ticks.tick() => {
                let input = driver.frame(&session);
                session.tick(&input);
                if session.is_finished() {
                    break;
                }
            }
            _ = &mut shutdown => {
                info!("Shutdown requested, leaving to menu");
                session.tick(&InputFrame {
                    action: Some(InputAction::ReturnToMenu),
                    ..Default::default()
                });
                break;
            }
        }
    }
}

/// Initialize tracing/logging
fn init_tracing(log_level: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        }
        _ = terminate => {
            info!("Received terminate signal, starting graceful shutdown");
        }
    }
}
