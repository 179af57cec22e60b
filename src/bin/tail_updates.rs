//! Tails realtime updates for a single generation
//!
//! Connects to the configured AppForge realtime endpoint, binds a
//! subscription to the generation id given on the command line, and logs
//! progress until the run reaches a terminal state or Ctrl+C.
//!
//! Environment:
//! - `APPFORGE_WS_URL` (required): ws:// or wss:// endpoint
//! - `APPFORGE_USER_ID` (optional): user id embedded as a query parameter

use anyhow::{Context, Result};
use appforge_realtime::bin_common::logging::init_tracing;
use livesockets::{GenerationSubscription, MessageRouter, NotificationBridge, TracingSink};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    init_tracing();

    let url = std::env::var("APPFORGE_WS_URL").context("APPFORGE_WS_URL must be set")?;
    let user_id = std::env::var("APPFORGE_USER_ID").ok();
    let generation_id = std::env::args()
        .nth(1)
        .context("usage: tail_updates <generation-id>")?;

    let router = Arc::new(MessageRouter::new());
    let builder = livesockets::builder().url(url).router(Arc::clone(&router));
    let builder = match user_id {
        Some(user_id) => builder.user_id(user_id),
        None => builder,
    };
    let client = builder.build();

    let _bridge = NotificationBridge::new(Arc::clone(&router), Arc::new(TracingSink));

    let mut subscription = GenerationSubscription::new(Arc::clone(&router));
    subscription.track(Some(generation_id.clone()));

    client.connect().await?;
    info!(generation_id = %generation_id, "connected, tailing updates (Ctrl+C to stop)");

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted");
                break;
            }
            _ = tokio::time::sleep(Duration::from_millis(500)) => {
                if subscription.is_loading() {
                    continue;
                }
                let progress = subscription.progress();
                info!(
                    stage = %progress.stage,
                    percentage = progress.percentage,
                    "{}",
                    progress.message
                );
                if subscription.is_completed() || subscription.is_failed() || subscription.is_cancelled() {
                    info!("generation reached a terminal state");
                    break;
                }
            }
        }
    }

    client.disconnect().await;
    info!("disconnected");
    Ok(())
}
