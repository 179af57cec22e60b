//! Heartbeat mechanism for the realtime connection
//!
//! A dedicated Tokio task ticks at the configured interval and hands a fresh
//! `ping` envelope to the connection loop through an unbounded crossbeam
//! channel, so heartbeat timing is independent of message processing and the
//! timestamp is authored by the sender at tick time.
//!
//! The task is shut down through its bounded signal channel on both manual
//! disconnect and any socket close; a closed payload channel also ends it.

use crate::protocol::Envelope;
use crossbeam_channel::{Receiver, Sender};
use std::time::Duration;
use tracing::debug;

/// Heartbeat task that emits periodic ping envelopes
///
/// The task will:
/// 1. Wait for the first interval (skips the immediate first tick)
/// 2. On each tick, send a freshly stamped ping through the channel
/// 3. Continue until a shutdown signal is received or the channel closes
pub async fn heartbeat_task(
    interval: Duration,
    heartbeat_tx: Sender<Envelope>,
    shutdown_rx: Receiver<()>,
) {
    let mut ticker = tokio::time::interval(interval);
    // Skip the first immediate tick - wait for the first interval
    ticker.tick().await;
    // If we miss ticks due to slow processing, skip them rather than bursting
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    debug!("heartbeat task started with interval: {:?}", interval);

    loop {
        match shutdown_rx.try_recv() {
            Ok(_) | Err(crossbeam_channel::TryRecvError::Disconnected) => {
                debug!("heartbeat task received shutdown signal");
                break;
            }
            Err(crossbeam_channel::TryRecvError::Empty) => {}
        }

        ticker.tick().await;

        if heartbeat_tx.send(Envelope::ping()).is_err() {
            debug!("heartbeat channel closed, shutting down heartbeat task");
            break;
        }
    }

    debug!("heartbeat task exiting");
}

/// Spawn a heartbeat task
///
/// Returns the task handle, the shutdown signal sender and the channel the
/// ping envelopes arrive on.
pub fn spawn_heartbeat(
    interval: Duration,
) -> (tokio::task::JoinHandle<()>, Sender<()>, Receiver<Envelope>) {
    let (shutdown_tx, shutdown_rx) = crossbeam_channel::bounded(1);
    let (heartbeat_tx, heartbeat_rx) = crossbeam_channel::unbounded();

    let handle = tokio::spawn(async move {
        heartbeat_task(interval, heartbeat_tx, shutdown_rx).await;
    });

    (handle, shutdown_tx, heartbeat_rx)
}
