use crate::core::config::ClientConfig;
use crate::core::connection_state::{AtomicConnectionState, AtomicMetrics, ConnectionState};
use crate::core::heartbeat;
use crate::protocol::{Envelope, MessageKind};
use crate::router::MessageRouter;
use crate::traits::{LiveSocketError, Result};
use crossbeam_channel::{unbounded, Receiver, Sender};
use futures::{SinkExt, StreamExt};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, error, info, warn};

type WsStream =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;
type WsSink = futures::stream::SplitSink<WsStream, Message>;
type WsSource = futures::stream::SplitStream<WsStream>;

/// Internal command messages for connection control
#[derive(Debug)]
enum ClientCommand {
    /// Send an envelope over the socket
    Send(Envelope),
    /// Close the socket gracefully
    Close,
}

/// How an active connection ended
#[derive(Debug)]
enum CloseReason {
    /// The application asked for the close; no reconnect is scheduled
    Manual,
    /// Error, remote close or stream end; reconnect may be scheduled
    Abrupt,
}

/// Metrics snapshot
#[derive(Debug, Clone)]
pub struct Metrics {
    pub messages_sent: u64,
    pub messages_received: u64,
    pub reconnect_count: u64,
    pub connection_state: ConnectionState,
}

/// Realtime client owning the single duplex connection
///
/// The socket handle lives inside a supervisor task spawned by `connect()`;
/// no other component touches it. Inbound envelopes are parsed and broadcast
/// on that task, so listeners observe strict socket-arrival order.
///
/// Unexpected closes trigger reconnection per the configured strategy until
/// it is exhausted (then the supervisor stops silently) or the application
/// calls `disconnect()`.
pub struct RealtimeClient {
    config: Arc<ClientConfig>,
    router: Arc<MessageRouter>,
    state: Arc<AtomicConnectionState>,
    metrics: Arc<AtomicMetrics>,
    /// Set by `disconnect()`; suppresses auto-reconnect
    manual_close: Arc<AtomicBool>,
    /// Reconnect attempts since the last successful open
    reconnect_attempts: Arc<AtomicUsize>,
    command_tx: Sender<ClientCommand>,
    command_rx: Receiver<ClientCommand>,
    supervisor: Mutex<Option<tokio::task::JoinHandle<()>>>,
}

impl RealtimeClient {
    /// Called by the builder's `build()` method; use `livesockets::builder()`.
    pub(crate) fn new(config: ClientConfig, router: Arc<MessageRouter>) -> Self {
        let (command_tx, command_rx) = unbounded();
        Self {
            config: Arc::new(config),
            router,
            state: Arc::new(AtomicConnectionState::new(ConnectionState::Closed)),
            metrics: Arc::new(AtomicMetrics::new()),
            manual_close: Arc::new(AtomicBool::new(false)),
            reconnect_attempts: Arc::new(AtomicUsize::new(0)),
            command_tx,
            command_rx,
            supervisor: Mutex::new(None),
        }
    }

    /// The router this client dispatches into
    pub fn router(&self) -> &Arc<MessageRouter> {
        &self.router
    }

    /// Open the connection
    ///
    /// Any existing connection is closed first. Resolves once the socket is
    /// open, or with an error for a failure occurring before open. After a
    /// pre-open failure the supervisor still enters the backoff loop, so the
    /// client keeps retrying in the background unless `disconnect()` is
    /// called.
    pub async fn connect(&self) -> Result<()> {
        self.disconnect().await;
        self.manual_close.store(false, Ordering::Release);

        let (open_tx, open_rx) = oneshot::channel();
        let ctx = SupervisorContext {
            config: Arc::clone(&self.config),
            router: Arc::clone(&self.router),
            state: Arc::clone(&self.state),
            metrics: Arc::clone(&self.metrics),
            manual_close: Arc::clone(&self.manual_close),
            reconnect_attempts: Arc::clone(&self.reconnect_attempts),
            command_rx: self.command_rx.clone(),
        };
        let handle = tokio::spawn(run_supervisor(ctx, open_tx));
        *self.supervisor.lock() = Some(handle);

        match open_rx.await {
            Ok(result) => result,
            Err(_) => Err(LiveSocketError::ConnectionClosed(
                "supervisor exited before open".to_string(),
            )),
        }
    }

    /// Close the connection and suppress auto-reconnect
    ///
    /// Stops the heartbeat, cancels any pending reconnect and waits for the
    /// supervisor task to finish. Safe to call when not connected.
    pub async fn disconnect(&self) {
        self.manual_close.store(true, Ordering::Release);
        let _ = self.command_tx.send(ClientCommand::Close);

        let handle = self.supervisor.lock().take();
        if let Some(handle) = handle {
            debug!("waiting for connection supervisor to stop");
            let _ = handle.await;
        }
    }

    /// Send an envelope over the socket
    ///
    /// Requires the connection to be open; otherwise the envelope is logged
    /// and dropped. Nothing is queued for later delivery while disconnected.
    pub fn send(&self, envelope: Envelope) {
        if !self.state.is_open() {
            warn!(
                kind = ?envelope.kind,
                "send while connection is not open, dropping message"
            );
            return;
        }
        if self.command_tx.send(ClientCommand::Send(envelope)).is_err() {
            warn!("command channel closed, dropping message");
        }
    }

    /// Current transport phase (pure read)
    #[inline]
    pub fn connection_state(&self) -> ConnectionState {
        self.state.get()
    }

    /// Check if the connection is open
    #[inline]
    pub fn is_connected(&self) -> bool {
        self.state.is_open()
    }

    /// Get current metrics
    pub fn metrics(&self) -> Metrics {
        Metrics {
            messages_sent: self.metrics.messages_sent(),
            messages_received: self.metrics.messages_received(),
            reconnect_count: self.metrics.reconnect_count(),
            connection_state: self.state.get(),
        }
    }
}

impl Drop for RealtimeClient {
    fn drop(&mut self) {
        // Stop the supervisor without awaiting it
        self.manual_close.store(true, Ordering::Release);
        let _ = self.command_tx.send(ClientCommand::Close);
    }
}

/// Everything the supervisor task needs from the client
struct SupervisorContext {
    config: Arc<ClientConfig>,
    router: Arc<MessageRouter>,
    state: Arc<AtomicConnectionState>,
    metrics: Arc<AtomicMetrics>,
    manual_close: Arc<AtomicBool>,
    reconnect_attempts: Arc<AtomicUsize>,
    command_rx: Receiver<ClientCommand>,
}

/// Supervisor task: owns the socket across its whole lifecycle
///
/// Connects, runs the active connection, and applies the reconnection
/// strategy after unexpected closes. `open_tx` resolves the caller's
/// `connect()` future on the first open or pre-open failure.
async fn run_supervisor(ctx: SupervisorContext, open_tx: oneshot::Sender<Result<()>>) {
    let mut first_open = Some(open_tx);
    let endpoint = ctx.config.endpoint();

    loop {
        if ctx.manual_close.load(Ordering::Acquire) {
            debug!("manual close requested, supervisor exiting");
            break;
        }

        ctx.state.set(ConnectionState::Connecting);
        match connect_async(&endpoint).await {
            Ok((ws_stream, _)) => {
                info!(url = %ctx.config.url(), "connected");
                ctx.state.set(ConnectionState::Open);
                // Attempt counter and backoff reset only on a successful open
                ctx.reconnect_attempts.store(0, Ordering::Release);
                if let Some(tx) = first_open.take() {
                    let _ = tx.send(Ok(()));
                }
                ctx.router.emit_connect();

                let reason = run_connection(ws_stream, &ctx).await;

                ctx.state.set(ConnectionState::Closed);
                ctx.router.emit_disconnect();

                if matches!(reason, CloseReason::Manual) {
                    break;
                }
            }
            Err(e) => {
                error!("failed to connect: {}", e);
                ctx.state.set(ConnectionState::Closed);
                if let Some(tx) = first_open.take() {
                    let _ = tx.send(Err(LiveSocketError::WebSocket(e.to_string())));
                }
                ctx.router.emit_error(&e.to_string());
            }
        }

        if ctx.manual_close.load(Ordering::Acquire) {
            break;
        }

        let attempt = ctx.reconnect_attempts.load(Ordering::Acquire);
        let Some(delay) = ctx.config.reconnect_strategy().next_delay(attempt) else {
            warn!(attempts = attempt, "reconnection attempts exhausted, giving up");
            break;
        };

        info!("reconnecting in {:?} (attempt {})", delay, attempt + 1);
        ctx.reconnect_attempts.store(attempt + 1, Ordering::Release);
        ctx.metrics.increment_reconnects();

        // Sleep in slices so a manual disconnect cancels the pending reconnect
        let check_interval = Duration::from_millis(100);
        let mut elapsed = Duration::ZERO;
        while elapsed < delay {
            if ctx.manual_close.load(Ordering::Acquire) {
                debug!("manual close during reconnect delay, supervisor exiting");
                return;
            }
            let sleep_time = check_interval.min(delay - elapsed);
            tokio::time::sleep(sleep_time).await;
            elapsed += sleep_time;
        }
    }

    debug!("connection supervisor exiting");
}

/// Drive one open socket until it closes
async fn run_connection(ws_stream: WsStream, ctx: &SupervisorContext) -> CloseReason {
    let (mut write, mut read) = ws_stream.split();

    // Drop commands queued while the socket was down: nothing is buffered
    // across a disconnect
    let mut stale = 0usize;
    while ctx.command_rx.try_recv().is_ok() {
        stale += 1;
    }
    if stale > 0 {
        debug!(count = stale, "dropped commands queued while disconnected");
    }

    let (_hb_handle, hb_shutdown_tx, heartbeat_rx) =
        heartbeat::spawn_heartbeat(ctx.config.heartbeat_interval());

    let reason = message_loop(&mut write, &mut read, ctx, &heartbeat_rx).await;

    // The heartbeat task checks this signal and exits on its next tick
    let _ = hb_shutdown_tx.send(());

    reason
}

/// Main message processing loop for one connection
async fn message_loop(
    write: &mut WsSink,
    read: &mut WsSource,
    ctx: &SupervisorContext,
    heartbeat_rx: &Receiver<Envelope>,
) -> CloseReason {
    loop {
        // A manual disconnect closes the socket even if the Close command
        // was drained with the stale queue
        if ctx.manual_close.load(Ordering::Acquire) {
            debug!("manual close detected in message loop");
            return graceful_close(write, ctx).await;
        }

        tokio::select! {
            msg = read.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        ctx.metrics.increment_received();
                        if handle_frame(write, ctx, &text).await.is_err() {
                            return CloseReason::Abrupt;
                        }
                    }
                    Some(Ok(Message::Close(_))) => {
                        info!("server closed the connection");
                        return CloseReason::Abrupt;
                    }
                    Some(Ok(_)) => {
                        // Binary and low-level protocol frames are not part
                        // of the envelope protocol
                    }
                    Some(Err(e)) => {
                        error!("WebSocket error: {}", e);
                        ctx.router.emit_error(&e.to_string());
                        return CloseReason::Abrupt;
                    }
                    None => {
                        warn!("WebSocket stream ended");
                        return CloseReason::Abrupt;
                    }
                }
            }

            // Handle commands (spawn_blocking with timeout to avoid blocking select)
            cmd = async {
                let rx = ctx.command_rx.clone();
                tokio::task::spawn_blocking(move || {
                    rx.recv_timeout(Duration::from_millis(100))
                }).await.ok()
            } => {
                match cmd {
                    Some(Ok(ClientCommand::Send(envelope))) => {
                        if send_envelope(write, ctx, &envelope).await.is_err() {
                            return CloseReason::Abrupt;
                        }
                    }
                    Some(Ok(ClientCommand::Close)) => {
                        return graceful_close(write, ctx).await;
                    }
                    Some(Err(_)) => {
                        // Timeout is normal, just continue the loop
                    }
                    None => {
                        debug!("command channel closed");
                        return graceful_close(write, ctx).await;
                    }
                }
            }

            // Handle pings from the dedicated heartbeat task
            ping = async {
                let rx = heartbeat_rx.clone();
                tokio::task::spawn_blocking(move || {
                    rx.recv_timeout(Duration::from_millis(100))
                }).await.ok().and_then(|r| r.ok())
            } => {
                if let Some(envelope) = ping {
                    debug!("heartbeat tick, sending ping");
                    if send_envelope(write, ctx, &envelope).await.is_err() {
                        return CloseReason::Abrupt;
                    }
                }
                // Timeout is normal, continue loop
            }
        }
    }
}

/// Parse one inbound frame, intercept control messages, fan out the rest
///
/// Malformed frames are logged and dropped; they never reach listeners.
/// Returns an error only for a failed write (pong reply), which ends the
/// connection.
async fn handle_frame(write: &mut WsSink, ctx: &SupervisorContext, text: &str) -> Result<()> {
    match ctx.router.parse(text) {
        Ok(envelope) => match envelope.kind {
            MessageKind::Ping => {
                // Reply before any queued outbound traffic is looked at
                debug!("ping received, replying with pong");
                send_envelope(write, ctx, &Envelope::pong()).await
            }
            MessageKind::Pong => {
                debug!("pong received");
                Ok(())
            }
            _ => {
                ctx.router.broadcast(&envelope);
                Ok(())
            }
        },
        Err(e) => {
            warn!("dropping malformed frame: {}", e);
            Ok(())
        }
    }
}

async fn send_envelope(write: &mut WsSink, ctx: &SupervisorContext, envelope: &Envelope) -> Result<()> {
    let text = match envelope.encode() {
        Ok(text) => text,
        Err(e) => {
            warn!(kind = ?envelope.kind, "failed to encode envelope, dropping: {}", e);
            return Ok(());
        }
    };

    write.send(Message::Text(text)).await.map_err(|e| {
        error!("failed to send message: {}", e);
        ctx.router.emit_error(&e.to_string());
        LiveSocketError::WebSocket(e.to_string())
    })?;
    ctx.metrics.increment_sent();
    Ok(())
}

/// Graceful close: `Open → Closing → Closed` (the supervisor sets `Closed`)
async fn graceful_close(write: &mut WsSink, ctx: &SupervisorContext) -> CloseReason {
    ctx.state.set(ConnectionState::Closing);
    if let Err(e) = write.close().await {
        debug!("error closing socket: {}", e);
    }
    CloseReason::Manual
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::DEFAULT_HEARTBEAT_INTERVAL;
    use crate::traits::ExponentialBackoff;

    fn test_client() -> RealtimeClient {
        let config = ClientConfig {
            url: "ws://localhost:9".to_string(),
            user_id: None,
            heartbeat_interval: DEFAULT_HEARTBEAT_INTERVAL,
            reconnect_strategy: Box::new(ExponentialBackoff::default()),
        };
        RealtimeClient::new(config, Arc::new(MessageRouter::new()))
    }

    #[test]
    fn test_initial_state() {
        let client = test_client();
        assert_eq!(client.connection_state(), ConnectionState::Closed);
        assert!(!client.is_connected());

        let metrics = client.metrics();
        assert_eq!(metrics.messages_sent, 0);
        assert_eq!(metrics.messages_received, 0);
        assert_eq!(metrics.reconnect_count, 0);
    }

    #[test]
    fn test_send_while_closed_drops_message() {
        let client = test_client();
        client.send(Envelope::ping());
        // Nothing is queued for later delivery
        assert!(client.command_rx.try_recv().is_err());
    }
}
