//! Single-connection WebSocket client with ping/pong keepalive

use super::types::{WsConfig, WsError, WsMessage};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// WebSocket client performing exactly one connection attempt per `connect` call
pub struct WsClient {
    config: WsConfig,
}

/// Handle to a live WebSocket connection
///
/// Inbound frames arrive on `recv`; `send_text` writes to the socket;
/// `close` tears the connection down and is idempotent. Once the
/// background stream task exits (error, close frame, or pong timeout)
/// `recv` yields `None`.
pub struct WsConnection {
    messages: mpsc::Receiver<WsMessage>,
    outbound: mpsc::Sender<String>,
    cancel: CancellationToken,
}

impl WsClient {
    /// Create a new WebSocket client with the given configuration
    pub fn new(config: WsConfig) -> Self {
        Self { config }
    }

    /// Get the configured URL
    pub fn url(&self) -> &str {
        &self.config.url
    }

    /// Establish the connection and spawn the stream task
    ///
    /// Fails with `WsError::Connect` if the transport cannot be established.
    pub async fn connect(&self) -> Result<WsConnection, WsError> {
        tracing::info!(url = %self.config.url, "Connecting to WebSocket");

        let (ws_stream, _response) = connect_async(&self.config.url)
            .await
            .map_err(|e| WsError::Connect(e.to_string()))?;

        tracing::info!("WebSocket connected");

        let (msg_tx, msg_rx) = mpsc::channel(1024);
        let (out_tx, out_rx) = mpsc::channel(256);
        let cancel = CancellationToken::new();

        let config = self.config.clone();
        let stream_cancel = cancel.clone();
        tokio::spawn(async move {
            if let Err(e) = run_stream(config, ws_stream, msg_tx, out_rx, stream_cancel).await {
                tracing::warn!(error = %e, "WebSocket stream ended with error");
            }
        });

        Ok(WsConnection {
            messages: msg_rx,
            outbound: out_tx,
            cancel,
        })
    }
}

impl WsConnection {
    /// Receive the next inbound message; `None` once the stream task has exited
    pub async fn recv(&mut self) -> Option<WsMessage> {
        self.messages.recv().await
    }

    /// Send a text frame
    pub async fn send_text(&self, text: impl Into<String>) -> Result<(), WsError> {
        self.outbound
            .send(text.into())
            .await
            .map_err(|e| WsError::Send(e.to_string()))
    }

    /// Close the connection; safe to call more than once
    pub fn close(&self) {
        self.cancel.cancel();
    }

    /// Token cancelled when the connection is closed
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }
}

/// Drive the socket until close, cancellation, or failure
async fn run_stream(
    config: WsConfig,
    ws_stream: WsStream,
    tx: mpsc::Sender<WsMessage>,
    mut out_rx: mpsc::Receiver<String>,
    cancel: CancellationToken,
) -> Result<(), WsError> {
    let (mut write, mut read) = ws_stream.split();

    let mut ping_interval = tokio::time::interval(config.ping_interval);
    ping_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    // First tick fires immediately; skip it so the first ping waits a full interval.
    ping_interval.tick().await;

    let mut pong_due: Option<Instant> = None;
    let mut outbound_open = true;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                let _ = write.send(Message::Close(None)).await;
                tracing::info!("WebSocket closed by local request");
                return Ok(());
            }

            msg = read.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        if tx.send(WsMessage::Text(text)).await.is_err() {
                            tracing::debug!("Receiver dropped, closing connection");
                            return Ok(());
                        }
                    }
                    Some(Ok(Message::Binary(data))) => {
                        if tx.send(WsMessage::Binary(data)).await.is_err() {
                            tracing::debug!("Receiver dropped, closing connection");
                            return Ok(());
                        }
                    }
                    Some(Ok(Message::Ping(data))) => {
                        write.send(Message::Pong(data)).await
                            .map_err(|e| WsError::Send(e.to_string()))?;
                    }
                    Some(Ok(Message::Pong(_))) => {
                        pong_due = None;
                    }
                    Some(Ok(Message::Close(_))) => {
                        tracing::info!("Received close frame");
                        return Ok(());
                    }
                    Some(Err(e)) => {
                        return Err(WsError::Connect(e.to_string()));
                    }
                    None => {
                        return Err(WsError::Connect("stream ended unexpectedly".into()));
                    }
                    _ => {}
                }
            }

            msg = out_rx.recv(), if outbound_open => {
                match msg {
                    Some(text) => {
                        write.send(Message::Text(text)).await
                            .map_err(|e| WsError::Send(e.to_string()))?;
                    }
                    None => {
                        // All senders dropped; inbound traffic continues.
                        outbound_open = false;
                    }
                }
            }

            _ = ping_interval.tick() => {
                write.send(Message::Ping(vec![])).await
                    .map_err(|e| WsError::Send(e.to_string()))?;
                if pong_due.is_none() {
                    pong_due = Some(Instant::now() + config.pong_timeout);
                }
            }

            _ = async {
                match pong_due {
                    Some(due) => tokio::time::sleep_until(due).await,
                    None => std::future::pending().await,
                }
            } => {
                return Err(WsError::PongTimeout);
            }
        }
    }
}
