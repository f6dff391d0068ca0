use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use crate::protocol::ClientMessage;
use crate::transport::{LinkEvent, Outbox, TransportError};

#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub url: String,
    /// Constant wait between a lost or failed connection and the next attempt.
    pub retry_delay: Duration,
}

/// Outbound handle to a running WebSocket transport task.
#[derive(Debug, Clone)]
pub struct WsOutbox {
    frames: UnboundedSender<String>,
    connected: Arc<AtomicBool>,
}

impl WsOutbox {
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }
}

impl Outbox for WsOutbox {
    fn send(&mut self, message: &ClientMessage) -> Result<(), TransportError> {
        if !self.is_connected() {
            return Err(TransportError::NotConnected);
        }
        let text = message.to_json()?;
        self.frames
            .send(text)
            .map_err(|_| TransportError::Shutdown)
    }
}

/// Spawn the connection task on the current runtime.
///
/// The task connects, forwards inbound text frames as [`LinkEvent::Message`],
/// and after any close or failure waits `retry_delay` and connects again.
/// It stops once `events` has no receiver or every [`WsOutbox`] is dropped.
pub fn spawn_ws_transport(config: TransportConfig, events: UnboundedSender<LinkEvent>) -> WsOutbox {
    let (frames, outbound) = mpsc::unbounded_channel();
    let connected = Arc::new(AtomicBool::new(false));
    tokio::spawn(run(config, events, outbound, connected.clone()));
    WsOutbox { frames, connected }
}

enum Ended {
    Closed,
    Failed(String),
    Shutdown,
}

async fn run(
    config: TransportConfig,
    events: UnboundedSender<LinkEvent>,
    mut outbound: UnboundedReceiver<String>,
    connected: Arc<AtomicBool>,
) {
    let mut attempt: u64 = 0;
    loop {
        attempt += 1;
        tracing::debug!(url = %config.url, attempt, "connecting");
        let ended = match connect_async(config.url.as_str()).await {
            Ok((stream, _response)) => {
                // Frames queued for a previous connection are stale.
                let mut stale = 0usize;
                while outbound.try_recv().is_ok() {
                    stale += 1;
                }
                if stale > 0 {
                    tracing::debug!(stale, "discarded outbound frames from previous link");
                }
                connected.store(true, Ordering::Release);
                tracing::info!(url = %config.url, "link open");
                if events.send(LinkEvent::Opened).is_err() {
                    return;
                }
                let ended = pump(stream, &events, &mut outbound).await;
                connected.store(false, Ordering::Release);
                ended
            }
            Err(e) => Ended::Failed(e.to_string()),
        };

        match ended {
            Ended::Shutdown => {
                tracing::debug!("transport shutting down");
                return;
            }
            Ended::Closed => tracing::info!("link closed"),
            Ended::Failed(error) => {
                tracing::warn!(%error, "link failed");
                if events.send(LinkEvent::Error(error)).is_err() {
                    return;
                }
            }
        }
        if events.send(LinkEvent::Closed).is_err() {
            return;
        }

        tracing::debug!(delay_ms = config.retry_delay.as_millis() as u64, "reconnecting after delay");
        tokio::time::sleep(config.retry_delay).await;
    }
}

async fn pump(
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
    events: &UnboundedSender<LinkEvent>,
    outbound: &mut UnboundedReceiver<String>,
) -> Ended {
    let (mut write, mut read) = stream.split();
    loop {
        tokio::select! {
            frame = read.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    if events.send(LinkEvent::Message(text)).is_err() {
                        return Ended::Shutdown;
                    }
                }
                Some(Ok(Message::Close(_))) | None => return Ended::Closed,
                Some(Ok(Message::Binary(bytes))) => {
                    tracing::debug!(len = bytes.len(), "ignoring binary frame");
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => return Ended::Failed(e.to_string()),
            },
            text = outbound.recv() => match text {
                Some(text) => {
                    if let Err(e) = write.send(Message::Text(text)).await {
                        return Ended::Failed(e.to_string());
                    }
                }
                None => {
                    let _ = write.send(Message::Close(None)).await;
                    return Ended::Shutdown;
                }
            },
        }
    }
}
