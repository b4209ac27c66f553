//! # Realtime Broker Connection
//!
//! Maintains one STOMP-over-WebSocket connection to the message broker.
//!
//! The connection task handles:
//! - WebSocket establishment with the session cookie forwarded
//! - The STOMP `CONNECT` / `CONNECTED` handshake
//! - Re-issuing every registered subscription after each (re)connect
//! - Routing inbound `MESSAGE` frames to their subscription channel
//! - Forwarding outbound frames queued by [`RealtimeHandle::publish`]
//! - Reconnecting after a fixed delay, indefinitely, until cancelled
//! - On cancellation: `UNSUBSCRIBE` all, `DISCONNECT`, close the socket
//!
//! Connection failures are only logged; callers observe
//! [`RealtimeHandle::is_connected`] or the `ConnectionChanged` event.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, Stream, StreamExt};
use parking_lot::Mutex;
use reqwest::Url;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval, sleep, timeout, MissedTickBehavior};
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::header::{HeaderValue, COOKIE};
use tokio_tungstenite::tungstenite::Error as WsError;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use super::stomp::{split_frames, Command, Frame};
use crate::core::error::{AppError, Result};
use crate::core::events::{emit, EventSender, SyncEvent};
use crate::core::Config;

/// Heart-beat interval advertised to and sent towards the broker.
const HEART_BEAT: Duration = Duration::from_secs(10);
/// How long to wait for `CONNECTED` after the socket opens.
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

/// Connection parameters for one broker connection.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    pub url: String,
    pub cookie: Option<String>,
    pub reconnect_delay: Duration,
}

impl ConnectionConfig {
    pub fn from_config(config: &Config, cookie: Option<String>) -> Self {
        Self {
            url: config.ws_url(),
            cookie,
            reconnect_delay: config.reconnect_delay,
        }
    }
}

/// Publish side of the broker, as seen by the chat components.
pub trait MessageTransport: Send + Sync {
    fn is_connected(&self) -> bool;

    /// Queue a JSON `SEND` frame. Fails with [`AppError::NotConnected`]
    /// while the connection is down.
    fn publish(&self, destination: &str, body: String) -> Result<()>;

    /// Register a subscription; it is (re)issued on every connect.
    fn subscribe(&self, destination: &str) -> Subscription;
}

struct SubscriptionEntry {
    id: String,
    destination: String,
    tx: mpsc::UnboundedSender<Frame>,
}

struct Inner {
    channel: &'static str,
    connected: AtomicBool,
    connects: AtomicU64,
    subscriptions: Mutex<Vec<SubscriptionEntry>>,
    outbound: mpsc::UnboundedSender<Frame>,
    cancel: CancellationToken,
    events: Option<EventSender>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl Inner {
    fn set_connected(&self, connected: bool) {
        let previous = self.connected.swap(connected, Ordering::SeqCst);
        if previous != connected {
            if let Some(events) = &self.events {
                emit(
                    events,
                    SyncEvent::ConnectionChanged {
                        channel: self.channel,
                        connected,
                    },
                );
            }
        }
    }

    /// Mark connected and snapshot the subscriptions to (re)issue, atomically
    /// with respect to `subscribe`.
    fn activate(&self) -> Vec<Frame> {
        let subs = self.subscriptions.lock();
        self.set_connected(true);
        subs.iter()
            .map(|entry| Frame::subscribe(&entry.id, &entry.destination))
            .collect()
    }

    fn unsubscribe_all_frames(&self) -> Vec<Frame> {
        self.subscriptions
            .lock()
            .iter()
            .map(|entry| Frame::unsubscribe(&entry.id))
            .collect()
    }

    fn dispatch(&self, text: &str) {
        for parsed in split_frames(text) {
            let frame = match parsed {
                Ok(frame) => frame,
                Err(e) => {
                    warn!(channel = self.channel, error = %e, "Dropping malformed STOMP frame");
                    continue;
                }
            };

            match frame.command {
                Command::Message => {
                    let Some(sub_id) = frame.get("subscription").map(str::to_string) else {
                        warn!(channel = self.channel, "MESSAGE frame without subscription header");
                        continue;
                    };
                    let subs = self.subscriptions.lock();
                    match subs.iter().find(|entry| entry.id == sub_id) {
                        Some(entry) => {
                            if entry.tx.send(frame).is_err() {
                                debug!(subscription = %sub_id, "Subscriber gone, frame dropped");
                            }
                        }
                        None => debug!(subscription = %sub_id, "Frame for unknown subscription"),
                    }
                }
                Command::Error => {
                    warn!(
                        channel = self.channel,
                        message = frame.get("message").unwrap_or_default(),
                        body = %frame.body,
                        "Broker sent ERROR frame"
                    );
                }
                Command::Receipt => trace!(receipt = frame.get("receipt-id").unwrap_or_default(), "Receipt"),
                other => trace!(command = %other, "Ignoring frame"),
            }
        }
    }
}

/// A registered subscription. Dropping it unsubscribes.
pub struct Subscription {
    id: String,
    destination: String,
    rx: mpsc::UnboundedReceiver<Frame>,
    owner: Option<Arc<Inner>>,
}

impl Subscription {
    /// A subscription fed by an arbitrary channel, not bound to a connection.
    pub fn detached(destination: &str, rx: mpsc::UnboundedReceiver<Frame>) -> Self {
        Self {
            id: format!("sub-{}", uuid::Uuid::new_v4()),
            destination: destination.to_string(),
            rx,
            owner: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn destination(&self) -> &str {
        &self.destination
    }

    /// Next delivered frame; `None` once the connection is shut down.
    pub async fn recv(&mut self) -> Option<Frame> {
        self.rx.recv().await
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let Some(owner) = self.owner.take() else {
            return;
        };
        // Once cancelled, the connection task unsubscribes everything still
        // registered before it disconnects.
        if owner.cancel.is_cancelled() {
            debug!(subscription = %self.id, "Subscription released during shutdown");
            return;
        }
        let removed = {
            let mut subs = owner.subscriptions.lock();
            let before = subs.len();
            subs.retain(|entry| entry.id != self.id);
            before != subs.len()
        };
        if removed && owner.connected.load(Ordering::SeqCst) {
            let _ = owner.outbound.send(Frame::unsubscribe(&self.id));
        }
        debug!(subscription = %self.id, destination = %self.destination, "Unsubscribed");
    }
}

/// Handle to a running broker connection.
#[derive(Clone)]
pub struct RealtimeHandle {
    inner: Arc<Inner>,
}

impl RealtimeHandle {
    /// Spawn the connection task. `channel` names the connection in logs and
    /// events; `cancel` ends it.
    pub fn start(
        channel: &'static str,
        config: ConnectionConfig,
        events: Option<EventSender>,
        cancel: CancellationToken,
    ) -> Self {
        let (outbound, outbound_rx) = mpsc::unbounded_channel();
        let inner = Arc::new(Inner {
            channel,
            connected: AtomicBool::new(false),
            connects: AtomicU64::new(0),
            subscriptions: Mutex::new(Vec::new()),
            outbound,
            cancel,
            events,
            task: Mutex::new(None),
        });

        let task = tokio::spawn(run(inner.clone(), config, outbound_rx));
        *inner.task.lock() = Some(task);

        Self { inner }
    }

    /// Number of successful handshakes so far.
    pub fn connect_count(&self) -> u64 {
        self.inner.connects.load(Ordering::Relaxed)
    }

    /// Cancel the connection and wait for the task to unsubscribe, disconnect
    /// and close the socket.
    pub async fn shutdown(&self) {
        self.inner.cancel.cancel();
        let task = self.inner.task.lock().take();
        if let Some(task) = task {
            if let Err(e) = task.await {
                error!(channel = self.inner.channel, error = %e, "Connection task failed");
            }
        }
        self.inner.set_connected(false);
    }
}

impl MessageTransport for RealtimeHandle {
    fn is_connected(&self) -> bool {
        self.inner.connected.load(Ordering::SeqCst)
    }

    fn publish(&self, destination: &str, body: String) -> Result<()> {
        if !self.is_connected() {
            return Err(AppError::NotConnected);
        }
        self.inner
            .outbound
            .send(Frame::send_json(destination, body))
            .map_err(|_| AppError::NotConnected)
    }

    fn subscribe(&self, destination: &str) -> Subscription {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = format!("sub-{}", uuid::Uuid::new_v4());

        let mut subs = self.inner.subscriptions.lock();
        subs.push(SubscriptionEntry {
            id: id.clone(),
            destination: destination.to_string(),
            tx,
        });
        if self.inner.connected.load(Ordering::SeqCst) {
            let _ = self.inner.outbound.send(Frame::subscribe(&id, destination));
        }
        drop(subs);

        debug!(channel = self.inner.channel, subscription = %id, destination, "Subscription registered");
        Subscription {
            id,
            destination: destination.to_string(),
            rx,
            owner: Some(self.inner.clone()),
        }
    }
}

enum SessionEnd {
    Shutdown,
    Dropped,
}

async fn run(inner: Arc<Inner>, config: ConnectionConfig, mut outbound_rx: mpsc::UnboundedReceiver<Frame>) {
    info!(channel = inner.channel, url = %config.url, "Starting broker connection");
    let mut attempt = 0u64;

    loop {
        if inner.cancel.is_cancelled() {
            break;
        }
        attempt += 1;

        match connect_once(&inner, &config, &mut outbound_rx).await {
            Ok(SessionEnd::Shutdown) => break,
            Ok(SessionEnd::Dropped) => {
                warn!(channel = inner.channel, attempt, "Broker connection lost, reconnecting");
            }
            Err(e) => {
                debug!(
                    channel = inner.channel,
                    error = %e,
                    attempt,
                    delay_ms = config.reconnect_delay.as_millis(),
                    "Broker connection failed"
                );
            }
        }
        inner.set_connected(false);

        tokio::select! {
            _ = inner.cancel.cancelled() => break,
            _ = sleep(config.reconnect_delay) => {}
        }
    }

    inner.set_connected(false);
    info!(channel = inner.channel, "Broker connection closed");
}

async fn connect_once(
    inner: &Inner,
    config: &ConnectionConfig,
    outbound_rx: &mut mpsc::UnboundedReceiver<Frame>,
) -> Result<SessionEnd> {
    let mut request = config.url.as_str().into_client_request()?;
    if let Some(cookie) = &config.cookie {
        let value = HeaderValue::from_str(cookie)
            .map_err(|e| AppError::Transport(format!("Invalid cookie header: {}", e)))?;
        request.headers_mut().insert(COOKIE, value);
    }
    let host = Url::parse(&config.url)
        .ok()
        .and_then(|url| url.host_str().map(str::to_string))
        .unwrap_or_else(|| "localhost".to_string());

    let (ws_stream, response) = tokio::select! {
        _ = inner.cancel.cancelled() => return Ok(SessionEnd::Shutdown),
        result = connect_async(request) => result?,
    };
    debug!(channel = inner.channel, status = ?response.status(), "WebSocket established");

    let (mut write, mut read) = ws_stream.split();
    write
        .send(Message::Text(Frame::connect(&host, HEART_BEAT.as_millis() as u64).encode()))
        .await?;

    let connected = tokio::select! {
        _ = inner.cancel.cancelled() => return Ok(SessionEnd::Shutdown),
        result = timeout(HANDSHAKE_TIMEOUT, await_connected(&mut read)) => result
            .map_err(|_| AppError::Transport("Timed out waiting for CONNECTED".to_string()))??,
    };

    // Frames queued while offline belong to the previous connection.
    let mut stale = 0usize;
    while outbound_rx.try_recv().is_ok() {
        stale += 1;
    }
    if stale > 0 {
        debug!(channel = inner.channel, stale, "Discarded frames queued while offline");
    }

    let connects = inner.connects.fetch_add(1, Ordering::Relaxed) + 1;
    info!(
        channel = inner.channel,
        version = connected.get("version").unwrap_or("1.0"),
        connects,
        "STOMP session established"
    );
    for frame in inner.activate() {
        write.send(Message::Text(frame.encode())).await?;
    }

    let mut heart_beat = interval(HEART_BEAT);
    heart_beat.set_missed_tick_behavior(MissedTickBehavior::Delay);
    heart_beat.tick().await;

    loop {
        tokio::select! {
            _ = inner.cancel.cancelled() => {
                inner.set_connected(false);
                let mut farewell = Vec::new();
                while let Ok(frame) = outbound_rx.try_recv() {
                    if frame.command == Command::Unsubscribe {
                        farewell.push(frame);
                    }
                }
                farewell.extend(inner.unsubscribe_all_frames());
                for frame in farewell {
                    let _ = write.send(Message::Text(frame.encode())).await;
                }
                let _ = write.send(Message::Text(Frame::disconnect("bye").encode())).await;
                let _ = write.close().await;
                debug!(channel = inner.channel, "Sent DISCONNECT and closed socket");
                return Ok(SessionEnd::Shutdown);
            }
            Some(frame) = outbound_rx.recv() => {
                trace!(channel = inner.channel, command = %frame.command, "Sending frame");
                write.send(Message::Text(frame.encode())).await?;
            }
            msg = read.next() => match msg {
                None => return Ok(SessionEnd::Dropped),
                Some(Err(e)) => return Err(e.into()),
                Some(Ok(Message::Text(text))) => inner.dispatch(&text),
                Some(Ok(Message::Ping(data))) => write.send(Message::Pong(data)).await?,
                Some(Ok(Message::Close(frame))) => {
                    info!(channel = inner.channel, reason = ?frame.map(|f| f.reason.to_string()), "Broker closed the socket");
                    return Ok(SessionEnd::Dropped);
                }
                Some(Ok(_)) => {}
            },
            _ = heart_beat.tick() => {
                write.send(Message::Text("\n".to_string())).await?;
            }
        }
    }
}

/// Read until the broker answers CONNECT.
async fn await_connected<S>(read: &mut S) -> Result<Frame>
where
    S: Stream<Item = std::result::Result<Message, WsError>> + Unpin,
{
    while let Some(msg) = read.next().await {
        let text = match msg? {
            Message::Text(text) => text,
            Message::Close(_) => break,
            _ => continue,
        };
        for parsed in split_frames(&text) {
            match parsed {
                Ok(frame) if frame.command == Command::Connected => return Ok(frame),
                Ok(frame) if frame.command == Command::Error => {
                    return Err(AppError::Transport(format!(
                        "Broker rejected CONNECT: {}",
                        frame.get("message").unwrap_or(frame.body.as_str())
                    )));
                }
                Ok(_) => {}
                Err(e) => warn!(error = %e, "Malformed frame during handshake"),
            }
        }
    }
    Err(AppError::Transport("Socket closed during STOMP handshake".to_string()))
}
