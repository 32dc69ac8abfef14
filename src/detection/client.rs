use super::debounce::TriggerDebouncer;
use super::messages::{ClientMessage, DetectionEvent};
use crate::session::ScheduledTask;
use anyhow::{ensure, Result};
use futures::future::BoxFuture;
use futures::{FutureExt, SinkExt, StreamExt};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, error, info, warn};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Configuration for the detection service connection
#[derive(Debug, Clone)]
pub struct DetectionConfig {
    /// Websocket address of the detection service
    pub url: String,

    /// Interval between keep-alive pings while connected
    pub keepalive_interval: Duration,

    /// Delay before reconnecting after a close
    pub reconnect_delay: Duration,

    /// Window in which repeat play-audio triggers are suppressed
    pub trigger_cooldown: Duration,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            url: "ws://localhost:8000/ws".to_string(),
            keepalive_interval: Duration::from_secs(30),
            reconnect_delay: Duration::from_secs(5),
            trigger_cooldown: Duration::from_secs(1),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

/// Notifications delivered to the consumer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetectionUpdate {
    ConnectionStatus(bool),
    PersonDetected(u32),
    PlayAudio,
}

/// Observable state of the detection client
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetectionStatus {
    pub state: ConnectionState,
    pub connected: bool,
    pub person_detected: bool,
    pub detection_count: u32,
    /// Reconnect attempts scheduled since the client was created
    pub reconnects: u64,
    pub pings_sent: u64,
}

impl Default for DetectionStatus {
    fn default() -> Self {
        Self {
            state: ConnectionState::Disconnected,
            connected: false,
            person_detected: false,
            detection_count: 0,
            reconnects: 0,
            pings_sent: 0,
        }
    }
}

#[derive(Debug)]
struct ClientState {
    connection: ConnectionState,
    shutdown: bool,
    reconnect: ScheduledTask,
    connection_task: Option<JoinHandle<()>>,
    status: DetectionStatus,
}

struct Inner {
    config: DetectionConfig,
    state: Mutex<ClientState>,
    updates: mpsc::UnboundedSender<DetectionUpdate>,
    debouncer: TriggerDebouncer,
    status: watch::Sender<DetectionStatus>,
}

/// Resilient client for the detection service event stream.
///
/// Holds at most one live connection. Every close, including a failed
/// connect, schedules exactly one reconnect until `shutdown()` is called.
/// Keep-alive pings run inside the connection task, so they stop exactly
/// when the connection does. Dropping the client shuts it down.
pub struct DetectionClient {
    inner: Arc<Inner>,
}

impl DetectionClient {
    pub fn new(config: DetectionConfig) -> Result<(Self, mpsc::UnboundedReceiver<DetectionUpdate>)> {
        ensure!(
            !config.keepalive_interval.is_zero(),
            "keep-alive interval must be positive"
        );
        ensure!(
            !config.reconnect_delay.is_zero(),
            "reconnect delay must be positive"
        );

        let (updates_tx, updates_rx) = mpsc::unbounded_channel();
        let (status_tx, _) = watch::channel(DetectionStatus::default());

        let trigger_tx = updates_tx.clone();
        let debouncer = TriggerDebouncer::new(config.trigger_cooldown, move || {
            if trigger_tx.send(DetectionUpdate::PlayAudio).is_err() {
                warn!("Detection update receiver dropped, discarding play-audio trigger");
            }
        });

        let inner = Arc::new(Inner {
            config,
            state: Mutex::new(ClientState {
                connection: ConnectionState::Disconnected,
                shutdown: false,
                reconnect: ScheduledTask::new(),
                connection_task: None,
                status: DetectionStatus::default(),
            }),
            updates: updates_tx,
            debouncer,
            status: status_tx,
        });

        Ok((Self { inner }, updates_rx))
    }

    /// Open the connection. No-op while connecting, connected or shut down.
    pub async fn connect(&self) {
        Arc::clone(&self.inner).connect().await;
    }

    /// Close the connection for good and cancel every pending timer
    pub async fn shutdown(&self) {
        self.inner.disconnect().await;
    }

    pub fn status(&self) -> DetectionStatus {
        self.inner.status.borrow().clone()
    }

    pub fn subscribe_status(&self) -> watch::Receiver<DetectionStatus> {
        self.inner.status.subscribe()
    }
}

impl Drop for DetectionClient {
    fn drop(&mut self) {
        // The reconnect timer and connection task keep `inner` alive, so they
        // have to be stopped here or they would outlive the client
        if let Ok(mut state) = self.inner.state.try_lock() {
            self.inner.close(&mut state);
            return;
        }

        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            let inner = Arc::clone(&self.inner);
            handle.spawn(async move { inner.disconnect().await });
        }
    }
}

impl Inner {
    fn connect(self: Arc<Self>) -> BoxFuture<'static, ()> {
        async move {
            {
                let mut state = self.state.lock().await;
                if state.shutdown {
                    debug!("Connect ignored, client shut down");
                    return;
                }
                if state.connection != ConnectionState::Disconnected {
                    debug!("Connect ignored, already {:?}", state.connection);
                    return;
                }
                state.reconnect.cancel();
                state.connection = ConnectionState::Connecting;
                self.publish(&mut state);
            }

            info!("Connecting to detection service at {}", self.config.url);

            match connect_async(self.config.url.as_str()).await {
                Ok((ws, _)) => {
                    let mut state = self.state.lock().await;
                    if state.shutdown {
                        info!("Discarding connection opened during shutdown");
                        return;
                    }

                    info!("Connected to detection service");
                    state.connection = ConnectionState::Connected;
                    self.publish(&mut state);
                    self.notify(DetectionUpdate::ConnectionStatus(true));

                    let inner = Arc::clone(&self);
                    state.connection_task = Some(tokio::spawn(inner.run_connection(ws)));
                }
                Err(e) => {
                    warn!("Failed to connect to detection service: {}", e);
                    self.handle_close().await;
                }
            }
        }
        .boxed()
    }

    async fn run_connection(self: Arc<Self>, ws: WsStream) {
        let (mut write, mut read) = ws.split();

        let period = self.config.keepalive_interval;
        let mut keepalive = tokio::time::interval_at(tokio::time::Instant::now() + period, period);

        loop {
            tokio::select! {
                message = read.next() => match message {
                    Some(Ok(Message::Text(text))) => self.dispatch(&text).await,
                    Some(Ok(Message::Binary(bin))) => {
                        warn!("Unexpected binary message ({} bytes)", bin.len());
                    }
                    Some(Ok(Message::Close(frame))) => {
                        info!("Detection service closed the connection: {:?}", frame);
                        break;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        error!("Failed to read from detection service: {}", e);
                        break;
                    }
                    None => break,
                },
                _ = keepalive.tick() => match ClientMessage::Ping.encode() {
                    Ok(ping) => {
                        if let Err(e) = write.send(Message::Text(ping)).await {
                            warn!("Failed to send keep-alive ping: {}", e);
                        } else {
                            let mut state = self.state.lock().await;
                            state.status.pings_sent += 1;
                            self.publish(&mut state);
                        }
                    }
                    Err(e) => error!("Failed to encode keep-alive ping: {}", e),
                },
            }
        }

        self.handle_close().await;
    }

    async fn dispatch(&self, text: &str) {
        match DetectionEvent::decode(text) {
            Ok(DetectionEvent::PersonDetected { count }) => {
                info!("Person detected (count={})", count);
                {
                    let mut state = self.state.lock().await;
                    state.status.person_detected = true;
                    state.status.detection_count = count;
                    self.publish(&mut state);
                }
                self.notify(DetectionUpdate::PersonDetected(count));
            }
            Ok(DetectionEvent::PlayAudioTrigger) => {
                info!("Play-audio trigger received");
                {
                    let mut state = self.state.lock().await;
                    state.status.person_detected = false;
                    self.publish(&mut state);
                }
                self.debouncer.fire();
            }
            Ok(DetectionEvent::Unknown) => debug!("Ignoring message: {}", text),
            Err(e) => warn!("Failed to decode detection message: {} ({})", e, text),
        }
    }

    async fn handle_close(self: &Arc<Self>) {
        let mut state = self.state.lock().await;

        let was_connected = state.connection == ConnectionState::Connected;
        state.connection = ConnectionState::Disconnected;
        state.connection_task = None;
        state.status.person_detected = false;

        if was_connected {
            info!("Disconnected from detection service");
            self.notify(DetectionUpdate::ConnectionStatus(false));
        }

        if !state.shutdown {
            let delay = self.config.reconnect_delay;
            if state.reconnect.schedule(delay, Arc::clone(self).connect()) {
                state.status.reconnects += 1;
                info!("Reconnecting to detection service in {:?}", delay);
            }
        }

        self.publish(&mut state);
    }

    async fn disconnect(&self) {
        let mut state = self.state.lock().await;
        self.close(&mut state);
    }

    fn close(&self, state: &mut ClientState) {
        if state.shutdown && state.connection_task.is_none() && !state.reconnect.is_pending() {
            return;
        }

        state.shutdown = true;
        if state.reconnect.cancel() {
            debug!("Cancelled pending reconnect");
        }
        if let Some(task) = state.connection_task.take() {
            task.abort();
        }

        let was_connected = state.connection == ConnectionState::Connected;
        state.connection = ConnectionState::Disconnected;
        state.status.person_detected = false;
        if was_connected {
            self.notify(DetectionUpdate::ConnectionStatus(false));
        }

        self.publish(state);
        info!("Detection client shut down");
    }

    fn notify(&self, update: DetectionUpdate) {
        if self.updates.send(update).is_err() {
            debug!("Detection update receiver dropped");
        }
    }

    fn publish(&self, state: &mut ClientState) {
        state.status.state = state.connection;
        state.status.connected = state.connection == ConnectionState::Connected;
        self.status.send_replace(state.status.clone());
    }
}
