use super::backend::{Recognizer, RecognizerError, RecognizerErrorKind, RecognizerEvent};
use super::interpreter::{Intent, Utterance};
use super::status::{RecognitionStatus, FAILURE_TEXT, PROMPT_TEXT};
use crate::session::{RestartPolicy, ScheduledTask, SessionGuard, SessionState, Termination};
use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Configuration for a recognition controller
#[derive(Debug, Clone)]
pub struct RecognitionConfig {
    /// Delay before restarting after a recoverable end.
    /// Short enough to feel continuous, long enough not to starve the
    /// platform recognizer with back-to-back starts.
    pub restart_delay: Duration,

    /// Recognition language tag
    pub lang: String,
}

impl Default for RecognitionConfig {
    fn default() -> Self {
        Self {
            restart_delay: Duration::from_millis(300),
            lang: "ja-JP".to_string(),
        }
    }
}

/// Mutable controller state. Only touched with the `Inner::state` lock held.
#[derive(Debug, Default)]
struct ControllerState {
    session: SessionState,
    should_be_active: bool,
    recognized_text: String,
    last_error: Option<RecognizerErrorKind>,
    restarts: u64,
    restart: ScheduledTask,
}

struct Inner {
    config: RecognitionConfig,
    guard: SessionGuard,
    recognizer: Mutex<Box<dyn Recognizer>>,
    state: Mutex<ControllerState>,
    intents: mpsc::UnboundedSender<Intent>,
    status: watch::Sender<RecognitionStatus>,
}

/// Keeps one continuous recognition session alive over a recognizer that
/// ends on its own.
///
/// Recognizer events are processed one at a time by a pump task, and every
/// state change happens under a single lock, so a terminal event can never
/// interleave with a racing `start()` or `stop()`.
pub struct RecognitionController {
    inner: Arc<Inner>,
    pump: JoinHandle<()>,
}

impl RecognitionController {
    /// Create a controller around `recognizer`.
    ///
    /// Returns the controller and the receiver on which `Affirmative` and
    /// `Negative` intents are delivered. Must be called inside a tokio runtime.
    pub fn new(
        mut recognizer: Box<dyn Recognizer>,
        config: RecognitionConfig,
    ) -> Result<(Self, mpsc::UnboundedReceiver<Intent>)> {
        let mut events = recognizer
            .events()
            .context("Recognizer event stream was already taken")?;

        info!(
            "Creating recognition controller: {} ({})",
            recognizer.name(),
            config.lang
        );

        let (intents_tx, intents_rx) = mpsc::unbounded_channel();
        let (status_tx, _) = watch::channel(RecognitionStatus::default());

        let inner = Arc::new(Inner {
            config,
            guard: SessionGuard::new(),
            recognizer: Mutex::new(recognizer),
            state: Mutex::new(ControllerState::default()),
            intents: intents_tx,
            status: status_tx,
        });

        let pump_inner = Arc::clone(&inner);
        let pump = tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                pump_inner.handle_event(event).await;
            }
            warn!("Recognizer event stream closed");
        });

        Ok((Self { inner, pump }, intents_rx))
    }

    /// Turn voice input on. No-op while an attempt is already in flight.
    pub async fn start(&self) {
        self.inner.start().await;
    }

    /// Turn voice input off and cancel any pending restart.
    pub async fn stop(&self) {
        self.inner.stop().await;
    }

    /// Stop the session and tear down the event pump
    pub async fn shutdown(&self) {
        self.inner.stop().await;
        self.pump.abort();
        info!("Recognition controller shut down");
    }

    /// Current status snapshot
    pub fn status(&self) -> RecognitionStatus {
        self.inner.status.borrow().clone()
    }

    /// Watch status changes
    pub fn subscribe_status(&self) -> watch::Receiver<RecognitionStatus> {
        self.inner.status.subscribe()
    }
}

impl Drop for RecognitionController {
    fn drop(&mut self) {
        self.pump.abort();

        // A pending restart holds `inner` and would otherwise start the
        // recognizer again after the controller is gone
        let in_flight = match self.inner.state.try_lock() {
            Ok(mut state) => {
                state.should_be_active = false;
                state.restart.cancel();
                state.session.is_in_flight()
            }
            Err(_) => true,
        };

        if in_flight {
            if let Ok(handle) = tokio::runtime::Handle::try_current() {
                let inner = Arc::clone(&self.inner);
                handle.spawn(async move { inner.stop().await });
            }
        }
    }
}

impl Inner {
    async fn start(&self) {
        let mut state = self.state.lock().await;

        if !self.guard.try_acquire() {
            if state.session == SessionState::StoppingIntentional {
                // The stopping attempt's terminal event will schedule the restart
                info!("Recognition resumed before previous attempt ended");
                state.should_be_active = true;
                state.recognized_text.clear();
                self.publish(&state);
            } else {
                debug!("Start ignored, attempt in flight ({:?})", state.session);
            }
            return;
        }

        info!("Starting recognition");
        state.should_be_active = true;
        state.recognized_text.clear();
        state.last_error = None;
        state.restart.cancel();
        state.session = SessionState::Starting;
        self.publish(&state);
        drop(state);

        self.begin_attempt().await;
    }

    async fn restart(self: Arc<Self>) {
        let mut state = self.state.lock().await;

        if !state.should_be_active {
            debug!("Restart dropped, recognition no longer wanted");
            return;
        }
        if !self.guard.try_acquire() {
            debug!("Restart dropped, attempt already in flight");
            return;
        }

        state.restarts += 1;
        state.session = SessionState::Starting;
        info!("Restarting recognition (restart #{})", state.restarts);
        self.publish(&state);
        drop(state);

        self.begin_attempt().await;
    }

    /// Ask the recognizer for a new attempt. The guard is already held.
    async fn begin_attempt(&self) {
        let result = {
            let mut recognizer = self.recognizer.lock().await;
            recognizer.start().await
        };

        let mut state = self.state.lock().await;
        match result {
            Ok(()) => debug!("Recognition attempt requested"),
            Err(RecognizerError::AlreadyStarted) => {
                debug!("Recognizer already running, treating as active");
                if state.session == SessionState::Starting {
                    state.session = SessionState::Active;
                }
            }
            Err(e) => {
                error!("Failed to start recognition: {}", e);
                if state.session.is_in_flight() {
                    state.session = SessionState::Idle;
                    self.guard.release();
                }
                state.should_be_active = false;
                state.last_error = Some(RecognizerErrorKind::Other(e.to_string()));
                state.recognized_text = FAILURE_TEXT.to_string();
            }
        }
        self.publish(&state);
    }

    async fn stop(&self) {
        let mut state = self.state.lock().await;

        state.should_be_active = false;
        if state.restart.cancel() {
            debug!("Cancelled pending recognition restart");
        }

        match state.session {
            SessionState::Idle | SessionState::StoppingIntentional => {
                self.publish(&state);
                return;
            }
            SessionState::Starting | SessionState::Active => {
                info!("Stopping recognition");
                state.session = SessionState::StoppingIntentional;
                self.publish(&state);
            }
        }
        drop(state);

        // Waits for an in-flight start to resolve before stopping it
        let result = {
            let mut recognizer = self.recognizer.lock().await;
            recognizer.stop().await
        };

        match result {
            Ok(()) => debug!("Recognition stop requested"),
            Err(RecognizerError::AlreadyStopped) => debug!("Recognizer already stopped"),
            Err(e) => {
                // The attempt is still running after a failed stop
                warn!("Failed to stop recognition: {}", e);
                let mut state = self.state.lock().await;
                if state.session == SessionState::StoppingIntentional {
                    if state.should_be_active {
                        // Resumed while stopping: its terminal event drives the restart
                        state.session = SessionState::Active;
                    } else {
                        state.session = SessionState::Idle;
                        self.guard.release();
                    }
                    self.publish(&state);
                }
            }
        }
    }

    async fn handle_event(self: &Arc<Self>, event: RecognizerEvent) {
        let mut state = self.state.lock().await;

        match event {
            RecognizerEvent::Began => {
                if state.session == SessionState::Starting {
                    state.session = SessionState::Active;
                    info!("Recognition active");
                    self.publish(&state);
                } else {
                    debug!("Ignoring begin event in state {:?}", state.session);
                }
            }
            RecognizerEvent::Result {
                text,
                is_final: false,
            } => {
                if state.should_be_active {
                    state.recognized_text = text;
                    self.publish(&state);
                }
            }
            RecognizerEvent::Result {
                text,
                is_final: true,
            } => self.handle_final(&mut state, Utterance::new(text)),
            terminal @ (RecognizerEvent::Ended | RecognizerEvent::Error(_)) => {
                self.handle_terminal(&mut state, terminal)
            }
        }
    }

    fn handle_final(&self, state: &mut ControllerState, utterance: Utterance) {
        if !state.should_be_active {
            debug!("Dropping result received while paused: {}", utterance.raw_text);
            return;
        }

        let intent = utterance.intent();
        info!("Recognized \"{}\" as {:?}", utterance.raw_text, intent);

        match intent {
            Intent::Unrecognized => state.recognized_text = PROMPT_TEXT.to_string(),
            Intent::Affirmative | Intent::Negative => {
                state.recognized_text = utterance.raw_text;
                if self.intents.send(intent).is_err() {
                    warn!("Intent receiver dropped, discarding {:?}", intent);
                }
            }
        }
        self.publish(state);
    }

    fn handle_terminal(self: &Arc<Self>, state: &mut ControllerState, event: RecognizerEvent) {
        if state.session == SessionState::Idle {
            debug!("Ignoring terminal event with no attempt in flight: {:?}", event);
            return;
        }

        let termination = classify_termination(state.session, state.should_be_active, &event);
        let policy = RestartPolicy::for_termination(termination, self.config.restart_delay);

        state.session = SessionState::Idle;
        self.guard.release();

        match (termination, event) {
            (Termination::Intentional, _) => info!("Recognition stopped"),
            (Termination::Recoverable, event) => debug!("Recognition attempt ended: {:?}", event),
            (Termination::Fatal, event) => {
                error!("Recognition failed, not restarting: {:?}", event);
                if let RecognizerEvent::Error(kind) = event {
                    state.last_error = Some(kind);
                }
                state.should_be_active = false;
                state.recognized_text = FAILURE_TEXT.to_string();
            }
        }

        if policy.should_restart {
            let inner = Arc::clone(self);
            if state.restart.schedule(policy.delay, inner.restart()) {
                debug!("Recognition restart scheduled in {:?}", policy.delay);
            }
        }

        self.publish(state);
    }

    fn publish(&self, state: &ControllerState) {
        self.status.send_replace(RecognitionStatus {
            state: state.session,
            listening: state.should_be_active,
            recognized_text: state.recognized_text.clone(),
            last_error: state.last_error.clone(),
            restarts: state.restarts,
        });
    }
}

/// Decide how an attempt ended.
///
/// An attempt ending while `StoppingIntentional` but wanted again was ended
/// by our own `stop()`, so it restarts whatever the platform reported.
fn classify_termination(
    session: SessionState,
    should_be_active: bool,
    event: &RecognizerEvent,
) -> Termination {
    if !should_be_active {
        return Termination::Intentional;
    }
    if session == SessionState::StoppingIntentional {
        return Termination::Recoverable;
    }
    match event {
        RecognizerEvent::Error(kind) if !kind.is_recoverable() => Termination::Fatal,
        _ => Termination::Recoverable,
    }
}
