use super::backend::{Recognizer, RecognizerError, RecognizerErrorKind, RecognizerEvent};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio::task::JoinHandle;
use tracing::debug;

type LineSource = Lines<Box<dyn AsyncBufRead + Send + Unpin>>;

/// Recognizer fed by text lines instead of audio.
///
/// Each attempt waits for one line, like a non-continuous speech engine
/// waits for one utterance:
/// - a non-empty line becomes a final result followed by `Ended`
/// - an empty line or `silence_timeout` without input is `NoSpeech`
/// - end of input is `AudioCapture` (the source is gone)
pub struct LineRecognizer {
    name: String,
    lines: Arc<Mutex<LineSource>>,
    silence_timeout: Duration,
    events_tx: mpsc::UnboundedSender<RecognizerEvent>,
    events_rx: Option<mpsc::UnboundedReceiver<RecognizerEvent>>,
    attempt: Option<Attempt>,
}

struct Attempt {
    cancel: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

impl LineRecognizer {
    pub fn new<R>(name: impl Into<String>, reader: R, silence_timeout: Duration) -> Self
    where
        R: AsyncBufRead + Send + Unpin + 'static,
    {
        let reader: Box<dyn AsyncBufRead + Send + Unpin> = Box::new(reader);
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        Self {
            name: name.into(),
            lines: Arc::new(Mutex::new(reader.lines())),
            silence_timeout,
            events_tx,
            events_rx: Some(events_rx),
            attempt: None,
        }
    }

    /// Recognizer reading utterances from standard input
    pub fn stdin(silence_timeout: Duration) -> Self {
        Self::new("stdin", BufReader::new(tokio::io::stdin()), silence_timeout)
    }

    fn is_running(&self) -> bool {
        self.attempt
            .as_ref()
            .is_some_and(|attempt| !attempt.handle.is_finished())
    }
}

#[async_trait::async_trait]
impl Recognizer for LineRecognizer {
    async fn start(&mut self) -> Result<(), RecognizerError> {
        if self.is_running() {
            return Err(RecognizerError::AlreadyStarted);
        }

        let (cancel_tx, cancel_rx) = oneshot::channel();
        let lines = Arc::clone(&self.lines);
        let events = self.events_tx.clone();
        let silence_timeout = self.silence_timeout;

        let handle = tokio::spawn(async move {
            let _ = events.send(RecognizerEvent::Began);

            let terminal = tokio::select! {
                _ = cancel_rx => RecognizerEvent::Ended,
                read = async {
                    let mut lines = lines.lock().await;
                    tokio::time::timeout(silence_timeout, lines.next_line()).await
                } => match read {
                    Ok(Ok(Some(line))) if line.trim().is_empty() => {
                        RecognizerEvent::Error(RecognizerErrorKind::NoSpeech)
                    }
                    Ok(Ok(Some(line))) => {
                        let _ = events.send(RecognizerEvent::Result {
                            text: line.trim().to_string(),
                            is_final: true,
                        });
                        RecognizerEvent::Ended
                    }
                    Ok(Ok(None)) => RecognizerEvent::Error(RecognizerErrorKind::AudioCapture),
                    Ok(Err(e)) => RecognizerEvent::Error(RecognizerErrorKind::Other(e.to_string())),
                    Err(_) => RecognizerEvent::Error(RecognizerErrorKind::NoSpeech),
                },
            };

            debug!("Line recognizer attempt finished: {:?}", terminal);
            let _ = events.send(terminal);
        });

        self.attempt = Some(Attempt {
            cancel: cancel_tx,
            handle,
        });
        Ok(())
    }

    async fn stop(&mut self) -> Result<(), RecognizerError> {
        match self.attempt.take() {
            Some(attempt) if !attempt.handle.is_finished() => attempt
                .cancel
                .send(())
                .map_err(|_| RecognizerError::AlreadyStopped),
            _ => Err(RecognizerError::AlreadyStopped),
        }
    }

    fn events(&mut self) -> Option<mpsc::UnboundedReceiver<RecognizerEvent>> {
        self.events_rx.take()
    }

    fn name(&self) -> &str {
        &self.name
    }
}
