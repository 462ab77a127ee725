use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use futures_util::StreamExt;
use tokio::sync::watch;

use crate::foundation::error::{LiveError, LiveResult};
use crate::prompt::{GenerationConfig, build_system_prompt};
use crate::registry::ModuleRegistry;
use crate::stream::event::StreamEvent;
use crate::stream::sse::{SseDecoder, SseFrame};
use crate::stream::transport::{GenerationRequest, GenerationTransport};

/// Where a controller is in its request lifecycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum GenerationState {
    /// Nothing started yet.
    #[default]
    Idle,
    /// Request sent, no body bytes yet.
    Requesting,
    /// Receiving deltas.
    Streaming,
    /// Finished normally.
    Done,
    /// Stream or transport failure.
    Error,
    /// Stopped by the caller or superseded by a newer generation.
    Cancelled,
}

impl GenerationState {
    /// Whether a request is in flight.
    pub fn is_active(self) -> bool {
        matches!(self, Self::Requesting | Self::Streaming)
    }

    /// Whether the lifecycle has ended.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Error | Self::Cancelled)
    }

    /// Lowercase name for logs and CLI output.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Requesting => "requesting",
            Self::Streaming => "streaming",
            Self::Done => "done",
            Self::Error => "error",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for GenerationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How one generation ended. Each variant carries the source accumulated up to that point.
#[derive(Debug)]
pub enum GenerationOutcome {
    /// `done` event or natural end of stream.
    Done {
        /// Full generated source.
        source: String,
    },
    /// Explicit `error` event ([`LiveError::Stream`]) or transport failure
    /// ([`LiveError::Transport`]).
    Failed {
        /// Failure reason.
        error: LiveError,
        /// Partial source received before the failure.
        source: String,
    },
    /// Cancelled by the caller or by a newer generation.
    Cancelled {
        /// Partial source received before cancellation.
        source: String,
    },
}

impl GenerationOutcome {
    /// Accumulated source.
    pub fn source(&self) -> &str {
        match self {
            Self::Done { source } | Self::Failed { source, .. } | Self::Cancelled { source } => source,
        }
    }

    /// Terminal state this outcome corresponds to.
    pub fn state(&self) -> GenerationState {
        match self {
            Self::Done { .. } => GenerationState::Done,
            Self::Failed { .. } => GenerationState::Error,
            Self::Cancelled { .. } => GenerationState::Cancelled,
        }
    }
}

/// Receives the accumulated source as it grows.
///
/// Callbacks run inline on the task driving [`GenerationController::generate`]; after a
/// cancellation no callback is invoked at all, `on_finish` included.
pub trait GenerationSink {
    /// Called after every delta with the full source accumulated so far.
    fn on_delta(&mut self, source: &str);

    /// Called once when the generation ends in [`GenerationOutcome::Done`] or
    /// [`GenerationOutcome::Failed`].
    fn on_finish(&mut self, outcome: &GenerationOutcome) {
        let _ = outcome;
    }
}

impl<S: GenerationSink + ?Sized> GenerationSink for &mut S {
    fn on_delta(&mut self, source: &str) {
        (**self).on_delta(source);
    }

    fn on_finish(&mut self, outcome: &GenerationOutcome) {
        (**self).on_finish(outcome);
    }
}

#[derive(Debug, Default)]
struct Shared {
    state: GenerationState,
    source: String,
    generation: u64,
    cancel: Option<watch::Sender<bool>>,
}

impl Shared {
    fn cancel_active(&mut self) -> bool {
        let Some(tx) = self.cancel.take() else {
            return false;
        };
        let _ = tx.send(true);
        if self.state.is_active() {
            self.state = GenerationState::Cancelled;
        }
        true
    }
}

fn lock(shared: &Mutex<Shared>) -> MutexGuard<'_, Shared> {
    // A panicking sink must not wedge cancellation.
    shared.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Cloneable handle that cancels whatever generation is in flight on its controller.
#[derive(Clone, Debug)]
pub struct CancelHandle {
    shared: Arc<Mutex<Shared>>,
}

impl CancelHandle {
    /// Cancel the active generation. No-op when nothing is in flight.
    pub fn cancel(&self) {
        if lock(&self.shared).cancel_active() {
            tracing::debug!("generation cancelled");
        }
    }
}

/// Drives one generation request at a time from prompt to terminal state.
pub struct GenerationController<T> {
    transport: T,
    registry: Arc<ModuleRegistry>,
    model: Option<String>,
    shared: Arc<Mutex<Shared>>,
}

impl<T: GenerationTransport> GenerationController<T> {
    /// Controller over `transport` with the standard registry.
    pub fn new(transport: T) -> Self {
        Self::with_registry(transport, Arc::new(ModuleRegistry::global().clone()))
    }

    /// Controller whose system prompts advertise `registry`.
    pub fn with_registry(transport: T, registry: Arc<ModuleRegistry>) -> Self {
        Self {
            transport,
            registry,
            model: None,
            shared: Arc::new(Mutex::new(Shared::default())),
        }
    }

    /// Downstream model identifier sent with every request.
    pub fn with_model(mut self, model: Option<String>) -> Self {
        self.model = model;
        self
    }

    /// Current lifecycle state.
    pub fn state(&self) -> GenerationState {
        lock(&self.shared).state
    }

    /// Source accumulated by the latest generation.
    pub fn source(&self) -> String {
        lock(&self.shared).source.clone()
    }

    /// Handle usable from other tasks or from inside a sink callback.
    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Cancel the active generation. Idempotent.
    pub fn cancel(&self) {
        self.cancel_handle().cancel();
    }

    /// Run one generation to completion, feeding `sink` along the way.
    ///
    /// A generation already in flight on this controller is cancelled first. The only `Err` is a
    /// configuration rejected by the prompt builder, in which case nothing was sent; every later
    /// failure is reported as [`GenerationOutcome::Failed`]. Dropping the returned future aborts
    /// the request and leaves the controller `Cancelled`.
    #[tracing::instrument(skip_all, fields(preset = %config.preset))]
    pub async fn generate<S: GenerationSink>(
        &self,
        config: &GenerationConfig,
        prompt: &str,
        sink: &mut S,
    ) -> LiveResult<GenerationOutcome> {
        let system_prompt = build_system_prompt(config, &self.registry)?;
        let request = GenerationRequest::new(config, prompt, system_prompt).with_model(self.model.clone());

        let (tx, mut rx) = watch::channel(false);
        let id = {
            let mut shared = lock(&self.shared);
            if shared.cancel_active() {
                tracing::debug!("superseding generation in flight");
            }
            shared.generation += 1;
            shared.state = GenerationState::Requesting;
            shared.source.clear();
            shared.cancel = Some(tx);
            shared.generation
        };
        let mut run = Run {
            shared: &self.shared,
            id,
            source: String::new(),
            finished: false,
        };
        tracing::debug!(generation = id, "requesting");

        let opened = tokio::select! {
            biased;
            _ = cancelled(&mut rx) => return Ok(run.cancelled()),
            opened = self.transport.open(&request) => opened,
        };
        let mut body = match opened {
            Ok(body) => body,
            Err(e) => return Ok(run.fail(e, sink)),
        };

        let mut decoder = SseDecoder::new();
        loop {
            let next = tokio::select! {
                biased;
                _ = cancelled(&mut rx) => return Ok(run.cancelled()),
                next = body.next() => next,
            };
            let (frames, end) = match next {
                Some(Ok(chunk)) => {
                    run.streaming();
                    (decoder.feed(&chunk), false)
                }
                Some(Err(e)) => return Ok(run.fail(e, sink)),
                None => (decoder.finish().into_iter().collect(), true),
            };
            for frame in frames {
                if *rx.borrow() {
                    return Ok(run.cancelled());
                }
                match frame {
                    SseFrame::Event(StreamEvent::Delta { content }) => run.delta(&content, sink),
                    SseFrame::Event(StreamEvent::Error { content }) => {
                        return Ok(run.fail(LiveError::stream(content), sink));
                    }
                    SseFrame::Event(StreamEvent::Done) => return Ok(run.done(sink)),
                    SseFrame::Malformed { payload, reason } => {
                        tracing::warn!(%reason, payload = %payload, "skipping malformed stream frame");
                    }
                }
            }
            // A sink may cancel while handling the final frames.
            if *rx.borrow() {
                return Ok(run.cancelled());
            }
            if end {
                return Ok(run.done(sink));
            }
        }
    }
}

async fn cancelled(rx: &mut watch::Receiver<bool>) {
    // A closed channel means the sender was taken by a canceller.
    let _ = rx.wait_for(|&c| c).await;
}

/// Bookkeeping for one generation. Writes to shared state only while this run is current.
struct Run<'a> {
    shared: &'a Mutex<Shared>,
    id: u64,
    source: String,
    finished: bool,
}

impl Run<'_> {
    fn update(&self, f: impl FnOnce(&mut Shared)) {
        let mut shared = lock(self.shared);
        if shared.generation == self.id {
            f(&mut shared);
        }
    }

    fn streaming(&self) {
        self.update(|s| {
            if s.state == GenerationState::Requesting {
                s.state = GenerationState::Streaming;
            }
        });
    }

    fn delta(&mut self, content: &str, sink: &mut impl GenerationSink) {
        self.source.push_str(content);
        self.update(|s| s.source.push_str(content));
        sink.on_delta(&self.source);
    }

    fn finish(&mut self, state: GenerationState) {
        self.finished = true;
        self.update(|s| {
            // A cancel that raced the final frame wins.
            if s.state.is_active() {
                s.state = state;
            }
            s.cancel = None;
        });
    }

    fn done(&mut self, sink: &mut impl GenerationSink) -> GenerationOutcome {
        self.finish(GenerationState::Done);
        tracing::debug!(generation = self.id, len = self.source.len(), "generation done");
        let outcome = GenerationOutcome::Done {
            source: std::mem::take(&mut self.source),
        };
        sink.on_finish(&outcome);
        outcome
    }

    fn fail(&mut self, error: LiveError, sink: &mut impl GenerationSink) -> GenerationOutcome {
        self.finish(GenerationState::Error);
        tracing::warn!(generation = self.id, %error, "generation failed");
        let outcome = GenerationOutcome::Failed {
            error,
            source: std::mem::take(&mut self.source),
        };
        sink.on_finish(&outcome);
        outcome
    }

    fn cancelled(&mut self) -> GenerationOutcome {
        self.finish(GenerationState::Cancelled);
        tracing::debug!(generation = self.id, "generation cancelled");
        GenerationOutcome::Cancelled {
            source: std::mem::take(&mut self.source),
        }
    }
}

impl Drop for Run<'_> {
    fn drop(&mut self) {
        if !self.finished {
            self.update(|s| {
                s.cancel = None;
                if s.state.is_active() {
                    s.state = GenerationState::Cancelled;
                }
            });
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/stream/controller.rs"]
mod tests;
