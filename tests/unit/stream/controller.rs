use super::*;
use crate::stream::transport::ByteStream;
use bytes::Bytes;
use futures_util::Stream;
use futures_util::stream;
use std::collections::VecDeque;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::task::{Context, Poll};

struct Script {
    chunks: Vec<LiveResult<&'static str>>,
    hang: bool,
}

fn script(chunks: &[&'static str]) -> Script {
    Script {
        chunks: chunks.iter().map(|c| Ok(*c)).collect(),
        hang: false,
    }
}

struct Tracked {
    inner: ByteStream,
    dropped: Arc<AtomicBool>,
}

impl Stream for Tracked {
    type Item = LiveResult<Bytes>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }
}

impl Drop for Tracked {
    fn drop(&mut self) {
        self.dropped.store(true, Ordering::SeqCst);
    }
}

#[derive(Default)]
struct ScriptedTransport {
    scripts: Mutex<VecDeque<LiveResult<Script>>>,
    requests: Mutex<Vec<GenerationRequest>>,
    aborted: Mutex<Vec<Arc<AtomicBool>>>,
}

impl ScriptedTransport {
    fn push(self, s: LiveResult<Script>) -> Self {
        self.scripts.lock().unwrap().push_back(s);
        self
    }

    fn aborted(&self, i: usize) -> bool {
        self.aborted.lock().unwrap()[i].load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl GenerationTransport for ScriptedTransport {
    async fn open(&self, request: &GenerationRequest) -> LiveResult<ByteStream> {
        self.requests.lock().unwrap().push(request.clone());
        let s = self.scripts.lock().unwrap().pop_front().expect("unscripted request")?;
        let chunks = stream::iter(
            s.chunks
                .into_iter()
                .map(|c| c.map(|c| Bytes::from_static(c.as_bytes())))
                .collect::<Vec<_>>(),
        );
        let inner: ByteStream = if s.hang {
            Box::pin(chunks.chain(stream::pending()))
        } else {
            Box::pin(chunks)
        };
        let dropped = Arc::new(AtomicBool::new(false));
        self.aborted.lock().unwrap().push(Arc::clone(&dropped));
        Ok(Box::pin(Tracked { inner, dropped }))
    }
}

#[derive(Default)]
struct Recorder {
    deltas: Vec<String>,
    finished: Vec<GenerationState>,
    cancel_after: Option<(usize, CancelHandle)>,
}

impl GenerationSink for Recorder {
    fn on_delta(&mut self, source: &str) {
        self.deltas.push(source.to_owned());
        if let Some((n, h)) = &self.cancel_after
            && self.deltas.len() == *n
        {
            h.cancel();
        }
    }

    fn on_finish(&mut self, outcome: &GenerationOutcome) {
        self.finished.push(outcome.state());
    }
}

fn cfg() -> GenerationConfig {
    GenerationConfig::with_duration(10.0)
}

const A: &str = "data: {\"type\":\"delta\",\"content\":\"A\"}\n";
const B: &str = "data: {\"type\":\"delta\",\"content\":\"B\"}\n";
const DONE: &str = "data: {\"type\":\"done\"}\n";

#[tokio::test]
async fn deltas_then_done_accumulate_in_order() {
    let c = GenerationController::new(ScriptedTransport::default().push(Ok(script(&[A, B, DONE]))));
    let mut rec = Recorder::default();
    let out = c.generate(&cfg(), "make it pop", &mut rec).await.unwrap();

    assert!(matches!(&out, GenerationOutcome::Done { source } if source == "AB"));
    assert_eq!(rec.deltas, ["A", "AB"]);
    assert_eq!(rec.finished, [GenerationState::Done]);
    assert_eq!(c.state(), GenerationState::Done);
    assert_eq!(c.source(), "AB");
    assert!(c.transport.aborted(0));
}

#[tokio::test]
async fn request_carries_prompts_and_model() {
    let c = GenerationController::new(ScriptedTransport::default().push(Ok(script(&[DONE]))))
        .with_model(Some("m-1".into()));
    let mut config = cfg();
    config.media_urls = vec!["https://cdn.example/a.png".into()];
    c.generate(&config, "a sunrise", &mut Recorder::default()).await.unwrap();

    let reqs = c.transport.requests.lock().unwrap();
    assert_eq!(reqs[0].prompt, "a sunrise");
    assert_eq!(reqs[0].model.as_deref(), Some("m-1"));
    assert_eq!(reqs[0].media_urls, config.media_urls);
    assert!(reqs[0].system_prompt.contains("300 frames"));
}

#[tokio::test]
async fn frames_split_across_chunks_and_crlf() {
    let c = GenerationController::new(ScriptedTransport::default().push(Ok(script(&[
        "data: {\"type\":\"delta\",\"con",
        "tent\":\"const X\"}\r\n\r\ndata:{\"type\":\"delta\",\"content\":\" = 1\"}\r\n",
    ]))));
    let mut rec = Recorder::default();
    let out = c.generate(&cfg(), "p", &mut rec).await.unwrap();
    assert_eq!(out.source(), "const X = 1");
    assert_eq!(rec.deltas, ["const X", "const X = 1"]);
    assert_eq!(rec.finished, [GenerationState::Done]);
}

#[tokio::test]
async fn malformed_frames_are_skipped() {
    let c = GenerationController::new(ScriptedTransport::default().push(Ok(script(&[
        A,
        "data: not json\n",
        ": comment\n",
        B,
    ]))));
    let mut rec = Recorder::default();
    let out = c.generate(&cfg(), "p", &mut rec).await.unwrap();
    assert_eq!(out.state(), GenerationState::Done);
    assert_eq!(out.source(), "AB");
}

#[tokio::test]
async fn trailing_frame_without_newline_is_flushed() {
    let c = GenerationController::new(
        ScriptedTransport::default().push(Ok(script(&[A, "data: {\"type\":\"delta\",\"content\":\"Z\"}"]))),
    );
    let out = c.generate(&cfg(), "p", &mut Recorder::default()).await.unwrap();
    assert_eq!(out.source(), "AZ");
}

#[tokio::test]
async fn error_event_is_fatal_and_reported_once() {
    let c = GenerationController::new(ScriptedTransport::default().push(Ok(script(&[
        A,
        "data: {\"type\":\"error\",\"content\":\"quota exceeded\"}\n",
        B,
    ]))));
    let mut rec = Recorder::default();
    let out = c.generate(&cfg(), "p", &mut rec).await.unwrap();
    match &out {
        GenerationOutcome::Failed { error, source } => {
            assert!(matches!(error, LiveError::Stream(m) if m == "quota exceeded"));
            assert_eq!(source, "A");
        }
        other => panic!("unexpected outcome {other:?}"),
    }
    assert_eq!(rec.deltas, ["A"]);
    assert_eq!(rec.finished, [GenerationState::Error]);
    assert_eq!(c.state(), GenerationState::Error);
    assert!(c.transport.aborted(0));
}

#[tokio::test]
async fn transport_failures_are_fatal() {
    let t = ScriptedTransport::default()
        .push(Err(LiveError::transport("HTTP 502 Bad Gateway")))
        .push(Ok(Script {
            chunks: vec![Ok(A), Err(LiveError::transport("connection reset"))],
            hang: false,
        }));
    let c = GenerationController::new(t);

    let mut rec = Recorder::default();
    let out = c.generate(&cfg(), "p", &mut rec).await.unwrap();
    assert!(matches!(out, GenerationOutcome::Failed { error: LiveError::Transport(_), .. }));
    assert_eq!(rec.finished, [GenerationState::Error]);

    let mut rec = Recorder::default();
    let out = c.generate(&cfg(), "p", &mut rec).await.unwrap();
    assert!(matches!(&out, GenerationOutcome::Failed { error: LiveError::Transport(m), source } if m == "connection reset" && source == "A"));
    assert_eq!(c.state(), GenerationState::Error);
}

#[tokio::test]
async fn invalid_config_sends_nothing() {
    let c = GenerationController::new(ScriptedTransport::default());
    let err = c
        .generate(&GenerationConfig::with_duration(0.0), "p", &mut Recorder::default())
        .await
        .unwrap_err();
    assert!(matches!(err, LiveError::Validation(_)));
    assert_eq!(c.state(), GenerationState::Idle);
    assert!(c.transport.requests.lock().unwrap().is_empty());
}

#[tokio::test]
async fn cancel_from_callback_suppresses_everything_after() {
    let c = GenerationController::new(ScriptedTransport::default().push(Ok(script(&[
        "data: {\"type\":\"delta\",\"content\":\"A\"}\ndata: {\"type\":\"delta\",\"content\":\"B\"}\ndata: {\"type\":\"done\"}\n",
    ]))));
    let mut rec = Recorder {
        cancel_after: Some((1, c.cancel_handle())),
        ..Recorder::default()
    };
    let out = c.generate(&cfg(), "p", &mut rec).await.unwrap();
    assert!(matches!(&out, GenerationOutcome::Cancelled { source } if source == "A"));
    assert_eq!(rec.deltas, ["A"]);
    assert!(rec.finished.is_empty());
    assert_eq!(c.state(), GenerationState::Cancelled);
    assert!(c.transport.aborted(0));
}

#[tokio::test]
async fn cancel_during_the_flushed_final_frame_is_not_done() {
    let c = GenerationController::new(
        ScriptedTransport::default().push(Ok(script(&["data: {\"type\":\"delta\",\"content\":\"A\"}"]))),
    );
    let mut rec = Recorder {
        cancel_after: Some((1, c.cancel_handle())),
        ..Recorder::default()
    };
    let out = c.generate(&cfg(), "p", &mut rec).await.unwrap();
    assert!(matches!(&out, GenerationOutcome::Cancelled { source } if source == "A"));
    assert_eq!(rec.deltas, ["A"]);
    assert!(rec.finished.is_empty());
    assert_eq!(c.state(), GenerationState::Cancelled);
}

#[tokio::test]
async fn cancel_while_waiting_for_data_aborts_transport() {
    let c = GenerationController::new(ScriptedTransport::default().push(Ok(Script {
        chunks: vec![Ok(A)],
        hang: true,
    })));
    let handle = c.cancel_handle();
    let mut rec = Recorder::default();
    let config = cfg();
    let (out, ()) = tokio::join!(c.generate(&config, "p", &mut rec), async {
        for _ in 0..4 {
            tokio::task::yield_now().await;
        }
        handle.cancel();
    });
    let out = out.unwrap();
    assert_eq!(out.state(), GenerationState::Cancelled);
    assert_eq!(rec.deltas, ["A"]);
    assert!(rec.finished.is_empty());
    assert!(c.transport.aborted(0));

    // Idempotent on a terminal controller.
    c.cancel();
    c.cancel();
    assert_eq!(c.state(), GenerationState::Cancelled);
}

#[tokio::test]
async fn new_generation_cancels_the_previous_one() {
    let t = ScriptedTransport::default()
        .push(Ok(Script {
            chunks: vec![Ok(A)],
            hang: true,
        }))
        .push(Ok(script(&[B, DONE])));
    let c = GenerationController::new(t);
    let mut first = Recorder::default();
    let mut second = Recorder::default();
    let config = cfg();
    let (a, b) = tokio::join!(c.generate(&config, "one", &mut first), async {
        for _ in 0..4 {
            tokio::task::yield_now().await;
        }
        c.generate(&config, "two", &mut second).await
    });

    assert_eq!(a.unwrap().state(), GenerationState::Cancelled);
    assert!(first.finished.is_empty());
    assert_eq!(b.unwrap().source(), "B");
    assert_eq!(second.finished, [GenerationState::Done]);
    assert_eq!(c.state(), GenerationState::Done);
    assert_eq!(c.source(), "B");
    assert!(c.transport.aborted(0));
}

#[tokio::test]
async fn dropping_the_future_counts_as_cancel() {
    let c = GenerationController::new(ScriptedTransport::default().push(Ok(Script {
        chunks: vec![Ok(A)],
        hang: true,
    })));
    let mut rec = Recorder::default();
    let timed = tokio::time::timeout(
        std::time::Duration::from_millis(20),
        c.generate(&cfg(), "p", &mut rec),
    )
    .await;
    assert!(timed.is_err());
    assert_eq!(c.state(), GenerationState::Cancelled);
    assert!(c.transport.aborted(0));
}

#[test]
fn state_helpers() {
    assert!(GenerationState::Streaming.is_active());
    assert!(!GenerationState::Idle.is_terminal());
    assert_eq!(GenerationState::Cancelled.to_string(), "cancelled");
}
