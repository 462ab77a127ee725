use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};

use bytes::Bytes;
use futures_util::{Stream, StreamExt, stream};
use wavyte_live::stream::ByteStream;
use wavyte_live::{
    GenerationConfig, GenerationController, GenerationOutcome, GenerationRequest, GenerationSink, GenerationState,
    GenerationTransport, LiveResult, LivePreview, PreviewOpts, PreviewStatus, StreamEvent,
};

/// Serves pre-encoded SSE bodies from memory and records whether each body was dropped.
#[derive(Default)]
struct InMemoryTransport {
    bodies: Mutex<Vec<(Vec<String>, bool)>>,
    opened: AtomicUsize,
    aborted: Arc<AtomicBool>,
    last_request: Mutex<Option<GenerationRequest>>,
}

impl InMemoryTransport {
    fn with_body(chunks: Vec<String>, hang: bool) -> Self {
        let t = Self::default();
        t.bodies.lock().unwrap().push((chunks, hang));
        t
    }
}

struct AbortOnDrop {
    inner: ByteStream,
    flag: Arc<AtomicBool>,
}

impl Stream for AbortOnDrop {
    type Item = LiveResult<Bytes>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }
}

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.flag.store(true, Ordering::SeqCst);
    }
}

#[async_trait::async_trait]
impl GenerationTransport for InMemoryTransport {
    async fn open(&self, request: &GenerationRequest) -> LiveResult<ByteStream> {
        self.opened.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().unwrap() = Some(request.clone());
        let (chunks, hang) = self.bodies.lock().unwrap().remove(0);
        let body = stream::iter(chunks.into_iter().map(|c| Ok(Bytes::from(c))));
        let inner: ByteStream = if hang {
            Box::pin(body.chain(stream::pending()))
        } else {
            Box::pin(body)
        };
        Ok(Box::pin(AbortOnDrop {
            inner,
            flag: Arc::clone(&self.aborted),
        }))
    }
}

fn delta(s: &str) -> String {
    StreamEvent::Delta { content: s.to_owned() }.to_sse_line()
}

fn source_as_deltas(src: &str, piece: usize) -> Vec<String> {
    let chars: Vec<char> = src.chars().collect();
    chars.chunks(piece).map(|c| delta(&c.iter().collect::<String>())).collect()
}

const SCENE: &str = r#"```jsx
import { AbsoluteFill, useCurrentFrame, interpolate } from "remotion";

const Badge = ({ label }) => <span className="badge">{label}</span>;

export const Promo = () => {
  const frame = useCurrentFrame();
  const x = interpolate(frame, [0, 30], [-200, 0], { extrapolateRight: "clamp" });
  return (
    <AbsoluteFill style={{ transform: `translateX(${x}px)` }}>
      <Badge label="New" />
      <h2>Spring sale</h2>
    </AbsoluteFill>
  );
};
```"#;

#[tokio::test]
async fn streamed_source_drives_the_live_preview() {
    let mut chunks = source_as_deltas(SCENE, 23);
    chunks.push(StreamEvent::Done.to_sse_line());
    let transport = Arc::new(InMemoryTransport::with_body(chunks, false));
    let controller = GenerationController::new(Arc::clone(&transport));
    let config = GenerationConfig::with_duration(4.0);
    let opts = PreviewOpts {
        compile_interval_ms: 0,
        ..PreviewOpts::default()
    };
    let mut preview = LivePreview::new(&opts, config.frame_count().unwrap()).unwrap();

    let outcome = controller.generate(&config, "a promo badge", &mut preview).await.unwrap();

    assert!(matches!(&outcome, GenerationOutcome::Done { source } if source == SCENE));
    assert_eq!(controller.state(), GenerationState::Done);
    assert_eq!(preview.status(), &PreviewStatus::Live);
    assert_eq!(preview.component().map(|c| c.name()), Some("Promo"));
    assert!(preview.compile_count() > 1);

    let frame = preview.render(30).unwrap().unwrap();
    assert_eq!(frame.text_content(), "NewSpring sale");

    let req = transport.last_request.lock().unwrap().clone().unwrap();
    assert_eq!(req.prompt, "a promo badge");
    assert!(req.system_prompt.contains("120 frames"));
}

struct Counting {
    deltas: usize,
    finishes: usize,
}

impl GenerationSink for Counting {
    fn on_delta(&mut self, _source: &str) {
        self.deltas += 1;
    }

    fn on_finish(&mut self, _outcome: &GenerationOutcome) {
        self.finishes += 1;
    }
}

#[tokio::test]
async fn cancelling_mid_stream_aborts_the_transport() {
    let transport = Arc::new(InMemoryTransport::with_body(vec![delta("A"), delta("B")], true));
    let controller = GenerationController::new(Arc::clone(&transport));
    let cancel = controller.cancel_handle();
    let mut sink = Counting { deltas: 0, finishes: 0 };
    let config = GenerationConfig::default();

    let (outcome, ()) = tokio::join!(
        controller.generate(&config, "p", &mut sink),
        async {
            for _ in 0..8 {
                tokio::task::yield_now().await;
            }
            cancel.cancel();
        }
    );

    let outcome = outcome.unwrap();
    assert!(matches!(&outcome, GenerationOutcome::Cancelled { source } if source == "AB"));
    assert_eq!(sink.deltas, 2);
    assert_eq!(sink.finishes, 0);
    assert!(transport.aborted.load(Ordering::SeqCst));
    assert_eq!(transport.opened.load(Ordering::SeqCst), 1);
    assert_eq!(controller.state(), GenerationState::Cancelled);

    controller.cancel();
    assert_eq!(controller.state(), GenerationState::Cancelled);
}

#[tokio::test]
async fn delta_then_done_yields_ab_and_one_completion() {
    let transport = Arc::new(InMemoryTransport::with_body(
        vec![delta("A"), delta("B"), StreamEvent::Done.to_sse_line()],
        false,
    ));
    let controller = GenerationController::new(Arc::clone(&transport));
    let mut sink = Counting { deltas: 0, finishes: 0 };
    let outcome = controller
        .generate(&GenerationConfig::default(), "p", &mut sink)
        .await
        .unwrap();
    assert_eq!(outcome.source(), "AB");
    assert_eq!((sink.deltas, sink.finishes), (2, 1));
    assert_eq!(controller.source(), "AB");

    let req = transport.last_request.lock().unwrap().clone().unwrap();
    assert_eq!(req.duration_seconds, 10.0);
    assert!(req.system_prompt.contains("300 frames"));
}
