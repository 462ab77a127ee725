//! Streaming generation: SSE wire format, transports and the request state machine.
//!
//! [`GenerationController`] owns the accumulated source of one request at a time. It never
//! compiles; it hands the growing source to a [`GenerationSink`], which decides its own cadence.

mod controller;
mod event;
mod http;
mod sse;
mod transport;

pub use controller::{CancelHandle, GenerationController, GenerationOutcome, GenerationSink, GenerationState};
pub use event::StreamEvent;
pub use http::HttpTransport;
pub use sse::{SseDecoder, SseFrame};
pub use transport::{ByteStream, GenerationRequest, GenerationTransport};
