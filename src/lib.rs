//! wavyte-live turns streamed model output into a live motion-graphics preview.
//!
//! The pipeline is one-directional:
//!
//! - [`build_system_prompt`] renders the instructions for a [`GenerationConfig`] from the
//!   capabilities in the [`ModuleRegistry`]
//! - a [`GenerationController`] streams source deltas from a [`GenerationTransport`]
//! - [`compile`] turns the accumulated source into a [`Component`] or a diagnostic
//! - a [`LivePreview`] keeps the last good component bound and renders frames from it
//!
//! Compilation is a pure function of the source text and the registry, so recompiling the same
//! string always yields an equivalent component.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod foundation;

pub(crate) mod animation;
pub(crate) mod script;

pub mod compiler;
pub mod config;
pub mod preview;
pub mod prompt;
pub mod registry;
pub mod render;
pub mod stream;

pub use crate::foundation::core::{FRAME_RATE, Fps, VideoConfig, frame_count_for_seconds};
pub use crate::foundation::error::{LiveError, LiveResult};

pub use crate::compiler::{
    CompileError, CompileErrorKind, CompileResult, Component, NO_COMPONENT_MESSAGE, compile, compile_with,
    try_compile,
};
pub use crate::config::{GeneratorConfig, PreviewOpts};
pub use crate::preview::{LivePreview, PreviewStatus};
pub use crate::prompt::{
    GenerationConfig, Preset, STYLES, Style, ThemeColors, build_default_system_prompt, build_system_prompt,
};
pub use crate::registry::{Export, ModuleRegistry, RegistryBuilder};
pub use crate::render::{RenderError, RenderedFrame, RenderedNode};
pub use crate::stream::{
    CancelHandle, GenerationController, GenerationOutcome, GenerationRequest, GenerationSink, GenerationState,
    GenerationTransport, HttpTransport, StreamEvent,
};
