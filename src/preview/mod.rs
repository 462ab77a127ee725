//! Host side of the live loop: recompiles growing source and holds the component being shown.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::compiler::{Component, compile_with};
use crate::config::PreviewOpts;
use crate::foundation::core::VideoConfig;
use crate::foundation::error::LiveResult;
use crate::registry::ModuleRegistry;
use crate::render::{RenderError, RenderedFrame};
use crate::stream::{GenerationOutcome, GenerationSink};

/// What the preview surface should display.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PreviewStatus {
    /// No valid component yet and more source may still arrive. Shown as a neutral placeholder.
    Placeholder,
    /// A component is bound and renders.
    Live,
    /// Generation ended and nothing valid was produced; the message is meant for the user.
    Failed(String),
}

/// Live preview bound to one render surface.
///
/// The bound component changes only when a compile succeeds, so a transiently broken source in
/// the middle of a stream keeps the last good frame on screen.
pub struct LivePreview {
    registry: Arc<ModuleRegistry>,
    surface: VideoConfig,
    interval: Duration,
    component: Option<Component>,
    diagnostic: Option<String>,
    status: PreviewStatus,
    last_compile: Option<Instant>,
    last_source: Option<String>,
    compiles: u64,
}

impl LivePreview {
    /// Preview over the standard registry.
    pub fn new(opts: &PreviewOpts, duration_in_frames: u64) -> LiveResult<Self> {
        Self::with_registry(opts, duration_in_frames, Arc::new(ModuleRegistry::global().clone()))
    }

    /// Preview compiling against `registry`.
    pub fn with_registry(
        opts: &PreviewOpts,
        duration_in_frames: u64,
        registry: Arc<ModuleRegistry>,
    ) -> LiveResult<Self> {
        opts.validate()?;
        Ok(Self {
            registry,
            surface: VideoConfig::new(opts.width, opts.height, duration_in_frames)?,
            interval: opts.compile_interval(),
            component: None,
            diagnostic: None,
            status: PreviewStatus::Placeholder,
            last_compile: None,
            last_source: None,
            compiles: 0,
        })
    }

    /// Surface the component is rendered into.
    pub fn surface(&self) -> &VideoConfig {
        &self.surface
    }

    /// Component currently bound, if any.
    pub fn component(&self) -> Option<&Component> {
        self.component.as_ref()
    }

    /// Diagnostic of the most recent failed compile or stream failure, cleared by a success.
    pub fn diagnostic(&self) -> Option<&str> {
        self.diagnostic.as_deref()
    }

    /// Current display status.
    pub fn status(&self) -> &PreviewStatus {
        &self.status
    }

    /// Number of compiles run so far.
    pub fn compile_count(&self) -> u64 {
        self.compiles
    }

    /// Forget everything and show the placeholder again.
    pub fn reset(&mut self) {
        self.component = None;
        self.diagnostic = None;
        self.status = PreviewStatus::Placeholder;
        self.last_compile = None;
        self.last_source = None;
    }

    /// Compile `source` now, ignoring the throttle. Returns whether a component is bound afterwards.
    pub fn update(&mut self, source: &str) -> bool {
        if self.last_source.as_deref() != Some(source) {
            self.compile(source);
        }
        self.component.is_some()
    }

    /// Render the bound component at `frame`; `None` while showing the placeholder or a failure.
    pub fn render(&self, frame: u64) -> Option<Result<RenderedFrame, RenderError>> {
        self.component.as_ref().map(|c| c.render(frame, &self.surface))
    }

    fn compile(&mut self, source: &str) {
        self.compiles += 1;
        self.last_compile = Some(Instant::now());
        self.last_source = Some(source.to_owned());

        let result = compile_with(source, &self.registry);
        if let Some(component) = result.component {
            tracing::debug!(component = component.name(), "preview swapped component");
            self.component = Some(component);
            self.diagnostic = None;
            self.status = PreviewStatus::Live;
        } else {
            self.diagnostic = result.error;
        }
    }

    fn throttled(&self) -> bool {
        self.last_compile.is_some_and(|t| t.elapsed() < self.interval)
    }
}

impl GenerationSink for LivePreview {
    fn on_delta(&mut self, source: &str) {
        if !self.throttled() {
            self.update(source);
        }
    }

    fn on_finish(&mut self, outcome: &GenerationOutcome) {
        self.update(outcome.source());
        if self.component.is_some() {
            if let GenerationOutcome::Failed { error, .. } = outcome {
                self.diagnostic = Some(error.to_string());
            }
            return;
        }
        let message = match outcome {
            GenerationOutcome::Failed { error, .. } => error.to_string(),
            _ => self
                .diagnostic
                .clone()
                .unwrap_or_else(|| "Generation finished without producing any code.".to_owned()),
        };
        self.diagnostic = Some(message.clone());
        self.status = PreviewStatus::Failed(message);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/preview/mod.rs"]
mod tests;
