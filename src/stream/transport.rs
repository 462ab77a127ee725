use std::pin::Pin;

use bytes::Bytes;
use futures_util::Stream;

use crate::foundation::error::LiveResult;
use crate::prompt::{GenerationConfig, Preset, ThemeColors};

/// Body of one generation request.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    /// Free-text user prompt.
    pub prompt: String,
    /// Rendered system prompt.
    pub system_prompt: String,
    /// Authoring template.
    pub preset: Preset,
    /// Style key, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    /// Clip length in seconds.
    pub duration_seconds: f64,
    /// Theme palette, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme_colors: Option<ThemeColors>,
    /// Reference media in order.
    #[serde(default)]
    pub media_urls: Vec<String>,
    /// Downstream model identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl GenerationRequest {
    /// Assemble a request from the session config and an already-built system prompt.
    pub fn new(config: &GenerationConfig, prompt: impl Into<String>, system_prompt: String) -> Self {
        Self {
            prompt: prompt.into(),
            system_prompt,
            preset: config.preset,
            style: config.style.clone(),
            duration_seconds: config.duration_seconds,
            theme_colors: config.theme_colors.clone(),
            media_urls: config.media_urls.clone(),
            model: None,
        }
    }

    /// Set the downstream model identifier.
    pub fn with_model(mut self, model: Option<String>) -> Self {
        self.model = model;
        self
    }
}

/// Response body as raw chunks. Dropping it aborts the underlying request.
pub type ByteStream = Pin<Box<dyn Stream<Item = LiveResult<Bytes>> + Send>>;

/// Opens generation requests against some service.
#[async_trait::async_trait]
pub trait GenerationTransport: Send + Sync {
    /// Issue `request` and return the response body once the service accepted it.
    async fn open(&self, request: &GenerationRequest) -> LiveResult<ByteStream>;
}

#[async_trait::async_trait]
impl<T: GenerationTransport + ?Sized> GenerationTransport for std::sync::Arc<T> {
    async fn open(&self, request: &GenerationRequest) -> LiveResult<ByteStream> {
        (**self).open(request).await
    }
}
