use futures_util::StreamExt;
use reqwest::header::{ACCEPT, HeaderMap, HeaderName, HeaderValue, USER_AGENT};

use crate::config::GeneratorConfig;
use crate::foundation::error::{LiveError, LiveResult};
use crate::stream::transport::{ByteStream, GenerationRequest, GenerationTransport};

const USER_AGENT_VALUE: &str = concat!("wavyte-live/", env!("CARGO_PKG_VERSION"));

/// Longest slice of an error response body kept in the diagnostic.
const MAX_ERROR_BODY: usize = 512;

/// [`GenerationTransport`] that POSTs JSON to an SSE endpoint.
#[derive(Clone, Debug)]
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: String,
    model: Option<String>,
}

impl HttpTransport {
    /// Build a client from a validated configuration.
    pub fn new(config: &GeneratorConfig) -> LiveResult<Self> {
        config.validate()?;
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("text/event-stream"));
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));
        for (name, value) in &config.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| LiveError::validation(format!("header name \"{name}\": {e}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| LiveError::validation(format!("header value for \"{name}\": {e}")))?;
            headers.insert(name, value);
        }

        let mut builder = reqwest::Client::builder()
            .default_headers(headers)
            .connect_timeout(config.connect_timeout());
        if let Some(t) = config.request_timeout() {
            builder = builder.timeout(t);
        }
        let client = builder
            .build()
            .map_err(|e| LiveError::transport(format!("build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.trim().to_owned(),
            model: config.model.clone(),
        })
    }

    /// Target URL.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait::async_trait]
impl GenerationTransport for HttpTransport {
    async fn open(&self, request: &GenerationRequest) -> LiveResult<ByteStream> {
        let body = match (&request.model, &self.model) {
            (None, Some(m)) => request.clone().with_model(Some(m.clone())),
            _ => request.clone(),
        };
        tracing::debug!(endpoint = %self.endpoint, model = ?body.model, "opening generation stream");

        let response = self.client.post(&self.endpoint).json(&body).send().await?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let text = truncate(text.trim(), MAX_ERROR_BODY);
            return Err(LiveError::transport(if text.is_empty() {
                format!("HTTP {status}")
            } else {
                format!("HTTP {status}: {text}")
            }));
        }

        let stream = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(|e| LiveError::transport(format!("read response body: {e}"))));
        Ok(Box::pin(stream))
    }
}

fn truncate(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}
