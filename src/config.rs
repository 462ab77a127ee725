//! File-backed configuration for the generation client and the preview host.

use crate::foundation::error::{LiveError, LiveResult};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::time::Duration;

/// Where and how generation requests are sent.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct GeneratorConfig {
    /// Absolute `http(s)` URL of the streaming generation endpoint.
    pub endpoint: String,
    /// Downstream model identifier forwarded in the request body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// TCP connect timeout.
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    /// Overall request timeout, stream included. `None` lets long generations run unbounded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout_ms: Option<u64>,
    /// Extra request headers (e.g. authorization).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
}

fn default_connect_timeout_ms() -> u64 {
    10_000
}

impl GeneratorConfig {
    /// Config for `endpoint` with every other field defaulted.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            model: None,
            connect_timeout_ms: default_connect_timeout_ms(),
            request_timeout_ms: None,
            headers: BTreeMap::new(),
        }
    }

    /// Parse from a JSON reader and validate.
    pub fn from_reader<R: std::io::Read>(r: R) -> LiveResult<Self> {
        let cfg: Self = serde_json::from_reader(r)
            .map_err(|e| LiveError::validation(format!("parse generator config JSON: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Parse from a JSON file on disk and validate.
    pub fn from_path(path: impl AsRef<Path>) -> LiveResult<Self> {
        Self::from_reader(open(path.as_ref(), "generator config")?)
    }

    /// Reject configurations the HTTP client cannot use.
    pub fn validate(&self) -> LiveResult<()> {
        let ep = self.endpoint.trim();
        if !(ep.starts_with("http://") || ep.starts_with("https://")) || ep.len() <= "https://".len() {
            return Err(LiveError::validation(format!(
                "endpoint must be an absolute http(s) URL, got \"{}\"",
                self.endpoint
            )));
        }
        if self.connect_timeout_ms == 0 {
            return Err(LiveError::validation("connectTimeoutMs must be > 0"));
        }
        if self.request_timeout_ms == Some(0) {
            return Err(LiveError::validation("requestTimeoutMs must be > 0 when set"));
        }
        if self.model.as_deref().is_some_and(|m| m.trim().is_empty()) {
            return Err(LiveError::validation("model must not be empty when set"));
        }
        for name in self.headers.keys() {
            if name.is_empty() || !name.bytes().all(|b| b.is_ascii_alphanumeric() || b"-_".contains(&b)) {
                return Err(LiveError::validation(format!("invalid header name \"{name}\"")));
            }
        }
        Ok(())
    }

    /// Connect timeout as a [`Duration`].
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Request timeout as a [`Duration`], if any.
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_ms.map(Duration::from_millis)
    }
}

/// Render-surface settings of a live preview.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct PreviewOpts {
    /// Surface width in pixels.
    pub width: u32,
    /// Surface height in pixels.
    pub height: u32,
    /// Minimum time between two mid-stream recompiles. `0` compiles on every delta.
    pub compile_interval_ms: u64,
}

impl Default for PreviewOpts {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
            compile_interval_ms: 250,
        }
    }
}

impl PreviewOpts {
    /// Parse from a JSON reader and validate.
    pub fn from_reader<R: std::io::Read>(r: R) -> LiveResult<Self> {
        let opts: Self = serde_json::from_reader(r)
            .map_err(|e| LiveError::validation(format!("parse preview options JSON: {e}")))?;
        opts.validate()?;
        Ok(opts)
    }

    /// Parse from a JSON file on disk and validate.
    pub fn from_path(path: impl AsRef<Path>) -> LiveResult<Self> {
        Self::from_reader(open(path.as_ref(), "preview options")?)
    }

    /// Width and height must be non-zero.
    pub fn validate(&self) -> LiveResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(LiveError::validation(format!(
                "preview surface must be non-empty, got {}x{}",
                self.width, self.height
            )));
        }
        Ok(())
    }

    /// Minimum recompile interval as a [`Duration`].
    pub fn compile_interval(&self) -> Duration {
        Duration::from_millis(self.compile_interval_ms)
    }
}

fn open(path: &Path, what: &str) -> LiveResult<BufReader<File>> {
    let f = File::open(path)
        .map_err(|e| LiveError::validation(format!("open {what} '{}': {e}", path.display())))?;
    Ok(BufReader::new(f))
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;
