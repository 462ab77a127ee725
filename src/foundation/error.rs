/// Convenience result type used across wavyte-live.
pub type LiveResult<T> = Result<T, LiveError>;

/// Top-level error taxonomy used by the prompt, registry and generation APIs.
///
/// Compilation failures are deliberately not part of this enum: the compiler reports them as
/// diagnostics inside [`crate::CompileResult`] and never returns an `Err`.
#[derive(thiserror::Error, Debug)]
pub enum LiveError {
    /// Invalid user-provided configuration or input data.
    #[error("validation error: {0}")]
    Validation(String),

    /// Module registry construction failed (e.g. duplicate export names).
    #[error("registry error: {0}")]
    Registry(String),

    /// Network or connection failure while talking to the generation service.
    #[error("transport error: {0}")]
    Transport(String),

    /// The generation service reported an explicit `error` event.
    #[error("stream error: {0}")]
    Stream(String),

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl LiveError {
    /// Build a [`LiveError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`LiveError::Registry`] value.
    pub fn registry(msg: impl Into<String>) -> Self {
        Self::Registry(msg.into())
    }

    /// Build a [`LiveError::Transport`] value.
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Build a [`LiveError::Stream`] value.
    pub fn stream(msg: impl Into<String>) -> Self {
        Self::Stream(msg.into())
    }

    /// Build a [`LiveError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

impl From<reqwest::Error> for LiveError {
    fn from(e: reqwest::Error) -> Self {
        Self::Transport(e.to_string())
    }
}

impl From<serde_json::Error> for LiveError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serde(e.to_string())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
