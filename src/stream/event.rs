/// One event of the generation stream.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StreamEvent {
    /// An incremental fragment of generated source.
    Delta {
        /// Text to append.
        content: String,
    },
    /// The service failed; terminal.
    Error {
        /// Failure reason.
        content: String,
    },
    /// Generation finished; terminal.
    Done,
}

impl StreamEvent {
    /// Whether this event ends the stream.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Delta { .. })
    }

    /// Encode as one `data: ` wire line, newline included.
    pub fn to_sse_line(&self) -> String {
        // Serializing a tagged enum of strings cannot fail.
        let json = serde_json::to_string(self).unwrap_or_else(|_| "{}".to_owned());
        format!("data: {json}\n")
    }
}
