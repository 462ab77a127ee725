use crate::stream::event::StreamEvent;

/// What a single wire line turned out to be.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SseFrame {
    /// A `data:` line with a well-formed event payload.
    Event(StreamEvent),
    /// A `data:` line whose payload is not a valid event; skipped by the controller.
    Malformed {
        /// The payload after the marker.
        payload: String,
        /// Why it failed to decode.
        reason: String,
    },
}

/// Incremental splitter of a byte stream into `data:` frames.
///
/// Chunks may end anywhere, including inside a multi-byte UTF-8 sequence or between `\r` and
/// `\n`; bytes are buffered until a full line is available.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buf: Vec<u8>,
}

impl SseDecoder {
    /// Empty decoder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one chunk and collect every frame completed by it.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<SseFrame> {
        self.buf.extend_from_slice(chunk);
        let mut frames = Vec::new();
        let mut start = 0;
        while let Some(nl) = self.buf[start..].iter().position(|&b| b == b'\n') {
            let end = start + nl;
            if let Some(f) = decode_line(&self.buf[start..end]) {
                frames.push(f);
            }
            start = end + 1;
        }
        self.buf.drain(..start);
        frames
    }

    /// Flush a trailing line that was not newline-terminated.
    pub fn finish(&mut self) -> Option<SseFrame> {
        let rest = std::mem::take(&mut self.buf);
        decode_line(&rest)
    }
}

fn decode_line(raw: &[u8]) -> Option<SseFrame> {
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    let line = String::from_utf8_lossy(raw);
    let payload = line.strip_prefix("data:")?;
    let payload = payload.strip_prefix(' ').unwrap_or(payload);
    if payload.trim().is_empty() {
        return None;
    }
    Some(match serde_json::from_str::<StreamEvent>(payload) {
        Ok(ev) => SseFrame::Event(ev),
        Err(e) => SseFrame::Malformed {
            payload: payload.to_owned(),
            reason: e.to_string(),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn delta(s: &str) -> SseFrame {
        SseFrame::Event(StreamEvent::Delta {
            content: s.to_owned(),
        })
    }

    #[test]
    fn splits_lines_across_chunks() {
        let mut d = SseDecoder::new();
        assert!(d.feed(b"data: {\"type\":\"delta\",\"con").is_empty());
        assert_eq!(d.feed(b"tent\":\"A\"}\ndata: {\"type\":\"done\"}\n"), vec![
            delta("A"),
            SseFrame::Event(StreamEvent::Done)
        ]);
    }

    #[test]
    fn ignores_non_data_lines_and_accepts_crlf() {
        let mut d = SseDecoder::new();
        let frames = d.feed(b": keepalive\r\nevent: message\r\ndata:{\"type\":\"delta\",\"content\":\"x\"}\r\n\r\n");
        assert_eq!(frames, vec![delta("x")]);
    }

    #[test]
    fn utf8_split_inside_a_character_is_reassembled() {
        let line = "data: {\"type\":\"delta\",\"content\":\"é→\"}\n".as_bytes();
        let split = line.iter().position(|&b| b == 0xC3).unwrap() + 1;
        let mut d = SseDecoder::new();
        assert!(d.feed(&line[..split]).is_empty());
        assert_eq!(d.feed(&line[split..]), vec![delta("é→")]);
    }

    #[test]
    fn malformed_payloads_are_reported_not_fatal() {
        let mut d = SseDecoder::new();
        let frames = d.feed(b"data: {oops\ndata: {\"type\":\"delta\",\"content\":\"ok\"}\n");
        assert!(matches!(&frames[0], SseFrame::Malformed { payload, .. } if payload == "{oops"));
        assert_eq!(frames[1], delta("ok"));
    }

    #[test]
    fn unknown_event_types_are_malformed() {
        let mut d = SseDecoder::new();
        let frames = d.feed(b"data: {\"type\":\"ping\"}\n");
        assert!(matches!(frames[0], SseFrame::Malformed { .. }));
    }

    #[test]
    fn finish_flushes_unterminated_line() {
        let mut d = SseDecoder::new();
        assert!(d.feed(b"data: {\"type\":\"done\"}").is_empty());
        assert_eq!(d.finish(), Some(SseFrame::Event(StreamEvent::Done)));
        assert_eq!(d.finish(), None);
    }
}
