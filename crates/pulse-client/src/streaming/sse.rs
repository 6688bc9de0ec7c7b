//! Event-stream frame parser
//!
//! The backend emits newline-delimited records of the form
//! `data: {json}\n`. Chunks arriving off the wire can split a record at any
//! byte, so decoding is incremental: bytes accumulate in a carry buffer
//! until a full line is available, then each `data: `-prefixed line is
//! parsed as one JSON record. Parsing the same byte sequence under any
//! chunking produces the same event sequence.

use serde_json::Value;
use tracing::debug;

/// One decoded record from the event stream.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// Incremental assistant text, delivered in arrival order.
    Content(String),
    /// Side-channel thread metadata; never contributes to the text buffer.
    Metadata(Value),
    /// Explicit end of stream. Any sibling fields on the record are ignored.
    Done,
}

const DATA_PREFIX: &str = "data: ";

/// Incremental byte-to-line decoder.
///
/// Handles LF and CRLF endings and carries partial lines across chunk
/// boundaries. Lines that are not valid UTF-8 are dropped.
#[derive(Debug, Default)]
pub struct LineDecoder {
    buf: Vec<u8>,
}

impl LineDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk, returning every line completed by it.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buf.extend_from_slice(chunk);

        let mut lines = Vec::new();
        while let Some(newline) = self.buf.iter().position(|&b| b == b'\n') {
            let mut line: Vec<u8> = self.buf.drain(..=newline).collect();
            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            if let Ok(line) = String::from_utf8(line) {
                lines.push(line);
            }
        }
        lines
    }

    /// Hand back whatever trails the final newline, if anything.
    pub fn take_remainder(&mut self) -> Option<String> {
        if self.buf.is_empty() {
            return None;
        }
        let rest = std::mem::take(&mut self.buf);
        String::from_utf8(rest).ok()
    }
}

/// Parses decoded chunks into [`StreamEvent`]s.
///
/// A record carrying `done: true` terminates the stream immediately; later
/// records in the same chunk are discarded. A `type: "metadata"` record is
/// surfaced as [`StreamEvent::Metadata`]. Everything else delivers its
/// non-empty `content` field. Malformed JSON, keep-alive comments, and
/// blank separator lines are skipped without aborting the stream.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    lines: LineDecoder,
    terminated: bool,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// True once a `done` record has been seen.
    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    /// Feed a chunk of raw bytes, returning the events it completes.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<StreamEvent> {
        if self.terminated {
            return Vec::new();
        }

        let mut events = Vec::new();
        for line in self.lines.push(chunk) {
            if let Some(event) = self.decode_line(&line) {
                let done = event == StreamEvent::Done;
                events.push(event);
                if done {
                    self.terminated = true;
                    break;
                }
            }
        }
        events
    }

    /// Flush the trailing partial line at end of stream. A record cut off
    /// mid-frame parses as malformed JSON and is swallowed like any other
    /// bad line.
    pub fn finish(&mut self) -> Vec<StreamEvent> {
        if self.terminated {
            return Vec::new();
        }
        let Some(rest) = self.lines.take_remainder() else {
            return Vec::new();
        };
        match self.decode_line(&rest) {
            Some(StreamEvent::Done) => {
                self.terminated = true;
                vec![StreamEvent::Done]
            }
            Some(event) => vec![event],
            None => Vec::new(),
        }
    }

    fn decode_line(&self, line: &str) -> Option<StreamEvent> {
        let payload = line.strip_prefix(DATA_PREFIX)?.trim();

        let record: Value = match serde_json::from_str(payload) {
            Ok(record) => record,
            Err(err) => {
                debug!(%err, "discarding malformed stream record");
                return None;
            }
        };

        // Terminal signal wins over any sibling fields on the same record.
        if record.get("done").and_then(Value::as_bool) == Some(true) {
            return Some(StreamEvent::Done);
        }

        if record.get("type").and_then(Value::as_str) == Some("metadata") {
            let payload = record
                .get("threadMetaData")
                .cloned()
                .unwrap_or_else(|| record.clone());
            return Some(StreamEvent::Metadata(payload));
        }

        match record.get("content").and_then(Value::as_str) {
            Some(content) if !content.is_empty() => {
                Some(StreamEvent::Content(content.to_string()))
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_line_decoder_lf() {
        let mut decoder = LineDecoder::new();
        let lines = decoder.push(b"one\ntwo\n");
        assert_eq!(lines, vec!["one", "two"]);
    }

    #[test]
    fn test_line_decoder_crlf() {
        let mut decoder = LineDecoder::new();
        let lines = decoder.push(b"one\r\ntwo\r\n");
        assert_eq!(lines, vec!["one", "two"]);
    }

    #[test]
    fn test_line_decoder_partial_across_chunks() {
        let mut decoder = LineDecoder::new();
        assert!(decoder.push(b"par").is_empty());
        assert_eq!(decoder.push(b"tial\n"), vec!["partial"]);
    }

    #[test]
    fn test_line_decoder_remainder() {
        let mut decoder = LineDecoder::new();
        decoder.push(b"left over");
        assert_eq!(decoder.take_remainder().as_deref(), Some("left over"));
        assert!(decoder.take_remainder().is_none());
    }

    #[test]
    fn test_content_record() {
        let mut decoder = FrameDecoder::new();
        let events = decoder.push(b"data: {\"content\":\"hello\"}\n\n");
        assert_eq!(events, vec![StreamEvent::Content("hello".to_string())]);
    }

    #[test]
    fn test_non_data_lines_ignored() {
        let mut decoder = FrameDecoder::new();
        let events = decoder.push(b": keep-alive\nevent: ping\n\ndata: {\"content\":\"x\"}\n");
        assert_eq!(events, vec![StreamEvent::Content("x".to_string())]);
    }

    #[test]
    fn test_malformed_record_skipped() {
        let mut decoder = FrameDecoder::new();
        let events = decoder.push(b"data: {\"content\":\"a\"}\ndata: not-json\ndata: {\"content\":\"b\"}\n");
        assert_eq!(
            events,
            vec![
                StreamEvent::Content("a".to_string()),
                StreamEvent::Content("b".to_string()),
            ]
        );
    }

    #[test]
    fn test_done_terminates_immediately() {
        let mut decoder = FrameDecoder::new();
        let events =
            decoder.push(b"data: {\"done\":true,\"content\":\"ignored\"}\ndata: {\"content\":\"late\"}\n");
        assert_eq!(events, vec![StreamEvent::Done]);
        assert!(decoder.is_terminated());
        assert!(decoder.push(b"data: {\"content\":\"more\"}\n").is_empty());
    }

    #[test]
    fn test_metadata_record() {
        let mut decoder = FrameDecoder::new();
        let body = json!({"type": "metadata", "threadMetaData": {"complaint_topic": "noise"}});
        let events = decoder.push(format!("data: {body}\n").as_bytes());
        assert_eq!(
            events,
            vec![StreamEvent::Metadata(json!({"complaint_topic": "noise"}))]
        );
    }

    #[test]
    fn test_empty_content_skipped() {
        let mut decoder = FrameDecoder::new();
        assert!(decoder.push(b"data: {\"content\":\"\"}\n").is_empty());
    }

    #[test]
    fn test_record_split_across_chunks() {
        let mut decoder = FrameDecoder::new();
        assert!(decoder.push(b"data: {\"con").is_empty());
        let events = decoder.push(b"tent\":\"joined\"}\n");
        assert_eq!(events, vec![StreamEvent::Content("joined".to_string())]);
    }

    #[test]
    fn test_finish_swallows_cut_frame() {
        let mut decoder = FrameDecoder::new();
        decoder.push(b"data: {\"content\":\"a\"}\ndata: {\"trunc");
        assert!(decoder.finish().is_empty());
    }

    #[test]
    fn test_finish_parses_complete_trailing_record() {
        let mut decoder = FrameDecoder::new();
        decoder.push(b"data: {\"content\":\"tail\"}");
        assert_eq!(
            decoder.finish(),
            vec![StreamEvent::Content("tail".to_string())]
        );
    }
}
