//! Legacy raw-text sentinel protocol
//!
//! Before task streaming, the backend streamed plain assistant text over
//! `POST /chat/stream` and embedded control markers directly in the text:
//! `[STREAM_END]` closed the stream, `[ERROR]:` prefixed a failure reason.
//! The framing is incompatible with the SSE protocol (the markers can occur
//! inside legitimate JSON content), so this decoder shares no code with
//! [`super::FrameDecoder`] and is only reachable behind
//! `ClientConfig::legacy_sentinel`.

/// One decoded item from a sentinel stream.
#[derive(Debug, Clone, PartialEq)]
pub enum SentinelEvent {
    /// Plain assistant text.
    Content(String),
    /// `[STREAM_END]` marker; text before it has already been delivered.
    End,
    /// `[ERROR]:` marker with the trailing text as the reason.
    Error(String),
}

const END_MARKER: &str = "[STREAM_END]";
const ERROR_MARKER: &str = "[ERROR]:";

/// Incremental scanner over the raw text stream.
///
/// Text is held back by at most one marker length so a marker split across
/// chunk boundaries is still recognized; incomplete trailing UTF-8 is
/// carried until its continuation bytes arrive.
#[derive(Debug, Default)]
pub struct SentinelDecoder {
    pending: Vec<u8>,
    text: String,
    terminated: bool,
}

impl SentinelDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    /// Feed a chunk of raw bytes, returning the events it completes.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<SentinelEvent> {
        if self.terminated {
            return Vec::new();
        }

        self.pending.extend_from_slice(chunk);
        self.drain_valid_utf8();
        self.scan()
    }

    /// Flush held-back text at end of stream.
    pub fn finish(&mut self) -> Vec<SentinelEvent> {
        if self.terminated || self.text.is_empty() {
            return Vec::new();
        }
        let rest = std::mem::take(&mut self.text);
        vec![SentinelEvent::Content(rest)]
    }

    /// Move the valid UTF-8 content of `pending` into `text`. An
    /// incomplete trailing sequence is kept for the next chunk; invalid
    /// bytes are dropped.
    fn drain_valid_utf8(&mut self) {
        loop {
            match std::str::from_utf8(&self.pending) {
                Ok(s) => {
                    self.text.push_str(s);
                    self.pending.clear();
                    return;
                }
                Err(err) => {
                    let valid_len = err.valid_up_to();
                    if valid_len > 0 {
                        let rest = self.pending.split_off(valid_len);
                        let valid = std::mem::replace(&mut self.pending, rest);
                        if let Ok(s) = String::from_utf8(valid) {
                            self.text.push_str(&s);
                        }
                    }
                    match err.error_len() {
                        Some(bad) => {
                            self.pending.drain(..bad);
                        }
                        None => return,
                    }
                }
            }
        }
    }

    fn scan(&mut self) -> Vec<SentinelEvent> {
        let mut events = Vec::new();

        // End marker takes precedence over the error marker, as in the
        // original client.
        if let Some(at) = self.text.find(END_MARKER) {
            let before: String = self.text.drain(..at).collect();
            if !before.is_empty() {
                events.push(SentinelEvent::Content(before));
            }
            self.terminated = true;
            self.text.clear();
            events.push(SentinelEvent::End);
            return events;
        }

        if let Some(at) = self.text.find(ERROR_MARKER) {
            let tail = self.text.split_off(at + ERROR_MARKER.len());
            let reason = tail.trim().to_string();
            let reason = if reason.is_empty() {
                "Unknown error".to_string()
            } else {
                reason
            };
            self.terminated = true;
            self.text.clear();
            events.push(SentinelEvent::Error(reason));
            return events;
        }

        // Keep one marker length back in case a marker straddles chunks.
        let keep = END_MARKER.len().max(ERROR_MARKER.len()) - 1;
        if self.text.len() > keep {
            let cut = floor_char_boundary(&self.text, self.text.len() - keep);
            if cut > 0 {
                let emit: String = self.text.drain(..cut).collect();
                events.push(SentinelEvent::Content(emit));
            }
        }
        events
    }
}

/// Largest char boundary at or below `index`.
fn floor_char_boundary(s: &str, index: usize) -> usize {
    let mut index = index.min(s.len());
    while index > 0 && !s.is_char_boundary(index) {
        index -= 1;
    }
    index
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(decoder: &mut SentinelDecoder, chunks: &[&str]) -> Vec<SentinelEvent> {
        let mut events = Vec::new();
        for chunk in chunks {
            events.extend(decoder.push(chunk.as_bytes()));
        }
        events.extend(decoder.finish());
        events
    }

    fn joined_content(events: &[SentinelEvent]) -> String {
        events
            .iter()
            .filter_map(|event| match event {
                SentinelEvent::Content(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_plain_text_flushes_on_finish() {
        let mut decoder = SentinelDecoder::new();
        let events = collect(&mut decoder, &["Hello, world"]);
        assert_eq!(joined_content(&events), "Hello, world");
    }

    #[test]
    fn test_end_marker_delivers_preceding_text() {
        let mut decoder = SentinelDecoder::new();
        let events = collect(&mut decoder, &["Hello[STREAM_END]"]);
        assert_eq!(joined_content(&events), "Hello");
        assert_eq!(events.last(), Some(&SentinelEvent::End));
    }

    #[test]
    fn test_end_marker_split_across_chunks() {
        let mut decoder = SentinelDecoder::new();
        let events = collect(&mut decoder, &["Hi[STREAM", "_END]"]);
        assert_eq!(joined_content(&events), "Hi");
        assert!(events.contains(&SentinelEvent::End));
    }

    #[test]
    fn test_text_after_end_marker_dropped() {
        let mut decoder = SentinelDecoder::new();
        let events = collect(&mut decoder, &["a[STREAM_END]ignored"]);
        assert_eq!(joined_content(&events), "a");
    }

    #[test]
    fn test_error_marker() {
        let mut decoder = SentinelDecoder::new();
        let events = collect(&mut decoder, &["[ERROR]: backend exploded"]);
        assert_eq!(
            events,
            vec![SentinelEvent::Error("backend exploded".to_string())]
        );
    }

    #[test]
    fn test_error_marker_without_reason() {
        let mut decoder = SentinelDecoder::new();
        let events = collect(&mut decoder, &["[ERROR]:"]);
        assert_eq!(events, vec![SentinelEvent::Error("Unknown error".to_string())]);
    }

    #[test]
    fn test_long_text_streams_incrementally() {
        let mut decoder = SentinelDecoder::new();
        let first = decoder.push("a long opening chunk of assistant text".as_bytes());
        assert!(!joined_content(&first).is_empty());
    }

    #[test]
    fn test_multibyte_split_across_chunks() {
        let mut decoder = SentinelDecoder::new();
        let bytes = "你好[STREAM_END]".as_bytes();
        let mut events = Vec::new();
        // Split inside the second multibyte character.
        events.extend(decoder.push(&bytes[..4]));
        events.extend(decoder.push(&bytes[4..]));
        events.extend(decoder.finish());
        assert_eq!(joined_content(&events), "你好");
        assert!(events.contains(&SentinelEvent::End));
    }
}
