//! Line-buffering decoder for the recognizer's stdout stream
//!
//! The recognizer writes one JSON object per line, but the pipe delivers
//! bytes in arbitrary chunks: a read can end mid-line or even mid-way
//! through a multi-byte UTF-8 sequence. The decoder therefore buffers raw
//! bytes and only decodes text once a full line is available. Malformed
//! lines are dropped rather than aborting the stream; a single garbled
//! line must never take down a live session. Dropped lines are counted so
//! callers can surface the number diagnostically.

use serde::{Deserialize, Serialize};

/// One decoded JSON record from the recognizer stream
///
/// The recognizer emits one kind of payload per line in practice, but the
/// fields are advisory rather than mutually exclusive by contract.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RecognitionEvent {
    /// Final recognized utterance
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    /// In-progress partial hypothesis
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partial: Option<String>,

    /// Informational message from the recognizer
    #[serde(skip_serializing_if = "Option::is_none")]
    pub info: Option<String>,

    /// Error reported by the recognizer itself
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Buffering decoder that turns byte chunks into [`RecognitionEvent`]s
///
/// Owned exclusively by one session. Feed chunks with [`push`], then call
/// [`finish`] exactly once when the stream ends to flush a trailing
/// unterminated line.
///
/// [`push`]: LineEventDecoder::push
/// [`finish`]: LineEventDecoder::finish
#[derive(Debug, Default)]
pub struct LineEventDecoder {
    /// Bytes not yet resolved into a complete line
    buffer: Vec<u8>,
    /// Lines that failed JSON parsing and were dropped
    malformed_lines: u64,
}

impl LineEventDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume one chunk of stream bytes and return the events completed by it
    ///
    /// Events are returned in line order. An empty chunk is a no-op.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<RecognitionEvent> {
        if chunk.is_empty() {
            return Vec::new();
        }
        self.buffer.extend_from_slice(chunk);

        let mut events = Vec::new();
        // Everything up to the last newline is complete lines; the tail
        // stays buffered until a later chunk (or finish) resolves it.
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            if let Some(event) = self.parse_line(&line[..pos]) {
                events.push(event);
            }
        }
        events
    }

    /// Flush the decoder at end of stream
    ///
    /// A trailing line without a terminating newline gets one parse
    /// attempt; if it fails the bytes are discarded like any malformed
    /// line. The decoder is empty afterwards.
    pub fn finish(&mut self) -> Option<RecognitionEvent> {
        let rest = std::mem::take(&mut self.buffer);
        self.parse_line(&rest)
    }

    /// Number of lines dropped because they failed JSON parsing
    pub fn malformed_lines(&self) -> u64 {
        self.malformed_lines
    }

    fn parse_line(&mut self, raw: &[u8]) -> Option<RecognitionEvent> {
        let text = String::from_utf8_lossy(raw);
        let line = text.trim();
        if line.is_empty() {
            return None;
        }
        match serde_json::from_str(line) {
            Ok(event) => Some(event),
            Err(err) => {
                // A bad line must not kill the stream. Count, log, move on.
                self.malformed_lines += 1;
                tracing::trace!("Dropping malformed recognizer line: {} ({:?})", err, line);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(msg: &str) -> RecognitionEvent {
        RecognitionEvent {
            info: Some(msg.to_string()),
            ..Default::default()
        }
    }

    fn partial(msg: &str) -> RecognitionEvent {
        RecognitionEvent {
            partial: Some(msg.to_string()),
            ..Default::default()
        }
    }

    /// Decode an input under every possible two-way split point
    fn decode_all_splits(input: &[u8]) -> Vec<Vec<RecognitionEvent>> {
        (0..=input.len())
            .map(|split| {
                let mut decoder = LineEventDecoder::new();
                let mut events = decoder.push(&input[..split]);
                events.extend(decoder.push(&input[split..]));
                events.extend(decoder.finish());
                events
            })
            .collect()
    }

    #[test]
    fn chunking_invariance() {
        let input = b"{\"info\":\"start\"}\n{\"partial\":\"he\"}\n{\"text\":\"hello\"}\n";
        let expected = {
            let mut decoder = LineEventDecoder::new();
            let mut events = decoder.push(input);
            events.extend(decoder.finish());
            events
        };
        assert_eq!(expected.len(), 3);

        for events in decode_all_splits(input) {
            assert_eq!(events, expected);
        }
    }

    #[test]
    fn chunk_boundary_inside_multibyte_char() {
        // "こんにちは" is 15 bytes of UTF-8; every split point, including
        // ones inside a character, must decode identically.
        let input = "{\"partial\":\"こんにちは\"}\n".as_bytes();
        for events in decode_all_splits(input) {
            assert_eq!(events, vec![partial("こんにちは")]);
        }
    }

    #[test]
    fn empty_and_whitespace_lines_produce_nothing() {
        let mut decoder = LineEventDecoder::new();
        assert!(decoder.push(b"\n").is_empty());
        assert!(decoder.push(b"   \n\t\n\r\n").is_empty());
        assert!(decoder.finish().is_none());
        assert_eq!(decoder.malformed_lines(), 0);
    }

    #[test]
    fn empty_chunk_is_noop() {
        let mut decoder = LineEventDecoder::new();
        assert!(decoder.push(b"").is_empty());
        let events = decoder.push(b"{\"info\":\"x\"}\n");
        assert_eq!(events, vec![info("x")]);
    }

    #[test]
    fn malformed_line_does_not_suppress_neighbors() {
        let mut decoder = LineEventDecoder::new();
        let events = decoder.push(b"{\"info\":\"a\"}\nnot json at all\n{\"info\":\"b\"}\n");
        assert_eq!(events, vec![info("a"), info("b")]);
        assert_eq!(decoder.malformed_lines(), 1);
    }

    #[test]
    fn trailing_unterminated_fragment_flushes_once() {
        let mut decoder = LineEventDecoder::new();
        let events = decoder.push(b"{\"info\":\"start\"}\n{\"text\":\"done\"}");
        assert_eq!(events, vec![info("start")]);

        let trailing = decoder.finish().expect("trailing event");
        assert_eq!(trailing.text.as_deref(), Some("done"));
        // Buffer is spent; a second flush yields nothing.
        assert!(decoder.finish().is_none());
    }

    #[test]
    fn trailing_garbage_is_discarded_silently() {
        let mut decoder = LineEventDecoder::new();
        assert!(decoder.push(b"{\"partial\":\"he").is_empty());
        assert!(decoder.finish().is_none());
        assert_eq!(decoder.malformed_lines(), 1);
    }

    #[test]
    fn partial_line_completed_across_chunks() {
        let mut decoder = LineEventDecoder::new();
        let mut events = decoder.push(b"{\"info\":\"start\"}\n{\"partial\":\"he");
        events.extend(decoder.push(b"llo\"}\n"));
        events.extend(decoder.finish());
        assert_eq!(events, vec![info("start"), partial("hello")]);
    }
}
