use serde_json::Value;
use tracing::{trace, warn};

use crate::events::StoryStreamEvent;

/// Frame delimiter of the story stream.
pub const FRAME_DELIMITER: &str = "\n\n";

const DATA_PREFIX: &str = "data: ";
const DONE_MARKER: &str = "[DONE]";

/// Incremental decoder for the story response body.
///
/// Bytes may arrive split anywhere: inside a multi-byte UTF-8 sequence, inside
/// the `\n\n` delimiter, or inside a JSON payload. Only complete frames are
/// parsed; the undecodable tail and the unterminated last frame are kept for
/// the next [`SseFrameDecoder::feed`]. Once a terminal event (`Done` or
/// `Error`) has been produced the decoder ignores all further input.
#[derive(Debug, Default)]
pub struct SseFrameDecoder {
    /// Trailing bytes of an incomplete UTF-8 sequence.
    pending_bytes: Vec<u8>,
    /// Decoded text not yet terminated by a delimiter.
    buffer: String,
    terminated: bool,
}

impl SseFrameDecoder {
    /// Feed arbitrary bytes into the decoder and drain complete events.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<StoryStreamEvent> {
        if self.terminated {
            return Vec::new();
        }

        self.pending_bytes.extend_from_slice(bytes);
        self.decode_pending();

        let mut events = Vec::new();
        while let Some(split) = self.buffer.find(FRAME_DELIMITER) {
            let frame = self.buffer[..split].to_string();
            self.buffer.drain(..split + FRAME_DELIMITER.len());

            parse_frame(&frame, &mut events);
            if events.last().is_some_and(StoryStreamEvent::is_terminal) {
                self.terminated = true;
                self.buffer.clear();
                self.pending_bytes.clear();
                break;
            }
        }

        events
    }

    /// Parse a complete body in one shot.
    pub fn parse_frames(input: &str) -> Vec<StoryStreamEvent> {
        let mut decoder = Self::default();
        decoder.feed(input.as_bytes())
    }

    /// True after `Done` or `Error` was produced.
    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    /// True when no partial frame or partial character is buffered.
    pub fn is_empty_buffer(&self) -> bool {
        self.buffer.trim().is_empty() && self.pending_bytes.is_empty()
    }

    fn decode_pending(&mut self) {
        loop {
            match std::str::from_utf8(&self.pending_bytes) {
                Ok(text) => {
                    self.buffer.push_str(text);
                    self.pending_bytes.clear();
                    return;
                }
                Err(error) => {
                    let valid = error.valid_up_to();
                    if let Ok(prefix) = std::str::from_utf8(&self.pending_bytes[..valid]) {
                        self.buffer.push_str(prefix);
                    }

                    match error.error_len() {
                        // Incomplete trailing sequence: wait for more bytes.
                        None => {
                            self.pending_bytes.drain(..valid);
                            return;
                        }
                        Some(invalid) => {
                            warn!(invalid_bytes = invalid, "replacing invalid UTF-8 in story stream");
                            self.buffer.push(char::REPLACEMENT_CHARACTER);
                            self.pending_bytes.drain(..valid + invalid);
                        }
                    }
                }
            }
        }
    }
}

fn parse_frame(frame: &str, events: &mut Vec<StoryStreamEvent>) {
    let frame = frame.trim_start_matches(['\r', '\n']);
    let Some(payload) = frame.strip_prefix(DATA_PREFIX) else {
        trace!(frame, "skipping frame without data prefix");
        return;
    };
    let payload = payload.trim();

    if payload == DONE_MARKER {
        events.push(StoryStreamEvent::Done);
        return;
    }

    let value = match serde_json::from_str::<Value>(payload) {
        Ok(value) => value,
        Err(error) => {
            warn!(%error, payload, "skipping unparseable story frame");
            return;
        }
    };

    let text = value.get("text").and_then(Value::as_str);
    let message = value.get("error").and_then(Value::as_str);

    if let Some(text) = text {
        events.push(StoryStreamEvent::chunk(text));
    }
    if let Some(message) = message {
        events.push(StoryStreamEvent::error(message));
    }
    if text.is_none() && message.is_none() {
        warn!(payload, "skipping story frame without text or error");
    }
}

#[cfg(test)]
mod tests {
    use super::SseFrameDecoder;
    use crate::events::StoryStreamEvent;

    #[test]
    fn decode_frames_incrementally() {
        let mut decoder = SseFrameDecoder::default();
        let mut events = Vec::new();

        events.extend(decoder.feed(b"data: {\"text\":\"Hello\"}\n\n"));
        assert_eq!(events, vec![StoryStreamEvent::chunk("Hello")]);

        events.extend(decoder.feed(b"data: [DONE]\n\n"));
        assert_eq!(events.len(), 2);
        assert!(decoder.is_terminated());
        assert!(decoder.is_empty_buffer());
    }

    #[test]
    fn holds_incomplete_multibyte_sequence() {
        let bytes = "data: {\"text\":\"ñ\"}\n\n".as_bytes();
        let split = bytes
            .iter()
            .position(|byte| *byte == 0xC3)
            .expect("two-byte sequence present")
            + 1;

        let mut decoder = SseFrameDecoder::default();
        assert!(decoder.feed(&bytes[..split]).is_empty());
        assert!(!decoder.is_empty_buffer());
        assert_eq!(
            decoder.feed(&bytes[split..]),
            vec![StoryStreamEvent::chunk("ñ")]
        );
    }

    #[test]
    fn replaces_invalid_bytes_instead_of_stalling() {
        let mut decoder = SseFrameDecoder::default();
        let mut bytes = b"data: {\"text\":\"a".to_vec();
        bytes.push(0xFF);
        bytes.extend_from_slice(b"b\"}\n\n");

        assert_eq!(
            decoder.feed(&bytes),
            vec![StoryStreamEvent::chunk("a\u{FFFD}b")]
        );
    }
}
