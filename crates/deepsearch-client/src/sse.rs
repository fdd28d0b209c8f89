//! Incremental `text/event-stream` decoding

use deepsearch_core::stream::sse_data;
use deepsearch_core::{LineBuffer, OutputEvent};

use crate::error::{ClientError, ClientResult};

/// Turns response body chunks into [`OutputEvent`]s
///
/// Frames may be split anywhere across chunks. Comment lines (keep-alives)
/// and `event:` names are skipped; the event type travels inside `data`.
#[derive(Debug, Default)]
pub struct EventStreamDecoder {
    lines: LineBuffer,
    data: String,
}

impl EventStreamDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk, returning every frame it completes in order
    ///
    /// Each frame decodes independently; a malformed one does not discard
    /// the frames around it.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<ClientResult<OutputEvent>> {
        self.lines.push(chunk);
        let mut events = Vec::new();
        while let Some(line) = self.lines.next_line() {
            if let Some(event) = self.line(&line).transpose() {
                events.push(event);
            }
        }
        events
    }

    /// Flush a trailing frame that was not followed by a blank line
    pub fn finish(&mut self) -> ClientResult<Option<OutputEvent>> {
        if let Some(tail) = self.lines.finish() {
            if let Some(event) = self.line(&tail)? {
                return Ok(Some(event));
            }
        }
        self.dispatch()
    }

    fn line(&mut self, line: &str) -> ClientResult<Option<OutputEvent>> {
        if line.is_empty() {
            return self.dispatch();
        }
        if let Some(data) = sse_data(line) {
            if !self.data.is_empty() {
                self.data.push('\n');
            }
            self.data.push_str(data);
        }
        Ok(None)
    }

    fn dispatch(&mut self) -> ClientResult<Option<OutputEvent>> {
        if self.data.is_empty() {
            return Ok(None);
        }
        let data = std::mem::take(&mut self.data);
        serde_json::from_str(&data)
            .map(Some)
            .map_err(|e| ClientError::Protocol(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRAMES: &str = "event: text-delta\ndata: {\"type\":\"text-delta\",\"text\":\"Hi\"}\n\n\
        : keep-alive\n\n\
        event: done\ndata: {\"type\":\"done\",\"finishReason\":\"stop\",\"steps\":1}\n\n";

    fn decoded(results: Vec<ClientResult<OutputEvent>>) -> Vec<OutputEvent> {
        results.into_iter().map(|r| r.unwrap()).collect()
    }

    #[test]
    fn test_decodes_frames_and_skips_comments() {
        let mut decoder = EventStreamDecoder::new();
        let events = decoded(decoder.push(FRAMES.as_bytes()));

        assert_eq!(events.len(), 2);
        assert_eq!(events[0], OutputEvent::TextDelta { text: "Hi".into() });
        assert!(events[1].is_terminal());
    }

    #[test]
    fn test_frames_split_across_chunks() {
        let mut decoder = EventStreamDecoder::new();
        let mut events = Vec::new();
        for chunk in FRAMES.as_bytes().chunks(7) {
            events.extend(decoded(decoder.push(chunk)));
        }
        assert_eq!(events.len(), 2);
    }

    #[test]
    fn test_unterminated_final_frame() {
        let mut decoder = EventStreamDecoder::new();
        let events = decoder.push(b"data: {\"type\":\"error\",\"message\":\"x\"}");
        assert!(events.is_empty());
        assert_eq!(decoder.finish().unwrap(), Some(OutputEvent::error("x")));
    }

    #[test]
    fn test_bad_json_is_protocol_error() {
        let mut decoder = EventStreamDecoder::new();
        let results = decoder.push(b"data: {nope\n\n");
        assert_eq!(results.len(), 1);
        assert!(matches!(results[0], Err(ClientError::Protocol(_))));
    }

    #[test]
    fn test_good_frame_survives_later_bad_frame() {
        let mut decoder = EventStreamDecoder::new();
        let results = decoder.push(
            b"data: {\"type\":\"text-delta\",\"text\":\"Hi\"}\n\ndata: {bad\n\n",
        );

        assert_eq!(results.len(), 2);
        assert!(matches!(&results[0], Ok(OutputEvent::TextDelta { text }) if text == "Hi"));
        assert!(matches!(results[1], Err(ClientError::Protocol(_))));
    }
}
