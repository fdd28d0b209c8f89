//! Line framing for streamed HTTP bodies
//!
//! Both SSE (OpenAI, our own transport) and NDJSON (Ollama) are line
//! oriented. Network chunks split lines and UTF-8 sequences arbitrarily, so
//! bytes are buffered until a full line is available and only then decoded.

/// Accumulates body bytes and yields complete lines
#[derive(Debug, Default)]
pub struct LineBuffer {
    buf: Vec<u8>,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a network chunk
    pub fn push(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Pop the next complete line, without its `\n` / `\r\n` terminator
    pub fn next_line(&mut self) -> Option<String> {
        let end = self.buf.iter().position(|b| *b == b'\n')?;
        let mut line: Vec<u8> = self.buf.drain(..=end).collect();
        line.pop();
        if line.last() == Some(&b'\r') {
            line.pop();
        }
        Some(String::from_utf8_lossy(&line).into_owned())
    }

    /// Flush a trailing line that never received a terminator
    pub fn finish(&mut self) -> Option<String> {
        if self.buf.is_empty() {
            return None;
        }
        let rest = std::mem::take(&mut self.buf);
        Some(String::from_utf8_lossy(&rest).trim_end_matches('\r').to_string())
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }
}

/// Payload of an SSE `data:` line, or `None` for any other line
pub fn sse_data(line: &str) -> Option<&str> {
    let rest = line.strip_prefix("data:")?;
    Some(rest.strip_prefix(' ').unwrap_or(rest))
}
