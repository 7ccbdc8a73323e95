use smsline_protocol::frames::{parse_sse_line, SseLine};
use smsline_protocol::StreamEvent;

use crate::error::ClientError;

/// Longest pending line accepted before the stream is treated as broken.
pub const MAX_LINE_BYTES: usize = 64 * 1024;

/// Incremental text/event-stream decoder.
///
/// Feed raw body chunks in any split; complete events come out. Data lines of
/// one event are joined with `\n` before JSON decoding, comment lines
/// (keep-alive pings) are counted and otherwise ignored.
#[derive(Debug)]
pub struct EventDecoder {
    line_buf: Vec<u8>,
    /// Bytes of `line_buf` already known to hold no newline.
    scanned: usize,
    max_line: usize,
    data: Vec<String>,
    comments: u64,
}

impl Default for EventDecoder {
    fn default() -> Self {
        Self::with_max_line(MAX_LINE_BYTES)
    }
}

impl EventDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_line(max_line: usize) -> Self {
        Self {
            line_buf: Vec::new(),
            scanned: 0,
            max_line,
            data: Vec::new(),
            comments: 0,
        }
    }

    /// Keep-alive comments seen so far.
    pub fn comments_seen(&self) -> u64 {
        self.comments
    }

    /// Decode whatever complete events `chunk` finishes.
    ///
    /// A pending line longer than the limit yields [`ClientError::LineTooLong`]
    /// and drops the buffered input; the caller should reconnect.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<Result<StreamEvent, ClientError>> {
        self.line_buf.extend_from_slice(chunk);
        let mut out = Vec::new();

        // keep an incomplete last line in the buffer
        while let Some(pos) = self.line_buf[self.scanned..].iter().position(|&b| b == b'\n') {
            let end = self.scanned + pos;
            let line: Vec<u8> = self.line_buf.drain(..=end).collect();
            self.scanned = 0;
            let line = String::from_utf8_lossy(&line[..line.len() - 1]);
            match parse_sse_line(&line) {
                SseLine::Data(data) => self.data.push(data),
                SseLine::Comment(_) => self.comments += 1,
                SseLine::Dispatch => {
                    if !self.data.is_empty() {
                        let payload = self.data.join("\n");
                        self.data.clear();
                        out.push(serde_json::from_str(&payload).map_err(ClientError::from));
                    }
                }
                SseLine::Event(_) | SseLine::Other => {}
            }
        }

        if self.line_buf.len() > self.max_line {
            self.line_buf.clear();
            self.data.clear();
            self.scanned = 0;
            out.push(Err(ClientError::LineTooLong { limit: self.max_line }));
        } else {
            self.scanned = self.line_buf.len();
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HISTORY: &str = "data: {\"type\":\"history\",\"messages\":[]}\n\n";
    const MESSAGE: &str = "data: {\"type\":\"message\",\"message\":{\"id\":\"SM1\",\"from\":\"+1\",\"body\":\"hi\",\"timestamp\":1}}\n\n";

    #[test]
    fn decodes_whole_frames() {
        let mut d = EventDecoder::new();
        let events = d.push(format!("{HISTORY}{MESSAGE}").as_bytes());
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], Ok(StreamEvent::History { .. })));
        match &events[1] {
            Ok(StreamEvent::Message { message }) => assert_eq!(message.id, "SM1"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn handles_frames_split_across_chunks() {
        let mut d = EventDecoder::new();
        let bytes = MESSAGE.as_bytes();
        let mut events = Vec::new();
        for chunk in bytes.chunks(7) {
            events.extend(d.push(chunk));
        }
        assert_eq!(events.len(), 1);
        assert!(events[0].is_ok());
    }

    #[test]
    fn multibyte_text_split_mid_character() {
        let frame = "data: {\"type\":\"message\",\"message\":{\"id\":\"SM2\",\"from\":\"+1\",\"body\":\"héllo 👋\",\"timestamp\":1}}\n\n";
        let bytes = frame.as_bytes();
        let split = frame.find('👋').unwrap() + 1;
        let mut d = EventDecoder::new();
        assert!(d.push(&bytes[..split]).is_empty());
        let events = d.push(&bytes[split..]);
        match &events[0] {
            Ok(StreamEvent::Message { message }) => assert_eq!(message.body, "héllo 👋"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn pings_are_counted_not_emitted() {
        let mut d = EventDecoder::new();
        assert!(d.push(b": ping\n\n: ping\n\n").is_empty());
        assert_eq!(d.comments_seen(), 2);
    }

    #[test]
    fn bad_json_is_an_error_and_decoding_continues() {
        let mut d = EventDecoder::new();
        let events = d.push(format!("data: not json\n\n{MESSAGE}").as_bytes());
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], Err(ClientError::Decode(_))));
        assert!(events[1].is_ok());
    }

    #[test]
    fn crlf_line_endings() {
        let mut d = EventDecoder::new();
        let events = d.push(b"data: {\"type\":\"history\",\"messages\":[]}\r\n\r\n");
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn unterminated_line_over_limit_is_an_error() {
        let mut d = EventDecoder::with_max_line(16);
        assert!(d.push(b"data: 0123456789").is_empty());
        let events = d.push(b"abcdef");
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], Err(ClientError::LineTooLong { limit: 16 })));

        // buffer was dropped; decoding resumes on fresh input
        let events = d.push(b"data: {\"type\":\"history\",\"messages\":[]}\n\n");
        assert!(matches!(&events[..], [Ok(StreamEvent::History { .. })]));
    }

    #[test]
    fn long_lines_under_limit_still_decode() {
        let body = "x".repeat(1000);
        let frame = format!(
            "data: {{\"type\":\"message\",\"message\":{{\"id\":\"SM3\",\"from\":\"+1\",\"body\":\"{body}\",\"timestamp\":1}}}}\n\n"
        );
        let mut d = EventDecoder::new();
        let mut events = Vec::new();
        for chunk in frame.as_bytes().chunks(10) {
            events.extend(d.push(chunk));
        }
        match &events[..] {
            [Ok(StreamEvent::Message { message })] => assert_eq!(message.body.len(), 1000),
            other => panic!("unexpected {other:?}"),
        }
    }
}
