use serde::{Deserialize, Serialize};
use smsline_core::Message;

/// Payload carried in the `data:` field of a stream frame.
///
/// Wire: `{ "type": "history", "messages": [...] }` once per connection,
/// then `{ "type": "message", "message": {...} }` per new arrival.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StreamEvent {
    History { messages: Vec<Message> },
    Message { message: Message },
}

impl StreamEvent {
    pub fn history(messages: Vec<Message>) -> Self {
        Self::History { messages }
    }

    pub fn message(message: Message) -> Self {
        Self::Message { message }
    }

    /// Short name for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::History { .. } => "history",
            Self::Message { .. } => "message",
        }
    }
}

/// Text used in keep-alive comment frames.
pub const PING_COMMENT: &str = "ping";

/// One text/event-stream frame as written by the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseFrame {
    /// `data: <json>\n\n`, the JSON is always a single line.
    Data(String),
    /// `: <text>\n\n`, ignored by clients.
    Comment(String),
}

impl SseFrame {
    pub fn event(event: &StreamEvent) -> Result<Self, serde_json::Error> {
        serde_json::to_string(event).map(Self::Data)
    }

    pub fn ping() -> Self {
        Self::Comment(PING_COMMENT.to_string())
    }

    /// Raw bytes on the wire for this frame.
    pub fn encode(&self) -> String {
        match self {
            Self::Data(json) => format!("data: {json}\n\n"),
            Self::Comment(text) => format!(": {text}\n\n"),
        }
    }
}

/// Classification of a single line read from an event stream.
#[derive(Debug, PartialEq, Eq)]
pub enum SseLine {
    /// Empty line, terminates the current event.
    Dispatch,
    Event(String),
    Data(String),
    Comment(String),
    /// `id:`, `retry:` or an unknown field; carries no payload for us.
    Other,
}

/// Parse one line of a text/event-stream body (without its trailing newline).
pub fn parse_sse_line(line: &str) -> SseLine {
    let line = line.strip_suffix('\r').unwrap_or(line);
    if line.is_empty() {
        return SseLine::Dispatch;
    }
    if let Some(comment) = line.strip_prefix(':') {
        return SseLine::Comment(comment.trim_start().to_string());
    }
    let (field, value) = match line.split_once(':') {
        Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
        None => (line, ""),
    };
    match field {
        "data" => SseLine::Data(value.to_string()),
        "event" => SseLine::Event(value.to_string()),
        _ => SseLine::Other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_data_with_and_without_space() {
        assert_eq!(parse_sse_line("data: {}"), SseLine::Data("{}".into()));
        assert_eq!(parse_sse_line("data:{}"), SseLine::Data("{}".into()));
    }

    #[test]
    fn keeps_colons_inside_data() {
        assert_eq!(
            parse_sse_line(r#"data: {"a":"b:c"}"#),
            SseLine::Data(r#"{"a":"b:c"}"#.into())
        );
    }

    #[test]
    fn comment_and_blank_lines() {
        assert_eq!(parse_sse_line(": ping"), SseLine::Comment("ping".into()));
        assert_eq!(parse_sse_line(""), SseLine::Dispatch);
        assert_eq!(parse_sse_line("\r"), SseLine::Dispatch);
    }

    #[test]
    fn unknown_fields_are_other() {
        assert_eq!(parse_sse_line("retry: 1000"), SseLine::Other);
        assert_eq!(parse_sse_line("id: 7"), SseLine::Other);
    }
}
