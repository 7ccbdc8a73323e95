// Verify the stream wire format matches what browser clients expect.
// These tests ensure the event shapes are never broken.

use smsline_core::Message;
use smsline_protocol::frames::{parse_sse_line, SseFrame, SseLine, StreamEvent};
use smsline_protocol::twiml;

fn sample(id: &str) -> Message {
    Message {
        id: id.to_string(),
        from: "+15551234567".to_string(),
        body: "hello".to_string(),
        timestamp: 1_700_000_000_000,
    }
}

#[test]
fn history_event_shape() {
    let ev = StreamEvent::history(vec![sample("SM1"), sample("SM2")]);
    let json = serde_json::to_string(&ev).unwrap();

    assert!(json.starts_with(r#"{"type":"history","messages":["#));
    assert!(json.contains(r#""id":"SM1""#));
    assert!(json.contains(r#""id":"SM2""#));
}

#[test]
fn empty_history_still_has_messages_array() {
    let json = serde_json::to_string(&StreamEvent::history(Vec::new())).unwrap();
    assert_eq!(json, r#"{"type":"history","messages":[]}"#);
}

#[test]
fn message_event_shape() {
    let ev = StreamEvent::message(sample("SM9"));
    let json = serde_json::to_string(&ev).unwrap();

    assert_eq!(
        json,
        r#"{"type":"message","message":{"id":"SM9","from":"+15551234567","body":"hello","timestamp":1700000000000}}"#
    );
}

#[test]
fn client_parses_server_event() {
    let json = r#"{"type":"message","message":{"id":"SM3","from":"+1","body":"x","timestamp":5}}"#;
    let ev: StreamEvent = serde_json::from_str(json).unwrap();

    match ev {
        StreamEvent::Message { message } => {
            assert_eq!(message.id, "SM3");
            assert_eq!(message.timestamp, 5);
        }
        other => panic!("expected message event, got {}", other.kind()),
    }
}

#[test]
fn data_frame_is_single_line() {
    let mut msg = sample("SM4");
    msg.body = "line one\nline two".to_string();
    let frame = SseFrame::event(&StreamEvent::message(msg)).unwrap();
    let wire = frame.encode();

    assert!(wire.starts_with("data: "));
    assert!(wire.ends_with("\n\n"));
    // the embedded newline must be escaped inside the JSON string
    assert_eq!(wire.matches('\n').count(), 2);
}

#[test]
fn ping_frame_is_comment() {
    assert_eq!(SseFrame::ping().encode(), ": ping\n\n");
    assert_eq!(parse_sse_line(": ping"), SseLine::Comment("ping".into()));
}

#[test]
fn encoded_frame_parses_back() {
    let frame = SseFrame::event(&StreamEvent::message(sample("SM5"))).unwrap();
    let wire = frame.encode();
    let mut lines = wire.split('\n');

    let data = match parse_sse_line(lines.next().unwrap()) {
        SseLine::Data(d) => d,
        other => panic!("expected data line, got {other:?}"),
    };
    assert_eq!(parse_sse_line(lines.next().unwrap()), SseLine::Dispatch);

    let ev: StreamEvent = serde_json::from_str(&data).unwrap();
    assert_eq!(ev, StreamEvent::message(sample("SM5")));
}

#[test]
fn twiml_ack_is_empty_response() {
    assert_eq!(
        twiml::EMPTY_RESPONSE,
        r#"<?xml version="1.0" encoding="UTF-8"?><Response/>"#
    );
    assert_eq!(twiml::CONTENT_TYPE, "text/xml");
}
