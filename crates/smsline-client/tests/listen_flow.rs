// Listener against a real gateway on a loopback port.

use axum::{body::Body, routing::get, Router};
use futures_util::{stream, StreamExt};
use smsline_client::{
    decoder::MAX_LINE_BYTES,
    webhook::{send_test_sms, TestSms},
    Backoff, ClientError, ListenerEvent, StreamListener,
};
use smsline_core::config::SmslineConfig;
use smsline_gateway::app::{build_router, AppState};
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tokio::sync::mpsc;

async fn spawn_gateway() -> SocketAddr {
    let state = Arc::new(AppState::from_config(SmslineConfig::default()));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, build_router(state)).await.unwrap();
    });
    addr
}

async fn next(rx: &mut mpsc::Receiver<ListenerEvent>) -> ListenerEvent {
    tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("timed out waiting for listener event")
        .expect("listener stopped")
}

fn fast_backoff(max_attempts: Option<u32>) -> Backoff {
    Backoff::new(Duration::from_millis(10), Duration::from_millis(40), max_attempts).with_jitter(0.0)
}

#[tokio::test]
async fn receives_history_then_posted_message() {
    let addr = spawn_gateway().await;
    let http = reqwest::Client::new();
    let webhook = format!("http://{addr}/webhook");

    let earlier = TestSms {
        sid: "SM-early".into(),
        ..TestSms::default()
    };
    let (status, _) = send_test_sms(&http, &webhook, &earlier).await.unwrap();
    assert_eq!(status, 200);

    let (tx, mut rx) = mpsc::channel(16);
    let listener = StreamListener::new(format!("http://{addr}/stream"), fast_backoff(None));
    let task = tokio::spawn(listener.run(tx));

    assert!(matches!(next(&mut rx).await, ListenerEvent::Connected));
    match next(&mut rx).await {
        ListenerEvent::History(messages) => {
            assert_eq!(messages.len(), 1);
            assert_eq!(messages[0].id, "SM-early");
        }
        other => panic!("expected history, got {other:?}"),
    }

    let live = TestSms {
        sid: "SM-live".into(),
        body: "hello there".into(),
        ..TestSms::default()
    };
    let (status, body) = send_test_sms(&http, &webhook, &live).await.unwrap();
    assert_eq!(status, 200);
    assert!(body.contains("<Response"));

    match next(&mut rx).await {
        ListenerEvent::Message(message) => {
            assert_eq!(message.id, "SM-live");
            assert_eq!(message.from, "+15551234567");
            assert_eq!(message.body, "hello there");
        }
        other => panic!("expected message, got {other:?}"),
    }

    // dropping the receiver stops the listener cleanly
    drop(rx);
    send_test_sms(&http, &webhook, &TestSms::default()).await.unwrap();
    let result = tokio::time::timeout(Duration::from_secs(5), task).await.unwrap().unwrap();
    assert!(result.is_ok());
}

#[tokio::test]
async fn gives_up_after_max_attempts() {
    // bind then drop to get a port nobody listens on
    let unused = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = unused.local_addr().unwrap();
    drop(unused);

    let (tx, mut rx) = mpsc::channel(16);
    let listener = StreamListener::new(format!("http://{addr}/stream"), fast_backoff(Some(2)));
    let task = tokio::spawn(listener.run(tx));

    let mut delays = Vec::new();
    while let Some(event) = rx.recv().await {
        match event {
            ListenerEvent::Reconnecting { attempt, delay } => delays.push((attempt, delay)),
            other => panic!("unexpected {other:?}"),
        }
    }
    assert_eq!(
        delays,
        vec![(1, Duration::from_millis(10)), (2, Duration::from_millis(20))]
    );

    match task.await.unwrap() {
        Err(ClientError::GaveUp { attempts }) => assert_eq!(attempts, 2),
        other => panic!("expected GaveUp, got {other:?}"),
    }
}

#[tokio::test]
async fn non_stream_endpoint_counts_as_failure() {
    let addr = spawn_gateway().await;
    let (tx, mut rx) = mpsc::channel(16);
    let listener = StreamListener::new(format!("http://{addr}/nope"), fast_backoff(Some(1)));
    let task = tokio::spawn(listener.run(tx));

    assert!(matches!(
        next(&mut rx).await,
        ListenerEvent::Reconnecting { attempt: 1, .. }
    ));
    assert!(matches!(
        task.await.unwrap(),
        Err(ClientError::GaveUp { attempts: 1 })
    ));
}

#[tokio::test]
async fn runaway_line_drops_the_connection_and_reconnects() {
    // one oversized chunk with no newline, then the body stays open
    let runaway = || async {
        let chunk = Ok::<_, std::io::Error>("x".repeat(MAX_LINE_BYTES * 2));
        Body::from_stream(stream::once(async move { chunk }).chain(stream::pending()))
    };
    let app = Router::new().route("/stream", get(runaway));
    let tcp = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = tcp.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(tcp, app).await.unwrap();
    });

    let (tx, mut rx) = mpsc::channel(16);
    let listener = StreamListener::new(format!("http://{addr}/stream"), fast_backoff(None));
    let task = tokio::spawn(listener.run(tx));

    assert!(matches!(next(&mut rx).await, ListenerEvent::Connected));
    assert!(matches!(
        next(&mut rx).await,
        ListenerEvent::Reconnecting { attempt: 1, .. }
    ));
    assert!(matches!(next(&mut rx).await, ListenerEvent::Connected));

    drop(rx);
    let result = tokio::time::timeout(Duration::from_secs(5), task).await.unwrap().unwrap();
    assert!(result.is_ok());
}
