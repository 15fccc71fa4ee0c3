use eventcast_broadcaster::Broadcaster;
use eventcast_daemon::http::SubscribeListener;
use eventcast_daemon::ingest::IngestListener;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpStream, UnixStream};
use tempfile::{tempdir, TempDir};

/// A relay wired up like the daemon's main, on a temp socket and port 0
struct TestRelay {
    broadcaster: Arc<Broadcaster>,
    socket_path: PathBuf,
    http_addr: SocketAddr,
    _dir: TempDir,
}

async fn start_relay() -> TestRelay {
    let dir = tempdir().unwrap();
    let socket_path = dir.path().join("ingest.sock");

    let broadcaster = Arc::new(Broadcaster::new());

    let ingest = IngestListener::bind(
        socket_path.to_str().unwrap(),
        Arc::clone(&broadcaster),
        false,
    )
    .unwrap();

    let subscribe = SubscribeListener::bind("127.0.0.1:0", Arc::clone(&broadcaster))
        .await
        .unwrap();
    let http_addr = subscribe.local_addr().unwrap();

    tokio::spawn(async move {
        let _ = ingest.run().await;
    });
    tokio::spawn(async move {
        let _ = subscribe.run().await;
    });

    TestRelay {
        broadcaster,
        socket_path,
        http_addr,
        _dir: dir,
    }
}

/// Open an SSE subscription and consume the response head
async fn subscribe(relay: &TestRelay, path: &str) -> TcpStream {
    let mut stream = TcpStream::connect(relay.http_addr).await.unwrap();
    let request = format!("GET {} HTTP/1.1\r\nHost: localhost\r\n\r\n", path);
    stream.write_all(request.as_bytes()).await.unwrap();

    // Head ends at the blank line; frames follow
    let mut head = Vec::new();
    let mut byte = [0u8; 1];
    while !head.ends_with(b"\r\n\r\n") {
        stream.read_exact(&mut byte).await.unwrap();
        head.push(byte[0]);
    }

    let head = String::from_utf8(head).unwrap();
    assert!(head.starts_with("HTTP/1.1 200 OK\r\n"));
    assert!(head.contains("Content-Type: text/event-stream; charset=utf-8"));

    stream
}

async fn publish_line(relay: &TestRelay, line: &str) {
    let mut stream = UnixStream::connect(&relay.socket_path).await.unwrap();
    stream.write_all(line.as_bytes()).await.unwrap();
    stream.write_all(b"\n").await.unwrap();
    stream.shutdown().await.unwrap();
}

/// Read from the stream until `expected` has arrived or the timeout hits
async fn read_expect(stream: &mut TcpStream, expected: &[u8]) {
    let mut received = Vec::new();
    let mut buf = [0u8; 256];

    let result = tokio::time::timeout(Duration::from_secs(3), async {
        while !received.ends_with(expected) {
            let n = stream.read(&mut buf).await.unwrap();
            assert!(n > 0, "stream closed before expected frame arrived");
            received.extend_from_slice(&buf[..n]);
        }
        received
    })
    .await;

    let received = result.expect("timed out waiting for frame");
    assert!(
        received.ends_with(expected),
        "expected {:?}, got {:?}",
        String::from_utf8_lossy(expected),
        String::from_utf8_lossy(&received)
    );
}

/// Wait until the registry settles at `count` live subscribers
async fn wait_for_subscribers(relay: &TestRelay, count: usize) {
    for _ in 0..50 {
        if relay.broadcaster.subscriber_count().await == count {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("subscriber count never reached {}", count);
}

#[tokio::test]
async fn test_end_to_end_delivery() {
    let relay = start_relay().await;
    let mut client = subscribe(&relay, "/event").await;
    wait_for_subscribers(&relay, 1).await;

    publish_line(
        &relay,
        r#"{"endpoint":"/event","event":"subscriber","data":"lrrbot","id":"12345"}"#,
    )
    .await;

    read_expect(&mut client, b"event: subscriber\ndata: lrrbot\nid: 12345\n\n").await;
}

#[tokio::test]
async fn test_publish_without_subscribers_is_noop() {
    let relay = start_relay().await;

    // Must neither error nor block the relay
    publish_line(&relay, r#"{"endpoint":"/empty","data":"into the void"}"#).await;
    tokio::time::sleep(Duration::from_millis(100)).await;

    // Relay still serves later subscribers normally
    let mut client = subscribe(&relay, "/empty").await;
    wait_for_subscribers(&relay, 1).await;

    publish_line(&relay, r#"{"endpoint":"/empty","data":"second"}"#).await;
    read_expect(&mut client, b"data: second\n\n").await;
}

#[tokio::test]
async fn test_late_subscriber_misses_earlier_commands() {
    let relay = start_relay().await;

    publish_line(&relay, r#"{"endpoint":"/event","data":"early"}"#).await;
    tokio::time::sleep(Duration::from_millis(100)).await;

    let mut client = subscribe(&relay, "/event").await;
    wait_for_subscribers(&relay, 1).await;

    publish_line(&relay, r#"{"endpoint":"/event","data":"late"}"#).await;

    // First bytes after the head must be the late frame, never the early one
    let expected = b"data: late\n\n";
    let mut exact = vec![0u8; expected.len()];
    tokio::time::timeout(Duration::from_secs(3), client.read_exact(&mut exact))
        .await
        .expect("timed out waiting for frame")
        .unwrap();
    assert_eq!(exact, expected);
}

#[tokio::test]
async fn test_disconnected_subscriber_does_not_block_others() {
    let relay = start_relay().await;

    let first = subscribe(&relay, "/event").await;
    let mut second = subscribe(&relay, "/event").await;
    wait_for_subscribers(&relay, 2).await;

    // First peer hangs up; its reader task flags it dead
    drop(first);
    tokio::time::sleep(Duration::from_millis(100)).await;

    publish_line(&relay, r#"{"endpoint":"/event","data":"survivor"}"#).await;
    read_expect(&mut second, b"data: survivor\n\n").await;

    // The dispatch pruned the dead handle
    wait_for_subscribers(&relay, 1).await;
}

#[tokio::test]
async fn test_multiline_data_round_trips_as_data_lines() {
    let relay = start_relay().await;
    let mut client = subscribe(&relay, "/event").await;
    wait_for_subscribers(&relay, 1).await;

    publish_line(&relay, r#"{"endpoint":"/event","data":"a\nb"}"#).await;

    read_expect(&mut client, b"data: a\ndata: b\n\n").await;
}

#[tokio::test]
async fn test_malformed_line_does_not_kill_producer_connection() {
    let relay = start_relay().await;
    let mut client = subscribe(&relay, "/event").await;
    wait_for_subscribers(&relay, 1).await;

    // Garbage, a command without an endpoint, then a valid publish, all on
    // one producer connection
    let mut producer = UnixStream::connect(&relay.socket_path).await.unwrap();
    producer.write_all(b"this is not json\n").await.unwrap();
    producer.write_all(b"{\"data\":\"no endpoint\"}\n").await.unwrap();
    producer
        .write_all(b"{\"endpoint\":\"/event\",\"data\":\"still alive\"}\n")
        .await
        .unwrap();
    producer.shutdown().await.unwrap();

    read_expect(&mut client, b"data: still alive\n\n").await;
}

#[tokio::test]
async fn test_any_method_subscribes() {
    let relay = start_relay().await;

    let mut stream = TcpStream::connect(relay.http_addr).await.unwrap();
    stream
        .write_all(b"POST /hooks HTTP/1.1\r\nHost: localhost\r\n\r\n")
        .await
        .unwrap();
    wait_for_subscribers(&relay, 1).await;

    publish_line(&relay, r#"{"endpoint":"/hooks","data":"posted"}"#).await;

    read_expect(&mut stream, b"data: posted\n\n").await;
}

#[tokio::test]
async fn test_sweeper_delivers_keepalive_to_idle_subscriber() {
    let relay = start_relay().await;
    let mut client = subscribe(&relay, "/event").await;
    wait_for_subscribers(&relay, 1).await;

    let sweeper = relay.broadcaster.spawn_sweeper(Duration::from_millis(200));

    // No publishes; after one sweep interval the comment frame arrives
    read_expect(&mut client, b": keepalive\n\n").await;

    sweeper.abort();
}

#[tokio::test]
async fn test_commands_from_one_producer_arrive_in_order() {
    let relay = start_relay().await;
    let mut client = subscribe(&relay, "/event").await;
    wait_for_subscribers(&relay, 1).await;

    let mut producer = UnixStream::connect(&relay.socket_path).await.unwrap();
    for i in 1..=3 {
        let line = format!("{{\"endpoint\":\"/event\",\"data\":\"{}\"}}\n", i);
        producer.write_all(line.as_bytes()).await.unwrap();
    }
    producer.shutdown().await.unwrap();

    read_expect(&mut client, b"data: 1\n\ndata: 2\n\ndata: 3\n\n").await;
}

#[tokio::test]
async fn test_stale_socket_file_is_replaced_on_bind() {
    let dir = tempdir().unwrap();
    let socket_path = dir.path().join("stale.sock");
    std::fs::write(&socket_path, b"stale").unwrap();

    let broadcaster = Arc::new(Broadcaster::new());
    let listener =
        IngestListener::bind(socket_path.to_str().unwrap(), broadcaster, false).unwrap();
    tokio::spawn(async move {
        let _ = listener.run().await;
    });

    // The fresh socket accepts connections
    UnixStream::connect(&socket_path).await.unwrap();
}
