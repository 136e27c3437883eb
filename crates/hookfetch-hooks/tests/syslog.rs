use std::sync::{Arc, Mutex};
use std::time::Duration;

use hookfetch::http::StatusCode;
use hookfetch::http::header::{CONTENT_LENGTH, HeaderValue};
use hookfetch::{Dispatcher, LifecycleError, Response, transport_fn};
use hookfetch_hooks::{DataHook, SyslogHook, SyslogOptions};
use tokio::net::UdpSocket;

async fn collector() -> (UdpSocket, SyslogOptions) {
    let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let options = SyslogOptions {
        target_host: "127.0.0.1".to_owned(),
        target_port: socket.local_addr().unwrap().port(),
        appname: Some("hookfetch-test".to_owned()),
        hostname: Some("testhost".to_owned()),
        ..SyslogOptions::default()
    };
    (socket, options)
}

async fn receive(socket: &UdpSocket) -> String {
    let mut buf = vec![0u8; 4096];
    let (n, _) = tokio::time::timeout(Duration::from_secs(5), socket.recv_from(&mut buf))
        .await
        .expect("no datagram received")
        .unwrap();
    String::from_utf8(buf[..n].to_vec()).unwrap()
}

/// Split a datagram into its header fields and message.
fn parse(datagram: &str) -> (Vec<&str>, &str) {
    let (header, message) = datagram.split_once('\u{feff}').unwrap();
    (header.split_whitespace().collect(), message)
}

fn assert_ms(field: &str) {
    let ms = field.strip_prefix("ms=").unwrap();
    assert!(ms.parse::<u64>().is_ok(), "bad timing field {field:?}");
}

#[tokio::test]
async fn test_reports_upstream_response() {
    let (socket, options) = collector().await;
    let dispatcher = Dispatcher::builder()
        .hook(SyslogHook::connect(options).await.unwrap())
        .upstream(transport_fn(|_| async {
            Ok(Response::new("hello").with_header(CONTENT_LENGTH, HeaderValue::from_static("5")))
        }))
        .build();

    let response = dispatcher.fetch("https://user:pw@example.com/?secret=xyzzy").await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let datagram = receive(&socket).await;
    let (header, message) = parse(&datagram);
    assert_eq!(header[0], "<134>1");
    assert!(header[1].ends_with('Z'));
    assert_eq!(&header[2..4], ["testhost", "hookfetch-test"]);
    assert_eq!(header[4], std::process::id().to_string());
    assert_eq!(&header[5..], ["fetch", "-"]);

    let fields: Vec<&str> = message.split(' ').collect();
    assert_eq!(&fields[..3], ["200", "GET", "https://example.com/"]);
    assert_ms(fields[3]);
    assert_eq!(fields[4], "len=5");
    assert!(!datagram.contains("xyzzy"));
    assert!(!datagram.contains("pw"));
}

#[tokio::test]
async fn test_reports_hook_response() {
    let (socket, options) = collector().await;
    let dispatcher = Dispatcher::builder()
        .hook(SyslogHook::connect(options).await.unwrap())
        .hook(DataHook)
        .build();

    let response = dispatcher.fetch("data:text/ascii;base64,TUlORCBCTE9XTg==").await.unwrap();
    assert_eq!(response.text().await.unwrap(), "MIND BLOWN");

    let datagram = receive(&socket).await;
    let (_, message) = parse(&datagram);
    let fields: Vec<&str> = message.split(' ').collect();
    assert_eq!(&fields[..3], ["200", "GET", "data:..."]);
    assert_ms(fields[3]);
    assert_eq!(fields[4], "len=10");
}

#[tokio::test]
async fn test_reports_failures_as_errors() {
    let (socket, options) = collector().await;
    let dispatcher = Dispatcher::builder()
        .hook(SyslogHook::connect(options).await.unwrap())
        .build();

    let err = dispatcher.fetch("https://example.com/").await.unwrap_err();
    assert!(err.is_access_denied());

    let datagram = receive(&socket).await;
    let (header, message) = parse(&datagram);
    assert_eq!(header[0], "<131>1");
    assert!(message.starts_with("- GET https://example.com/ ms="));
}

#[tokio::test]
async fn test_warning_for_client_errors() {
    let (socket, options) = collector().await;
    let dispatcher = Dispatcher::builder()
        .hook(SyslogHook::connect(options).await.unwrap())
        .upstream(transport_fn(|_| async { Ok(Response::with_status_only(StatusCode::NOT_FOUND)) }))
        .build();

    dispatcher.fetch("https://example.com/missing").await.unwrap();

    let datagram = receive(&socket).await;
    let (header, message) = parse(&datagram);
    assert_eq!(header[0], "<132>1");
    assert!(message.starts_with("404 GET https://example.com/missing"));
}

#[tokio::test]
async fn test_every_dispatch_sends_without_listener_failures() {
    let (socket, options) = collector().await;
    let fatal: Arc<Mutex<Vec<String>>> = Arc::default();
    let dispatcher = Dispatcher::builder()
        .hook(SyslogHook::connect(options).await.unwrap())
        .hook(DataHook)
        .fatal_sink({
            let fatal = Arc::clone(&fatal);
            move |err: LifecycleError| fatal.lock().unwrap().push(err.to_string())
        })
        .build();

    for _ in 0..3 {
        dispatcher.fetch("data:,ping").await.unwrap();
    }
    for _ in 0..3 {
        let datagram = receive(&socket).await;
        let (_, message) = parse(&datagram);
        assert!(message.starts_with("200 GET data:..."));
    }
    assert!(fatal.lock().unwrap().is_empty(), "listener failures: {:?}", fatal.lock().unwrap());
}
