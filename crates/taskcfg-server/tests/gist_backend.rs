//! Integration tests for the gist backend against an in-process HTTP server.
//!
//! Each test binds a one-shot listener on an ephemeral port, points the
//! store's API base at it, and inspects the single request it receives.

use serde_json::{json, Value};
use taskcfg_core::{decode, to_pretty_string, FormatError};
use taskcfg_server::application::{ConfigStore, StoreError};
use taskcfg_server::domain::GistSettings;
use taskcfg_server::infrastructure::storage::GistStore;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

// ── Canned HTTP server ────────────────────────────────────────────────────────

#[derive(Debug)]
struct CapturedRequest {
    request_line: String,
    headers: Vec<(String, String)>,
    body: String,
}

impl CapturedRequest {
    fn header(&self, name: &str) -> Option<&str> {
        let name = name.to_ascii_lowercase();
        self.headers
            .iter()
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v.as_str())
    }
}

fn find_header_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|w| w == b"\r\n\r\n").map(|p| p + 4)
}

async fn read_request(stream: &mut TcpStream) -> CapturedRequest {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let header_end = loop {
        let n = stream.read(&mut chunk).await.unwrap();
        assert!(n > 0, "client closed before finishing the request head");
        buf.extend_from_slice(&chunk[..n]);
        if let Some(end) = find_header_end(&buf) {
            break end;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let mut lines = head.split("\r\n");
    let request_line = lines.next().unwrap_or_default().to_string();
    let headers: Vec<(String, String)> = lines
        .filter_map(|l| l.split_once(':'))
        .map(|(k, v)| (k.trim().to_ascii_lowercase(), v.trim().to_string()))
        .collect();

    let content_length: usize = headers
        .iter()
        .find(|(k, _)| k == "content-length")
        .map(|(_, v)| v.parse().unwrap())
        .unwrap_or(0);
    while buf.len() < header_end + content_length {
        let n = stream.read(&mut chunk).await.unwrap();
        assert!(n > 0, "client closed before finishing the body");
        buf.extend_from_slice(&chunk[..n]);
    }
    let body = String::from_utf8(buf[header_end..header_end + content_length].to_vec()).unwrap();

    CapturedRequest {
        request_line,
        headers,
        body,
    }
}

/// Serves exactly one request with `status` and a JSON `body`.
async fn serve_once(status: &'static str, body: Value) -> (String, JoinHandle<CapturedRequest>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let handle = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let request = read_request(&mut stream).await;
        let body = body.to_string();
        let response = format!(
            "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        stream.write_all(response.as_bytes()).await.unwrap();
        let _ = stream.shutdown().await;
        request
    });

    (format!("http://{addr}"), handle)
}

fn store_for(api_base: String) -> GistStore {
    GistStore::new(GistSettings {
        api_base,
        gist_id: Some("abc123".to_string()),
        token: Some("tok".to_string()),
        ..GistSettings::default()
    })
    .unwrap()
}

fn gist_with_file(name: &str, content: &str) -> Value {
    json!({
        "id": "abc123",
        "files": { name: { "filename": name, "content": content } }
    })
}

// ── Read ──────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_read_returns_parsed_content_of_named_file() {
    // Arrange
    let (base, server) = serve_once(
        "200 OK",
        gist_with_file(
            "config.json",
            r#"{"name":"g","description":"from gist","task":[{"addons":"http://a","tag=t1":true}]}"#,
        ),
    )
    .await;
    let store = store_for(base);

    // Act
    let blob = store.read().await.unwrap();

    // Assert
    assert_eq!(blob["name"], "g");
    assert_eq!(blob["task"][0]["tag=t1"], true);
    let request = server.await.unwrap();
    assert_eq!(request.request_line, "GET /gists/abc123 HTTP/1.1");
    assert_eq!(request.header("Authorization"), Some("token tok"));
    assert_eq!(
        request.header("Accept"),
        Some("application/vnd.github.v3+json")
    );
}

#[tokio::test]
async fn test_read_of_gist_without_the_file_yields_empty_object() {
    // Arrange
    let (base, server) = serve_once("200 OK", gist_with_file("other.json", "{}")).await;
    let store = store_for(base);

    // Act
    let blob = store.read().await.unwrap();

    // Assert: the fallback document fails validation with every field missing.
    assert_eq!(blob, json!({}));
    assert_eq!(
        decode(&blob),
        Err(FormatError::MissingFields(vec!["name", "description", "task"]))
    );
    server.await.unwrap();
}

#[tokio::test]
async fn test_read_of_non_json_file_content_is_corrupt() {
    let (base, server) = serve_once("200 OK", gist_with_file("config.json", "name = 1")).await;
    let store = store_for(base);

    let result = store.read().await;

    assert!(matches!(result, Err(StoreError::Corrupt { .. })));
    server.await.unwrap();
}

#[tokio::test]
async fn test_read_rejected_by_github_is_remote_error() {
    // Arrange
    let (base, server) = serve_once(
        "401 Unauthorized",
        json!({"message": "Bad credentials", "documentation_url": "https://docs.github.com/rest"}),
    )
    .await;
    let store = store_for(base);

    // Act
    let result = store.read().await;

    // Assert
    match result {
        Err(StoreError::Remote { status, message }) => {
            assert_eq!(status, 401);
            assert_eq!(message, "Bad credentials");
        }
        other => panic!("expected Remote, got {other:?}"),
    }
    server.await.unwrap();
}

#[tokio::test]
async fn test_read_with_nothing_listening_is_transport_error() {
    // Arrange: reserve a port, then free it.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let store = store_for(format!("http://{addr}"));

    // Act
    let result = store.read().await;

    // Assert
    assert!(matches!(result, Err(StoreError::Transport(_))));
}

// ── Write ─────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_write_patches_named_file_with_pretty_document() {
    // Arrange
    let (base, server) = serve_once("200 OK", gist_with_file("config.json", "{}")).await;
    let store = store_for(base);
    let doc = json!({"name": "n", "description": "d", "task": [{"addons": "a", "tag=x": true}]});

    // Act
    store.write(&doc).await.unwrap();

    // Assert
    let request = server.await.unwrap();
    assert_eq!(request.request_line, "PATCH /gists/abc123 HTTP/1.1");
    assert_eq!(request.header("authorization"), Some("token tok"));
    let body: Value = serde_json::from_str(&request.body).unwrap();
    assert_eq!(
        body,
        json!({"files": {"config.json": {"content": to_pretty_string(&doc)}}})
    );
}

#[tokio::test]
async fn test_write_rejected_by_github_is_remote_error() {
    let (base, server) = serve_once("404 Not Found", json!({"message": "Not Found"})).await;
    let store = store_for(base);

    let result = store.write(&json!({})).await;

    assert!(matches!(
        result,
        Err(StoreError::Remote { status: 404, .. })
    ));
    server.await.unwrap();
}
