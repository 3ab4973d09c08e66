//! Network adapters against a one-shot local HTTP server.

use compass_common::Capability;
use compassd::config::{CommunityProviderConfig, KnowledgeProviderConfig, SearchProviderConfig};
use compassd::providers::{
    http_client, CommunityAdapter, KnowledgeAdapter, ProviderAdapter, ProviderError, ProviderQuery,
    SearchAdapter,
};
use flate2::write::GzEncoder;
use flate2::Compression;
use std::io::Write;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Answer exactly one request, then hand back the request head (lowercased)
async fn serve_once(
    status: &'static str,
    headers: Vec<(&'static str, &'static str)>,
    body: Vec<u8>,
) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = Vec::new();
        let mut buf = [0u8; 1024];
        while !request.windows(4).any(|w| w == b"\r\n\r\n") {
            let n = socket.read(&mut buf).await.unwrap();
            if n == 0 {
                break;
            }
            request.extend_from_slice(&buf[..n]);
        }

        let mut head = format!(
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n",
            status,
            body.len()
        );
        for (name, value) in &headers {
            head.push_str(&format!("{}: {}\r\n", name, value));
        }
        head.push_str("\r\n");
        socket.write_all(head.as_bytes()).await.unwrap();
        socket.write_all(&body).await.unwrap();
        let _ = socket.shutdown().await;

        String::from_utf8_lossy(&request).to_lowercase()
    });

    (format!("http://{}", addr), handle)
}

fn gzip(text: &str) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(text.as_bytes()).unwrap();
    encoder.finish().unwrap()
}

fn query(text: &str) -> ProviderQuery {
    ProviderQuery::new(text, Vec::new())
}

// ============================================================================
// Compressed bodies
// ============================================================================

#[tokio::test]
async fn test_community_decodes_gzip_body() {
    let payload = r#"{"items": [
        {"title": "Offline voice assistant on Ubuntu", "link": "https://askubuntu.com/q/1",
         "is_answered": true, "answer_count": 2, "score": 12, "tags": ["voice"]}
    ], "has_more": false}"#;
    let (base_url, server) =
        serve_once("200 OK", vec![("Content-Encoding", "gzip")], gzip(payload)).await;

    let adapter = CommunityAdapter::new(
        http_client().unwrap(),
        CommunityProviderConfig {
            base_url,
            ..CommunityProviderConfig::default()
        },
    );
    let sources = adapter.fetch(&query("voice assistant")).await.unwrap();

    assert_eq!(sources.len(), 1);
    assert_eq!(sources[0].kind, Capability::Community);
    assert_eq!(sources[0].title, "Offline voice assistant on Ubuntu");

    let request = server.await.unwrap();
    assert!(request.starts_with("get /2.3/search/advanced?"));
    let accept = request
        .lines()
        .find(|l| l.starts_with("accept-encoding:"))
        .unwrap_or_default();
    assert!(accept.contains("gzip"), "request head: {}", request);
}

// ============================================================================
// Transport failures
// ============================================================================

#[tokio::test]
async fn test_knowledge_non_2xx_is_unavailable() {
    let (base_url, server) = serve_once("503 Service Unavailable", Vec::new(), b"{}".to_vec()).await;

    let adapter = KnowledgeAdapter::new(
        http_client().unwrap(),
        KnowledgeProviderConfig {
            base_url,
            ..KnowledgeProviderConfig::default()
        },
    );
    let err = adapter.fetch(&query("x")).await.unwrap_err();

    assert!(matches!(err, ProviderError::Unavailable(ref m) if m.contains("503")));
    assert!(server.await.unwrap().starts_with("get /w/api.php?"));
}

#[tokio::test]
async fn test_search_non_json_is_malformed() {
    let (base_url, server) =
        serve_once("200 OK", Vec::new(), b"<html>rate limited</html>".to_vec()).await;

    let adapter = SearchAdapter::new(
        http_client().unwrap(),
        SearchProviderConfig {
            base_url,
            ..SearchProviderConfig::default()
        },
    );
    let err = adapter.fetch(&query("x")).await.unwrap_err();

    assert!(matches!(err, ProviderError::Malformed(_)));
    server.await.unwrap();
}
