//! Gemini REST adapter against a canned local HTTP server.

use std::sync::{Arc, Mutex};

use report_lens::config::InsightConfig;
use report_lens::credential::Credential;
use report_lens::error::InsightError;
use report_lens::insight::GeminiBackend;
use report_lens::{Diagnostics, GenerativeBackend, InsightClient};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

type Requests = Arc<Mutex<Vec<String>>>;

/// Answer one connection per canned `(status line, body)` pair, in order.
async fn serve(responses: Vec<(&'static str, String)>) -> (String, Requests) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let requests: Requests = Arc::new(Mutex::new(Vec::new()));
    let seen = Arc::clone(&requests);

    tokio::spawn(async move {
        for (status, body) in responses {
            let (mut socket, _) = listener.accept().await.unwrap();
            let request = read_request(&mut socket).await;
            seen.lock().unwrap().push(request);

            let reply = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            socket.write_all(reply.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
        }
    });

    (format!("http://{}", addr), requests)
}

async fn read_request(socket: &mut tokio::net::TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let n = socket.read(&mut chunk).await.unwrap();
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);

        let text = String::from_utf8_lossy(&buf);
        if let Some(head_end) = text.find("\r\n\r\n") {
            let content_length = text[..head_end]
                .lines()
                .filter_map(|line| line.split_once(':'))
                .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
                .and_then(|(_, value)| value.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if buf.len() >= head_end + 4 + content_length {
                break;
            }
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}

fn backend(base_url: &str) -> GeminiBackend {
    let settings = InsightConfig {
        base_url: base_url.to_string(),
        timeout_secs: Some(10),
        ..InsightConfig::default()
    };
    GeminiBackend::new(Credential::new("test-key").unwrap(), &settings).unwrap()
}

fn generate_reply(text: &str) -> String {
    serde_json::json!({
        "candidates": [{ "content": { "parts": [{ "text": text }] }, "finishReason": "STOP" }]
    })
    .to_string()
}

#[tokio::test]
async fn lists_models_across_pages() {
    let first = r#"{"models": [{"name": "models/embedding-001", "supportedGenerationMethods": ["embedContent"]}],
                   "nextPageToken": "page-2"}"#;
    let second = r#"{"models": [{"name": "models/gemini-pro", "supportedGenerationMethods": ["generateContent"]}]}"#;
    let (base, requests) = serve(vec![("200 OK", first.into()), ("200 OK", second.into())]).await;

    let models = backend(&base).list_models().await.unwrap();
    assert_eq!(models.len(), 2);
    assert_eq!(models[1].name, "models/gemini-pro");

    let requests = requests.lock().unwrap().clone();
    assert!(requests[0].starts_with("GET /v1beta/models?pageSize=1000 "));
    assert!(requests[1].starts_with("GET /v1beta/models?pageSize=1000&pageToken=page-2 "));
    assert!(requests[0].to_ascii_lowercase().contains("x-goog-api-key: test-key"));
}

#[tokio::test]
async fn generates_content() {
    let (base, requests) = serve(vec![("200 OK", generate_reply("Looks like a slow CDN."))]).await;

    let reply = backend(&base)
        .generate("models/gemini-pro", "Explain:\n\nText: Timeout")
        .await
        .unwrap();
    assert_eq!(reply, "Looks like a slow CDN.");

    let request = requests.lock().unwrap()[0].clone();
    assert!(request.starts_with("POST /v1beta/models/gemini-pro:generateContent "));
    assert!(request.contains(r#""text":"Explain:\n\nText: Timeout""#));
}

#[tokio::test]
async fn error_status_is_typed() {
    let body = r#"{"error": {"code": 403, "message": "API key not valid"}}"#;
    let (base, _) = serve(vec![("403 Forbidden", body.into())]).await;

    let err = backend(&base).list_models().await.unwrap_err();
    match err {
        InsightError::Status { status, body } => {
            assert_eq!(status, 403);
            assert!(body.contains("API key not valid"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn connect_selects_model_and_answers() {
    let listing = r#"{"models": [
        {"name": "models/gemini-1.5-flash", "supportedGenerationMethods": ["generateContent"]},
        {"name": "models/gemini-pro", "supportedGenerationMethods": ["generateContent"]}
    ]}"#;
    let (base, requests) = serve(vec![
        ("200 OK", listing.into()),
        ("200 OK", generate_reply("Retry with a longer wait.")),
    ])
    .await;

    let settings = InsightConfig {
        base_url: base,
        ..InsightConfig::default()
    };
    let client = InsightClient::connect(
        Credential::new("test-key"),
        &settings,
        Arc::new(Diagnostics::new()),
    )
    .await;

    assert_eq!(client.model(), Some("models/gemini-pro"));
    let reply = client.get_insights("Timeout", "Explain:").await;
    assert_eq!(reply, "Retry with a longer wait.");
    assert_eq!(requests.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn listing_failure_disables_client() {
    let (base, _) = serve(vec![("500 Internal Server Error", "{}".into())]).await;
    let settings = InsightConfig {
        base_url: base,
        ..InsightConfig::default()
    };
    let client = InsightClient::connect(
        Credential::new("test-key"),
        &settings,
        Arc::new(Diagnostics::new()),
    )
    .await;

    assert!(!client.is_enabled());
}
