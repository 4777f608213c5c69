//! API endpoint integration tests

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    body::Body,
    http::{Request, Response, StatusCode, header},
};
use summarizer_x::api::{ApiState, router};
use summarizer_x::clipboard::Clipboard;
use summarizer_x::completion::CompletionClient;
use summarizer_x::extract::{DOCX_MIME, extract_docx};
use summarizer_x::session::Turn;
use summarizer_x::voice::Synthesizer;
use tower::ServiceExt;

mod common;
use common::{
    FAKE_MP3, FakeSynthesizer, MemoryClipboard, RecordingSynthesizer, ScriptedCompletion,
    StalledCompletion,
};

const BOUNDARY: &str = "summarizer-test-boundary";

/// Build a router around a scripted completion client
fn build_test_router(completion: &Arc<ScriptedCompletion>) -> Router {
    let client: Arc<dyn CompletionClient> = completion.clone();
    router(Arc::new(ApiState::new(Some(client))))
}

async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
    app.clone().oneshot(request).await.unwrap()
}

async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

fn post(uri: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: &serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn upload(uri: &str, file_name: &str, mime: &str, contents: &[u8]) -> Request<Body> {
    let mut body = format!(
        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\nContent-Type: {mime}\r\n\r\n"
    )
    .into_bytes();
    body.extend_from_slice(contents);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn create_session(app: &Router) -> String {
    let response = send(app, post("/api/sessions")).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["session_id"]
        .as_str()
        .unwrap()
        .to_string()
}

/// Create a session holding `text` and one summarize exchange
async fn summarized_session(app: &Router, text: &str) -> String {
    let id = create_session(app).await;
    let response = send(
        app,
        upload(
            &format!("/api/sessions/{id}/document"),
            "notes.txt",
            "text/plain",
            text.as_bytes(),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send(app, post(&format!("/api/sessions/{id}/actions/summarize"))).await;
    assert_eq!(response.status(), StatusCode::OK);
    id
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = build_test_router(&Arc::new(ScriptedCompletion::default()));

    let response = send(&app, get("/health")).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert!(json["version"].is_string());
}

#[tokio::test]
async fn test_chat_page_served() {
    let app = build_test_router(&Arc::new(ScriptedCompletion::default()));

    let response = send(&app, get("/")).await;

    assert_eq!(response.status(), StatusCode::OK);
    let html = String::from_utf8(body_bytes(response).await).unwrap();
    assert!(html.contains("<title>SummarizerX - ChatBot</title>"));
}

#[tokio::test]
async fn test_new_session_is_empty() {
    let app = build_test_router(&Arc::new(ScriptedCompletion::default()));
    let id = create_session(&app).await;

    let response = send(&app, get(&format!("/api/sessions/{id}"))).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["history"], serde_json::json!([]));
    assert_eq!(json["has_document"], false);
}

#[tokio::test]
async fn test_upload_then_summarize() {
    let completion = Arc::new(ScriptedCompletion::replying("A fox, briefly."));
    let app = build_test_router(&completion);
    let id = create_session(&app).await;

    let response = send(
        &app,
        upload(
            &format!("/api/sessions/{id}/document"),
            "fox.txt",
            "text/plain",
            b"The quick brown fox.",
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["extracted"], true);
    assert_eq!(json["characters"], 20);

    let response = send(&app, post(&format!("/api/sessions/{id}/actions/summarize"))).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["reply"], "A fox, briefly.");
    assert_eq!(
        json["history"],
        serde_json::json!([
            {"role": "user", "content": "Summarize the uploaded content."},
            {"role": "assistant", "content": "A fox, briefly."},
        ])
    );

    assert_eq!(
        completion.requests()[0][1],
        Turn::system("Here is the document content: The quick brown fox.")
    );
}

#[tokio::test]
async fn test_unsupported_upload_keeps_document() {
    let completion = Arc::new(ScriptedCompletion::default());
    let app = build_test_router(&completion);
    let id = create_session(&app).await;
    let uri = format!("/api/sessions/{id}/document");

    send(&app, upload(&uri, "a.txt", "text/plain", b"Original text.")).await;
    let response = send(&app, upload(&uri, "p.png", "image/png", b"\x89PNG")).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["extracted"], false);
    assert!(json.get("characters").is_none());

    send(&app, post(&format!("/api/sessions/{id}/actions/paraphrase"))).await;
    assert_eq!(
        completion.requests()[0][1],
        Turn::system("Here is the document content: Original text.")
    );
}

#[tokio::test]
async fn test_docx_upload_extracts_paragraphs() {
    let app = build_test_router(&Arc::new(ScriptedCompletion::default()));
    let id = create_session(&app).await;
    let docx = summarizer_x::export::render_docx("First.\nSecond.").unwrap();
    let expected = extract_docx(&docx).unwrap();

    let response = send(
        &app,
        upload(&format!("/api/sessions/{id}/document"), "doc.docx", DOCX_MIME, &docx),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["extracted"], true);
    assert_eq!(json["characters"], expected.chars().count());
}

#[tokio::test]
async fn test_action_without_document() {
    let completion = Arc::new(ScriptedCompletion::default());
    let app = build_test_router(&completion);
    let id = create_session(&app).await;

    let response = send(&app, post(&format!("/api/sessions/{id}/actions/quiz"))).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "bad_request");
    assert_eq!(
        json["error"]["message"],
        "Error generating quiz: no document uploaded"
    );
    assert!(completion.requests().is_empty());
}

#[tokio::test]
async fn test_unknown_action() {
    let app = build_test_router(&Arc::new(ScriptedCompletion::default()));
    let id = create_session(&app).await;

    let response = send(&app, post(&format!("/api/sessions/{id}/actions/translate"))).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_prompt_without_document() {
    let app = build_test_router(&Arc::new(ScriptedCompletion::replying("Paris.")));
    let id = create_session(&app).await;

    let response = send(
        &app,
        post_json(
            &format!("/api/sessions/{id}/prompt"),
            &serde_json::json!({"text": "Capital of France?"}),
        ),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["reply"], "Paris.");
    assert_eq!(json["history"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_failed_completion_is_bad_gateway() {
    let app = build_test_router(&Arc::new(ScriptedCompletion::failing("rate limited")));
    let id = create_session(&app).await;

    let response = send(
        &app,
        post_json(
            &format!("/api/sessions/{id}/prompt"),
            &serde_json::json!({"text": "Hello?"}),
        ),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let json = body_json(response).await;
    assert!(
        json["error"]["message"]
            .as_str()
            .unwrap()
            .starts_with("Error processing the question: ")
    );

    let json = body_json(send(&app, get(&format!("/api/sessions/{id}"))).await).await;
    assert_eq!(
        json["history"],
        serde_json::json!([{"role": "user", "content": "Hello?"}])
    );
}

#[tokio::test]
async fn test_dropped_action_keeps_session() {
    let completion: Arc<dyn CompletionClient> = Arc::new(StalledCompletion);
    let app = router(Arc::new(ApiState::new(Some(completion))));
    let id = create_session(&app).await;
    let response = send(
        &app,
        upload(
            &format!("/api/sessions/{id}/document"),
            "notes.txt",
            "text/plain",
            b"Keep me around.",
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let pending = send(&app, post(&format!("/api/sessions/{id}/actions/summarize")));
    assert!(
        tokio::time::timeout(Duration::from_millis(200), pending)
            .await
            .is_err()
    );

    let response = send(&app, get(&format!("/api/sessions/{id}"))).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["has_document"], true);
    assert_eq!(json["history"], serde_json::json!([]));
}

#[tokio::test]
async fn test_chat_without_completion_client() {
    let app = router(Arc::new(ApiState::new(None)));
    let id = create_session(&app).await;

    let response = send(
        &app,
        post_json(
            &format!("/api/sessions/{id}/prompt"),
            &serde_json::json!({"text": "Hello?"}),
        ),
    )
    .await;

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_export_formats() {
    let app = build_test_router(&Arc::new(ScriptedCompletion::replying("Summary text.")));
    let id = summarized_session(&app, "Some document.").await;

    let response = send(&app, get(&format!("/api/sessions/{id}/messages/1/export/txt"))).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "text/plain");
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"assistant_response.txt\""
    );
    assert_eq!(body_bytes(response).await, b"Summary text.");

    let response = send(&app, get(&format!("/api/sessions/{id}/messages/1/export/docx"))).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], DOCX_MIME);
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"assistant_response.docx\""
    );
    let docx = body_bytes(response).await;
    assert!(extract_docx(&docx).unwrap().contains("Summary text."));

    let response = send(&app, get(&format!("/api/sessions/{id}/messages/1/export/pdf"))).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/pdf");
    assert!(body_bytes(response).await.starts_with(b"%PDF"));
}

#[tokio::test]
async fn test_export_rejects_bad_targets() {
    let app = build_test_router(&Arc::new(ScriptedCompletion::default()));
    let id = summarized_session(&app, "Some document.").await;

    // Index 0 is the user turn
    let response = send(&app, get(&format!("/api/sessions/{id}/messages/0/export/txt"))).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = send(&app, get(&format!("/api/sessions/{id}/messages/9/export/txt"))).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = send(&app, get(&format!("/api/sessions/{id}/messages/1/export/md"))).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_speech_requires_synthesizer() {
    let app = build_test_router(&Arc::new(ScriptedCompletion::default()));
    let id = summarized_session(&app, "Some document.").await;

    let response = send(&app, post(&format!("/api/sessions/{id}/messages/1/speech"))).await;

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_speech_and_clipboard() {
    let completion: Arc<dyn CompletionClient> =
        Arc::new(ScriptedCompletion::replying("Read me."));
    let synthesizer: Arc<dyn Synthesizer> = Arc::new(FakeSynthesizer);
    let clipboard = Arc::new(MemoryClipboard::default());
    let shared: Arc<dyn Clipboard> = clipboard.clone();
    let app = router(Arc::new(
        ApiState::new(Some(completion))
            .synthesizer(Some(synthesizer))
            .clipboard(Some(shared)),
    ));
    let id = summarized_session(&app, "Some document.").await;

    let response = send(&app, post(&format!("/api/sessions/{id}/messages/1/speech"))).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "audio/mpeg");
    assert_eq!(body_bytes(response).await, FAKE_MP3);

    let response = send(&app, post(&format!("/api/sessions/{id}/messages/1/clipboard"))).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["copied"], true);
    assert_eq!(clipboard.contents().as_deref(), Some("Read me."));
}

#[tokio::test]
async fn test_long_message_read_aloud_in_chunks() {
    let completion: Arc<dyn CompletionClient> = Arc::new(ScriptedCompletion::replying(
        "First sentence here. Second sentence here. Third one.",
    ));
    let recorder = Arc::new(RecordingSynthesizer::default());
    let synthesizer: Arc<dyn Synthesizer> = recorder.clone();
    let app = router(Arc::new(
        ApiState::new(Some(completion))
            .synthesizer(Some(synthesizer))
            .speech_chunk_size(25),
    ));
    let id = summarized_session(&app, "Some document.").await;

    let response = send(&app, post(&format!("/api/sessions/{id}/messages/1/speech"))).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        recorder.requests(),
        vec!["First sentence here.", "Second sentence here.", "Third one."]
    );
    assert!(recorder.requests().iter().all(|r| r.chars().count() <= 25));
    assert_eq!(
        body_bytes(response).await,
        b"[First sentence here.][Second sentence here.][Third one.]"
    );
}

#[tokio::test]
async fn test_unknown_sessions() {
    let app = build_test_router(&Arc::new(ScriptedCompletion::default()));

    let response = send(&app, get("/api/sessions/not-a-uuid")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = send(
        &app,
        get("/api/sessions/00000000-0000-4000-8000-000000000000"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["error"]["code"], "not_found");
}

#[tokio::test]
async fn test_end_session() {
    let app = build_test_router(&Arc::new(ScriptedCompletion::default()));
    let id = create_session(&app).await;
    let uri = format!("/api/sessions/{id}");

    let delete = || {
        Request::builder()
            .method("DELETE")
            .uri(&uri)
            .body(Body::empty())
            .unwrap()
    };

    assert_eq!(send(&app, delete()).await.status(), StatusCode::NO_CONTENT);
    assert_eq!(send(&app, delete()).await.status(), StatusCode::NOT_FOUND);
    assert_eq!(send(&app, get(&uri)).await.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_sessions_are_isolated() {
    let app = build_test_router(&Arc::new(ScriptedCompletion::default()));
    let first = summarized_session(&app, "Document one.").await;
    let second = create_session(&app).await;

    let json = body_json(send(&app, get(&format!("/api/sessions/{second}"))).await).await;
    assert_eq!(json["has_document"], false);
    assert_eq!(json["history"], serde_json::json!([]));

    let json = body_json(send(&app, get(&format!("/api/sessions/{first}"))).await).await;
    assert_eq!(json["has_document"], true);
}
