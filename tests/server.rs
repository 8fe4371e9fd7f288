//! HTTP API tests against the router with fake engines.

mod common;

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use tower::ServiceExt;

use pageocr::models::SourceDocument;
use pageocr::ocr::{EnginePool, OcrBackendType};
use pageocr::server::{create_router, AppState};

use common::{engine, extractor, pdf_bytes, png_bytes, FakeLoader, ScriptedBackend};

fn app_with(backend: ScriptedBackend, loader: FakeLoader, timeout: Duration) -> axum::Router {
    let state = AppState {
        pool: Arc::new(EnginePool::new(vec![engine(backend)]).unwrap()),
        extractor: Arc::new(extractor(loader)),
        backend: OcrBackendType::Tesseract,
        request_timeout: timeout,
        max_body_bytes: 1024 * 1024,
    };
    create_router(state)
}

fn app(backend: ScriptedBackend, loader: FakeLoader) -> axum::Router {
    app_with(backend, loader, Duration::from_secs(30))
}

fn extract_request(document: &SourceDocument) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/extract")
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(document).unwrap()))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_reports_backend() {
    let app = app(ScriptedBackend::default(), FakeLoader::default());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["backend"], "tesseract");
    assert_eq!(body["engines"], 1);
}

#[tokio::test]
async fn extract_paged_document() {
    let app = app(
        ScriptedBackend::with_texts(&["first", "second"]),
        FakeLoader::with_pages(2),
    );
    let document = SourceDocument::new("d-1", "scan.pdf", "application/pdf", &pdf_bytes());

    let response = app.oneshot(extract_request(&document)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["id"], "d-1");
    let pages = body["pages"].as_array().unwrap();
    assert_eq!(pages.len(), 2);
    assert_eq!(pages[1]["pageNumber"], 2);

    let payload: serde_json::Value =
        serde_json::from_str(pages[1]["extractedTextJson"].as_str().unwrap()).unwrap();
    assert_eq!(payload["natural_text"], "second");
}

#[tokio::test]
async fn extract_image() {
    let app = app(ScriptedBackend::with_texts(&["INVOICE 123"]), FakeLoader::default());
    let document = SourceDocument::new("img", "receipt.png", "image/png", &png_bytes());

    let response = app.oneshot(extract_request(&document)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(
        body["pages"][0]["extractedTextJson"],
        r#"{"primary_language":"eng","natural_text":"INVOICE 123"}"#
    );
}

#[tokio::test]
async fn unsupported_media_type_is_415() {
    let app = app(ScriptedBackend::default(), FakeLoader::default());
    let document = SourceDocument::new("t", "notes.txt", "text/plain", b"words");

    let response = app.oneshot(extract_request(&document)).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    let body = json_body(response).await;
    assert_eq!(body["error"], "unsupported_media_type");
    assert!(body["message"].as_str().unwrap().contains("text/plain"));
}

#[tokio::test]
async fn empty_document_is_400() {
    let app = app(ScriptedBackend::default(), FakeLoader::with_pages(0));
    let document = SourceDocument::new("e", "empty.pdf", "application/pdf", &pdf_bytes());

    let response = app.oneshot(extract_request(&document)).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"], "empty_document");
}

#[tokio::test]
async fn recognition_failure_is_502() {
    let app = app(
        ScriptedBackend::default().failing_on(2),
        FakeLoader::with_pages(3),
    );
    let document = SourceDocument::new("f", "scan.pdf", "application/pdf", &pdf_bytes());

    let response = app.oneshot(extract_request(&document)).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body = json_body(response).await;
    assert_eq!(body["error"], "recognition_engine_error");
    assert!(body.get("pages").is_none());
}

#[tokio::test]
async fn engine_not_ready_is_503() {
    let backend = ScriptedBackend::offline();
    let app = app(backend, FakeLoader::with_pages(1));
    let document = SourceDocument::new("n", "scan.pdf", "application/pdf", &pdf_bytes());

    let response = app.oneshot(extract_request(&document)).await.unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json_body(response).await["error"], "engine_not_ready");
}

#[tokio::test]
async fn engine_recovers_once_backend_comes_online() {
    let backend = ScriptedBackend::offline();
    let app = app(backend.clone(), FakeLoader::with_pages(1));
    let document = SourceDocument::new("r", "scan.pdf", "application/pdf", &pdf_bytes());

    let response = app
        .clone()
        .oneshot(extract_request(&document))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json_body(response).await["error"], "engine_not_ready");

    backend.set_online();

    let response = app.oneshot(extract_request(&document)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["pages"].as_array().unwrap().len(), 1);
    assert_eq!(backend.call_count(), 1);
}

#[tokio::test]
async fn image_that_does_not_decode_is_400() {
    let backend = ScriptedBackend::default();
    let app = app(backend.clone(), FakeLoader::default());
    let document = SourceDocument::new("x", "photo.png", "image/png", b"definitely not a png");

    let response = app.oneshot(extract_request(&document)).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"], "invalid_image_input");
    assert_eq!(backend.call_count(), 0);
}

#[tokio::test]
async fn slow_extraction_times_out() {
    let backend = ScriptedBackend {
        delay: Some(Duration::from_secs(5)),
        ..Default::default()
    };
    let app = app_with(backend, FakeLoader::with_pages(1), Duration::from_millis(50));
    let document = SourceDocument::new("s", "scan.pdf", "application/pdf", &pdf_bytes());

    let response = app.oneshot(extract_request(&document)).await.unwrap();

    assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(json_body(response).await["error"], "timeout");
}

#[tokio::test]
async fn malformed_body_is_400() {
    let app = app(ScriptedBackend::default(), FakeLoader::default());

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/extract")
                .header("content-type", "application/json")
                .body(Body::from("{\"id\": "))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"], "invalid_request");
}
