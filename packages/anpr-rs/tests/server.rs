//! HTTP contract of the detection service.

mod common;

use std::io::Cursor;
use std::sync::Arc;

use anpr_rs::prelude::*;
use anpr_rs::server::{router, AppState};
use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::*;
use image::ImageFormat;
use serde_json::Value;
use tower::ServiceExt;

const BOUNDARY: &str = "anpr-test-boundary";

fn state(pipeline: AnprPipeline) -> AppState {
    AppState {
        pipeline: Arc::new(pipeline),
        model: "models/best.pt".to_string(),
    }
}

fn png_bytes() -> Vec<u8> {
    let mut buf = Vec::new();
    blank_image()
        .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .unwrap();
    buf
}

fn upload(content_type: &str, data: &[u8]) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"car.png\"\r\nContent-Type: {content_type}\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri("/detect")
        .header("content-type", format!("multipart/form-data; boundary={BOUNDARY}"))
        .body(Body::from(body))
        .unwrap()
}

async fn send(state: AppState, request: Request<Body>) -> (StatusCode, Value) {
    let response = router(state).oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_health() {
    let request = Request::builder().uri("/").body(Body::empty()).unwrap();
    let (status, body) = send(state(pipeline(Vec::new(), ScriptedReader::default(), false)), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ANPR Service Running");
    assert_eq!(body["model"], "models/best.pt");
    assert_eq!(body["debug"], false);
}

#[tokio::test]
async fn test_detect_returns_plates() {
    let reader = ScriptedReader::default()
        .with(1, Reading::text("KA 01 AB 1234"))
        .with(2, Reading::nothing());
    let pipeline = pipeline(vec![region(1, 0.9456), region(2, 0.5)], reader, true);

    let (status, body) = send(state(pipeline), upload("image/png", &png_bytes())).await;

    assert_eq!(status, StatusCode::OK);
    let plates = body["plates"].as_array().unwrap();
    assert_eq!(plates.len(), 2);
    assert_eq!(plates[0]["plate"], "KA01AB1234");
    assert_eq!(plates[0]["raw_text"], "KA 01 AB 1234");
    assert_eq!(plates[0]["status"], "OK");
    assert_eq!(plates[0]["confidence"], 0.946);
    assert_eq!(plates[0]["bbox"], serde_json::json!([1, 0, 51, 20]));
    assert_eq!(plates[1]["status"], "OCR_EMPTY");
}

#[tokio::test]
async fn test_detect_rejects_non_image() {
    let pipeline = pipeline(Vec::new(), ScriptedReader::default(), false);
    let (status, body) = send(state(pipeline), upload("text/plain", b"hello")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "File must be an image");
}

#[tokio::test]
async fn test_detect_rejects_undecodable_image() {
    let pipeline = pipeline(Vec::new(), ScriptedReader::default(), false);
    let (status, body) = send(state(pipeline), upload("image/jpeg", b"not really a jpeg")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Could not decode image");
}

#[tokio::test]
async fn test_detect_reports_detector_failure() {
    let pipeline = AnprPipeline::new(
        Arc::new(ScriptedDetector {
            regions: Err("weights corrupted".into()),
        }),
        Arc::new(TaggingCropper),
        Arc::new(ScriptedReader::default()),
        PipelineOptions { debug: Some(false) },
    );

    let (status, body) = send(state(pipeline), upload("image/png", &png_bytes())).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let detail = body["detail"].as_str().unwrap();
    assert!(detail.starts_with("ANPR processing failed"), "{detail}");
    assert!(detail.contains("weights corrupted"), "{detail}");
}

#[tokio::test]
async fn test_bind_resolves_hostnames() {
    let listener = anpr_rs::server::bind("localhost", 0).await.unwrap();
    let addr = listener.local_addr().unwrap();
    assert!(addr.ip().is_loopback());
    assert_ne!(addr.port(), 0);
}
