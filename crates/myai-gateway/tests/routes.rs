// SPDX-FileCopyrightText: 2026 MyAI Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Route tests driven through the router with `tower::ServiceExt::oneshot`.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use myai_agent::CaptionSession;
use myai_core::{PluginAdapter, TrainingLauncher};
use myai_gateway::{router, GatewayState, ServerConfig};
use myai_test_utils::{
    MockAdapter, MockCaptioner, MockHistorySink, MockTrainingLauncher, TestHarness, TestHarnessBuilder,
};
use serde_json::Value;
use tower::ServiceExt;

struct Gateway {
    app: Router,
    state: GatewayState,
    _temp_dir: tempfile::TempDir,
}

async fn gateway_with(
    builder: TestHarnessBuilder,
    trainer: Option<Arc<dyn TrainingLauncher>>,
    max_body_bytes: usize,
) -> Gateway {
    let (session, temp_dir) = builder.build().await.unwrap().into_session();
    let captions = CaptionSession::new(
        Arc::new(MockCaptioner::new()),
        Arc::new(MockHistorySink::new()),
    );
    let state = GatewayState::new(session, captions, trainer);
    let config = ServerConfig {
        max_body_bytes,
        ..ServerConfig::default()
    };
    let app = router(&config, state.clone());

    Gateway {
        app,
        state,
        _temp_dir: temp_dir,
    }
}

async fn gateway() -> Gateway {
    gateway_with(TestHarness::builder(), None, 1024 * 1024).await
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::String(String::from_utf8_lossy(&bytes).into()))
    };
    (status, json)
}

fn post(uri: &str, body: impl Into<Body>) -> Request<Body> {
    Request::post(uri).body(body.into()).unwrap()
}

#[tokio::test]
async fn health_reports_awake_state() {
    let gw = gateway().await;
    let (status, body) = send(&gw.app, Request::get("/health").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["awake"], false);

    assert!(gw.state.agent.lock().await.wake().await);
    let (_, body) = send(&gw.app, Request::get("/health").body(Body::empty()).unwrap()).await;
    assert_eq!(body["awake"], true);
}

#[tokio::test]
async fn health_answers_while_a_prompt_holds_the_agent() {
    let gw = gateway().await;
    let _in_flight = gw.state.agent.lock().await;

    let request = Request::get("/health").body(Body::empty()).unwrap();
    let answered =
        tokio::time::timeout(std::time::Duration::from_secs(1), send(&gw.app, request)).await;
    let (status, body) = answered.expect("health must not wait for the agent lock");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["awake"], false);
}

#[tokio::test]
async fn health_reports_degraded_collaborators() {
    let gw = gateway().await;
    let adapters: Vec<Arc<dyn PluginAdapter>> = vec![
        Arc::new(MockAdapter::healthy("hub-model-loader")),
        Arc::new(MockAdapter::unhealthy("remote-transcriber", "connection refused")),
    ];
    let state = gw.state.clone().with_adapters(adapters);
    let app = router(&ServerConfig::default(), state);

    let (status, body) = send(&app, Request::get("/health").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["issues"][0], "remote-transcriber: connection refused");
    assert_eq!(body["issues"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn health_omits_issues_when_collaborators_are_healthy() {
    let gw = gateway().await;
    let adapters: Vec<Arc<dyn PluginAdapter>> =
        vec![Arc::new(MockAdapter::healthy("hub-model-loader"))];
    let state = gw.state.clone().with_adapters(adapters);
    let app = router(&ServerConfig::default(), state);

    let (_, body) = send(&app, Request::get("/health").body(Body::empty()).unwrap()).await;
    assert_eq!(body["status"], "ok");
    assert!(body.get("issues").is_none());
}

#[tokio::test]
async fn asr_question_returns_transcription_and_reply() {
    let gw = gateway().await;
    let (status, body) = send(&gw.app, post("/api/v1/asr?mode=question", vec![10u8; 64])).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["transcription"], "what is the weather");
    assert_eq!(body["reply"], "mock reply");
    assert!(body["audio"].is_null());
    assert_eq!(gw.state.agent.lock().await.history().len(), 2);
}

#[tokio::test]
async fn asr_narrates_only_for_literal_true() {
    let gw = gateway().await;
    let (_, body) = send(
        &gw.app,
        post("/api/v1/asr?mode=question&narrateResponse=true", vec![10u8; 64]),
    )
    .await;
    assert!(body["audio"].is_string());

    let (_, body) = send(
        &gw.app,
        post("/api/v1/asr?mode=question&narrateResponse=yes", vec![10u8; 64]),
    )
    .await;
    assert!(body["audio"].is_null());
}

#[tokio::test]
async fn asr_transcribe_mode_skips_generation() {
    let gw = gateway().await;
    let (status, body) = send(&gw.app, post("/api/v1/asr?mode=transcribe", vec![10u8; 64])).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["transcription"], "what is the weather");
    assert!(body["reply"].is_null());
    assert!(gw.state.agent.lock().await.history().is_empty());
}

#[tokio::test]
async fn asr_rejects_bad_mode_and_empty_body() {
    let gw = gateway().await;

    let (status, body) = send(&gw.app, post("/api/v1/asr?mode=shout", vec![10u8; 8])).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("shout"));

    let (status, _) = send(&gw.app, post("/api/v1/asr", vec![10u8; 8])).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&gw.app, post("/api/v1/asr?mode=question", Body::empty())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn asr_collaborator_failure_is_500() {
    let gw = gateway_with(TestHarness::builder().with_failing_transcriber(), None, 1024).await;
    let (status, body) = send(&gw.app, post("/api/v1/asr?mode=question", vec![1u8; 8])).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].is_string());
    assert!(gw.state.agent.lock().await.history().is_empty());
}

#[tokio::test]
async fn asr_body_over_limit_is_rejected() {
    let gw = gateway_with(TestHarness::builder(), None, 16).await;
    let response = gw
        .app
        .clone()
        .oneshot(post("/api/v1/asr?mode=question", vec![1u8; 64]))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn tts_accepts_form_body() {
    let gw = gateway().await;
    let request = Request::post("/api/v1/tts?mode=question&narrateResponse=true")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from("userMessage=Hello+there"))
        .unwrap();
    let (status, body) = send(&gw.app, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["reply"], "mock reply");
    assert!(body["audio"].is_string());
    assert!(body["transcription"].is_null());

    let agent = gw.state.agent.lock().await;
    assert_eq!(agent.history().records()[0].content, "Hello there");
}

#[tokio::test]
async fn tts_accepts_json_body() {
    let gw = gateway().await;
    let request = Request::post("/api/v1/tts?mode=transcribe")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"userMessage": "echo me"}"#))
        .unwrap();
    let (status, body) = send(&gw.app, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["transcription"], "echo me");
    assert!(body["reply"].is_null());
}

#[tokio::test]
async fn tts_missing_message_is_400() {
    let gw = gateway().await;
    let (status, body) = send(&gw.app, post("/api/v1/tts?mode=question", Body::empty())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("userMessage"));

    let request = Request::post("/api/v1/tts?mode=question")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{}"))
        .unwrap();
    let (status, _) = send(&gw.app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn caption_uses_default_and_explicit_prompt() {
    let gw = gateway().await;

    let (status, body) = send(&gw.app, post("/api/v1/caption", vec![1u8, 2, 3])).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["caption"], "This is a photo of a cat");

    let (_, body) = send(&gw.app, post("/api/v1/caption?prompt=A%20drawing%20of", vec![1u8])).await;
    assert_eq!(body["caption"], "A drawing of a cat");

    assert_eq!(gw.state.captions.lock().await.history().len(), 2);
}

#[tokio::test]
async fn caption_without_condition_skips_the_prefix() {
    let gw = gateway().await;
    let (status, body) = send(
        &gw.app,
        post("/api/v1/caption?conditional=false&prompt=ignored", vec![1u8, 2]),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["caption"], "a cat");

    let captions = gw.state.captions.lock().await;
    assert_eq!(captions.history().records()[0].content, "[analyze_img] :: a cat");
}

#[tokio::test]
async fn caption_empty_image_is_400() {
    let gw = gateway().await;
    let (status, _) = send(&gw.app, post("/api/v1/caption", Body::empty())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn training_unconfigured_is_503() {
    let gw = gateway().await;
    let (status, body) = send(&gw.app, post("/api/v1/training", Body::empty())).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "training is not configured");
}

#[tokio::test]
async fn training_launch_is_202() {
    let launcher = Arc::new(MockTrainingLauncher::new("/srv/results"));
    let gw = gateway_with(TestHarness::builder(), Some(launcher.clone()), 1024).await;

    let (status, body) = send(&gw.app, post("/api/v1/training", Body::empty())).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["run_id"], "run-1");
    assert_eq!(body["output_dir"], "/srv/results/gpt2-run-1");
    assert_eq!(launcher.launches(), 1);
}
