// SPDX-FileCopyrightText: 2026 MyAI Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end tests for the complete MyAI pipeline.
//!
//! The first group runs on the mock harness. The second wires the real
//! tokenizer, inference client, audio codec, and gateway against a wiremock
//! inference server.

use std::path::Path;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use http_body_util::BodyExt;
use myai_agent::{
    AgentCollaborators, AgentSession, CaptionSession, JsonHistoryStore, ModelResolver,
    SessionSettings,
};
use myai_config::MyaiConfig;
use myai_core::{AudioCodec, HistorySink, Role};
use myai_gateway::{router, GatewayState, ServerConfig};
use myai_inference::{InferenceStack, SymphoniaCodec};
use myai_test_utils::TestHarness;
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ---- Mock harness ----

#[tokio::test]
async fn conversation_round_trips_through_flushed_transcript() {
    let harness = TestHarness::builder()
        .with_mock_responses(vec!["First answer".to_string(), "Second answer".to_string()])
        .build()
        .await
        .unwrap();
    let history_dir = harness.history_dir.clone();
    let (mut session, _temp_dir) = harness.into_session();

    assert_eq!(session.generate_reply("one").await.unwrap(), "First answer");
    assert_eq!(session.generate_reply("two").await.unwrap(), "Second answer");
    let expected = session.history().records().to_vec();

    let path = session.close().await.unwrap().unwrap();
    assert!(path.starts_with(history_dir.join("AGENT")));

    let reloaded = JsonHistoryStore::new(&history_dir).load(&path).unwrap();
    assert_eq!(reloaded, expected);
    assert_eq!(
        reloaded.iter().map(|r| r.role).collect::<Vec<_>>(),
        vec![Role::User, Role::Agent, Role::User, Role::Agent]
    );
}

#[tokio::test]
async fn warm_up_then_reply_keeps_greeting_first() {
    let harness = TestHarness::builder()
        .with_mock_responses(vec!["Hi, I am MyAI.".to_string(), "Sunny.".to_string()])
        .build()
        .await
        .unwrap();
    let (mut session, _temp_dir) = harness.into_session();

    assert!(session.wake().await);
    session.generate_reply("weather?").await.unwrap();

    let contents: Vec<&str> = session
        .history()
        .records()
        .iter()
        .map(|r| r.content.as_str())
        .collect();
    assert_eq!(contents, vec!["Hi, I am MyAI.", "weather?", "Sunny."]);
}

// ---- Real collaborators over a mock inference server ----

const TOKENIZER_JSON: &str = r#"{
    "version": "1.0",
    "truncation": null,
    "padding": null,
    "added_tokens": [],
    "normalizer": null,
    "pre_tokenizer": {"type": "Whitespace"},
    "post_processor": null,
    "decoder": null,
    "model": {
        "type": "WordLevel",
        "vocab": {"<unk>": 0, "hello": 1, "world": 2, "weather": 3, "sunny": 4},
        "unk_token": "<unk>"
    }
}"#;

fn write_tokenizer(models_dir: &Path) {
    let dir = models_dir.join("gpt2");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("tokenizer.json"), TOKENIZER_JSON).unwrap();
    std::fs::write(dir.join("tokenizer_config.json"), r#"{"eos_token": "<unk>"}"#).unwrap();
}

async fn mount_inference(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/v1/models/load"))
        .and(body_partial_json(json!({"model": "gpt2"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "model": "gpt2",
            "embedding_rows": 5,
            "eos_token_id": 0,
            "max_position_embeddings": 1024
        })))
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/generate"))
        .and(body_partial_json(json!({"input_ids": [3]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"output_ids": [3, 4]})))
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/transcribe"))
        .and(body_partial_json(json!({"sample_rate": 16000})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"text": "weather"})))
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/synthesize"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "samples": [0.0, 0.5, -0.5, 0.25],
            "sample_rate": 16000
        })))
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/caption"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"caption": "This is a photo of a dog"})),
        )
        .mount(server)
        .await;
}

async fn real_gateway(server: &MockServer, root: &Path) -> (axum::Router, GatewayState) {
    let models_dir = root.join("models");
    write_tokenizer(&models_dir);

    let mut config = MyaiConfig::default();
    config.model.inference_url = server.uri();
    config.model.models_dir = models_dir;
    config.history.dir = root.join("history");
    config.agent.bootstrap_path = root.join("agent.json");

    let stack = InferenceStack::from_config(&config).unwrap();
    let sink: Arc<dyn HistorySink> = Arc::new(JsonHistoryStore::new(&config.history.dir));
    let resolver = ModelResolver::from_config(stack.loader.clone(), &config.model);
    let collaborators = AgentCollaborators {
        transcriber: stack.transcriber.clone(),
        synthesizer: stack.synthesizer.clone(),
        codec: Arc::new(SymphoniaCodec::new()),
        sink: sink.clone(),
    };
    let agent = AgentSession::open(&resolver, collaborators, SessionSettings::from_config(&config))
        .await
        .unwrap();
    let captions = CaptionSession::new(stack.captioner.clone(), sink);

    let state = GatewayState::new(agent, captions, stack.trainer.clone())
        .with_adapters(stack.adapters.clone());
    (router(&ServerConfig::default(), state.clone()), state)
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn text_prompt_runs_through_real_tokenizer_and_server() {
    let server = MockServer::start().await;
    mount_inference(&server).await;
    let root = tempfile::tempdir().unwrap();
    let (app, state) = real_gateway(&server, root.path()).await;

    let request = Request::post("/api/v1/tts?mode=question&narrateResponse=true")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"userMessage": "weather"}"#))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["reply"], "sunny");
    assert!(body["audio"].as_str().is_some_and(|a| !a.is_empty()));
    assert!(body["transcription"].is_null());
    assert_eq!(state.agent.lock().await.history().len(), 2);
}

#[tokio::test]
async fn audio_prompt_is_decoded_resampled_and_answered() {
    let server = MockServer::start().await;
    mount_inference(&server).await;
    let root = tempfile::tempdir().unwrap();
    let (app, _state) = real_gateway(&server, root.path()).await;

    // 0.1 s of 48 kHz mono audio; the session resamples to 16 kHz.
    let pcm: Vec<i16> = (0..4800).map(|i| ((i % 48) * 500) as i16).collect();
    let wav = SymphoniaCodec::new().encode_wav(&pcm, 48_000).unwrap();

    let request = Request::post("/api/v1/asr?mode=question")
        .body(Body::from(wav))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["transcription"], "weather");
    assert_eq!(body["reply"], "sunny");
    assert!(body["audio"].is_null());
}

#[tokio::test]
async fn caption_route_uses_remote_captioner() {
    let server = MockServer::start().await;
    mount_inference(&server).await;
    let root = tempfile::tempdir().unwrap();
    let (app, state) = real_gateway(&server, root.path()).await;

    let request = Request::post("/api/v1/caption")
        .body(Body::from(vec![0x89, b'P', b'N', b'G']))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["caption"], "This is a photo of a dog");

    let records = state.captions.lock().await.history().records().to_vec();
    assert_eq!(records.len(), 1);
    assert!(records[0].content.starts_with("[caption_img] :: "));
}

#[tokio::test]
async fn inference_outage_surfaces_as_500() {
    let server = MockServer::start().await;
    mount_inference(&server).await;
    let root = tempfile::tempdir().unwrap();
    let (app, state) = real_gateway(&server, root.path()).await;

    // No generate mock matches these ids.
    let request = Request::post("/api/v1/tts?mode=question")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from("userMessage=hello+world"))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(json_body(response).await["error"].is_string());
    assert!(state.agent.lock().await.history().is_empty());
}

#[tokio::test]
async fn health_tracks_inference_server_reachability() {
    let server = MockServer::start().await;
    mount_inference(&server).await;
    let root = tempfile::tempdir().unwrap();
    let (app, _state) = real_gateway(&server, root.path()).await;

    // No /health mock yet: the server answers 404.
    let response = app
        .clone()
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let body = json_body(response).await;
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["issues"].as_array().unwrap().len(), 4);

    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    let response = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let body = json_body(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["awake"], false);
}
