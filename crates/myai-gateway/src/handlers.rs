// SPDX-FileCopyrightText: 2026 MyAI Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for the gateway.

use axum::{
    body::Bytes,
    extract::{FromRequest, Query, Request, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Form, Json,
};
use std::sync::atomic::Ordering;

use myai_core::{
    AudioEnvelope, HealthStatus, ImageEnvelope, MyaiError, PluginAdapter, PromptReply,
    TextEnvelope,
};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use crate::server::GatewayState;

/// Query flags shared by the ASR and TTS routes.
#[derive(Debug, Default, Deserialize)]
pub struct PromptQuery {
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default, rename = "narrateResponse")]
    pub narrate_response: Option<String>,
}

impl PromptQuery {
    /// Only the literal `true` enables narration.
    pub fn narrate(&self) -> bool {
        self.narrate_response.as_deref() == Some("true")
    }
}

/// TTS body, accepted as form fields or JSON.
#[derive(Debug, Default, Deserialize)]
pub struct TextBody {
    #[serde(default, rename = "userMessage")]
    pub user_message: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CaptionQuery {
    #[serde(default)]
    pub prompt: Option<String>,
    /// `conditional=false` captions without any prefix.
    #[serde(default)]
    pub conditional: Option<String>,
}

impl CaptionQuery {
    pub fn unconditional(&self) -> bool {
        self.conditional.as_deref() == Some("false")
    }
}

#[derive(Debug, Serialize)]
pub struct CaptionResponse {
    pub caption: String,
}

#[derive(Debug, Serialize)]
pub struct TrainingResponse {
    pub run_id: String,
    pub output_dir: String,
}

/// Response body for GET /health.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    /// Whether the agent finished its warm-up greeting.
    pub awake: bool,
    /// One entry per collaborator that is not healthy.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<String>,
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
        .into_response()
}

/// Wraps a [`MyaiError`] so handlers can return it with `?`.
#[derive(Debug)]
pub struct ApiError(pub MyaiError);

impl From<MyaiError> for ApiError {
    fn from(err: MyaiError) -> Self {
        Self(err)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            err if err.is_client_error() => StatusCode::BAD_REQUEST,
            MyaiError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_client_error() {
            warn!(error = %self.0, "rejected request");
        } else {
            error!(error = %self.0, "request failed");
        }
        error_response(status, self.0.to_string())
    }
}

/// POST `<route_asr>`
///
/// The body is the raw audio container.
pub async fn post_asr(
    State(state): State<GatewayState>,
    Query(query): Query<PromptQuery>,
    body: Bytes,
) -> Result<Json<PromptReply>, ApiError> {
    let narrate_response = query.narrate();
    let envelope = AudioEnvelope {
        audio: body.to_vec(),
        mode: query.mode,
        narrate_response,
    };
    let mut agent = state.agent.lock().await;
    Ok(Json(agent.handle_audio_prompt(envelope).await?))
}

/// POST `<route_tts>`
pub async fn post_tts(State(state): State<GatewayState>, request: Request) -> Response {
    let query = match Query::<PromptQuery>::try_from_uri(request.uri()) {
        Ok(Query(query)) => query,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, e.body_text()),
    };

    let body = match read_text_body(request).await {
        Ok(body) => body,
        Err(response) => return response,
    };

    let narrate_response = query.narrate();
    let envelope = TextEnvelope {
        user_message: body.user_message,
        mode: query.mode,
        narrate_response,
    };
    let mut agent = state.agent.lock().await;
    match agent.handle_text_prompt(envelope).await {
        Ok(reply) => Json(reply).into_response(),
        Err(e) => ApiError(e).into_response(),
    }
}

/// Parses `userMessage` from JSON or form bodies. Any other content type
/// carries no message.
async fn read_text_body(request: Request) -> Result<TextBody, Response> {
    let content_type = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();

    if content_type.starts_with("application/json") {
        Json::<TextBody>::from_request(request, &())
            .await
            .map(|Json(body)| body)
            .map_err(|e| error_response(StatusCode::BAD_REQUEST, e.body_text()))
    } else if content_type.starts_with("application/x-www-form-urlencoded") {
        Form::<TextBody>::from_request(request, &())
            .await
            .map(|Form(body)| body)
            .map_err(|e| error_response(StatusCode::BAD_REQUEST, e.body_text()))
    } else {
        Ok(TextBody::default())
    }
}

/// POST `<route_caption>`
///
/// The body is the raw image; `?prompt=` overrides the conditional prefix and
/// `?conditional=false` drops it.
pub async fn post_caption(
    State(state): State<GatewayState>,
    Query(query): Query<CaptionQuery>,
    body: Bytes,
) -> Result<Json<CaptionResponse>, ApiError> {
    let mut captions = state.captions.lock().await;
    let caption = if query.unconditional() {
        captions.analyze(&body).await?
    } else {
        let envelope = ImageEnvelope {
            image: body.to_vec(),
            prompt: query.prompt,
        };
        captions.caption(envelope).await?
    };
    Ok(Json(CaptionResponse { caption }))
}

/// POST `<route_training>`
pub async fn post_training(State(state): State<GatewayState>) -> Response {
    let Some(trainer) = state.trainer.as_ref() else {
        return error_response(
            StatusCode::SERVICE_UNAVAILABLE,
            "training is not configured",
        );
    };
    match trainer.launch().await {
        Ok(run) => (
            StatusCode::ACCEPTED,
            Json(TrainingResponse {
                run_id: run.run_id,
                output_dir: run.output_dir.display().to_string(),
            }),
        )
            .into_response(),
        Err(e) => ApiError(e).into_response(),
    }
}

/// GET /health
///
/// Never takes a session lock, so it answers while a prompt is in flight.
/// `status` is `degraded` when any collaborator reports a problem.
pub async fn get_health(State(state): State<GatewayState>) -> Json<HealthResponse> {
    let mut issues = Vec::new();
    for adapter in &state.adapters {
        match adapter.health_check().await {
            Ok(HealthStatus::Healthy) => {}
            Ok(HealthStatus::Degraded(reason) | HealthStatus::Unhealthy(reason)) => {
                issues.push(format!("{}: {reason}", adapter.name()));
            }
            Err(e) => issues.push(format!("{}: {e}", adapter.name())),
        }
    }
    if !issues.is_empty() {
        warn!(issues = ?issues, "collaborator health degraded");
    }

    Json(HealthResponse {
        status: if issues.is_empty() { "ok" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        awake: state.awake.load(Ordering::Acquire),
        issues,
    })
}
