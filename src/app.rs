//! HTTP surface of `ytsum-app`: JSON endpoints over the pipeline plus a small
//! HTML page.

pub mod model;
mod page;

use std::path::Path;
use std::sync::Arc;

use axum::Router;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Json, Response};
use axum::routing::{get, post};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use crate::error::Error;
use crate::pipeline::{Pipeline, RequestContext, Submissions};

use self::model::{ErrorBody, SummarizeRequest, SummarizeResponse, VideoRequest, VideoResponse};

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
    pub submissions: Arc<Submissions>,
}

impl AppState {
    pub fn new(pipeline: Pipeline) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            submissions: Arc::new(Submissions::new()),
        }
    }
}

type ApiError = (StatusCode, Json<ErrorBody>);

fn api_error(err: &Error) -> ApiError {
    let status =
        StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    if status.is_server_error() {
        tracing::error!(error = %err, %status, "request failed");
    } else {
        tracing::warn!(error = %err, %status, "request rejected");
    }
    (status, Json(ErrorBody::new(err.user_message())))
}

fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    body.map(|Json(value)| value).map_err(|rejection| {
        tracing::debug!(error = %rejection.body_text(), "rejected request body");
        api_error(&Error::InvalidInput("Malformed request body".to_owned()))
    })
}

/// Serves `web_dir` when it holds an `index.html`; otherwise every unknown
/// path gets the built-in page.
pub fn router(state: AppState, web_dir: Option<&Path>) -> Router {
    let mut app = Router::new()
        .route("/healthz", get(|| async { "ok\n" }))
        .route("/api/summarize", post(summarize_handler))
        .route("/api/video", post(video_handler))
        .route("/api/session", get(session_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let web_index = web_dir.map(|dir| (dir, dir.join("index.html")));
    match web_index {
        Some((dir, index)) if index.exists() => {
            let static_files = ServeDir::new(dir).not_found_service(ServeFile::new(index));
            app = app.fallback_service(static_files);
        }
        _ => {
            app = app.fallback(|| async { Html(page::INDEX_HTML) });
        }
    }
    app
}

async fn summarize_handler(
    State(state): State<AppState>,
    body: Result<Json<SummarizeRequest>, JsonRejection>,
) -> Result<Json<SummarizeResponse>, ApiError> {
    let req = json_body(body)?;
    let text = req.text.unwrap_or_default();
    let result = state
        .pipeline
        .summarizer()
        .generate_summary(&text)
        .await
        .map_err(|err| api_error(&err))?;
    Ok(Json(result.into()))
}

async fn video_handler(
    State(state): State<AppState>,
    body: Result<Json<VideoRequest>, JsonRejection>,
) -> Result<Json<VideoResponse>, ApiError> {
    let req = json_body(body)?;
    let mut ctx = RequestContext::new(req.url.as_deref().unwrap_or_default());
    let ticket = state.submissions.begin(&ctx);
    let outcome = state.pipeline.run(&mut ctx).await;

    if !state.submissions.finish(ticket, ctx.clone()) {
        return Err((
            StatusCode::CONFLICT,
            Json(ErrorBody::new(
                "A newer submission replaced this one. Showing the latest request instead.",
            )),
        ));
    }
    outcome.map_err(|err| api_error(&err))?;

    let (Some(video), Some(source), Some(summary)) = (ctx.video, ctx.source, ctx.summary) else {
        tracing::error!(request_id = %ctx.request_id, "pipeline finished without a result");
        return Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorBody::new("Something went wrong. Please try again.")),
        ));
    };
    Ok(Json(VideoResponse {
        request_id: ctx.request_id,
        paragraphs: summary.paragraphs(),
        video,
        source,
        summary: summary.text,
        model: summary.model,
        degraded: summary.degraded,
    }))
}

async fn session_handler(State(state): State<AppState>) -> Response {
    match state.submissions.latest() {
        Some(ctx) => Json(ctx).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    }
}
