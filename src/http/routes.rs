use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Request, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use serde_json::json;
use tower::ServiceExt;
use tower_http::{services::ServeFile, trace::TraceLayer};

use crate::core::{
    domain::{ExecutionResult, RunRequest},
    engine::Sandbox,
    errors::SandboxError,
};
use crate::http::{
    present::{LinkSettings, ToolResponse, present},
    viewer,
};

#[derive(Debug)]
pub struct AppState {
    pub sandbox: Sandbox,
    pub links: LinkSettings,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/execute", post(execute))
        .route("/tools/execute_python_code", post(execute_tool))
        .route("/view/*relpath", get(view_file))
        .route("/files/*relpath", get(serve_file))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

impl IntoResponse for SandboxError {
    fn into_response(self) -> Response {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": self.to_string() })),
        )
            .into_response()
    }
}

#[tracing::instrument(skip(state, req))]
async fn execute(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RunRequest>,
) -> Result<Json<ExecutionResult>, SandboxError> {
    let result = state.sandbox.execute(&req.code).await?;
    Ok(Json(result))
}

#[tracing::instrument(skip(state, req))]
async fn execute_tool(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RunRequest>,
) -> Result<Json<ToolResponse>, SandboxError> {
    let result = state.sandbox.execute(&req.code).await?;
    Ok(Json(present(result, &state.links)))
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, Json(json!({ "detail": "File not found" }))).into_response()
}

async fn serve_file(
    State(state): State<Arc<AppState>>,
    Path(relpath): Path<String>,
    req: Request,
) -> Response {
    let Some(file) = viewer::resolve_safe(state.sandbox.artifact_root(), &relpath).await else {
        return not_found();
    };

    match ServeFile::new(file).oneshot(req).await {
        Ok(response) => response.into_response(),
        Err(never) => match never {},
    }
}

async fn view_file(
    State(state): State<Arc<AppState>>,
    Path(relpath): Path<String>,
) -> Response {
    let root = state.sandbox.artifact_root();
    let Some(file) = viewer::resolve_safe(root, &relpath).await else {
        return not_found();
    };

    let rel_display = tokio::fs::canonicalize(root)
        .await
        .ok()
        .and_then(|base| {
            file.strip_prefix(&base)
                .ok()
                .map(|p| p.to_string_lossy().replace('\\', "/"))
        })
        .unwrap_or(relpath);

    Html(viewer::render(&rel_display, &file)).into_response()
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn index() -> Html<&'static str> {
    Html(viewer::INDEX_PAGE)
}
