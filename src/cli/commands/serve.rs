//! HTTP tool server for integration with other systems.
//!
//! Exposes the same tools as the MCP server over REST.

use crate::cli::Output;
use crate::config::Settings;
use crate::error::ReelcutError;
use crate::mcp::Tool;
use crate::media::MediaEngine;
use crate::tools::ToolRegistry;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

/// Shared application state.
struct AppState {
    registry: ToolRegistry,
}

/// Run the HTTP API server.
pub async fn run_serve(host: Option<String>, port: Option<u16>, settings: Settings) -> anyhow::Result<()> {
    std::fs::create_dir_all(settings.uploads_dir())?;
    std::fs::create_dir_all(settings.outputs_dir())?;

    let host = host.unwrap_or_else(|| settings.http.host.clone());
    let port = port.unwrap_or(settings.http.port);

    let app = router(&settings);

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("Reelcut Tool Server");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    println!();
    println!("Endpoints:");
    Output::kv("Health", "GET  /health");
    Output::kv("List Tools", "GET  /tools");
    Output::kv("Call Tool", "POST /tools/{name}");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, app).await?;

    Ok(())
}

/// Build the router over a fresh registry.
fn router(settings: &Settings) -> Router {
    let state = Arc::new(AppState {
        registry: ToolRegistry::new(MediaEngine::new(settings)),
    });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/tools", get(list_tools))
        .route("/tools/{name}", post(call_tool))
        .layer(cors)
        .with_state(state)
}

#[derive(Serialize)]
struct ToolsResponse {
    tools: Vec<Tool>,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

fn error_response(status: StatusCode, error: String) -> axum::response::Response {
    (status, Json(ErrorResponse { error })).into_response()
}

// === Handlers ===

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn list_tools(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(ToolsResponse {
        tools: state.registry.specs().iter().map(Tool::from).collect(),
    })
}

async fn call_tool(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Json(arguments): Json<Value>,
) -> impl IntoResponse {
    if state.registry.get(&name).is_none() {
        return error_response(StatusCode::NOT_FOUND, format!("Unknown tool: {}", name));
    }

    info!("HTTP tool call: {} {}", name, arguments);

    match state.registry.call(&name, &arguments).await {
        Ok(outcome) => Json(outcome).into_response(),
        Err(e @ ReelcutError::InvalidToolCall(_)) => {
            error_response(StatusCode::BAD_REQUEST, e.to_string())
        }
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}
