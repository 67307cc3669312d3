use std::net::SocketAddr;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::sync::watch;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::rpc::handlers::{CastVotePayload, RpcError, RpcHandler, VerifyVotePayload, PARSE_ERROR};
use crate::utils::METRICS;

/// JSON-RPC 2.0 request structure (simplified)
#[derive(Debug, Deserialize)]
struct JsonRpcRequest {
    #[allow(dead_code)]
    jsonrpc: Option<String>,
    method: String,
    params: Option<Value>,
    id: Option<Value>,
}

/// JSON-RPC 2.0 response
#[derive(Debug, Serialize)]
struct JsonRpcResponse {
    jsonrpc: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<Value>,
    id: Option<Value>,
}

impl JsonRpcResponse {
    fn result(id: Option<Value>, v: Value) -> Self {
        Self { jsonrpc: "2.0", result: Some(v), error: None, id }
    }
    fn error(id: Option<Value>, e: RpcError) -> Self {
        Self {
            jsonrpc: "2.0",
            result: None,
            error: Some(json!({"code": e.code, "message": e.message})),
            id,
        }
    }
}

/// HTTP front for the vote service.
pub struct RpcServer {
    addr: SocketAddr,
    handler: RpcHandler,
}

impl RpcServer {
    pub fn new(addr: SocketAddr, handler: RpcHandler) -> Self {
        Self { addr, handler }
    }

    pub fn router(handler: RpcHandler) -> Router {
        Router::new()
            .route("/health", get(|| async { "ok" }))
            .route("/metrics", get(|| async { METRICS.render() }))
            .route("/vote/cast", post(cast_vote))
            .route("/vote/verify", post(verify_vote))
            .route("/blockchain/stats", get(blockchain_stats))
            .route("/rpc", post(json_rpc_endpoint))
            .layer(TraceLayer::new_for_http())
            .with_state(handler)
    }

    /// Serve until `shutdown` flips to true.
    pub async fn start(self, mut shutdown: watch::Receiver<bool>) -> anyhow::Result<()> {
        let app = Self::router(self.handler);
        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        info!("Starting RPC server on {}", listener.local_addr()?);

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.wait_for(|stop| *stop).await;
            })
            .await?;
        info!("RPC server stopped");
        Ok(())
    }
}

fn bad_request(message: impl Into<String>) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({"success": false, "error": message.into()})),
    )
        .into_response()
}

async fn cast_vote(State(rh): State<RpcHandler>, body: Bytes) -> Response {
    let payload: CastVotePayload = match serde_json::from_slice(&body) {
        Ok(p) => p,
        Err(e) => return bad_request(format!("invalid request body: {}", e)),
    };

    match rh.cast_vote(payload).await {
        Ok(resp) if resp.success => Json(resp).into_response(),
        Ok(resp) => (StatusCode::BAD_REQUEST, Json(resp)).into_response(),
        Err(e) => bad_request(e.to_string()),
    }
}

async fn verify_vote(State(rh): State<RpcHandler>, body: Bytes) -> Response {
    let payload: VerifyVotePayload = match serde_json::from_slice(&body) {
        Ok(p) => p,
        Err(e) => return bad_request(format!("invalid request body: {}", e)),
    };

    match rh.verify_vote(payload) {
        Ok(Some(verification)) => {
            Json(json!({"success": true, "verification": verification})).into_response()
        }
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(json!({"success": false, "error": "vote not found on blockchain"})),
        )
            .into_response(),
        Err(e) => bad_request(e.to_string()),
    }
}

async fn blockchain_stats(State(rh): State<RpcHandler>) -> Response {
    Json(json!({"success": true, "stats": rh.stats()})).into_response()
}

/// JSON-RPC router: single endpoint POST /rpc
async fn json_rpc_endpoint(State(rh): State<RpcHandler>, body: Bytes) -> Response {
    let req: JsonRpcRequest = match serde_json::from_slice(&body) {
        Ok(r) => r,
        Err(_) => {
            let err = RpcError { code: PARSE_ERROR, message: "Parse error".into() };
            return Json(JsonRpcResponse::error(None, err)).into_response();
        }
    };

    let id = req.id.clone();
    let resp = match rh.dispatch(&req.method, req.params).await {
        Ok(v) => JsonRpcResponse::result(id, v),
        Err(e) => JsonRpcResponse::error(id, e),
    };
    Json(resp).into_response()
}
