//! The HTTP front door: `GET /version`, `POST /log`.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderValue, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use energylabel_core::{Run, WarehouseError};
use serde::Serialize;
use serde_json::{json, Value};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;
use tracing::warn;
use validator::Validate;

use crate::validation::{OneOrMany, RunPayload};
use crate::AppState;

#[derive(Serialize)]
struct VersionResponse {
    version: &'static str,
}

async fn version() -> Json<VersionResponse> {
    Json(VersionResponse {
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn log(
    State(state): State<Arc<AppState>>,
    Json(body): Json<OneOrMany<RunPayload>>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let payloads = body.into_vec();
    let mut runs = Vec::with_capacity(payloads.len());
    for payload in payloads {
        payload
            .validate()
            .map_err(|err| validation_error_response(&err.to_string()))?;
        runs.push(Run::from(payload));
    }

    state
        .warehouse
        .insert_runs(&runs)
        .await
        .map_err(|err| warehouse_error_response(&err))?;

    Ok(Json(json!({ "inserted": runs.len() })))
}

fn validation_error_response(message: &str) -> (StatusCode, Json<Value>) {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": message })))
}

/// Map a [`WarehouseError`] to the HTTP status `POST /log` reports: a
/// driver failure is the server's fault (500), everything else — a bad
/// payload, a schema misuse, a bad config value surfaced too late to be
/// rejected earlier — is treated as a client error (400).
fn warehouse_error_response(error: &WarehouseError) -> (StatusCode, Json<Value>) {
    let status = match error {
        WarehouseError::DriverError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        _ => StatusCode::BAD_REQUEST,
    };
    if status == StatusCode::INTERNAL_SERVER_ERROR {
        warn!(error = %error, "driver error handling /log");
    }
    (status, Json(json!({ "error": error.to_string() })))
}

/// `POST /log` bodies larger than this are rejected with 413 before they
/// ever reach the handler or get deserialized.
const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Build the router. A `ServiceBuilder` layers CORS, a CSP header, and a
/// request body size cap over every route, the same shape the teacher's
/// dashboard wires up its own middleware stack with.
pub fn build_router(state: Arc<AppState>) -> Router {
    let middleware = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .layer(SetResponseHeaderLayer::if_not_present(
            axum::http::header::CONTENT_SECURITY_POLICY,
            HeaderValue::from_static("default-src 'none'"),
        ))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES));

    Router::new()
        .route("/version", get(version))
        .route("/log", post(log))
        .layer(middleware)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use energylabel_core::WarehouseError;

    #[test]
    fn schema_misuse_maps_to_400() {
        let err = WarehouseError::SchemaMisuseError("x".into());
        let (status, _) = warehouse_error_response(&err);
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn validation_error_maps_to_400() {
        let err = WarehouseError::ValidationError("bad field".into());
        let (status, _) = warehouse_error_response(&err);
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
