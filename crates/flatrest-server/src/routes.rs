//! HTTP routes for the server.
//!
//! Any first path segment names a collection:
//!
//! | Verb   | Path             | Success |
//! |--------|------------------|---------|
//! | GET    | `/{entity}`      | 200 `{success, length, data}` |
//! | GET    | `/{entity}/{id}` | 200 `{success, data}` |
//! | POST   | `/{entity}`      | 201 `{success, length, data}` |
//! | PUT    | `/{entity}/{id}` | 201 `{success, data}` |
//! | DELETE | `/{entity}/{id}` | 200 `{success, message}` |

use crate::{
    response::{ApiError, Envelope, Operation, INTERNAL_ERROR_MESSAGE},
    state::AppState,
};
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::{Request, Response, StatusCode},
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use flatrest_core::QueryDescriptor;
use serde_json::Value;
use std::{any::Any, time::Duration};
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{Any as AnyOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing::{error, info, Span};

/// Create the router with all routes.
///
/// Entity routes are nested under `prefix` (e.g. `/api`) unless it is
/// empty. The health route always stays at `/`.
pub fn create_router(state: AppState, prefix: &str) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AnyOrigin)
        .allow_methods(AnyOrigin)
        .allow_headers(AnyOrigin);

    let entities = Router::new()
        .route("/{entity}", get(list_records).post(create_record))
        .route(
            "/{entity}/{id}",
            get(get_record).put(update_record).delete(delete_record),
        );

    let router = Router::new().route("/", get(health));
    let router = if prefix.is_empty() {
        router.merge(entities)
    } else {
        router.nest(prefix, entities)
    };

    router
        .method_not_allowed_fallback(method_not_allowed)
        .fallback(route_not_found)
        .with_state(state)
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<_>| {
                    tracing::info_span!(
                        "request",
                        method = %request.method(),
                        uri = %request.uri(),
                    )
                })
                .on_request(|request: &Request<_>, _span: &Span| {
                    info!(
                        method = %request.method(),
                        path = %request.uri().path(),
                        "request"
                    );
                })
                .on_response(|response: &Response<_>, latency: Duration, _span: &Span| {
                    info!(
                        status = %response.status(),
                        latency = ?latency,
                        "response"
                    );
                }),
        )
}

// =============================================================================
// Global endpoints
// =============================================================================

async fn health() -> impl IntoResponse {
    Json(Envelope::message("API running!"))
}

async fn route_not_found() -> ApiError {
    ApiError::not_found("Route not found")
}

async fn method_not_allowed() -> ApiError {
    ApiError::new(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed")
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response<axum::body::Body> {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };
    error!(panic = %detail, "Request handler panicked");

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(Envelope::failure(INTERNAL_ERROR_MESSAGE)),
    )
        .into_response()
}

// =============================================================================
// Entity endpoints
// =============================================================================

async fn list_records(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
    params: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Path(entity) = path.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let Query(params) = params.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let query = QueryDescriptor::from_params(params);

    let listing = state
        .service
        .list(&entity, &query)
        .await
        .map_err(|e| ApiError::from_access(e, Operation::Read))?;

    Ok(Json(Envelope::list(
        listing.records.into_iter().map(Value::Object).collect(),
    )))
}

async fn get_record(
    State(state): State<AppState>,
    path: Result<Path<(String, String)>, PathRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Path((entity, id)) = path.map_err(|e| ApiError::bad_request(e.body_text()))?;

    let record = state
        .service
        .get(&entity, &id)
        .await
        .map_err(|e| ApiError::from_access(e, Operation::Read))?;

    Ok(Json(Envelope::data(record)))
}

async fn create_record(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Path(entity) = path.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let Json(payload) = body.map_err(|e| ApiError::bad_request(e.body_text()))?;

    let listing = state
        .service
        .create(&entity, payload)
        .await
        .map_err(|e| ApiError::from_access(e, Operation::Create))?;

    Ok((
        StatusCode::CREATED,
        Json(Envelope::list(
            listing.records.into_iter().map(Value::Object).collect(),
        )),
    ))
}

async fn update_record(
    State(state): State<AppState>,
    path: Result<Path<(String, String)>, PathRejection>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Path((entity, id)) = path.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let Json(payload) = body.map_err(|e| ApiError::bad_request(e.body_text()))?;

    let record = state
        .service
        .update(&entity, &id, payload)
        .await
        .map_err(|e| ApiError::from_access(e, Operation::Mutate))?;

    Ok((StatusCode::CREATED, Json(Envelope::data(record))))
}

async fn delete_record(
    State(state): State<AppState>,
    path: Result<Path<(String, String)>, PathRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Path((entity, id)) = path.map_err(|e| ApiError::bad_request(e.body_text()))?;

    state
        .service
        .delete(&entity, &id)
        .await
        .map_err(|e| ApiError::from_access(e, Operation::Mutate))?;

    Ok(Json(Envelope::message("Record deleted successfully")))
}
