// 🌐 REST API - axum router for the bank aggregate
//
//   GET    /api/health
//   GET    /api/banks
//   POST   /api/banks            → 201 + Location
//   GET    /api/banks/consume    → peer listing, verbatim
//   GET    /api/banks/:id
//   PUT    /api/banks/:id        → reconcile branches by code
//   DELETE /api/banks/:id        → 204
//
// Every failure is a BankError; its IntoResponse impl picks status and body.
// That includes unknown paths (404) and unsupported methods (405).

use crate::dto::{BankRequest, BankResponse, HealthResponse};
use crate::error::{
    BankError, BAD_REQUEST, INVALID_FIELD_TYPE, INVALID_FORMAT_ERROR, JSON_PARSE_ERROR,
};
use crate::service::BankService;
use crate::VERSION;
use axum::{
    async_trait,
    body::Bytes,
    extract::{
        rejection::{BytesRejection, FailedToBufferBody},
        FromRequest, FromRequestParts, OriginalUri, Path, Request, State,
    },
    http::{header, request::Parts, Method, StatusCode, Uri},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<BankService>,
}

impl AppState {
    pub fn new(service: BankService) -> Self {
        AppState {
            service: Arc::new(service),
        }
    }
}

pub fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/banks", get(list_banks).post(create_bank))
        .route("/banks/consume", get(consume_banks))
        .route(
            "/banks/:id",
            get(get_bank).put(update_bank).delete(delete_bank),
        );

    Router::new()
        .nest("/api", api_routes)
        .method_not_allowed_fallback(method_not_allowed)
        .fallback(no_route)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ============================================================================
// Extractors
// ============================================================================

/// `:id` path segment parsed as a UUID
#[derive(Debug, Clone, Copy)]
pub struct BankId(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for BankId
where
    S: Send + Sync,
{
    type Rejection = BankError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(id) = Path::<Uuid>::from_request_parts(parts, state)
            .await
            .map_err(|_| {
                BankError::invalid_format(INVALID_FIELD_TYPE, "'id' is expected to be of type 'Uuid'")
            })?;

        Ok(BankId(id))
    }
}

/// JSON body with errors in the service's own shape.
///
/// - unreadable body   → "Bad Request" (too large, or the stream failed)
/// - empty body        → "Bad Request" / "Required request body is missing"
/// - broken JSON       → "JSON parse error"
/// - wrong value types → "Invalid format error"
#[derive(Debug, Clone)]
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = BankError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(body_rejection)?;

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Err(BankError::invalid_format(
                BAD_REQUEST,
                "Required request body is missing",
            ));
        }

        serde_json::from_slice(&bytes).map(JsonBody).map_err(|e| {
            let message = match e.classify() {
                serde_json::error::Category::Data => INVALID_FORMAT_ERROR,
                _ => JSON_PARSE_ERROR,
            };
            BankError::invalid_format(message, e.to_string())
        })
    }
}

fn body_rejection(rejection: BytesRejection) -> BankError {
    let details = match rejection {
        BytesRejection::FailedToBufferBody(FailedToBufferBody::LengthLimitError(_)) => {
            "Request body exceeds the size limit"
        }
        _ => "Request body could not be read",
    };

    BankError::invalid_format(BAD_REQUEST, details)
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "OK".to_string(),
        version: VERSION.to_string(),
    })
}

/// GET /api/banks - All banks, ordered by name
async fn list_banks(State(state): State<AppState>) -> Result<Json<Vec<BankResponse>>, BankError> {
    Ok(Json(state.service.get_all()?))
}

/// GET /api/banks/:id
async fn get_bank(
    State(state): State<AppState>,
    BankId(id): BankId,
) -> Result<Json<BankResponse>, BankError> {
    Ok(Json(state.service.get_by_id(id)?))
}

/// POST /api/banks - Create a bank with its initial branches
async fn create_bank(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<BankRequest>,
) -> Result<impl IntoResponse, BankError> {
    let created = state.service.create(request)?;
    let location = format!("/banks/{}", created.id);

    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(created),
    ))
}

/// PUT /api/banks/:id - Replace name/type and reconcile branches by code
async fn update_bank(
    State(state): State<AppState>,
    BankId(id): BankId,
    JsonBody(request): JsonBody<BankRequest>,
) -> Result<Json<BankResponse>, BankError> {
    Ok(Json(state.service.update(id, request)?))
}

/// DELETE /api/banks/:id
async fn delete_bank(
    State(state): State<AppState>,
    BankId(id): BankId,
) -> Result<StatusCode, BankError> {
    state.service.delete(id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/banks/consume - Banks from the peer service
async fn consume_banks(
    State(state): State<AppState>,
) -> Result<Json<Vec<BankResponse>>, BankError> {
    Ok(Json(state.service.consume_get_all().await?))
}

async fn no_route(uri: Uri) -> BankError {
    BankError::NoRoute(uri.path().to_string())
}

/// Nested routes see a stripped URI; report the one the client sent
async fn method_not_allowed(method: Method, OriginalUri(uri): OriginalUri) -> BankError {
    BankError::MethodNotAllowed {
        method: method.to_string(),
        path: uri.path().to_string(),
    }
}
