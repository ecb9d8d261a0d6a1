use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use mosaic_service::{
    ConceptSearchRequest, ConceptSearchResponse, IndexDocumentRequest, IndexDocumentResponse,
    RelatedDocumentsResponse, SearchAvailability, ServiceError, SimilaritySearchRequest,
    SimilaritySearchResponse, SynthesisRequest, SynthesisResponse,
};

use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/v1/similarity/search", post(similarity_search))
        .route("/v1/similarity/sessions/{id}", get(related_sessions))
        .route("/v1/similarity/documents/{id}", get(related_documents))
        .route("/v1/search/concept", get(concept_search))
        .route("/v1/search/availability", get(search_availability))
        .route("/v1/synthesize", post(synthesize))
        .route("/v1/documents/index", post(index_document))
        .with_state(state)
}

async fn health() -> StatusCode {
    StatusCode::OK
}

async fn similarity_search(
    State(state): State<AppState>,
    Json(payload): Json<SimilaritySearchRequest>,
) -> Result<Json<SimilaritySearchResponse>, ApiError> {
    let response = state.service.similarity_search(payload).await?;
    Ok(Json(response))
}

async fn related_sessions(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SimilaritySearchResponse>, ApiError> {
    let response = state.service.related_sessions(id).await?;
    Ok(Json(response))
}

async fn related_documents(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<RelatedDocumentsResponse>, ApiError> {
    let response = state.service.related_documents(id).await?;
    Ok(Json(response))
}

#[derive(Debug, Deserialize)]
struct ConceptParams {
    q: String,
    limit: Option<u32>,
    project_id: Option<Uuid>,
}

async fn concept_search(
    State(state): State<AppState>,
    Query(params): Query<ConceptParams>,
) -> Result<Json<ConceptSearchResponse>, ApiError> {
    let request = ConceptSearchRequest {
        query: params.q,
        limit: params.limit,
        project_id: params.project_id,
    };
    let response = state.service.concept_search(request).await?;
    Ok(Json(response))
}

async fn search_availability(State(state): State<AppState>) -> Json<SearchAvailability> {
    Json(state.service.search_availability().await)
}

async fn synthesize(
    State(state): State<AppState>,
    Json(payload): Json<SynthesisRequest>,
) -> Result<Json<SynthesisResponse>, ApiError> {
    let response = state.service.synthesize(payload).await?;
    Ok(Json(response))
}

async fn index_document(
    State(state): State<AppState>,
    Json(payload): Json<IndexDocumentRequest>,
) -> Result<Json<IndexDocumentResponse>, ApiError> {
    let response = state.service.index_document(payload).await?;
    Ok(Json(response))
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error_code: String,
    message: String,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    error_code: String,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, error_code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status,
            error_code: error_code.into(),
            message: message.into(),
        }
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        let message = err.to_string();
        match err {
            ServiceError::InvalidRequest { .. } => {
                ApiError::new(StatusCode::BAD_REQUEST, "invalid_request", message)
            }
            ServiceError::NotFound { .. } => {
                ApiError::new(StatusCode::NOT_FOUND, "not_found", message)
            }
            ServiceError::ProviderUnavailable { .. } => {
                ApiError::new(StatusCode::BAD_GATEWAY, "provider_unavailable", message)
            }
            ServiceError::Provider { .. } => {
                ApiError::new(StatusCode::BAD_GATEWAY, "provider_error", message)
            }
            ServiceError::Storage { .. } => {
                ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "storage_error", message)
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error_code: self.error_code,
            message: self.message,
        };
        (self.status, Json(body)).into_response()
    }
}
