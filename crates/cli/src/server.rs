//! HTTP API.
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/health` | Service status and version |
//! | `POST` | `/rag/query` | Answer a question for the calling user |
//! | `POST` | `/embeddings/reindex` | Re-embed the caller's tenant (admins only) |
//! | `GET`  | `/metrics` | In-process query metrics |
//!
//! Callers are authenticated upstream; the gateway forwards the identity in
//! `x-user-id`, `x-tenant-id`, `x-user-role`, `x-user-permissions`
//! (comma separated), `x-user-admin` and `x-store-id` headers.
//!
//! Errors use `{ "error": { "code": "...", "message": "..." } }` with codes
//! `bad_request` (400), `unauthenticated` (401), `access_denied` (403) and
//! `internal` (500).

use crate::services::Services;
use axum::{
    extract::State,
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use ragdesk_core::AppError;
use ragdesk_knowledge::{MetricsSnapshot, Query, QueryFilter, RagResult, UserIdentity};
use serde::{Deserialize, Serialize};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

const DEFAULT_ROLE: &str = "staff";

/// Starts the HTTP server and runs until the process is terminated.
pub async fn run_server(bind: &str, cors_origins: &[String], services: Services) -> anyhow::Result<()> {
    let app = build_router(services).layer(cors_layer(cors_origins));

    tracing::info!("ragdesk API listening on http://{}", bind);

    let listener = tokio::net::TcpListener::bind(bind).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn build_router(services: Services) -> Router {
    Router::new()
        .route("/health", get(handle_health))
        .route("/rag/query", post(handle_query))
        .route("/embeddings/reindex", post(handle_reindex))
        .route("/metrics", get(handle_metrics))
        .with_state(services)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.iter().any(|o| o == "*") {
        return layer.allow_origin(Any);
    }

    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(parsed))
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            code: "bad_request",
            message: message.into(),
        }
    }

    fn unauthenticated(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            code: "unauthenticated",
            message: message.into(),
        }
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        match err {
            AppError::AccessDenied(message) => Self {
                status: StatusCode::FORBIDDEN,
                code: "access_denied",
                message,
            },
            other => {
                tracing::error!("Request failed: {}", other);
                Self {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    code: "internal",
                    message: other.to_string(),
                }
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code.to_string(),
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

// ============ Identity ============

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

fn identity_from_headers(headers: &HeaderMap) -> Result<UserIdentity, ApiError> {
    let user_id = header(headers, "x-user-id")
        .ok_or_else(|| ApiError::unauthenticated("missing x-user-id header"))?;
    let tenant_id = header(headers, "x-tenant-id")
        .ok_or_else(|| ApiError::unauthenticated("missing x-tenant-id header"))?;
    let role = header(headers, "x-user-role").unwrap_or(DEFAULT_ROLE);

    let permissions: Vec<String> = header(headers, "x-user-permissions")
        .map(|list| {
            list.split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    let mut identity = UserIdentity::new(user_id, tenant_id, role).with_permissions(permissions);
    if let Some(store_id) = header(headers, "x-store-id") {
        identity = identity.with_store(store_id);
    }
    if matches!(
        header(headers, "x-user-admin").map(str::to_ascii_lowercase).as_deref(),
        Some("true" | "1")
    ) {
        identity = identity.admin();
    }
    Ok(identity)
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    service: &'static str,
    version: &'static str,
    timestamp: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        service: "ragdesk",
        version: env!("CARGO_PKG_VERSION"),
        timestamp: Utc::now().to_rfc3339(),
    })
}

// ============ POST /rag/query ============

fn default_include_sources() -> bool {
    true
}

#[derive(Debug, Deserialize)]
struct QueryRequest {
    query: String,
    #[serde(default)]
    filters: Option<QueryFilter>,
    #[serde(default)]
    max_results: Option<usize>,
    #[serde(default = "default_include_sources")]
    include_sources: bool,
}

async fn handle_query(
    State(services): State<Services>,
    headers: HeaderMap,
    Json(request): Json<QueryRequest>,
) -> Result<Json<RagResult>, ApiError> {
    let identity = identity_from_headers(&headers)?;

    let text = request.query.trim();
    if text.is_empty() {
        return Err(ApiError::bad_request("query must not be empty"));
    }
    if request.max_results == Some(0) {
        return Err(ApiError::bad_request("max_results must be at least 1"));
    }

    let mut query = Query::new(text, identity);
    if let Some(filters) = request.filters {
        query = query.with_filters(filters);
    }
    if let Some(max_results) = request.max_results {
        query = query.with_max_results(max_results);
    }
    if !request.include_sources {
        query = query.without_sources();
    }

    let result = services.pipeline.retrieve_and_generate(&query).await?;
    Ok(Json(result))
}

// ============ POST /embeddings/reindex ============

#[derive(Debug, Serialize, Deserialize)]
struct ReindexResponse {
    status: String,
    task_id: String,
    tenant_id: String,
    chunks_reindexed: usize,
}

async fn handle_reindex(
    State(services): State<Services>,
    headers: HeaderMap,
) -> Result<Json<ReindexResponse>, ApiError> {
    let identity = identity_from_headers(&headers)?;
    let receipt = ragdesk_knowledge::reindex(&identity, services.index.as_ref()).await?;

    Ok(Json(ReindexResponse {
        status: "started".to_string(),
        task_id: receipt.task_id,
        tenant_id: receipt.tenant_id,
        chunks_reindexed: receipt.chunks_reindexed,
    }))
}

// ============ GET /metrics ============

async fn handle_metrics(State(services): State<Services>) -> Json<MetricsSnapshot> {
    Json(services.metrics.snapshot())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ragdesk_core::config::{AppConfig, ModelConfig, ProviderConfig};
    use ragdesk_knowledge::AnswerStatus;
    use tempfile::TempDir;

    fn ollama_slot() -> ModelConfig {
        ModelConfig {
            provider: ProviderConfig::Ollama {
                endpoint: "http://localhost:11434".to_string(),
                model: "llama3.2".to_string(),
            },
            temperature: 0.1,
            max_tokens: 500,
        }
    }

    /// Services over an empty corpus; no model call is ever made.
    async fn services(temp: &TempDir) -> Services {
        let mut config = AppConfig {
            workspace: temp.path().to_path_buf(),
            ..AppConfig::default()
        };
        config.generation.default_model = ollama_slot();
        config.generation.extended_model = ollama_slot();
        Services::build(&config).await.unwrap()
    }

    fn headers(pairs: &[(&'static str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, HeaderValue::from_str(value).unwrap());
        }
        map
    }

    fn request(query: &str) -> QueryRequest {
        QueryRequest {
            query: query.to_string(),
            filters: None,
            max_results: None,
            include_sources: true,
        }
    }

    #[test]
    fn test_identity_from_headers() {
        let identity = identity_from_headers(&headers(&[
            ("x-user-id", "u1"),
            ("x-tenant-id", "T1"),
            ("x-user-role", "sales"),
            ("x-user-permissions", "cost:view, docs:cost_pdf"),
            ("x-user-admin", "TRUE"),
            ("x-store-id", "S9"),
        ]))
        .unwrap();

        assert_eq!(identity.user_id, "u1");
        assert_eq!(identity.tenant_id, "T1");
        assert_eq!(identity.role, "sales");
        assert_eq!(identity.permissions, vec!["cost:view", "docs:cost_pdf"]);
        assert_eq!(identity.store_id.as_deref(), Some("S9"));
        assert!(identity.is_admin);
    }

    #[test]
    fn test_identity_defaults_and_missing_headers() {
        let identity =
            identity_from_headers(&headers(&[("x-user-id", "u1"), ("x-tenant-id", "T1")])).unwrap();
        assert_eq!(identity.role, DEFAULT_ROLE);
        assert!(!identity.is_admin);

        let err = identity_from_headers(&headers(&[("x-user-id", "u1")])).unwrap_err();
        assert_eq!(err.status, StatusCode::UNAUTHORIZED);
        assert_eq!(err.code, "unauthenticated");
    }

    #[test]
    fn test_error_mapping() {
        let denied = ApiError::from(AppError::AccessDenied("nope".to_string()));
        assert_eq!(denied.status, StatusCode::FORBIDDEN);
        assert_eq!(denied.code, "access_denied");

        let internal = ApiError::from(AppError::Pipeline("boom".to_string()));
        assert_eq!(internal.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(internal.code, "internal");
        assert_eq!(
            internal.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_query_against_empty_corpus() {
        let temp = TempDir::new().unwrap();
        let services = services(&temp).await;

        let Json(result) = handle_query(
            State(services.clone()),
            headers(&[("x-user-id", "u1"), ("x-tenant-id", "T1"), ("x-user-role", "manager")]),
            Json(request("保証期間は?")),
        )
        .await
        .unwrap();

        assert_eq!(result.status, AnswerStatus::NoResults);
        assert_eq!(result.confidence, 0.0);
    }

    #[tokio::test]
    async fn test_query_validation() {
        let temp = TempDir::new().unwrap();
        let services = services(&temp).await;

        let err = handle_query(
            State(services.clone()),
            headers(&[("x-user-id", "u1"), ("x-tenant-id", "T1")]),
            Json(request("   ")),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);

        let err = handle_query(State(services), HeaderMap::new(), Json(request("q")))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_reindex_requires_admin() {
        let temp = TempDir::new().unwrap();
        let services = services(&temp).await;

        let err = handle_reindex(
            State(services.clone()),
            headers(&[("x-user-id", "u1"), ("x-tenant-id", "T1")]),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::FORBIDDEN);

        let Json(response) = handle_reindex(
            State(services),
            headers(&[("x-user-id", "admin"), ("x-tenant-id", "T1"), ("x-user-admin", "1")]),
        )
        .await
        .unwrap();
        assert_eq!(response.status, "started");
        assert_eq!(response.tenant_id, "T1");
        assert_eq!(response.chunks_reindexed, 0);
    }

    #[tokio::test]
    async fn test_health_and_metrics() {
        let Json(health) = handle_health().await;
        assert_eq!(health.status, "ok");
        assert_eq!(health.service, "ragdesk");

        let temp = TempDir::new().unwrap();
        let Json(snapshot) = handle_metrics(State(services(&temp).await)).await;
        assert_eq!(snapshot.queries, 0);
    }
}
