//! HTTP server mode serving decoded datasets to map and chart front-ends

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::cli::runner::{dataset_message, dataset_summaries};
use crate::engine::{DatasetLoader, LoadOptions};
use crate::error::{Error, Result};

/// Server configuration
#[derive(Clone)]
pub struct ServerConfig {
    /// Loader for the served catalog
    pub loader: DatasetLoader,
}

/// App state shared across handlers
struct AppState {
    loader: DatasetLoader,
}

/// Query parameters of the dataset endpoint
#[derive(Debug, Default, Deserialize)]
struct DatasetQuery {
    /// Serve fallback data without contacting the API
    #[serde(default)]
    offline: bool,
}

/// Response wrapper
#[derive(Debug, Serialize)]
struct ApiResponse<T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    fn error(msg: impl Into<String>) -> ApiResponse<()> {
        ApiResponse {
            success: false,
            data: None,
            error: Some(msg.into()),
        }
    }
}

/// Build the router
pub fn router(config: ServerConfig) -> Router {
    let state = AppState {
        loader: config.loader,
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/datasets", get(list_datasets))
        .route("/datasets/:name", get(get_dataset))
        .route("/datasets/:name/metadata", get(get_metadata))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state))
}

/// Start the HTTP server
pub async fn serve(config: ServerConfig, port: u16) -> Result<()> {
    let app = router(config);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Starting HTTP server on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| Error::config(format!("Failed to bind to port {port}: {e}")))?;

    axum::serve(listener, app)
        .await
        .map_err(|e| Error::config(format!("Server error: {e}")))?;

    Ok(())
}

/// Health check endpoint
async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

/// List catalog datasets
async fn list_datasets(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let catalog = state.loader.catalog();
    Json(ApiResponse::success(json!({
        "type": "DATASETS",
        "catalog": catalog.name,
        "datasets": dataset_summaries(catalog)
    })))
}

/// Load and decode one dataset
async fn get_dataset(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Query(query): Query<DatasetQuery>,
) -> Response {
    let options = LoadOptions {
        offline: query.offline || state.loader.options().offline,
    };

    match state.loader.load_with(&name, options).await {
        Ok(loaded) => (
            StatusCode::OK,
            Json(ApiResponse::success(dataset_message(&loaded))),
        )
            .into_response(),
        Err(e) => error_response(&e),
    }
}

/// Table metadata of one dataset
async fn get_metadata(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Response {
    if let Err(e) = state.loader.catalog().dataset(&name) {
        return error_response(&e);
    }

    match state.loader.metadata(&name).await {
        Ok(metadata) => (
            StatusCode::OK,
            Json(ApiResponse::success(json!({
                "type": "METADATA",
                "dataset": name,
                "metadata": metadata
            }))),
        )
            .into_response(),
        Err(e) => error_response(&e),
    }
}

fn status_for(error: &Error) -> StatusCode {
    match error {
        Error::UnknownDataset { .. } => StatusCode::NOT_FOUND,
        e if e.is_retryable() || e.is_structural() => StatusCode::BAD_GATEWAY,
        Error::Http(_) | Error::HttpStatus { .. } => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(error: &Error) -> Response {
    (
        status_for(error),
        Json(ApiResponse::<()>::error(error.to_string())),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::TableSource;
    use crate::loader::{load_catalog_from_str, DatasetDefinition};
    use crate::metadata::TableMetadata;
    use crate::table::RawTable;
    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use serde_json::Value;
    use tower::ServiceExt;

    const CATALOG: &str = r#"
name: test
base_url: https://pxdata.example.com/api
datasets:
  - name: unemployment
    title: Unemployment rate
    path: /u.px
    fixed:
      - role: measure
        hints: [tiedot]
        key: rate
    fallback:
      rows:
        - { key: KU091, value: 5.5 }
        - { key: KU049, value: 4.5 }
"#;

    struct DownSource;

    #[async_trait]
    impl TableSource for DownSource {
        async fn fetch(&self, _url: &str, _dataset: &DatasetDefinition) -> Result<RawTable> {
            Err(Error::http_status(503, "down"))
        }

        async fn metadata(&self, _url: &str) -> Result<TableMetadata> {
            Err(Error::http_status(503, "down"))
        }
    }

    fn app() -> Router {
        let catalog = load_catalog_from_str(CATALOG).unwrap();
        let loader = DatasetLoader::with_source(catalog, Arc::new(DownSource));
        router(ServerConfig { loader })
    }

    async fn get_json(uri: &str) -> (StatusCode, Value) {
        let response = app()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = get_json("/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_list_datasets() {
        let (status, body) = get_json("/datasets").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["datasets"][0]["name"], "unemployment");
        assert_eq!(body["data"]["datasets"][0]["fallback"], true);
    }

    #[tokio::test]
    async fn test_dataset_falls_back_when_source_down() {
        let (status, body) = get_json("/datasets/unemployment").await;
        assert_eq!(status, StatusCode::OK);
        let data = &body["data"];
        assert_eq!(data["dataset"]["origin"]["kind"], "fallback");
        assert_eq!(data["values"]["KU091"], 5.5);
        assert_eq!(data["summary"]["mean"], 5.0);
    }

    #[tokio::test]
    async fn test_dataset_offline_query() {
        let (status, body) = get_json("/datasets/unemployment?offline=true").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["dataset"]["origin"]["reason"], "offline");
    }

    #[tokio::test]
    async fn test_unknown_dataset_is_404() {
        let (status, body) = get_json("/datasets/nope").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], false);
        assert!(body["error"].as_str().unwrap().contains("nope"));

        let (status, _) = get_json("/datasets/nope/metadata").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_metadata_upstream_error_is_502() {
        let (status, body) = get_json("/datasets/unemployment/metadata").await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["success"], false);
    }
}
