// Registry Code - Web Server
// REST API with Axum: the same validate-then-generate path the form uses

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use clap::Parser;
use registry_code::{
    generate, parse_birth_date, process_rows, BatchRow, Config, InputValidator, RawIdentity,
    RegistryCode, SourceRow, ValidationError,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "registry-server")]
#[command(about = "HTTP API for student registry codes", version = registry_code::VERSION, long_about = None)]
struct Args {
    #[arg(short, long, default_value = "registry-code.yaml")]
    config: String,

    /// Overrides listen.port from the config file
    #[arg(short, long)]
    port: Option<u16>,
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<ApiError>,
}

#[derive(Serialize)]
struct ApiError {
    kind: &'static str,
    message: String,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    fn rejected(err: &ValidationError) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(ApiError {
                kind: err.kind(),
                message: err.to_string(),
            }),
        }
    }
}

/// Request body: identity fields as typed, birth date as YYYY-MM-DD
#[derive(Debug, Deserialize)]
struct CodeRequest {
    surname: String,
    given_name: String,
    patronymic: String,
    birth_date: String,
    group_id: String,
}

#[derive(Serialize)]
struct CodeResponse {
    code: RegistryCode,
    canonical: String,
}

impl From<CodeRequest> for BatchRow {
    fn from(req: CodeRequest) -> Self {
        Self {
            surname: req.surname,
            given_name: req.given_name,
            patronymic: req.patronymic,
            birth_date: req.birth_date,
            group_id: req.group_id,
        }
    }
}

fn code_for(req: CodeRequest, validator: &InputValidator) -> Result<CodeResponse, ValidationError> {
    let birth_date = parse_birth_date(&req.birth_date)?;
    let record = validator.validate(&RawIdentity {
        surname: req.surname,
        given_name: req.given_name,
        patronymic: req.patronymic,
        birth_date,
        group_id: req.group_id,
    })?;

    Ok(CodeResponse {
        code: generate(&record),
        canonical: record.canonical_string(),
    })
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// POST /api/codes - Validate one student and return the code
async fn create_code(Json(req): Json<CodeRequest>) -> impl IntoResponse {
    match code_for(req, &InputValidator::new()) {
        Ok(resp) => (StatusCode::OK, Json(ApiResponse::ok(resp))).into_response(),
        Err(e) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ApiResponse::<CodeResponse>::rejected(&e)),
        )
            .into_response(),
    }
}

/// POST /api/codes/batch - Code many students; failures are reported per item
async fn create_codes_batch(Json(items): Json<Vec<serde_json::Value>>) -> impl IntoResponse {
    let rows: Vec<SourceRow> = items
        .into_iter()
        .enumerate()
        .map(|(i, item)| source_row(i + 1, item))
        .collect();

    let results = process_rows(&rows, &InputValidator::new());
    (StatusCode::OK, Json(ApiResponse::ok(results)))
}

/// Decode one batch item; a malformed item becomes a rejected row, not a failed request
fn source_row(line: usize, item: serde_json::Value) -> SourceRow {
    match serde_json::from_value::<CodeRequest>(item.clone()) {
        Ok(req) => SourceRow::ok(line, req.into()),
        Err(e) => {
            let text = |key: &str| {
                item.get(key)
                    .and_then(serde_json::Value::as_str)
                    .unwrap_or_default()
                    .to_string()
            };
            let row = BatchRow {
                surname: text("surname"),
                given_name: text("given_name"),
                patronymic: text("patronymic"),
                birth_date: text("birth_date"),
                group_id: text("group_id"),
            };
            SourceRow::malformed(line, row, e.to_string())
        }
    }
}

fn router() -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/codes", post(create_code))
        .route("/codes/batch", post(create_codes_batch));

    Router::new()
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

// ============================================================================
// Main Server
// ============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "registry_code=info,registry_server=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let mut config = Config::load_or_default(&args.config)?;
    if let Some(port) = args.port {
        config.listen.port = port;
    }

    let addr = config.listen_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("server running on http://{}", addr);
    info!("  API: POST http://{}/api/codes", addr);

    axum::serve(listener, router()).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;

    async fn post_json(uri: &str, body: serde_json::Value) -> (StatusCode, serde_json::Value) {
        let response = router()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn ivanov() -> serde_json::Value {
        serde_json::json!({
            "surname": "Ivanov",
            "given_name": "Ivan",
            "patronymic": "Ivanovich",
            "birth_date": "2000-05-15",
            "group_id": "101"
        })
    }

    #[tokio::test]
    async fn test_health() {
        let response = router()
            .oneshot(Request::builder().uri("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_create_code() {
        let (status, body) = post_json("/api/codes", ivanov()).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["code"], "L324Y300");
        assert_eq!(body["data"]["canonical"], "Ivanov Ivan Ivanovich 2000-05-15 101");
    }

    #[tokio::test]
    async fn test_create_code_rejects_future_date() {
        let mut req = ivanov();
        req["birth_date"] = serde_json::json!("9999-01-01");

        let (status, body) = post_json("/api/codes", req).await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["success"], false);
        assert!(body["data"].is_null());
        assert_eq!(body["error"]["kind"], "future_birth_date");
    }

    #[tokio::test]
    async fn test_batch_reports_each_item() {
        let mut bad = ivanov();
        bad["group_id"] = serde_json::json!("A1");

        let (status, body) = post_json("/api/codes/batch", serde_json::json!([ivanov(), bad])).await;

        assert_eq!(status, StatusCode::OK);
        let items = body["data"].as_array().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0]["code"], "L324Y300");
        assert_eq!(items[1]["code"], "");
        assert_eq!(items[1]["line"], 2);
    }

    #[tokio::test]
    async fn test_batch_malformed_item_is_rejected_alone() {
        let malformed = serde_json::json!({ "surname": "Sidorov", "group_id": 303 });

        let (status, body) =
            post_json("/api/codes/batch", serde_json::json!([ivanov(), malformed, ivanov()])).await;

        assert_eq!(status, StatusCode::OK);
        let items = body["data"].as_array().unwrap();
        assert_eq!(items.len(), 3);
        assert_eq!(items[0]["code"], "L324Y300");
        assert_eq!(items[1]["code"], "");
        assert_eq!(items[1]["surname"], "Sidorov");
        assert!(items[1]["error"].as_str().unwrap().starts_with("malformed row:"));
        assert_eq!(items[2]["line"], 3);
        assert_eq!(items[2]["code"], "L324Y300");
    }
}
