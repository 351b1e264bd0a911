/// HTTP API поверх движка

use axum::{
    extract::{Query, State},
    http::{Method, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use tower_http::cors::{Any, CorsLayer};

use crate::{
    engine,
    error::AoristicError,
    reference::{DayLayout, ReferenceTable},
    types::{AoristicRequest, AoristicResponse, AoristicSummary, BatchOptions},
    WeightMatrix,
};

#[derive(Clone, Default)]
pub struct AppState {
    pub defaults: BatchOptions,
}

impl AppState {
    pub fn new(defaults: BatchOptions) -> Self {
        Self { defaults }
    }
}

impl IntoResponse for AoristicError {
    fn into_response(self) -> Response {
        (StatusCode::BAD_REQUEST, self.to_string()).into_response()
    }
}

pub fn router(state: AppState) -> Router {
    // CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/api/aoristic", post(weigh))
        .route("/api/aoristic/summary", post(summarize))
        .route("/api/reference-table", get(reference_table))
        .layer(cors)
        .with_state(state)
}

async fn root() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "message": "Aoristic API",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

fn run_request(state: &AppState, request: &AoristicRequest) -> Result<engine::OutputTable, AoristicError> {
    let options = request.options.as_ref().unwrap_or(&state.defaults);
    engine::run_with(&request.rows, &request.columns, options)
}

async fn weigh(
    State(state): State<AppState>,
    Json(request): Json<AoristicRequest>,
) -> Result<Json<AoristicResponse>, AoristicError> {
    tracing::info!("Aoristic request: {} rows, start column `{}`", request.rows.len(), request.columns.start_col);

    let table = run_request(&state, &request)?;
    Ok(Json(table.into_payload()))
}

async fn summarize(
    State(state): State<AppState>,
    Json(request): Json<AoristicRequest>,
) -> Result<Json<AoristicSummary>, AoristicError> {
    tracing::info!("Summary request: {} rows", request.rows.len());

    let table = run_request(&state, &request)?;
    Ok(Json(WeightMatrix::from_table(&table).summarize()))
}

#[derive(Debug, Default, Deserialize)]
struct ReferenceQuery {
    #[serde(default)]
    layout: DayLayout,
}

async fn reference_table(Query(query): Query<ReferenceQuery>) -> Json<ReferenceTable> {
    Json(ReferenceTable::new(query.layout))
}
