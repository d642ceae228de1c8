use crate::config::AppConfig;
use crate::data::{Dataset, NameCoverage};
use crate::error::{LoadError, LookupError};
use crate::selection::{Selection, Year};
use crate::view::{build_view, DashboardView, MapStyle};
use anyhow::Result;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Outcome of the one-time load. A failed load leaves the server up so the
/// page can show the notice.
pub enum DataState {
    Ready(Arc<Dataset>),
    Failed { notice: String },
}

impl From<Result<Dataset, LoadError>> for DataState {
    fn from(loaded: Result<Dataset, LoadError>) -> Self {
        match loaded {
            Ok(dataset) => DataState::Ready(Arc::new(dataset)),
            Err(e) => DataState::Failed { notice: e.notice() },
        }
    }
}

pub struct AppState {
    pub data: DataState,
    pub style: MapStyle,
    pub static_dir: PathBuf,
}

impl AppState {
    pub fn new(config: &AppConfig, data: DataState) -> Self {
        AppState {
            data,
            style: MapStyle::from(&config.map),
            static_dir: config.server.static_dir.clone(),
        }
    }

    fn dataset(&self) -> Result<&Dataset, ApiError> {
        match &self.data {
            DataState::Ready(dataset) => Ok(dataset.as_ref()),
            DataState::Failed { notice } => Err(ApiError::Unavailable(notice.clone())),
        }
    }
}

#[derive(Debug)]
pub enum ApiError {
    Unavailable(String),
    BadRequest(String),
    NotFound(String),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            ApiError::Unavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
        };
        (status, Json(ErrorBody { error })).into_response()
    }
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

#[derive(Serialize)]
pub struct OptionsResponse {
    countries: Vec<String>,
    years: Vec<String>,
}

#[derive(Deserialize)]
pub struct DashboardParams {
    country: Option<String>,
    /// Comma separated year labels
    years: Option<String>,
}

#[derive(Serialize)]
#[serde(untagged)]
pub enum DashboardResponse {
    View(Box<DashboardView>),
    Notice { notice: String },
}

#[derive(Deserialize)]
pub struct LocateParams {
    lat: f64,
    lon: f64,
}

#[derive(Serialize)]
pub struct LocateResponse {
    country: Option<String>,
}

pub fn build_router(state: Arc<AppState>) -> Router {
    let static_files = ServeDir::new(&state.static_dir);

    Router::new()
        .route("/api/health", get(health_handler))
        .route("/api/options", get(options_handler))
        .route("/api/dashboard", get(dashboard_handler))
        .route("/api/locate", get(locate_handler))
        .route("/api/coverage", get(coverage_handler))
        .fallback_service(static_files)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn start_server(config: AppConfig, data: DataState) -> Result<()> {
    let state = Arc::new(AppState::new(&config, data));

    let port = config.server.port;
    let addr = SocketAddr::from(([127, 0, 0, 1], port));

    info!("Starting server on http://{}", addr);

    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let status = match state.data {
        DataState::Ready(_) => "ok",
        DataState::Failed { .. } => "unavailable",
    };
    Json(HealthResponse { status })
}

async fn options_handler(State(state): State<Arc<AppState>>) -> Result<Json<OptionsResponse>, ApiError> {
    let dataset = state.dataset()?;
    Ok(Json(OptionsResponse {
        countries: dataset.country_names().map(str::to_string).collect(),
        years: Year::labels(),
    }))
}

async fn dashboard_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<DashboardParams>,
) -> Result<Json<DashboardResponse>, ApiError> {
    let dataset = state.dataset()?;

    let years = Selection::parse_year_list(params.years.as_deref().unwrap_or(""))
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let selection = Selection::new(params.country.as_deref(), years);

    match build_view(dataset, &selection, &state.style) {
        Ok(view) => Ok(Json(DashboardResponse::View(Box::new(view)))),
        Err(e @ LookupError::NoCountrySelected) => Ok(Json(DashboardResponse::Notice {
            notice: e.to_string(),
        })),
        Err(e) => Err(ApiError::NotFound(e.to_string())),
    }
}

async fn locate_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<LocateParams>,
) -> Result<Json<LocateResponse>, ApiError> {
    let dataset = state.dataset()?;
    let country = dataset
        .country_at(params.lon, params.lat)
        .filter(|name| dataset.record(name).is_some())
        .map(str::to_string);
    Ok(Json(LocateResponse { country }))
}

async fn coverage_handler(State(state): State<Arc<AppState>>) -> Result<Json<NameCoverage>, ApiError> {
    let dataset = state.dataset()?;
    Ok(Json(dataset.coverage().clone()))
}
