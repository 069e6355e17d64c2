//! HTTP server for the visualizations.
//!
//! The dataset is loaded once at startup and shared read-only with every
//! handler. Pages and scripts can be served from a static directory.
//!
//! # API Endpoints
//!
//! | Method | Path                  | Description                        |
//! |--------|-----------------------|------------------------------------|
//! | GET    | `/health`             | Health check                       |
//! | GET    | `/api/summary`        | Years, extent and load report      |
//! | GET    | `/api/years/{year}`   | Ranked entries of a year           |
//! | GET    | `/api/value`          | `?country=&year=` lookup           |
//! | GET    | `/api/series/{name}`  | A country's time series            |
//! | GET    | `/api/legend`         | `?kind=&buckets=&stops=` legend    |
//! | GET    | `/api/regions/{year}` | GeoJSON regions with their values  |
//! | GET    | `/api/logs`           | SSE stream of loader logs          |

use axum::{
    extract::{Path, Query, State},
    http::{header, Method, StatusCode},
    response::{sse::Event, Json, Sse},
    routing::get,
    Router,
};
use futures::stream::Stream;
use serde_json::{json, Value};
use std::{convert::Infallible, net::SocketAddr, path::PathBuf, sync::Arc, time::Duration};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt as _;
use tower_http::{cors::CorsLayer, services::ServeDir};

use super::logs::{log_error, log_info, log_success, LOG_BROADCASTER};
use super::types::{
    error_response, LegendKind, LegendQuery, LegendResponse, RegionsResponse, SeriesResponse,
    SummaryResponse, ValueQuery, ValueResponse, YearResponse,
};
use crate::config::{
    ServerConfig, DEFAULT_LEGEND_BUCKETS, DEFAULT_SEQUENTIAL_STOPS, MAX_LEGEND_BUCKETS,
};
use crate::error::{LoadError, ServerError, ServerResult};
use crate::geo::{fill_for_year, load_regions, Region};
use crate::scale::{Legend, SequentialLegend};
use crate::transform::pipeline::{load_dataset, DatasetContext};

type ApiError = (StatusCode, Json<Value>);

/// Shared, read-only handler state.
#[derive(Clone)]
pub struct AppState {
    pub dataset: Arc<DatasetContext>,
    pub regions: Option<Arc<Vec<Region>>>,
}

impl AppState {
    pub fn new(dataset: DatasetContext, regions: Option<Vec<Region>>) -> Self {
        Self {
            dataset: Arc::new(dataset),
            regions: regions.map(Arc::new),
        }
    }
}

/// Build the router. With `static_dir`, unmatched paths are served from it.
pub fn router(state: AppState, static_dir: Option<PathBuf>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([header::CONTENT_TYPE]);

    let api = Router::new()
        .route("/health", get(health))
        .route("/api/summary", get(summary))
        .route("/api/years/{year}", get(year_entries))
        .route("/api/value", get(value))
        .route("/api/series/{country}", get(series))
        .route("/api/legend", get(legend))
        .route("/api/regions/{year}", get(regions))
        .route("/api/logs", get(sse_logs))
        .with_state(state);

    let app = match static_dir {
        Some(dir) => api.fallback_service(ServeDir::new(dir)),
        None => api.route("/", get(health)),
    };

    app.layer(cors)
}

/// Load the configured dataset and serve it.
pub async fn start_server(config: ServerConfig) -> ServerResult<()> {
    let dataset_path = config.dataset.clone().ok_or_else(|| {
        ServerError::Config("no dataset given (use --dataset or RESHAPER_DATASET)".to_string())
    })?;

    let dataset = load_dataset(&dataset_path, &config.preset.load_options())
        .await
        .map_err(|e| {
            log_error(format!("Failed to load {}: {}", dataset_path.display(), e));
            e
        })?;

    let regions = match config.geojson {
        Some(ref path) => {
            let regions = load_regions(path, &config.geo_name_property)
                .await
                .map_err(LoadError::from)?;
            log_success(format!("{} regions from {}", regions.len(), path.display()));
            Some(regions)
        }
        None => None,
    };

    let app = router(AppState::new(dataset, regions), config.static_dir.clone());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    println!("🚀 Reshaper server running on http://localhost:{}", config.port);
    println!("   GET  /api/summary        - Dataset overview");
    println!("   GET  /api/years/{{year}}   - Ranked entries");
    println!("   GET  /api/value          - Country/year lookup");
    println!("   GET  /api/series/{{name}}  - Country series");
    println!("   GET  /api/legend         - Threshold or sequential legend");
    println!("   GET  /api/regions/{{year}} - Region fills");
    println!("   GET  /api/logs           - SSE log stream");
    if let Some(ref dir) = config.static_dir {
        log_info(format!("Serving static files from {}", dir.display()));
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "reshaper",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn summary(State(state): State<AppState>) -> Json<SummaryResponse> {
    Json(SummaryResponse::from(state.dataset.as_ref()))
}

async fn year_entries(State(state): State<AppState>, Path(year): Path<i32>) -> Json<YearResponse> {
    let entries = state.dataset.ranked(year);
    let total: f64 = entries.iter().map(|e| e.value).sum();
    Json(YearResponse { year, total, entries })
}

async fn value(State(state): State<AppState>, Query(query): Query<ValueQuery>) -> Json<ValueResponse> {
    let value = state.dataset.value_for(&query.country, query.year);
    let position = match (value.value(), state.dataset.extent) {
        (Some(v), Some(extent)) => Some(extent.sequential_position(v)),
        _ => None,
    };

    Json(ValueResponse {
        country: query.country,
        year: query.year,
        value,
        position,
    })
}

async fn series(State(state): State<AppState>, Path(country): Path<String>) -> Json<SeriesResponse> {
    let points = state.dataset.series(&country);
    Json(SeriesResponse { country, points })
}

async fn legend(
    State(state): State<AppState>,
    Query(query): Query<LegendQuery>,
) -> Result<Json<LegendResponse>, ApiError> {
    let extent = state.dataset.extent.ok_or_else(|| {
        (StatusCode::NOT_FOUND, Json(error_response("dataset has no values")))
    })?;

    let legend = match query.kind {
        LegendKind::Threshold => {
            let buckets = legend_size("buckets", query.buckets, DEFAULT_LEGEND_BUCKETS, 1)?;
            LegendResponse::Threshold(Legend::new(extent, buckets))
        }
        LegendKind::Sequential => {
            let stops = legend_size("stops", query.stops, DEFAULT_SEQUENTIAL_STOPS, 2)?;
            LegendResponse::Sequential(SequentialLegend::new(extent, stops))
        }
    };
    Ok(Json(legend))
}

/// Requested legend size, refused outside `min..=MAX_LEGEND_BUCKETS`.
fn legend_size(
    name: &str,
    requested: Option<usize>,
    default: usize,
    min: usize,
) -> Result<usize, ApiError> {
    let size = requested.unwrap_or(default);
    if !(min..=MAX_LEGEND_BUCKETS).contains(&size) {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(error_response(&format!(
                "{} must be between {} and {}",
                name, min, MAX_LEGEND_BUCKETS
            ))),
        ));
    }
    Ok(size)
}

async fn regions(
    State(state): State<AppState>,
    Path(year): Path<i32>,
) -> Result<Json<RegionsResponse>, ApiError> {
    let regions = state.regions.as_ref().ok_or_else(|| {
        (StatusCode::NOT_FOUND, Json(error_response("no GeoJSON configured")))
    })?;
    Ok(Json(RegionsResponse {
        year,
        regions: fill_for_year(regions, &state.dataset.index, year),
    }))
}

/// SSE endpoint for real-time log streaming
async fn sse_logs() -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = LOG_BROADCASTER.subscribe();

    let stream = BroadcastStream::new(rx).filter_map(|result| match result {
        Ok(entry) => {
            let json = serde_json::to_string(&entry).ok()?;
            Some(Ok(Event::default().data(json)))
        }
        Err(_) => None,
    });

    Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}
