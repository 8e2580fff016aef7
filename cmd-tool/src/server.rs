//! Proxy API served by `cmd_serve`.
//!
//! Endpoints:
//! - `POST /api/cmd` forwards a cone search to VizieR and returns its VOTable
//! - `GET /api/isochrone?age=..&z=..` returns a stored track file
//! - `GET /api/finder_chart?ra=..&dec=..` returns an SDSS cutout URL

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use cmd_client::upstream::{fetch_votable, UpstreamConfig};
use cmd_client::{CatalogRequest, FinderChartResponse};
use cmd_core::catalog::DEFAULT_RADIUS_DEG;
use cmd_core::isochrone::{load_track, track_filename};
use cmd_core::{AgeKey, CatalogQuery, CmdError, FinderRequest};
use serde::Deserialize;
use tracing::{error, info, warn};

/// Shared handler state.
#[derive(Debug, Clone)]
pub struct AppState {
    pub upstream: UpstreamConfig,
    pub http: reqwest::Client,
}

impl AppState {
    pub fn new(upstream: UpstreamConfig) -> Self {
        Self {
            upstream,
            http: reqwest::Client::new(),
        }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/cmd", post(catalog_handler))
        .route("/api/isochrone", get(isochrone_handler))
        .route("/api/finder_chart", get(finder_chart_handler))
        .with_state(state)
}

/// Bind `bind_address:port` and serve until the process exits.
pub async fn serve(state: Arc<AppState>, bind_address: &str, port: u16) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(format!("{bind_address}:{port}")).await?;

    info!("CMD proxy starting on http://{}", listener.local_addr()?);
    info!("Isochrone directory: {}", state.upstream.isochrone_dir.display());

    axum::serve(listener, router(state)).await?;
    Ok(())
}

fn json_error(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(serde_json::json!({ "error": message.into() })),
    )
        .into_response()
}

async fn catalog_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CatalogRequest>,
) -> Response {
    let (Some(ra), Some(dec)) = (request.ra, request.dec) else {
        return json_error(StatusCode::BAD_REQUEST, "Missing RA or Dec");
    };
    let radius = request.radius.unwrap_or(DEFAULT_RADIUS_DEG);

    let query = match CatalogQuery::new(ra, dec, radius) {
        Ok(query) => query,
        Err(e) => return json_error(StatusCode::BAD_REQUEST, e.to_string()),
    };

    match fetch_votable(&state.http, &state.upstream, &query).await {
        Ok(reply) => {
            let status =
                StatusCode::from_u16(reply.status).unwrap_or(StatusCode::BAD_GATEWAY);
            (status, [(header::CONTENT_TYPE, "application/xml")], reply.body).into_response()
        }
        Err(e) => {
            error!("VizieR request failed: {}", e);
            json_error(StatusCode::BAD_GATEWAY, e.to_string())
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct IsochroneQuery {
    #[serde(default)]
    pub age: Option<String>,
    #[serde(default)]
    pub z: Option<String>,
}

async fn isochrone_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<IsochroneQuery>,
) -> Response {
    let age_key = params.age.map(AgeKey::new).unwrap_or_default();
    let z = params.z.unwrap_or_else(|| "0.019".to_string());

    match load_track(&state.upstream.isochrone_dir, &age_key, &z) {
        Ok(track) => Json(track).into_response(),
        Err(CmdError::InvalidInput(msg)) => json_error(StatusCode::BAD_REQUEST, msg),
        Err(CmdError::FetchFailure(_)) => {
            let name = track_filename(&age_key, &z);
            warn!("Isochrone file not found: {}", name);
            json_error(
                StatusCode::NOT_FOUND,
                format!("Isochrone file '{name}' not found"),
            )
        }
        Err(e) => {
            error!("Failed to read isochrone {}: {}", age_key, e);
            json_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct FinderChartQuery {
    pub ra: Option<f64>,
    pub dec: Option<f64>,
    pub scale: Option<f64>,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

async fn finder_chart_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<FinderChartQuery>,
) -> Response {
    let (Some(ra), Some(dec)) = (params.ra, params.dec) else {
        return json_error(StatusCode::BAD_REQUEST, "Missing RA or Dec");
    };
    let request = FinderRequest {
        ra,
        dec,
        scale: params.scale.unwrap_or(0.2),
        width: params.width.unwrap_or(120),
        height: params.height.unwrap_or(120),
    };

    match state.upstream.finder_chart_url(&request) {
        Ok(url) => Json(FinderChartResponse {
            finder_chart_url: Some(url.to_string()),
        })
        .into_response(),
        Err(e) => json_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}
