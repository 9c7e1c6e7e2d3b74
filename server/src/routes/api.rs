use std::fmt::Write as _;

use axum::Json;
use axum::body::Body;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use mappa_client::geometry::ScreenPoint;
use mappa_client::{
    Criterion, PointerEvent, PointerOutcome, RegionSummary, SelectionMode, UndefinedModeError,
    ViewMode,
};
use mappa_shared::{RegionDetail, RegionId};
use serde::Deserialize;
use tracing::warn;

use crate::presenter::{
    Command, SelectionAction, SelectionState, StatusReport, ViewState, ViewUpdate,
};
use crate::state::{AppState, ObservabilitySnapshot};

const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";
const FRAME_CONTENT_TYPE: &str = "application/octet-stream";

fn presenter_gone() -> StatusCode {
    warn!("Presentation thread is not answering");
    StatusCode::SERVICE_UNAVAILABLE
}

async fn status_report(state: &AppState) -> Result<StatusReport, StatusCode> {
    state
        .presenter
        .request(|reply| Command::Status { reply })
        .await
        .ok_or_else(presenter_gone)
}

pub async fn health(State(state): State<AppState>) -> Result<Json<serde_json::Value>, StatusCode> {
    let report = status_report(&state).await?;
    let observability = state.observability.snapshot();
    let uptime_secs = (Utc::now() - state.started_at).num_seconds();
    Ok(Json(serde_json::json!({
        "status": "ok",
        "data": report.data,
        "regions": report.regions,
        "tiles": report.tiles,
        "frames": report.frames,
        "hovered": report.hovered,
        "started_at": state.started_at.to_rfc3339(),
        "uptime_secs": uptime_secs,
        "observability": {
            "frame_requests_total": observability.frame_requests_total,
            "frames_rendered_total": observability.frames_rendered_total,
            "geometry_errors_total": observability.geometry_errors_total,
            "tiles_missing_last_frame": observability.tiles_missing_last_frame,
            "tiles_loaded_total": observability.tiles_loaded_total,
            "tile_load_failures_total": observability.tile_load_failures_total,
            "pointer_events_total": observability.pointer_events_total,
            "hit_tests_total": observability.hit_tests_total,
        }
    })))
}

pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    let regions = status_report(&state)
        .await
        .map(|report| report.regions)
        .unwrap_or(0);
    let body = render_prometheus_metrics(regions, state.observability.snapshot());
    (
        [
            (header::CONTENT_TYPE, PROMETHEUS_CONTENT_TYPE),
            (header::CACHE_CONTROL, "no-store"),
        ],
        body,
    )
}

fn render_prometheus_metrics(regions: usize, observability: ObservabilitySnapshot) -> String {
    let mut body = String::new();
    let _ = writeln!(
        body,
        "# HELP mappa_regions Number of regions currently loaded."
    );
    let _ = writeln!(body, "# TYPE mappa_regions gauge");
    let _ = writeln!(body, "mappa_regions {regions}");

    let counters = [
        (
            "mappa_frame_requests_total",
            "Frame requests served.",
            observability.frame_requests_total,
        ),
        (
            "mappa_frames_rendered_total",
            "Frames actually repainted.",
            observability.frames_rendered_total,
        ),
        (
            "mappa_geometry_errors_total",
            "Regions skipped in a frame because their geometry could not be projected.",
            observability.geometry_errors_total,
        ),
        (
            "mappa_tiles_loaded_total",
            "Base map tiles handed to the renderer.",
            observability.tiles_loaded_total,
        ),
        (
            "mappa_tile_load_failures_total",
            "Tile files that could not be used.",
            observability.tile_load_failures_total,
        ),
        (
            "mappa_pointer_events_total",
            "Pointer events received.",
            observability.pointer_events_total,
        ),
        (
            "mappa_hit_tests_total",
            "Hit-test requests received.",
            observability.hit_tests_total,
        ),
    ];
    for (name, help, value) in counters {
        let _ = writeln!(body, "# HELP {name} {help}");
        let _ = writeln!(body, "# TYPE {name} counter");
        let _ = writeln!(body, "{name} {value}");
    }

    let _ = writeln!(
        body,
        "# HELP mappa_tiles_missing Tiles absent from the most recent frame."
    );
    let _ = writeln!(body, "# TYPE mappa_tiles_missing gauge");
    let _ = writeln!(
        body,
        "mappa_tiles_missing {}",
        observability.tiles_missing_last_frame
    );
    body
}

pub async fn get_regions(
    State(state): State<AppState>,
) -> Result<Json<Vec<RegionSummary>>, StatusCode> {
    state
        .presenter
        .request(|reply| Command::Regions { reply })
        .await
        .map(Json)
        .ok_or_else(presenter_gone)
}

pub async fn get_region(
    State(state): State<AppState>,
    Path(id): Path<u32>,
) -> Result<Json<RegionDetail>, StatusCode> {
    let detail = state
        .presenter
        .request(|reply| Command::Detail {
            id: RegionId(id),
            reply,
        })
        .await
        .ok_or_else(presenter_gone)?;
    detail.map(Json).ok_or(StatusCode::NOT_FOUND)
}

/// Current frame as raw RGBA8, row-major, with its size in headers.
pub async fn get_frame(State(state): State<AppState>) -> Result<Response, StatusCode> {
    state.observability.record_frame_request();
    let frame = state
        .presenter
        .request(|reply| Command::Render { reply })
        .await
        .ok_or_else(presenter_gone)?;
    if frame.repainted {
        state.observability.record_frame_rendered(
            u64::from(frame.stats.geometry_errors),
            u64::from(frame.stats.tiles_missing),
        );
    }

    let mut response = Response::new(Body::from(frame.pixels));
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(FRAME_CONTENT_TYPE),
    );
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    headers.insert("x-frame-width", HeaderValue::from(frame.width));
    headers.insert("x-frame-height", HeaderValue::from(frame.height));
    headers.insert("x-frame-number", HeaderValue::from(frame.frame));
    Ok(response)
}

#[derive(Debug, Deserialize)]
pub struct HitQuery {
    x: i32,
    y: i32,
}

pub async fn hit_test(
    State(state): State<AppState>,
    Query(query): Query<HitQuery>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    state.observability.record_hit_test();
    let point = ScreenPoint::new(query.x, query.y);
    let region = state
        .presenter
        .request(|reply| Command::HitTest { point, reply })
        .await
        .ok_or_else(presenter_gone)?;
    Ok(Json(serde_json::json!({ "region": region })))
}

pub async fn post_pointer(
    State(state): State<AppState>,
    payload: Result<Json<PointerEvent>, JsonRejection>,
) -> Result<Json<PointerOutcome>, StatusCode> {
    let Json(event) = payload.map_err(|_| StatusCode::BAD_REQUEST)?;
    state.observability.record_pointer_event();
    state
        .presenter
        .request(|reply| Command::Pointer { event, reply })
        .await
        .map(Json)
        .ok_or_else(presenter_gone)
}

#[derive(Debug, Deserialize)]
pub struct SelectionRequest {
    action: SelectionAction,
    criterion: Criterion,
}

pub async fn post_selection(
    State(state): State<AppState>,
    payload: Result<Json<SelectionRequest>, JsonRejection>,
) -> Result<Json<SelectionState>, StatusCode> {
    let Json(request) = payload.map_err(|_| StatusCode::BAD_REQUEST)?;
    let result = state
        .presenter
        .request(|reply| Command::Selection {
            action: request.action,
            criterion: request.criterion,
            reply,
        })
        .await
        .ok_or_else(presenter_gone)?;
    result.map(Json).map_err(|_| StatusCode::NOT_FOUND)
}

#[derive(Debug, Default, Deserialize)]
pub struct ViewRequest {
    #[serde(default)]
    selection_mode: Option<String>,
    #[serde(default)]
    view_mode: Option<String>,
    #[serde(default)]
    simple_render: Option<bool>,
    #[serde(default)]
    latitude: Option<f64>,
    #[serde(default)]
    longitude: Option<f64>,
    #[serde(default)]
    zoom: Option<u8>,
}

fn parse_view_request(request: ViewRequest) -> Result<ViewUpdate, String> {
    let selection_mode = request
        .selection_mode
        .as_deref()
        .map(str::parse::<SelectionMode>)
        .transpose()
        .map_err(|e: UndefinedModeError| e.to_string())?;
    let view_mode = request
        .view_mode
        .as_deref()
        .map(str::parse::<ViewMode>)
        .transpose()
        .map_err(|e: UndefinedModeError| e.to_string())?;
    let relocate = match (request.latitude, request.longitude) {
        (Some(lat), Some(lon)) if lat.is_finite() && lon.is_finite() => Some((lat, lon)),
        (None, None) => None,
        _ => return Err("latitude and longitude must be given together as numbers".to_owned()),
    };
    Ok(ViewUpdate {
        selection_mode,
        view_mode,
        simple_render: request.simple_render,
        relocate,
        zoom: request.zoom,
    })
}

pub async fn put_view(
    State(state): State<AppState>,
    payload: Result<Json<ViewRequest>, JsonRejection>,
) -> Result<Json<ViewState>, Response> {
    let Json(request) = payload.map_err(|e| (StatusCode::BAD_REQUEST, e.body_text()).into_response())?;
    let update =
        parse_view_request(request).map_err(|e| (StatusCode::BAD_REQUEST, e).into_response())?;
    state
        .presenter
        .request(|reply| Command::UpdateView { update, reply })
        .await
        .map(Json)
        .ok_or_else(|| presenter_gone().into_response())
}
