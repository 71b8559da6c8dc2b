use std::time::Instant;

use serde_json::{json, Value};
use size_history_core::storage_keys::{ArtifactLocation, PLOT_CONTENT_TYPE};
use size_history_core::store::{SizeHistoryStore, StoreError};
use size_history_core::trend::{build_trend_series, TrendSeries, TrendWindow};
use thiserror::Error;

use crate::adapters::object_store::ContainerObjects;
use crate::handlers::response::HandlerResponse;

const COMPONENT: &str = "plotter";

/// Turns a trend series into encoded image bytes.
pub trait TrendRenderer {
    fn render_png(&self, series: &TrendSeries) -> Result<Vec<u8>, String>;
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlotError {
    #[error(transparent)]
    Query(#[from] StoreError),
    #[error("No data available in the last {window_seconds} seconds.")]
    NoData { window_seconds: u64 },
    #[error("failed to render chart: {0}")]
    Render(String),
    #[error("failed to publish chart: {0}")]
    Publish(String),
}

impl PlotError {
    pub fn status_code(&self) -> u16 {
        match self {
            Self::NoData { .. } => 404,
            Self::Query(_) | Self::Render(_) | Self::Publish(_) => 500,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PublishedTrend {
    pub location: ArtifactLocation,
    pub series: TrendSeries,
}

/// Queries the trailing window ending at `now_ms`, renders it and overwrites the published chart.
pub fn render_recent_trend(
    container_id: &str,
    window_seconds: u64,
    now_ms: i64,
    store: &impl SizeHistoryStore,
    renderer: &impl TrendRenderer,
    containers: &impl ContainerObjects,
) -> Result<PublishedTrend, PlotError> {
    let window = TrendWindow::ending_at(now_ms, window_seconds);
    let observations = store.query_range(container_id, window.from_ms, window.to_ms)?;
    tracing::debug!(
        component = COMPONENT,
        event = "window_queried",
        container_id = %container_id,
        from_ms = window.from_ms,
        to_ms = window.to_ms,
        observations = observations.len(),
    );
    if observations.is_empty() {
        return Err(PlotError::NoData { window_seconds });
    }

    let historical_max = store.query_max(container_id)?;
    let series = build_trend_series(container_id, window, &observations, historical_max.as_ref())
        .ok_or(PlotError::NoData { window_seconds })?;

    let image = renderer.render_png(&series).map_err(PlotError::Render)?;
    let location = ArtifactLocation::plot(container_id);
    containers
        .put_object(
            &location.container_id,
            &location.key,
            &image,
            Some(PLOT_CONTENT_TYPE),
        )
        .map_err(PlotError::Publish)?;

    Ok(PublishedTrend { location, series })
}

/// Handles the HTTP GET that asks for a fresh chart.
pub fn handle_plot_request(
    event: &Value,
    container_id: &str,
    default_window_seconds: u64,
    now_ms: i64,
    store: &impl SizeHistoryStore,
    renderer: &impl TrendRenderer,
    containers: &impl ContainerObjects,
) -> HandlerResponse {
    let started_at = Instant::now();
    let window_seconds = match requested_window_seconds(event, default_window_seconds) {
        Ok(value) => value,
        Err(message) => {
            return HandlerResponse::json(
                400,
                json!({
                    "error": "validation_error",
                    "message": message,
                }),
            );
        }
    };

    match render_recent_trend(
        container_id,
        window_seconds,
        now_ms,
        store,
        renderer,
        containers,
    ) {
        Ok(published) => {
            let uri = published.location.uri();
            tracing::info!(
                component = COMPONENT,
                event = "plot_published",
                container_id = %container_id,
                window_seconds,
                points = published.series.points.len(),
                historical_max_bytes = published.series.historical_max_bytes,
                artifact = %uri,
                duration_ms = started_at.elapsed().as_millis() as u64,
            );
            HandlerResponse::message(
                200,
                &format!("Plot successfully generated and stored in {uri}"),
            )
        }
        Err(error @ PlotError::NoData { .. }) => {
            tracing::info!(
                component = COMPONENT,
                event = "plot_skipped",
                container_id = %container_id,
                window_seconds,
            );
            HandlerResponse::message(error.status_code(), &error.to_string())
        }
        Err(error) => {
            tracing::error!(
                component = COMPONENT,
                event = "plot_failed",
                container_id = %container_id,
                error = %error,
            );
            HandlerResponse::message(error.status_code(), &format!("Error: {error}"))
        }
    }
}

/// Reads `window_seconds` from API Gateway query parameters, falling back to `default`.
pub fn requested_window_seconds(event: &Value, default: u64) -> Result<u64, String> {
    let raw = event
        .get("queryStringParameters")
        .and_then(|params| params.get("window_seconds"));

    match raw {
        None | Some(Value::Null) => Ok(default),
        Some(Value::String(text)) => match text.trim().parse::<u64>() {
            Ok(value) if value > 0 => Ok(value),
            _ => Err(format!(
                "window_seconds must be a positive integer, got '{text}'"
            )),
        },
        Some(other) => Err(format!(
            "window_seconds must be a positive integer, got {other}"
        )),
    }
}
