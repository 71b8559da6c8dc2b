use serde::{Deserialize, Serialize};

use crate::contract::SizeObservation;

pub const DEFAULT_WINDOW_SECONDS: u64 = 10;

/// Trailing time span ending at the moment a trend is requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendWindow {
    pub from_ms: i64,
    pub to_ms: i64,
    pub window_seconds: u64,
}

impl TrendWindow {
    pub fn ending_at(now_ms: i64, window_seconds: u64) -> Self {
        let span_ms = i64::try_from(window_seconds.saturating_mul(1_000)).unwrap_or(i64::MAX);
        Self {
            from_ms: now_ms.saturating_sub(span_ms),
            to_ms: now_ms,
            window_seconds,
        }
    }

    pub fn contains(&self, observed_at: i64) -> bool {
        (self.from_ms..=self.to_ms).contains(&observed_at)
    }

    /// Seconds before the end of the window; always `<= 0` for contained timestamps.
    pub fn relative_seconds(&self, observed_at: i64) -> f64 {
        -((self.to_ms - observed_at) as f64) / 1_000.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub relative_seconds: f64,
    pub size_bytes: u64,
}

/// Chart-ready series derived from the observations in a window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendSeries {
    pub container_id: String,
    pub window: TrendWindow,
    pub points: Vec<TrendPoint>,
    pub historical_max_bytes: u64,
}

impl TrendSeries {
    /// Upper bound for the size axis covering both the points and the reference line.
    pub fn size_ceiling(&self) -> u64 {
        self.points
            .iter()
            .map(|point| point.size_bytes)
            .chain(std::iter::once(self.historical_max_bytes))
            .max()
            .unwrap_or(0)
    }
}

/// Derives the series for `container_id`, or `None` when the window holds no observations.
///
/// Observations for other containers or outside the window are ignored. The historical
/// maximum never falls below a plotted point, so a max lookup that trails recent writes
/// is lifted to the largest in-window size.
pub fn build_trend_series(
    container_id: &str,
    window: TrendWindow,
    observations: &[SizeObservation],
    historical_max: Option<&SizeObservation>,
) -> Option<TrendSeries> {
    let mut in_window: Vec<&SizeObservation> = observations
        .iter()
        .filter(|observation| {
            observation.container_id == container_id && window.contains(observation.observed_at)
        })
        .collect();
    if in_window.is_empty() {
        return None;
    }
    in_window.sort_by_key(|observation| observation.observed_at);

    let points: Vec<TrendPoint> = in_window
        .into_iter()
        .map(|observation| TrendPoint {
            relative_seconds: window.relative_seconds(observation.observed_at),
            size_bytes: observation.total_size_bytes,
        })
        .collect();
    let window_max = points.iter().map(|point| point.size_bytes).max().unwrap_or(0);
    let recorded_max = historical_max
        .map(|observation| observation.total_size_bytes)
        .unwrap_or(0);

    Some(TrendSeries {
        container_id: container_id.to_string(),
        window,
        points,
        historical_max_bytes: recorded_max.max(window_max),
    })
}
