//! Trend windowing and chart-coordinate mapping.
//!
//! All mapping is pure arithmetic over the report's history section. The
//! same history and geometry always produce byte-identical polyline text,
//! so rendered charts are reproducible run to run.

use crate::report::{History, HistoryPoint};

/// Default number of most recent runs shown in the trend chart.
pub const DEFAULT_WINDOW: usize = 20;

/// Target box for the chart, in abstract units. Padding is applied on all
/// four sides.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartGeometry {
    pub width: f64,
    pub height: f64,
    pub padding: f64,
}

impl Default for ChartGeometry {
    fn default() -> Self {
        Self {
            width: 600.0,
            height: 150.0,
            padding: 10.0,
        }
    }
}

/// One plotted point.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartPoint {
    pub x: f64,
    pub y: f64,
    pub score: f64,
    pub timestamp: String,
}

/// Windowed history projected into chart space.
#[derive(Debug, Clone, PartialEq)]
pub struct TrendView {
    /// Points in the window, scored or not.
    pub point_count: usize,
    /// Coordinates for the points that carry a score, in window order.
    pub coords: Vec<ChartPoint>,
    pub min_score: f64,
    pub max_score: f64,
    /// Last score minus the previous one, when both exist in the window.
    pub delta: Option<f64>,
}

/// Last `window` points of an ascending history.
pub fn window_points(points: &[HistoryPoint], window: usize) -> &[HistoryPoint] {
    let start = points.len().saturating_sub(window);
    &points[start..]
}

/// Min and max score inside the window. A window with no scored points
/// maps against the full `[0, 100]` range.
pub fn score_bounds(window: &[HistoryPoint]) -> (f64, f64) {
    let mut bounds: Option<(f64, f64)> = None;
    for score in window.iter().filter_map(|p| p.overall_score) {
        bounds = Some(match bounds {
            Some((lo, hi)) => (lo.min(score), hi.max(score)),
            None => (score, score),
        });
    }
    bounds.unwrap_or((0.0, 100.0))
}

/// Vertical position for a score. Higher scores map closer to the top
/// (smaller y). A flat series renders centered rather than dividing by
/// zero.
pub fn map_y(value: f64, min: f64, max: f64, geom: &ChartGeometry) -> f64 {
    if max <= min {
        return geom.height / 2.0;
    }
    let plot = geom.height - 2.0 * geom.padding;
    geom.padding + (max - value) / (max - min) * plot
}

/// Horizontal position for the point at `index` of `count`. A single
/// point renders centered.
pub fn map_x(index: usize, count: usize, geom: &ChartGeometry) -> f64 {
    if count <= 1 {
        return geom.width / 2.0;
    }
    let plot = geom.width - 2.0 * geom.padding;
    geom.padding + index as f64 * plot / (count - 1) as f64
}

/// Score movement across the last two points of the window. `None` when
/// fewer than two scored points close the window.
pub fn delta(window: &[HistoryPoint]) -> Option<f64> {
    let [.., prev, last] = window else {
        return None;
    };
    Some(last.overall_score? - prev.overall_score?)
}

/// Project a history into chart space.
pub fn trend_view(history: &History, window: usize, geom: &ChartGeometry) -> TrendView {
    let points = window_points(&history.points, window);
    let (min_score, max_score) = score_bounds(points);
    let coords = points
        .iter()
        .enumerate()
        .filter_map(|(i, p)| {
            let score = p.overall_score?;
            Some(ChartPoint {
                x: map_x(i, points.len(), geom),
                y: map_y(score, min_score, max_score, geom),
                score,
                timestamp: p.timestamp.clone(),
            })
        })
        .collect();
    TrendView {
        point_count: points.len(),
        coords,
        min_score,
        max_score,
        delta: delta(points),
    }
}

/// SVG-style `points` attribute text. Fixed one-decimal formatting keeps
/// the output byte-stable.
pub fn polyline_points(view: &TrendView) -> String {
    let mut out = String::new();
    for point in &view.coords {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(&format!("{:.1},{:.1}", point.x, point.y));
    }
    out
}
