//! Deterministic text and SVG rendering of a canonical report.
//!
//! Every function here is a pure formatter: same report, same bytes out.
//! Nothing re-derives verdicts; tone and grading come from the core.

use lakeview_core::report::{PenaltySource, Report};
use lakeview_core::schema_diff;
use lakeview_core::score::{alert_tone, grade_view, penalty_breakdown, Tone};
use lakeview_core::trend::{self, ChartGeometry, TrendView};

const SPARK_LEVELS: [char; 8] = ['\u{2581}', '\u{2582}', '\u{2583}', '\u{2584}', '\u{2585}', '\u{2586}', '\u{2587}', '\u{2588}'];

#[must_use]
pub fn fmt_pct(ratio: f64) -> String {
    format!("{:.1}%", ratio * 100.0)
}

#[must_use]
pub fn fmt_delta(delta: Option<f64>) -> String {
    match delta {
        Some(d) => format!("{d:+.1} vs previous run"),
        None => "no previous run to compare".to_owned(),
    }
}

fn tone_tag(tone: Tone) -> String {
    format!("[{}]", tone.as_str())
}

/// Full text view of a report.
#[must_use]
pub fn render_report(report: &Report, window: usize) -> String {
    let mut out = String::new();
    let geom = ChartGeometry::default();
    let view = trend::trend_view(&report.history, window, &geom);

    header_section(&mut out, report);
    score_section(&mut out, report, &view);
    summary_section(&mut out, report);
    pii_section(&mut out, report);
    policy_section(&mut out, report);
    if let Some(changes) = &report.schema_changes {
        out.push('\n');
        for line in schema_diff::render_lines(changes) {
            out.push_str(&line);
            out.push('\n');
        }
    }
    alerts_section(&mut out, report);
    insights_section(&mut out, report);
    trend_section(&mut out, report, &view, window);
    autofix_section(&mut out, report);
    out
}

fn header_section(out: &mut String, report: &Report) {
    out.push_str(&format!(
        "Dataset   {} (run {})\n",
        report.dataset_name, report.run_id
    ));
    if let Some(at) = report.generated_at {
        out.push_str(&format!(
            "Generated {}\n",
            at.format("%Y-%m-%d %H:%M:%S UTC")
        ));
    }
}

fn score_section(out: &mut String, report: &Report, view: &TrendView) {
    let grade = grade_view(report);
    out.push_str(&format!(
        "\nScore     {:.1}  {}  {}  ({})\n",
        grade.score,
        grade.label,
        tone_tag(grade.tone),
        fmt_delta(view.delta)
    ));
    if let Some(reason) = &grade.reason {
        out.push_str(&format!("Reason    {reason}\n"));
    }

    let breakdown = penalty_breakdown(report);
    let origin = match breakdown.source {
        PenaltySource::Producer => "reported",
        PenaltySource::Approximated => "approximated",
    };
    out.push_str(&format!("\nPenalties ({origin})\n"));
    out.push_str(&format!("  missing     {:.1}\n", breakdown.penalty_missing));
    out.push_str(&format!("  outliers    {:.1}\n", breakdown.penalty_outliers));
    out.push_str(&format!(
        "  duplicates  {:.1}\n",
        breakdown.penalty_duplicates
    ));
    out.push_str(&format!("  pii         {:.1}\n", breakdown.penalty_pii));
    out.push_str(&format!("  drift       {:.1}\n", breakdown.penalty_drift));
}

fn summary_section(out: &mut String, report: &Report) {
    let s = &report.summary;
    out.push_str("\nSummary\n");
    out.push_str(&format!("  rows {}, columns {}\n", s.row_count, s.column_count));
    out.push_str(&format!(
        "  missing cells {} ({})\n",
        s.missing_cells,
        fmt_pct(s.missing_ratio)
    ));
    out.push_str(&format!(
        "  duplicate rows {} ({})\n",
        s.duplicate_rows,
        fmt_pct(s.duplicate_ratio)
    ));
    out.push_str(&format!("  outliers {}\n", fmt_pct(s.outlier_ratio)));
    out.push_str(&format!(
        "  drift {}\n",
        if s.has_drift { "detected" } else { "none" }
    ));
}

fn pii_section(out: &mut String, report: &Report) {
    let pii = &report.pii;
    if !pii.has_pii && pii.columns.is_empty() {
        return;
    }
    out.push_str(&format!(
        "\nPII       {} column{} flagged\n",
        pii.column_count,
        if pii.column_count == 1 { "" } else { "s" }
    ));
    for col in &pii.columns {
        if col.detected_types.is_empty() {
            out.push_str(&format!("  - {}\n", col.column));
        } else {
            out.push_str(&format!(
                "  - {} ({})\n",
                col.column,
                col.detected_types.join(", ")
            ));
        }
    }
}

fn policy_section(out: &mut String, report: &Report) {
    let policy = &report.policy;
    if policy.passed {
        out.push_str("\nPolicy    passed\n");
        return;
    }
    out.push_str("\nPolicy    FAILED\n");
    for failure in &policy.failures {
        out.push_str(&format!("  - {}: {}\n", failure.code, failure.message));
    }
}

fn alerts_section(out: &mut String, report: &Report) {
    if report.alerts.is_empty() {
        return;
    }
    out.push_str("\nAlerts\n");
    for alert in &report.alerts {
        out.push_str(&format!(
            "  {} {} {}\n",
            tone_tag(alert_tone(alert.level)),
            alert.code,
            alert.message
        ));
    }
}

fn insights_section(out: &mut String, report: &Report) {
    if report.insights.is_empty() {
        return;
    }
    out.push_str("\nInsights\n");
    for insight in &report.insights {
        out.push_str(&format!(
            "  ({}) {}: {}\n",
            insight.severity, insight.category, insight.message
        ));
    }
}

fn trend_section(out: &mut String, report: &Report, view: &TrendView, window: usize) {
    if report.history.points.is_empty() {
        return;
    }
    out.push_str(&format!("\nTrend (last {window} runs)\n"));
    out.push_str(&format!(
        "  {} run{}, scores {:.1}..{:.1}\n",
        view.point_count,
        if view.point_count == 1 { "" } else { "s" },
        view.min_score,
        view.max_score
    ));
    let spark = sparkline(report, window);
    if !spark.is_empty() {
        out.push_str(&format!("  {spark}\n"));
    }
}

/// Block-character sparkline over the trend window. Points without a
/// score render as a midline dot.
#[must_use]
pub fn sparkline(report: &Report, window: usize) -> String {
    let points = trend::window_points(&report.history.points, window);
    let (min, max) = trend::score_bounds(points);
    points
        .iter()
        .map(|p| match p.overall_score {
            Some(score) => {
                let level = if max > min {
                    ((score - min) / (max - min) * 7.0).round() as usize
                } else {
                    3
                };
                SPARK_LEVELS[level.min(7)]
            }
            None => '\u{00b7}',
        })
        .collect()
}

fn autofix_section(out: &mut String, report: &Report) {
    let Some(plan) = &report.autofix.plan else {
        return;
    };
    let enabled = plan.steps.iter().filter(|s| s.enabled).count();
    out.push_str(&format!(
        "\nAutofix plan ({} step{}, {} enabled)\n",
        plan.steps.len(),
        if plan.steps.len() == 1 { "" } else { "s" },
        enabled
    ));
    for step in &plan.steps {
        let mark = if step.enabled { 'x' } else { ' ' };
        let lock = if step.locked { " (locked)" } else { "" };
        out.push_str(&format!("  [{mark}] {}  {}{lock}\n", step.id, step.label));
    }
}

/// Trend chart as a standalone SVG document. Same view, same bytes.
#[must_use]
pub fn render_trend_svg(view: &TrendView, geom: &ChartGeometry) -> String {
    let (w, h, pad) = (geom.width, geom.height, geom.padding);
    let mut svg = String::new();
    svg.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\">\n"
    ));
    svg.push_str(&format!(
        "  <rect width=\"{w}\" height=\"{h}\" fill=\"#ffffff\"/>\n"
    ));

    if view.coords.is_empty() {
        svg.push_str(&format!(
            "  <text x=\"{:.1}\" y=\"{:.1}\" font-family=\"monospace\" font-size=\"12\" fill=\"#888888\" text-anchor=\"middle\">no scored runs</text>\n",
            w / 2.0,
            h / 2.0
        ));
        svg.push_str("</svg>\n");
        return svg;
    }

    if view.coords.len() > 1 {
        svg.push_str(&format!(
            "  <polyline fill=\"none\" stroke=\"#2f6f4f\" stroke-width=\"2\" points=\"{}\"/>\n",
            trend::polyline_points(view)
        ));
    }
    for point in &view.coords {
        svg.push_str(&format!(
            "  <circle cx=\"{:.1}\" cy=\"{:.1}\" r=\"3\" fill=\"#2f6f4f\"/>\n",
            point.x, point.y
        ));
    }
    svg.push_str(&format!(
        "  <text x=\"{pad}\" y=\"{:.1}\" font-family=\"monospace\" font-size=\"10\" fill=\"#555555\">max {:.1}</text>\n",
        pad, view.max_score
    ));
    svg.push_str(&format!(
        "  <text x=\"{pad}\" y=\"{:.1}\" font-family=\"monospace\" font-size=\"10\" fill=\"#555555\">min {:.1}</text>\n",
        h - pad, view.min_score
    ));
    svg.push_str("</svg>\n");
    svg
}

#[cfg(test)]
mod tests {
    use super::*;
    use lakeview_core::report::ingest::ingest;
    use lakeview_core::trend::trend_view;
    use serde_json::json;

    fn sample() -> Report {
        ingest(&json!({
            "dataset_name": "orders",
            "run_id": "r-9",
            "generated_at": "2024-06-10T09:00:00Z",
            "overall_score": 78.5,
            "score_grade": { "label": "Good", "reason": "minor gaps" },
            "summary": { "row_count": 100, "column_count": 5, "missing_ratio": 0.02 },
            "policy": { "passed": false, "failures": [{ "code": "MIN", "message": "too low" }] },
            "history": [
                { "timestamp": "2024-06-08T09:00:00Z", "overall_score": 70.0 },
                { "timestamp": "2024-06-09T09:00:00Z", "overall_score": 75.0 },
            ],
            "autofix_plan": { "steps": [
                { "id": "drop", "label": "Drop duplicates", "code": "x", "enabled": true },
            ]},
        }))
        .unwrap()
    }

    #[test]
    fn render_is_deterministic() {
        let report = sample();
        assert_eq!(render_report(&report, 20), render_report(&report, 20));
    }

    #[test]
    fn render_carries_every_section() {
        let text = render_report(&sample(), 20);
        assert!(text.contains("Dataset   orders (run r-9)"));
        assert!(text.contains("Score     78.5  Good  [success]"));
        assert!(text.contains("Reason    minor gaps"));
        assert!(text.contains("Penalties (approximated)"));
        assert!(text.contains("Policy    FAILED"));
        assert!(text.contains("  - MIN: too low"));
        assert!(text.contains("Trend (last 20 runs)"));
        assert!(text.contains("[x] drop  Drop duplicates"));
    }

    #[test]
    fn alerts_render_with_tones() {
        let report = ingest(&json!({
            "dataset_name": "d", "run_id": "r",
            "alerts": [
                { "level": "error", "code": "SCHEMA_BREAK", "message": "column removed" },
                { "level": "warning", "code": "HIGH_MISSING_RATIO", "message": "gaps up" },
                { "code": "NOTE", "message": "fyi" },
            ],
        }))
        .unwrap();
        let text = render_report(&report, 20);
        assert!(text.contains("\nAlerts\n"));
        assert!(text.contains("  [danger] SCHEMA_BREAK column removed"));
        assert!(text.contains("  [warning] HIGH_MISSING_RATIO gaps up"));
        assert!(text.contains("  [info] NOTE fyi"));
    }

    #[test]
    fn delta_formatting_signs() {
        assert_eq!(fmt_delta(Some(5.0)), "+5.0 vs previous run");
        assert_eq!(fmt_delta(Some(-2.5)), "-2.5 vs previous run");
        assert_eq!(fmt_delta(None), "no previous run to compare");
    }

    #[test]
    fn pct_formatting() {
        assert_eq!(fmt_pct(0.021), "2.1%");
        assert_eq!(fmt_pct(0.0), "0.0%");
    }

    #[test]
    fn sparkline_marks_unscored_points() {
        let report = ingest(&json!({
            "dataset_name": "d", "run_id": "r",
            "history": [
                { "timestamp": "2024-01-01T00:00:00Z", "overall_score": 10.0 },
                { "timestamp": "2024-01-02T00:00:00Z" },
                { "timestamp": "2024-01-03T00:00:00Z", "overall_score": 90.0 },
            ],
        }))
        .unwrap();
        let spark = sparkline(&report, 20);
        assert_eq!(spark.chars().count(), 3);
        assert_eq!(spark.chars().nth(1), Some('\u{00b7}'));
        assert_eq!(spark.chars().next(), Some(SPARK_LEVELS[0]));
        assert_eq!(spark.chars().last(), Some(SPARK_LEVELS[7]));
    }

    #[test]
    fn svg_is_stable_and_well_formed() {
        let report = sample();
        let geom = ChartGeometry::default();
        let view = trend_view(&report.history, 20, &geom);
        let svg = render_trend_svg(&view, &geom);
        assert!(svg.starts_with("<svg "));
        assert!(svg.ends_with("</svg>\n"));
        assert!(svg.contains("<polyline"));
        assert_eq!(svg.matches("<circle").count(), 2);
        assert_eq!(svg, render_trend_svg(&view, &geom));
    }

    #[test]
    fn svg_without_scores_says_so() {
        let geom = ChartGeometry::default();
        let view = trend_view(&Default::default(), 20, &geom);
        let svg = render_trend_svg(&view, &geom);
        assert!(svg.contains("no scored runs"));
        assert!(!svg.contains("<circle"));
    }
}
