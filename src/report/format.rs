//! Formatted terminal tables.
//!
//! Formatting lives here so the pipeline code stays free of layout concerns
//! and output changes stay localized.

use crate::eva::{ProbabilityPlot, SummaryTable};

/// Summary table: one row per return period.
pub fn format_summary(table: &SummaryTable) -> String {
    let mut out = String::new();
    push_line(
        &mut out,
        format!(
            "{:>14} {:>14} {:>14} {:>14}",
            "return period", "return value", "lower ci", "upper ci"
        ),
    );
    push_line(&mut out, format!("{:-<14} {:-<14} {:-<14} {:-<14}", "", "", "", ""));

    for row in &table.rows {
        push_line(
            &mut out,
            format!(
                "{:>14} {:>14} {:>14} {:>14}",
                fmt_num(row.return_period),
                fmt_num(row.return_value),
                fmt_opt(row.lower_ci),
                fmt_opt(row.upper_ci),
            ),
        );
    }
    out
}

/// Header line for a probability plot: kind and goodness of fit.
pub fn format_plot_header(plot: &ProbabilityPlot) -> String {
    format!(
        "{} plot: n={} | max |observed - theoretical|={}",
        plot.kind,
        plot.observed.len(),
        fmt_num(max_abs_deviation(plot))
    )
}

fn max_abs_deviation(plot: &ProbabilityPlot) -> f64 {
    plot.observed
        .iter()
        .zip(&plot.theoretical)
        .map(|(o, t)| (o - t).abs())
        .fold(0.0, f64::max)
}

fn push_line(out: &mut String, line: String) {
    out.push_str(line.trim_end());
    out.push('\n');
}

fn fmt_num(v: f64) -> String {
    if !v.is_finite() {
        return "nan".to_string();
    }
    if v != 0.0 && (v.abs() >= 1e6 || v.abs() < 1e-3) {
        format!("{v:.4e}")
    } else {
        format!("{v:.4}")
    }
}

fn fmt_opt(v: Option<f64>) -> String {
    v.map(fmt_num).unwrap_or_else(|| "-".to_string())
}
