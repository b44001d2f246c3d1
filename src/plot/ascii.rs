//! ASCII plotting for terminal output.
//!
//! Fixed-size grid, deterministic output. Plot elements:
//! - extremes: `o`
//! - the 1:1 line a perfect fit would follow: `.`
//!
//! Both axes share one range so the 1:1 line is the grid diagonal.

use crate::eva::ProbabilityPlot;

/// Render a PP or QQ plot: theoretical on x, observed on y.
pub fn render_probability_plot(plot: &ProbabilityPlot, width: usize, height: usize) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let (lo, hi) = value_range(&plot.observed, &plot.theoretical).unwrap_or((0.0, 1.0));
    let (lo, hi) = pad_range(lo, hi, 0.05);

    let mut grid = vec![vec![' '; width]; height];

    // Diagonal first so points overlay it.
    let x0 = map_x(lo, lo, hi, width);
    let y0 = map_y(lo, lo, hi, height);
    let x1 = map_x(hi, lo, hi, width);
    let y1 = map_y(hi, lo, hi, height);
    draw_line(&mut grid, x0, y0, x1, y1, '.');

    for (&observed, &theoretical) in plot.observed.iter().zip(&plot.theoretical) {
        if !(observed.is_finite() && theoretical.is_finite()) {
            continue;
        }
        let x = map_x(theoretical, lo, hi, width);
        let y = map_y(observed, lo, hi, height);
        grid[y][x] = 'o';
    }

    let mut out = String::new();
    out.push_str(&format!(
        "{} plot: x=theoretical, y=observed | range=[{lo:.3}, {hi:.3}]\n",
        plot.kind
    ));
    for row in grid {
        out.push_str(&row.into_iter().collect::<String>());
        out.push('\n');
    }
    out
}

fn value_range(a: &[f64], b: &[f64]) -> Option<(f64, f64)> {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for &v in a.iter().chain(b).filter(|v| v.is_finite()) {
        min = min.min(v);
        max = max.max(v);
    }
    if min.is_finite() && max.is_finite() && max > min {
        Some((min, max))
    } else {
        None
    }
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    let pad = (span * frac).max(1e-12);
    (min - pad, max + pad)
}

fn map_x(t: f64, t_min: f64, t_max: f64, width: usize) -> usize {
    let width = width.max(2);
    let u = ((t - t_min) / (t_max - t_min)).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let height = height.max(2);
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // y=top is max -> row 0
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

/// Integer line drawing (Bresenham).
fn draw_line(grid: &mut [Vec<char>], x0: usize, y0: usize, x1: usize, y1: usize, ch: char) {
    let mut x0 = x0 as isize;
    let mut y0 = y0 as isize;
    let x1 = x1 as isize;
    let y1 = y1 as isize;

    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if y0 >= 0 && (y0 as usize) < grid.len() && x0 >= 0 && (x0 as usize) < grid[0].len() {
            grid[y0 as usize][x0 as usize] = ch;
        }

        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PlotKind;

    #[test]
    fn plot_golden_snapshot_small() {
        let plot = ProbabilityPlot {
            kind: PlotKind::PP,
            observed: vec![0.0, 1.0],
            theoretical: vec![0.0, 0.5],
        };
        let txt = render_probability_plot(&plot, 10, 5);
        let expected = concat!(
            "PP plot: x=theoretical, y=observed | range=[-0.050, 1.050]\n",
            "     o  ..\n",
            "      ..  \n",
            "    ..    \n",
            "  ..      \n",
            "o.        \n",
        );
        assert_eq!(txt, expected);
    }

    #[test]
    fn skips_non_finite_points() {
        let plot = ProbabilityPlot {
            kind: PlotKind::QQ,
            observed: vec![1.0, f64::NAN, 3.0],
            theoretical: vec![1.0, 2.0, 3.0],
        };
        let txt = render_probability_plot(&plot, 20, 8);
        let points: usize = txt.lines().skip(1).map(|l| l.matches('o').count()).sum();
        assert_eq!(points, 2);
        assert_eq!(txt.lines().count(), 9);
    }
}
