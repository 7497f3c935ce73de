//! ASCII time-series plots for the diagnostics report.
//!
//! Fixed-size character grid, deterministic output. The x axis is the series
//! position; each series is drawn as a connected line with its own glyph.
//! Earlier series win where lines overlap.

/// One line on the plot.
#[derive(Debug, Clone, Copy)]
pub struct Series<'a> {
    pub values: &'a [f64],
    pub glyph: char,
}

/// Render `series` on a `width` x `height` grid with a one-line header.
pub fn render_time_plot(label: &str, series: &[Series<'_>], width: usize, height: usize) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let n = series.iter().map(|s| s.values.len()).max().unwrap_or(0);
    let x_max = n.saturating_sub(1).max(1) as f64;
    let (y_min, y_max) = y_range(series).unwrap_or((0.0, 1.0));
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);

    let mut grid = vec![vec![' '; width]; height];
    for s in series {
        draw_series(&mut grid, s, x_max, y_min, y_max);
    }

    let mut out = String::new();
    out.push_str(&format!(
        "Plot: {label} | t=[0, {}] | y=[{y_min:.2}, {y_max:.2}]\n",
        n.saturating_sub(1)
    ));
    for row in grid {
        out.push_str(&row.into_iter().collect::<String>());
        out.push('\n');
    }
    out
}

fn y_range(series: &[Series<'_>]) -> Option<(f64, f64)> {
    let mut min_y = f64::INFINITY;
    let mut max_y = f64::NEG_INFINITY;
    for v in series.iter().flat_map(|s| s.values.iter()).filter(|v| v.is_finite()) {
        min_y = min_y.min(*v);
        max_y = max_y.max(*v);
    }
    if min_y.is_finite() && max_y.is_finite() && max_y > min_y {
        Some((min_y, max_y))
    } else if min_y.is_finite() {
        // Flat series: centre it.
        Some((min_y - 1.0, min_y + 1.0))
    } else {
        None
    }
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    let pad = (span * frac).max(1e-12);
    (min - pad, max + pad)
}

fn map_x(i: f64, x_max: f64, width: usize) -> usize {
    let u = (i / x_max).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // Row 0 is the top of the plot.
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

fn draw_series(grid: &mut [Vec<char>], series: &Series<'_>, x_max: f64, y_min: f64, y_max: f64) {
    let height = grid.len();
    let width = grid[0].len();

    let mut prev: Option<(usize, usize)> = None;
    for (i, &y) in series.values.iter().enumerate() {
        if !y.is_finite() {
            prev = None;
            continue;
        }
        let x = map_x(i as f64, x_max, width);
        let yy = map_y(y, y_min, y_max, height);
        match prev {
            Some((x0, y0)) => draw_line(grid, x0, y0, x, yy, series.glyph),
            None if grid[yy][x] == ' ' => grid[yy][x] = series.glyph,
            None => {}
        }
        prev = Some((x, yy));
    }
}

/// Integer line drawing (Bresenham). Only fills empty cells.
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
        if y0 >= 0
            && (y0 as usize) < grid.len()
            && x0 >= 0
            && (x0 as usize) < grid[0].len()
            && grid[y0 as usize][x0 as usize] == ' '
        {
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

    #[test]
    fn plot_golden_snapshot_small() {
        let values = [0.0, 10.0];
        let txt = render_time_plot("PE load", &[Series { values: &values, glyph: '-' }], 10, 5);
        let expected = concat!(
            "Plot: PE load | t=[0, 1] | y=[-0.50, 10.50]\n",
            "        --\n",
            "      --  \n",
            "    --    \n",
            "  --      \n",
            "--        \n",
        );
        assert_eq!(txt, expected);
    }

    #[test]
    fn first_series_wins_on_overlap() {
        let a = [1.0, 1.0, 1.0];
        let b = [1.0, 1.0, 1.0];
        let txt = render_time_plot(
            "overlap",
            &[Series { values: &a, glyph: '-' }, Series { values: &b, glyph: '*' }],
            12,
            5,
        );
        assert!(txt.contains('-'));
        assert!(!txt.contains('*'));
    }

    #[test]
    fn empty_input_renders_blank_grid() {
        let txt = render_time_plot("empty", &[], 10, 5);
        assert_eq!(txt.lines().count(), 6);
        assert!(txt.lines().skip(1).all(|l| l.trim().is_empty()));
    }
}
