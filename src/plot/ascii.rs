//! ASCII plotting of chart tables for terminal output.
//!
//! This is intentionally "dumb" (fixed-size grid), optimized for:
//! - quick visual sanity checks in a terminal
//! - deterministic output (helpful for golden tests)
//!
//! Each series gets its own glyph (primary `*`, comparisons `o x + # @`,
//! inflation `i`). Consecutive present cells are joined with the same glyph;
//! absent cells break the line.

use crate::analytics::{ChartTable, INFLATION_KEY};

const SERIES_GLYPHS: [char; 6] = ['*', 'o', 'x', '+', '#', '@'];
const INFLATION_GLYPH: char = 'i';

/// Render every column of `table` onto one shared year/value grid.
pub fn render_chart_plot(table: &ChartTable, width: usize, height: usize) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let mut columns: Vec<(String, char, Vec<(i32, f64)>)> = table
        .keys
        .iter()
        .enumerate()
        .map(|(i, key)| (key.clone(), SERIES_GLYPHS[i % SERIES_GLYPHS.len()], table.column(key)))
        .collect();
    if table.show_inflation {
        columns.push((
            INFLATION_KEY.to_string(),
            INFLATION_GLYPH,
            table.column(INFLATION_KEY),
        ));
    }

    let Some((x_min, x_max)) = year_range(table) else {
        return "Plot: no data\n".to_string();
    };
    let (y_min, y_max) = value_range(&columns).unwrap_or((0.0, 1.0));
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);

    let mut grid = vec![vec![' '; width]; height];

    // Draw later series first so the primary ends up on top.
    for (_, glyph, points) in columns.iter().rev() {
        draw_series(&mut grid, table, points, *glyph, (x_min, x_max), (y_min, y_max));
    }

    let mut out = String::new();
    out.push_str(&format!(
        "Plot: year=[{x_min}, {x_max}] | y=[{y_min:.2}, {y_max:.2}]\n"
    ));
    for row in grid {
        out.push_str(row.into_iter().collect::<String>().trim_end());
        out.push('\n');
    }

    let legend: Vec<String> = columns
        .iter()
        .map(|(key, glyph, _)| format!("{glyph} {key}"))
        .collect();
    out.push_str(&legend.join("  "));
    out.push('\n');

    out
}

fn year_range(table: &ChartTable) -> Option<(i32, i32)> {
    let first = table.rows.first()?.year;
    let last = table.rows.last()?.year;
    Some((first, last.max(first + 1)))
}

fn value_range(columns: &[(String, char, Vec<(i32, f64)>)]) -> Option<(f64, f64)> {
    let mut min_y = f64::INFINITY;
    let mut max_y = f64::NEG_INFINITY;
    for (_, _, points) in columns {
        for &(_, y) in points {
            min_y = min_y.min(y);
            max_y = max_y.max(y);
        }
    }
    if min_y.is_finite() && max_y.is_finite() && max_y > min_y {
        Some((min_y, max_y))
    } else if min_y.is_finite() {
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

fn map_x(year: i32, x_min: i32, x_max: i32, width: usize) -> usize {
    let width = width.max(2);
    let u = ((year - x_min) as f64 / (x_max - x_min) as f64).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let height = height.max(2);
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // y=top is max -> row 0
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

fn draw_series(
    grid: &mut [Vec<char>],
    table: &ChartTable,
    points: &[(i32, f64)],
    glyph: char,
    x: (i32, i32),
    y: (f64, f64),
) {
    let height = grid.len();
    let width = grid[0].len();

    let mut prev: Option<(i32, usize, usize)> = None;
    for &(year, value) in points {
        let cx = map_x(year, x.0, x.1, width);
        let cy = map_y(value, y.0, y.1, height);
        match prev {
            // Only join rows that are adjacent in the table.
            Some((prev_year, x0, y0)) if adjacent_rows(table, prev_year, year) => {
                draw_line(grid, x0, y0, cx, cy, glyph);
            }
            _ => {}
        }
        grid[cy][cx] = glyph;
        prev = Some((year, cx, cy));
    }
}

fn adjacent_rows(table: &ChartTable, a: i32, b: i32) -> bool {
    table
        .rows
        .windows(2)
        .any(|w| w[0].year == a && w[1].year == b)
}

/// Integer line drawing (Bresenham-ish).
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
