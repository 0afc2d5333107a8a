//! Plotters-powered dashboard chart widget for Ratatui.
//!
//! We render Plotters output into the Ratatui buffer using `plotters-ratatui-backend`.
//! Series data and bounds are prepared by the caller; `render()` only draws.

use plotters::prelude::*;
use plotters::style::Color as _;
use plotters_ratatui_backend::widget_fn;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::Widget,
};

/// Series colors, primary first, cycled for comparisons.
pub const PALETTE: [(u8, u8, u8); 10] = [
    (0x02, 0x84, 0xc7),
    (0x7c, 0x3a, 0xed),
    (0x10, 0xb9, 0x81),
    (0xef, 0x44, 0x44),
    (0xf9, 0x73, 0x16),
    (0x8b, 0x5c, 0xf6),
    (0xf5, 0x9e, 0x0b),
    (0x14, 0xb8, 0xa6),
    (0xec, 0x48, 0x99),
    (0x63, 0x66, 0xf1),
];

pub const INFLATION_COLOR: (u8, u8, u8) = (0xff, 0x00, 0x00);

pub fn palette_color(index: usize) -> (u8, u8, u8) {
    PALETTE[index % PALETTE.len()]
}

pub fn to_ratatui((r, g, b): (u8, u8, u8)) -> Color {
    Color::Rgb(r, g, b)
}

/// How value series are drawn. The inflation overlay is always a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartStyle {
    Line,
    Bar,
    Area,
}

/// One drawable series: contiguous runs of `(year, value)` points.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSeries {
    pub label: String,
    pub color: (u8, u8, u8),
    pub segments: Vec<Vec<(f64, f64)>>,
}

pub struct DashboardChart<'a> {
    pub series: &'a [ChartSeries],
    pub inflation: Option<&'a ChartSeries>,
    pub style: ChartStyle,
    /// Draw a y = 0 reference line (YoY view).
    pub zero_line: bool,
    pub x_bounds: [f64; 2],
    pub y_bounds: [f64; 2],
    pub y_label: &'a str,
    pub fmt_y: fn(f64) -> String,
}

impl<'a> Widget for DashboardChart<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // Plotters may fail to lay out a chart in a tiny area.
        if area.width < 20 || area.height < 8 {
            buf.set_string(
                area.x,
                area.y,
                "Chart area too small (resize terminal).",
                Style::default().fg(Color::Yellow),
            );
            return;
        }

        let [x0, x1] = self.x_bounds;
        let [y0, y1] = self.y_bounds;
        if !(x0.is_finite() && x1.is_finite() && y0.is_finite() && y1.is_finite()) || x1 <= x0 || y1 <= y0 {
            return;
        }

        let widget = widget_fn(move |root| {
            let mut chart = ChartBuilder::on(&root)
                .margin(1)
                .set_label_area_size(LabelAreaPosition::Left, 8)
                .set_label_area_size(LabelAreaPosition::Bottom, 3)
                .build_cartesian_2d(x0..x1, y0..y1)?;

            chart
                .configure_mesh()
                .disable_x_mesh()
                .disable_y_mesh()
                .x_desc("Year")
                .y_desc(self.y_label)
                .x_labels(6)
                .y_labels(5)
                .x_label_formatter(&|v| format!("{:.0}", v.round()))
                .y_label_formatter(&|v| (self.fmt_y)(*v))
                .label_style(("sans-serif", 10).into_font().color(&WHITE))
                .axis_style(&WHITE)
                .bold_line_style(&WHITE)
                .draw()?;

            let baseline = 0.0_f64.clamp(y0, y1);
            let n_series = self.series.len().max(1);
            let group_width = 0.8;
            let bar_width = group_width / n_series as f64;

            for (i, series) in self.series.iter().enumerate() {
                let (r, g, b) = series.color;
                let color = RGBColor(r, g, b);
                match self.style {
                    ChartStyle::Line => {
                        for segment in &series.segments {
                            chart.draw_series(LineSeries::new(segment.iter().copied(), &color))?;
                        }
                    }
                    ChartStyle::Area => {
                        for segment in &series.segments {
                            chart.draw_series(
                                AreaSeries::new(segment.iter().copied(), baseline, &color.mix(0.2))
                                    .border_style(&color),
                            )?;
                        }
                    }
                    ChartStyle::Bar => {
                        let offset = -group_width / 2.0 + bar_width * i as f64;
                        chart.draw_series(series.segments.iter().flatten().map(|&(x, y)| {
                            Rectangle::new(
                                [(x + offset, baseline), (x + offset + bar_width, y)],
                                color.filled(),
                            )
                        }))?;
                    }
                }
            }

            if self.zero_line && y0 < 0.0 && y1 > 0.0 {
                chart.draw_series(LineSeries::new([(x0, 0.0), (x1, 0.0)], &RGBColor(0x66, 0x66, 0x66)))?;
            }

            if let Some(inflation) = self.inflation {
                let (r, g, b) = inflation.color;
                let color = RGBColor(r, g, b);
                for segment in &inflation.segments {
                    chart.draw_series(LineSeries::new(segment.iter().copied(), &color))?;
                }
            }

            Ok(())
        });

        widget.render(area, buf);
    }
}
