//! Terminal plotting.

pub mod ascii;

pub use ascii::render_chart_plot;
