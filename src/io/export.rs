//! Export chart rows to CSV.
//!
//! Header: `year`, one column per series key, then `inflation` when the overlay
//! is enabled. Absent cells are written as empty fields.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::analytics::ChartTable;
use crate::error::AppError;

/// File name used when the user does not pick one: `<metric>_data.csv`.
pub fn default_export_path(metric: &str) -> PathBuf {
    PathBuf::from(format!("{metric}_data.csv"))
}

/// Write a chart table as CSV into any writer.
pub fn write_chart_csv<W: Write>(writer: W, table: &ChartTable) -> Result<(), AppError> {
    let mut wtr = csv::Writer::from_writer(writer);

    wtr.write_record(table.header())
        .map_err(|e| AppError::runtime(format!("Failed to write export CSV header: {e}")))?;

    for row in &table.rows {
        let mut record = Vec::with_capacity(table.keys.len() + 2);
        record.push(row.year.to_string());
        record.extend(row.cells.iter().map(|(_, v)| fmt_cell(*v)));
        if table.show_inflation {
            record.push(fmt_cell(row.inflation));
        }
        wtr.write_record(&record)
            .map_err(|e| AppError::runtime(format!("Failed to write export CSV row: {e}")))?;
    }

    wtr.flush()
        .map_err(|e| AppError::runtime(format!("Failed to flush export CSV: {e}")))?;
    Ok(())
}

/// Write a chart table to `path`.
pub fn write_chart_csv_file(path: &Path, table: &ChartTable) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::input(format!("Failed to create export CSV '{}': {e}", path.display())))?;
    write_chart_csv(file, table)?;
    log::info!("wrote {} rows to {}", table.rows.len(), path.display());
    Ok(())
}

fn fmt_cell(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::{ValueMode, project};
    use crate::domain::{AnalyticsPayload, DataPoint, Series, Unit};

    fn payload() -> AnalyticsPayload {
        let primary = Series::new(
            "boston",
            "median_price",
            Unit::Dollars,
            vec![DataPoint::new(2019, 500000.0), DataPoint::new(2020, 512500.5)],
        );
        let comparison = Series::new(
            "salem",
            "median_price",
            Unit::Dollars,
            vec![DataPoint::new(2020, 390000.0)],
        );
        AnalyticsPayload {
            primary,
            comparisons: vec![comparison],
            metadata: Default::default(),
        }
    }

    fn render(table: &ChartTable) -> String {
        let mut buf = Vec::new();
        write_chart_csv(&mut buf, table).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn absent_cells_are_blank() {
        let table = project(&payload(), ValueMode::Raw, false);
        assert_eq!(
            render(&table),
            "year,boston,salem\n2019,500000,\n2020,512500.5,390000\n"
        );
    }

    #[test]
    fn inflation_column_when_enabled() {
        let table = project(&payload(), ValueMode::Raw, true);
        assert_eq!(
            render(&table),
            "year,boston,salem,inflation\n2019,500000,,2.3\n2020,512500.5,390000,1.4\n"
        );
    }

    #[test]
    fn location_names_with_commas_are_quoted() {
        let mut p = payload();
        p.comparisons[0].location = "salem, ma".to_string();
        let table = project(&p, ValueMode::Raw, false);
        assert!(render(&table).starts_with("year,boston,\"salem, ma\"\n"));
    }

    #[test]
    fn default_name_uses_metric() {
        assert_eq!(default_export_path("median_price"), PathBuf::from("median_price_data.csv"));
    }
}
