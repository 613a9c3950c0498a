//! Spreadsheet exports (CSV and XLSX) for any table of rows.

use std::str::FromStr;

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use rust_xlsxwriter::{Format, Workbook, XlsxError};
use thiserror::Error;

use crate::errors::AppError;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("XLSX error: {0}")]
    Xlsx(#[from] XlsxError),

    #[error("export buffer error: {0}")]
    Buffer(String),
}

impl From<ExportError> for AppError {
    fn from(e: ExportError) -> Self {
        AppError::Internal(anyhow::anyhow!(e))
    }
}

/// A cell value. Numbers stay numeric in XLSX.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Number(f64),
}

impl Cell {
    fn as_csv_field(&self) -> String {
        match self {
            Cell::Text(s) => s.clone(),
            Cell::Number(n) => n.to_string(),
        }
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::Text(s.to_string())
    }
}

impl From<String> for Cell {
    fn from(s: String) -> Self {
        Cell::Text(s)
    }
}

/// A row type that can be written to a spreadsheet.
pub trait TabularRow {
    fn headers() -> &'static [&'static str];
    fn cells(&self) -> Vec<Cell>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Xlsx,
}

impl FromStr for ExportFormat {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "xlsx" => Ok(ExportFormat::Xlsx),
            other => Err(AppError::Validation(format!(
                "Invalid format '{other}'. Use 'csv' or 'xlsx'"
            ))),
        }
    }
}

impl ExportFormat {
    fn content_type(self) -> &'static str {
        match self {
            ExportFormat::Csv => "text/csv; charset=utf-8",
            ExportFormat::Xlsx => {
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            }
        }
    }

    fn extension(self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Xlsx => "xlsx",
        }
    }
}

/// Writes a header record plus one record per row. Fields containing
/// delimiters, quotes or newlines are quoted by the CSV writer.
pub fn to_csv<R: TabularRow>(rows: &[R]) -> Result<Vec<u8>, ExportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(R::headers())?;
    for row in rows {
        writer.write_record(row.cells().iter().map(Cell::as_csv_field))?;
    }
    writer
        .into_inner()
        .map_err(|e| ExportError::Buffer(e.to_string()))
}

/// Writes a single-sheet workbook with a bold header row.
pub fn to_xlsx<R: TabularRow>(rows: &[R], sheet_name: &str) -> Result<Vec<u8>, ExportError> {
    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(sheet_name)?;

    for (col, title) in R::headers().iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, *title, &header_format)?;
    }
    for (i, row) in rows.iter().enumerate() {
        let row_idx = (i + 1) as u32;
        for (col, cell) in row.cells().iter().enumerate() {
            match cell {
                Cell::Text(s) => worksheet.write_string(row_idx, col as u16, s)?,
                Cell::Number(n) => worksheet.write_number(row_idx, col as u16, *n)?,
            };
        }
    }

    Ok(workbook.save_to_buffer()?)
}

/// Renders rows in `format` and wraps them as a file download.
pub fn download<R: TabularRow>(
    rows: &[R],
    format: ExportFormat,
    base_name: &str,
    sheet_name: &str,
) -> Result<Response, AppError> {
    let body = match format {
        ExportFormat::Csv => to_csv(rows)?,
        ExportFormat::Xlsx => to_xlsx(rows, sheet_name)?,
    };
    let disposition = format!(
        "attachment; filename=\"{base_name}.{}\"",
        format.extension()
    );
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, format.content_type().to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response())
}
