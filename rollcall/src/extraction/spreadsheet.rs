//! `.xlsx` to CSV rendering.
//!
//! The model gets the first worksheet as comma-separated text: header row first, one line per
//! row, no row-number column. Rows with no content are dropped.

use calamine::{Data, Reader, Xlsx};
use std::io::Cursor;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SpreadsheetError {
    #[error("failed to read spreadsheet: {0}")]
    Workbook(#[from] calamine::XlsxError),

    #[error("spreadsheet contains no worksheets")]
    NoWorksheet,

    #[error("failed to render spreadsheet as CSV: {0}")]
    Csv(#[from] csv::Error),
}

/// Render the first worksheet of an in-memory `.xlsx` workbook as CSV.
pub fn render_csv(content: &[u8]) -> Result<String, SpreadsheetError> {
    let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(content))?;
    let range = workbook.worksheet_range_at(0).ok_or(SpreadsheetError::NoWorksheet)??;

    let mut writer = csv::WriterBuilder::new().flexible(true).from_writer(Vec::new());
    for row in range.rows().filter(|row| !is_blank(row)) {
        writer.write_record(row.iter().map(render_cell))?;
    }

    let buffer = writer.into_inner().map_err(|e| csv::Error::from(e.into_error()))?;
    // Cell text came from the workbook's XML, so it is already UTF-8
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

fn is_blank(row: &[Data]) -> bool {
    row.iter().all(|cell| match cell {
        Data::Empty => true,
        Data::String(s) => s.is_empty(),
        _ => false,
    })
}

fn render_cell(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        // f64 Display prints whole numbers without a fraction: 20.0 -> "20"
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        Data::Bool(true) => "True".to_string(),
        Data::Bool(false) => "False".to_string(),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(|d| d.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| dt.as_f64().to_string()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Error(e) => e.to_string(),
    }
}
