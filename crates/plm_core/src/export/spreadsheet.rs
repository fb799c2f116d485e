use super::{EXPORT_HEADERS, EXPORT_TITLE, export_rows, write_atomically};
use crate::error::AppError;
use crate::model::Task;
use rust_xlsxwriter::{Format, Workbook, XlsxError};
use std::path::Path;

const COLUMN_PADDING: usize = 5;

/// Cell contents and column widths of the task sheet. The first row holds
/// the headers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetLayout {
    pub rows: Vec<Vec<String>>,
    pub column_widths: Vec<usize>,
}

pub fn sheet_layout(tasks: &[Task]) -> SheetLayout {
    let mut rows: Vec<Vec<String>> = Vec::with_capacity(tasks.len() + 1);
    rows.push(EXPORT_HEADERS.iter().map(|header| header.to_string()).collect());
    rows.extend(export_rows(tasks).into_iter().map(Vec::from));

    let column_widths = (0..EXPORT_HEADERS.len())
        .map(|column| {
            rows.iter()
                .map(|row| row[column].chars().count())
                .max()
                .unwrap_or(0)
                + COLUMN_PADDING
        })
        .collect();

    SheetLayout {
        rows,
        column_widths,
    }
}

/// Builds the workbook in memory and returns the `.xlsx` bytes.
pub fn render_spreadsheet(tasks: &[Task]) -> Result<Vec<u8>, AppError> {
    let layout = sheet_layout(tasks);
    build_workbook(&layout).map_err(|err| AppError::invalid_data(format!("spreadsheet: {err}")))
}

pub fn export_spreadsheet(tasks: &[Task], path: &Path) -> Result<(), AppError> {
    let bytes = render_spreadsheet(tasks).inspect_err(|err| {
        tracing::error!(path = %path.display(), %err, "spreadsheet rendering failed");
    })?;
    write_atomically(path, &bytes)?;
    tracing::debug!(path = %path.display(), rows = tasks.len(), "spreadsheet written");
    Ok(())
}

fn build_workbook(layout: &SheetLayout) -> Result<Vec<u8>, XlsxError> {
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(EXPORT_TITLE)?;

    for (row_index, row) in layout.rows.iter().enumerate() {
        let row_number = row_index as u32;
        for (column_index, value) in row.iter().enumerate() {
            let column_number = column_index as u16;
            if row_index == 0 {
                worksheet.write_string_with_format(row_number, column_number, value, &bold)?;
            } else {
                worksheet.write_string(row_number, column_number, value)?;
            }
        }
    }

    for (column_index, width) in layout.column_widths.iter().enumerate() {
        worksheet.set_column_width(column_index as u16, *width as f64)?;
    }

    workbook.save_to_buffer()
}
