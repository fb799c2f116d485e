mod document;
mod spreadsheet;

pub use document::{
    CellFrame, DocumentLayout, PageLayout, TableSpec, TextRun, detail_table, export_document,
    export_year_summary, layout_document, render_document, summary_table,
};
pub use spreadsheet::{SheetLayout, export_spreadsheet, render_spreadsheet, sheet_layout};

use crate::error::AppError;
use crate::format::{format_duration, format_export_date};
use crate::model::Task;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

pub const EXPORT_TITLE: &str = "Auftragsliste";
pub const EXPORT_HEADERS: [&str; 6] = [
    "Feld",
    "Fahrzeug",
    "Anbaugerät",
    "Beschreibung",
    "Datum",
    "Dauer",
];
pub const DEFAULT_SPREADSHEET_NAME: &str = "auftragsliste.xlsx";
pub const DEFAULT_DOCUMENT_NAME: &str = "auftragsliste.pdf";

const UNRESOLVED_PLACEHOLDER: &str = "Error";
const EMPTY_DESCRIPTION_PLACEHOLDER: &str = "No description";

/// One detail row per task, in the order given.
pub fn export_rows(tasks: &[Task]) -> Vec<[String; 6]> {
    tasks.iter().map(export_row).collect()
}

fn export_row(task: &Task) -> [String; 6] {
    let description = if task.description.is_empty() {
        EMPTY_DESCRIPTION_PLACEHOLDER.to_string()
    } else {
        task.description.clone()
    };

    [
        task.field_name().unwrap_or(UNRESOLVED_PLACEHOLDER).to_string(),
        task.vehicle_name().unwrap_or(UNRESOLVED_PLACEHOLDER).to_string(),
        task.attachment_name()
            .unwrap_or(UNRESOLVED_PLACEHOLDER)
            .to_string(),
        description,
        format_export_date(task.begin_date),
        format_duration(task.duration),
    ]
}

/// Writes `bytes` to a temp file next to `path` and moves it into place, so
/// a failed export never leaves a partial file behind.
pub fn write_atomically(path: &Path, bytes: &[u8]) -> Result<(), AppError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let result = persist_through_temp(dir, path, bytes);
    if let Err(err) = &result {
        tracing::error!(path = %path.display(), %err, "export failed");
    }
    result
}

fn persist_through_temp(dir: &Path, path: &Path, bytes: &[u8]) -> Result<(), AppError> {
    let mut temp = NamedTempFile::new_in(dir)
        .map_err(|err| AppError::io(format!("{}: {}", dir.display(), err)))?;
    temp.write_all(bytes)
        .and_then(|_| temp.flush())
        .map_err(|err| AppError::io(format!("{}: {}", temp.path().display(), err)))?;
    temp.persist(path)
        .map_err(|err| AppError::io(format!("{}: {}", path.display(), err.error)))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{EXPORT_HEADERS, export_rows, write_atomically};
    use crate::model::{Field, Task, Vehicle};
    use time::macros::datetime;

    fn task() -> Task {
        Task {
            id: 1,
            field_id: 1,
            vehicle_id: 2,
            attachment_id: 3,
            description: String::new(),
            duration: 5400,
            field: Some(Field {
                id: 1,
                name: "Hofwiese".to_string(),
                farm_id: None,
                farm_name: None,
                size: None,
            }),
            vehicle: Some(Vehicle {
                id: 2,
                name: "Fendt 724".to_string(),
            }),
            attachment: None,
            begin_date: datetime!(2024-05-01 07:00:00 +2),
            end_date: None,
            year: None,
            crop_id: None,
            crop_name: None,
            field_info: None,
        }
    }

    #[test]
    fn rows_use_placeholders_and_german_formats() {
        let rows = export_rows(&[task()]);

        assert_eq!(
            rows[0],
            [
                "Hofwiese".to_string(),
                "Fendt 724".to_string(),
                "Error".to_string(),
                "No description".to_string(),
                "1.5.2024, 07:00:00".to_string(),
                "01:30:00".to_string(),
            ]
        );
        assert_eq!(EXPORT_HEADERS.len(), rows[0].len());
    }

    #[test]
    fn atomic_write_replaces_the_target() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.bin");
        std::fs::write(&path, b"old").unwrap();

        write_atomically(&path, b"new contents").unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"new contents");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn atomic_write_into_missing_directory_leaves_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("out.bin");

        let err = write_atomically(&path, b"data").unwrap_err();

        assert_eq!(err.code(), "io_error");
        assert!(!path.exists());
    }
}
