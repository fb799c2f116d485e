//! Plain-text and JSON renderings of dashboard data.

use crate::cli::OptionKind;
use plm_core::config::Palette;
use plm_core::format::{
    format_area, format_duration, format_hectares, format_performance, format_rate,
    format_table_date,
};
use plm_core::model::{FieldInfo, Task};
use plm_core::summary::{AreaSummary, TaskTotals};
use plm_core::task_api::Dashboard;
use serde_json::{Value, json};
use tabled::settings::Style;
use tabled::{Table, Tabled};

const MISSING: &str = "-";
const UNRESOLVED: &str = "Error";

#[derive(Tabled)]
struct TaskRow {
    #[tabled(rename = "ID")]
    id: i64,
    #[tabled(rename = "Betrieb")]
    farm: String,
    #[tabled(rename = "Erntejahr")]
    year: String,
    #[tabled(rename = "Frucht")]
    crop: String,
    #[tabled(rename = "Feld")]
    field: String,
    #[tabled(rename = "Größe")]
    size: String,
    #[tabled(rename = "Fahrzeug")]
    vehicle: String,
    #[tabled(rename = "Gerät")]
    attachment: String,
    #[tabled(rename = "Beschreibung")]
    description: String,
    #[tabled(rename = "Datum")]
    date: String,
    #[tabled(rename = "Dauer")]
    duration: String,
    #[tabled(rename = "Flächenleistung")]
    performance: String,
}

impl From<&Task> for TaskRow {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id,
            farm: task.farm_name().unwrap_or(MISSING).to_string(),
            year: task
                .year
                .map(|year| year.to_string())
                .unwrap_or_else(|| MISSING.to_string()),
            crop: task.crop_name.clone().unwrap_or_else(|| MISSING.to_string()),
            field: task.field_name().unwrap_or(UNRESOLVED).to_string(),
            size: format_area(task.size()),
            vehicle: task.vehicle_name().unwrap_or(UNRESOLVED).to_string(),
            attachment: task.attachment_name().unwrap_or(UNRESOLVED).to_string(),
            description: task.description.clone(),
            date: format_table_date(task.begin_date),
            duration: format_duration(task.duration),
            performance: format_performance(task.performance()),
        }
    }
}

pub fn task_table(tasks: &[Task]) -> String {
    let rows: Vec<TaskRow> = tasks.iter().map(TaskRow::from).collect();
    Table::new(rows).with(Style::modern()).to_string()
}

pub fn statistics_lines(totals: &TaskTotals) -> Vec<String> {
    vec![
        format!("Gesamtanzahl Aufträge: {}", totals.task_count),
        format!(
            "Bewirtschaftete Fläche: {} ha ({})",
            format_hectares(totals.managed_area),
            format_rate(totals.hours_per_hectare(), "h/ha")
        ),
        format!(
            "Bearbeitete Fläche: {} ha ({})",
            format_hectares(totals.worked_area),
            format_rate(totals.hectares_per_hour(), "ha/h")
        ),
        format!("Gesamtdauer: {}", format_duration(totals.total_duration)),
    ]
}

pub fn print_tasks_plain(tasks: &[Task], totals: &TaskTotals, palette: &Palette) {
    for line in statistics_lines(totals) {
        println!("{}", palette.accentize(&line));
    }
    if tasks.is_empty() {
        println!("{}", palette.mutedize("Keine Aufträge gefunden."));
    } else {
        println!("{}", task_table(tasks));
    }
}

pub fn totals_json(totals: &TaskTotals) -> Value {
    json!({
        "task_count": totals.task_count,
        "managed_area": totals.managed_area,
        "worked_area": totals.worked_area,
        "total_duration": totals.total_duration,
        "hours_per_hectare": totals.hours_per_hectare(),
        "hectares_per_hour": totals.hectares_per_hour(),
    })
}

pub fn task_json(task: &Task) -> Value {
    json!({
        "id": task.id,
        "farm": task.farm_name(),
        "year": task.year,
        "crop_id": task.crop_id,
        "crop": task.crop_name,
        "field_id": task.field_id,
        "field": task.field_name(),
        "size": task.size(),
        "vehicle_id": task.vehicle_id,
        "vehicle": task.vehicle_name(),
        "attachment_id": task.attachment_id,
        "attachment": task.attachment_name(),
        "description": task.description,
        "begin": format_table_date(task.begin_date),
        "end": task.end_date.map(format_table_date),
        "duration": task.duration,
        "performance": task.performance(),
    })
}

pub fn tasks_json(tasks: &[Task], totals: &TaskTotals) -> Value {
    json!({
        "totals": totals_json(totals),
        "tasks": tasks.iter().map(task_json).collect::<Vec<_>>(),
    })
}

/// Label/value pairs of the task detail view.
pub fn task_detail_lines(task: &Task) -> Vec<(&'static str, String)> {
    let or_missing = |value: Option<&str>| value.unwrap_or(MISSING).to_string();
    let or_unresolved = |value: Option<&str>| value.unwrap_or(UNRESOLVED).to_string();
    let field_info_begin = task
        .field_info
        .as_ref()
        .and_then(|info| info.begin.clone());

    vec![
        ("ID", task.id.to_string()),
        ("Betrieb", or_missing(task.farm_name())),
        (
            "Erntejahr",
            task.year
                .map(|year| year.to_string())
                .unwrap_or_else(|| MISSING.to_string()),
        ),
        ("Frucht", or_missing(task.crop_name.as_deref())),
        ("Feld", or_unresolved(task.field_name())),
        ("Größe", format_area(task.size())),
        ("Fahrzeug", or_unresolved(task.vehicle_name())),
        ("Gerät", or_unresolved(task.attachment_name())),
        ("Beschreibung", task.description.clone()),
        ("Beginn", format_table_date(task.begin_date)),
        (
            "Ende",
            task.end_date
                .map(format_table_date)
                .unwrap_or_else(|| MISSING.to_string()),
        ),
        ("Dauer", format_duration(task.duration)),
        ("Flächenleistung", format_performance(task.performance())),
        ("Anbau seit", or_missing(field_info_begin.as_deref())),
    ]
}

pub fn print_task_plain(task: &Task, palette: &Palette) {
    for (label, value) in task_detail_lines(task) {
        println!("{}: {}", palette.accentize(label), value);
    }
}

#[derive(Tabled)]
struct OptionRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
}

/// `(id, label)` pairs rendered as a two-column table.
pub fn option_table(options: &[(String, String)]) -> String {
    let rows: Vec<OptionRow> = options
        .iter()
        .map(|(id, name)| OptionRow {
            id: id.clone(),
            name: name.clone(),
        })
        .collect();
    Table::new(rows).with(Style::modern()).to_string()
}

pub fn options_json(options: &[(String, String)]) -> Value {
    Value::Array(
        options
            .iter()
            .map(|(id, name)| json!({ "id": id, "name": name }))
            .collect(),
    )
}

/// `(id, label)` choices for one filter. Fields are narrowed to `farms` when
/// any are given.
pub fn option_pairs(
    dashboard: &Dashboard,
    kind: OptionKind,
    farms: &[i64],
) -> Vec<(String, String)> {
    let references = &dashboard.references;
    match kind {
        OptionKind::Farms => references
            .farms
            .iter()
            .map(|farm| (farm.id.to_string(), farm.name.clone()))
            .collect(),
        OptionKind::Fields => dashboard
            .field_options(farms)
            .into_iter()
            .map(|field| (field.id.to_string(), field.name.clone()))
            .collect(),
        OptionKind::Vehicles => references
            .vehicles
            .iter()
            .map(|vehicle| (vehicle.id.to_string(), vehicle.name.clone()))
            .collect(),
        OptionKind::Attachments => references
            .attachments
            .iter()
            .map(|attachment| (attachment.id.to_string(), attachment.name.clone()))
            .collect(),
        OptionKind::Crops => references
            .crops
            .iter()
            .map(|crop| (crop.id.to_string(), crop.name.clone()))
            .collect(),
        OptionKind::Years => references
            .years
            .iter()
            .map(|year| (year.year.to_string(), year.year.to_string()))
            .collect(),
    }
}

#[derive(Tabled)]
struct FieldInfoRow {
    #[tabled(rename = "ID")]
    id: i64,
    #[tabled(rename = "Betrieb")]
    farm: String,
    #[tabled(rename = "Frucht")]
    crop: String,
    #[tabled(rename = "Feld")]
    field: String,
    #[tabled(rename = "Größe")]
    size: String,
    #[tabled(rename = "Beginn")]
    begin: String,
}

pub fn field_info_table(records: &[FieldInfo]) -> String {
    let rows: Vec<FieldInfoRow> = records
        .iter()
        .map(|record| FieldInfoRow {
            id: record.id,
            farm: record.farm_name.clone().unwrap_or_else(|| MISSING.to_string()),
            crop: record.crop_name.clone().unwrap_or_else(|| MISSING.to_string()),
            field: record.field_name.clone().unwrap_or_else(|| MISSING.to_string()),
            size: format_area(record.field_size),
            begin: record.begin_date.clone().unwrap_or_else(|| MISSING.to_string()),
        })
        .collect();
    Table::new(rows).with(Style::modern()).to_string()
}

pub fn field_infos_json(records: &[FieldInfo]) -> Value {
    Value::Array(
        records
            .iter()
            .map(|record| {
                json!({
                    "id": record.id,
                    "year": record.year,
                    "farm": record.farm_name,
                    "crop_id": record.crop_id,
                    "crop": record.crop_name,
                    "field_id": record.field_id,
                    "field": record.field_name,
                    "size": record.field_size,
                    "begin": record.begin_date,
                })
            })
            .collect(),
    )
}

pub fn area_summary_json(summary: &AreaSummary) -> Value {
    json!({
        "total_area": summary.total_area,
        "total_fields": summary.total_fields,
        "farms": summary.farms.iter().map(|farm| {
            json!({
                "farm": farm.farm,
                "total_area": farm.total_area,
                "crops": farm.crops.iter().map(|crop| {
                    json!({
                        "crop": crop.crop,
                        "field_count": crop.field_count,
                        "total_area": crop.total_area,
                    })
                }).collect::<Vec<_>>(),
            })
        }).collect::<Vec<_>>(),
    })
}
