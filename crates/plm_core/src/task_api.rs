use crate::collate::locale_compare;
use crate::datetime::{format_service_timestamp, parse_local_datetime, restore_local_datetime};
use crate::error::AppError;
use crate::filter::FilterOptions;
use crate::model::{Field, References, Task, TaskPayload};
use crate::normalize::normalize_tasks;
use crate::service::PlmService;
use crate::view::{Query, ViewResult, compute_view};
use time::{Duration, PrimitiveDateTime, UtcOffset};

/// The base task list plus everything needed to filter it.
#[derive(Debug, Clone)]
pub struct Dashboard {
    pub references: References,
    pub tasks: Vec<Task>,
    pub options: FilterOptions,
}

impl Dashboard {
    pub fn new(references: References, tasks: Vec<Task>) -> Self {
        let options = FilterOptions::from_references(&references);
        Self {
            references,
            tasks,
            options,
        }
    }

    pub fn view(&self, query: &Query) -> ViewResult {
        compute_view(&self.tasks, query, &self.options)
    }

    pub fn task(&self, id: i64) -> Result<&Task, AppError> {
        self.tasks
            .iter()
            .find(|task| task.id == id)
            .ok_or_else(|| AppError::invalid_input(format!("task {id} not found")))
    }

    /// Field choices, narrowed to the given farms when any are selected.
    pub fn field_options(&self, farm_ids: &[i64]) -> Vec<&Field> {
        self.references.fields_of_farms(farm_ids)
    }
}

/// Fetches every reference list, ordered the way the option lists show them.
pub fn load_references(service: &dyn PlmService) -> Result<References, AppError> {
    let mut references = References {
        fields: service.fetch_fields()?,
        vehicles: service.fetch_vehicles()?,
        attachments: service.fetch_attachments()?,
        farms: service.fetch_farms()?,
        crops: service.fetch_crops()?,
        years: service.fetch_years()?,
    };

    references
        .fields
        .sort_by(|a, b| locale_compare(&a.name, &b.name));
    references
        .vehicles
        .sort_by(|a, b| locale_compare(&a.name, &b.name));
    references
        .attachments
        .sort_by(|a, b| locale_compare(&a.name, &b.name));
    references
        .farms
        .sort_by(|a, b| locale_compare(&a.name, &b.name));
    references
        .crops
        .sort_by(|a, b| locale_compare(&a.name, &b.name));
    references.years.sort_by(|a, b| b.year.cmp(&a.year));

    Ok(references)
}

pub fn load_dashboard(
    service: &dyn PlmService,
    local_offset: UtcOffset,
) -> Result<Dashboard, AppError> {
    let references = load_references(service)?;
    let records = service.fetch_tasks()?;
    let tasks = normalize_tasks(&records, &references, local_offset)?;
    tracing::debug!(tasks = tasks.len(), "dashboard loaded");

    Ok(Dashboard::new(references, tasks))
}

/// Raw form input for a new task.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskDraft {
    pub field_id: i64,
    pub vehicle_id: i64,
    pub attachment_id: i64,
    pub description: String,
    /// `HH:MM` or `HH:MM:SS`
    pub duration: String,
    pub begin: String,
    pub end: Option<String>,
}

/// Changes to an existing task; `None` keeps the current value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskEdit {
    pub field_id: Option<i64>,
    pub vehicle_id: Option<i64>,
    pub attachment_id: Option<i64>,
    pub description: Option<String>,
    pub duration: Option<String>,
    pub begin: Option<String>,
    pub end: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskReceipt {
    pub payload: TaskPayload,
    pub message: String,
}

/// Parses `HH:MM` or `HH:MM:SS` into seconds. Hours are unbounded.
pub fn parse_duration(raw: &str) -> Result<u64, AppError> {
    let trimmed = raw.trim();
    let invalid = || {
        AppError::invalid_input(format!(
            "duration '{trimmed}' must look like HH:MM or HH:MM:SS"
        ))
    };

    let parts: Vec<&str> = trimmed.split(':').collect();
    if !(2..=3).contains(&parts.len()) {
        return Err(invalid());
    }

    let mut numbers = Vec::with_capacity(parts.len());
    for part in &parts {
        if part.is_empty() || !part.chars().all(|ch| ch.is_ascii_digit()) {
            return Err(invalid());
        }
        numbers.push(part.parse::<u64>().map_err(|_| invalid())?);
    }

    let hours = numbers[0];
    let minutes = numbers[1];
    let seconds = numbers.get(2).copied().unwrap_or(0);
    if minutes >= 60 || seconds >= 60 {
        return Err(invalid());
    }

    hours
        .checked_mul(3600)
        .and_then(|total| total.checked_add(minutes * 60 + seconds))
        .ok_or_else(|| AppError::invalid_input(format!("duration '{trimmed}' is too long")))
}

pub fn confirmation_message(description: &str, field_name: &str) -> String {
    format!("Der Auftrag \"{description}\" wurde für \"{field_name}\" hinzugefügt.")
}

fn require_references<'a>(
    references: &'a References,
    field_id: i64,
    vehicle_id: i64,
    attachment_id: i64,
) -> Result<&'a Field, AppError> {
    let field = references
        .field(field_id)
        .ok_or_else(|| AppError::invalid_input(format!("unknown field id {field_id}")))?;
    if references.vehicle(vehicle_id).is_none() {
        return Err(AppError::invalid_input(format!(
            "unknown vehicle id {vehicle_id}"
        )));
    }
    if references.attachment(attachment_id).is_none() {
        return Err(AppError::invalid_input(format!(
            "unknown attachment id {attachment_id}"
        )));
    }
    Ok(field)
}

fn checked_end(
    begin: PrimitiveDateTime,
    duration: u64,
    end: Option<&str>,
) -> Result<PrimitiveDateTime, AppError> {
    match end {
        Some(raw) => {
            let end = parse_local_datetime(raw)?;
            if end < begin {
                return Err(AppError::invalid_input("end must not be before begin"));
            }
            Ok(end)
        }
        None => {
            let seconds = i64::try_from(duration)
                .map_err(|_| AppError::invalid_input("duration is too long"))?;
            begin
                .checked_add(Duration::seconds(seconds))
                .ok_or_else(|| AppError::invalid_input("duration is too long"))
        }
    }
}

pub fn create_task(
    service: &dyn PlmService,
    references: &References,
    draft: &TaskDraft,
) -> Result<TaskReceipt, AppError> {
    let field = require_references(
        references,
        draft.field_id,
        draft.vehicle_id,
        draft.attachment_id,
    )?;
    let duration = parse_duration(&draft.duration)?;
    let begin = parse_local_datetime(&draft.begin)?;
    let end = checked_end(begin, duration, draft.end.as_deref())?;
    let description = draft.description.trim().to_string();

    let payload = TaskPayload {
        id: None,
        fields_id: draft.field_id,
        vehicles_id: draft.vehicle_id,
        attachments_id: draft.attachment_id,
        description: description.clone(),
        duration,
        begin: format_service_timestamp(begin)?,
        end: format_service_timestamp(end)?,
    };

    service.create_task(&payload)?;
    tracing::debug!(field_id = payload.fields_id, "task created");

    Ok(TaskReceipt {
        message: confirmation_message(&description, &field.name),
        payload,
    })
}

pub fn update_task(
    service: &dyn PlmService,
    references: &References,
    task: &Task,
    edit: &TaskEdit,
    local_offset: UtcOffset,
) -> Result<TaskReceipt, AppError> {
    let field_id = edit.field_id.unwrap_or(task.field_id);
    let vehicle_id = edit.vehicle_id.unwrap_or(task.vehicle_id);
    let attachment_id = edit.attachment_id.unwrap_or(task.attachment_id);
    require_references(references, field_id, vehicle_id, attachment_id)?;

    let duration = match edit.duration.as_deref() {
        Some(raw) => parse_duration(raw)?,
        None => task.duration,
    };
    let begin = match edit.begin.as_deref() {
        Some(raw) => parse_local_datetime(raw)?,
        None => restore_local_datetime(task.begin_date, local_offset),
    };

    let timing_changed = edit.begin.is_some() || edit.duration.is_some();
    let end = match (edit.end.as_deref(), task.end_date) {
        (Some(raw), _) => checked_end(begin, duration, Some(raw))?,
        (None, Some(existing)) if !timing_changed => restore_local_datetime(existing, local_offset),
        (None, _) => checked_end(begin, duration, None)?,
    };

    let description = match edit.description.as_deref() {
        Some(text) => text.trim().to_string(),
        None => task.description.clone(),
    };

    let payload = TaskPayload {
        id: Some(task.id),
        fields_id: field_id,
        vehicles_id: vehicle_id,
        attachments_id: attachment_id,
        description,
        duration,
        begin: format_service_timestamp(begin)?,
        end: format_service_timestamp(end)?,
    };

    service.update_task(&payload)?;
    tracing::debug!(task_id = task.id, "task updated");

    Ok(TaskReceipt {
        message: format!("Der Auftrag {} wurde aktualisiert.", task.id),
        payload,
    })
}
