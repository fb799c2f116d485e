use crate::datetime::{adjust_to_timezone, parse_service_timestamp};
use crate::error::AppError;
use crate::model::{References, Task, TaskFieldInfo, TaskRecord};
use time::UtcOffset;

/// Joins raw task rows against the reference lists.
///
/// Unresolved field, vehicle and attachment ids become `None`; the task is
/// kept so the table can render the placeholder. The result is ordered by
/// corrected begin date, newest first.
pub fn normalize_tasks(
    records: &[TaskRecord],
    references: &References,
    local_offset: UtcOffset,
) -> Result<Vec<Task>, AppError> {
    let mut tasks = Vec::with_capacity(records.len());
    for record in records {
        tasks.push(normalize_task(record, references, local_offset)?);
    }

    tasks.sort_by(|a, b| b.begin_date.cmp(&a.begin_date));
    Ok(tasks)
}

fn normalize_task(
    record: &TaskRecord,
    references: &References,
    local_offset: UtcOffset,
) -> Result<Task, AppError> {
    let begin = parse_service_timestamp(&record.begin, local_offset).map_err(|err| {
        AppError::invalid_data(format!("task {}: {}", record.id, err.message()))
    })?;

    let end_date = match record.end.as_deref() {
        Some(raw) => match parse_service_timestamp(raw, local_offset) {
            Ok(end) => Some(adjust_to_timezone(end, local_offset)),
            Err(err) => {
                tracing::debug!(task_id = record.id, %err, "ignoring unreadable end timestamp");
                None
            }
        },
        None => None,
    };

    let field_info = record.field_info_id.map(|_| TaskFieldInfo {
        field_id: record.field_id,
        begin: record.field_info_begin.clone(),
        year: record.year,
        crop_id: record.crop_id,
        crop_name: record.crop_name.clone(),
    });

    Ok(Task {
        id: record.id,
        field_id: record.fields_id,
        vehicle_id: record.vehicles_id,
        attachment_id: record.attachments_id,
        description: record.description.clone().unwrap_or_default(),
        duration: record.duration,
        field: references.field(record.fields_id).cloned(),
        vehicle: references.vehicle(record.vehicles_id).cloned(),
        attachment: references.attachment(record.attachments_id).cloned(),
        begin_date: adjust_to_timezone(begin, local_offset),
        end_date,
        year: record.year,
        crop_id: record.crop_id,
        crop_name: record.crop_name.clone(),
        field_info,
    })
}
