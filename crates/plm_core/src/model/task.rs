use super::{Attachment, Field, Vehicle};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// A task row as delivered by `plm_tasks_matched`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub id: i64,
    pub fields_id: i64,
    pub vehicles_id: i64,
    pub attachments_id: i64,
    #[serde(default)]
    pub description: Option<String>,
    pub duration: u64,
    pub begin: String,
    #[serde(default)]
    pub end: Option<String>,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub crop_id: Option<i64>,
    #[serde(default)]
    pub crop_name: Option<String>,
    #[serde(default)]
    pub field_info_id: Option<i64>,
    #[serde(default)]
    pub field_id: Option<i64>,
    #[serde(default)]
    pub field_info_begin: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskFieldInfo {
    pub field_id: Option<i64>,
    pub begin: Option<String>,
    pub year: Option<i32>,
    pub crop_id: Option<i64>,
    pub crop_name: Option<String>,
}

/// A task joined against its reference data.
#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    pub id: i64,
    pub field_id: i64,
    pub vehicle_id: i64,
    pub attachment_id: i64,
    pub description: String,
    pub duration: u64,
    pub field: Option<Field>,
    pub vehicle: Option<Vehicle>,
    pub attachment: Option<Attachment>,
    pub begin_date: OffsetDateTime,
    pub end_date: Option<OffsetDateTime>,
    pub year: Option<i32>,
    pub crop_id: Option<i64>,
    pub crop_name: Option<String>,
    pub field_info: Option<TaskFieldInfo>,
}

impl Task {
    pub fn field_name(&self) -> Option<&str> {
        self.field.as_ref().map(|field| field.name.as_str())
    }

    pub fn vehicle_name(&self) -> Option<&str> {
        self.vehicle.as_ref().map(|vehicle| vehicle.name.as_str())
    }

    pub fn attachment_name(&self) -> Option<&str> {
        self.attachment
            .as_ref()
            .map(|attachment| attachment.name.as_str())
    }

    pub fn farm_id(&self) -> Option<i64> {
        self.field.as_ref().and_then(|field| field.farm_id)
    }

    /// Farm label, only shown when the field is linked to a farm.
    pub fn farm_name(&self) -> Option<&str> {
        let field = self.field.as_ref()?;
        field.farm_id?;
        field.farm_name.as_deref()
    }

    pub fn size(&self) -> Option<f64> {
        self.field.as_ref().and_then(|field| field.size)
    }

    /// Hectares worked per hour. `None` when the field size is unknown or
    /// zero, or when the task has no duration.
    pub fn performance(&self) -> Option<f64> {
        let size = self.size().filter(|size| *size != 0.0)?;
        if self.duration == 0 {
            return None;
        }
        Some(size / (self.duration as f64 / 3600.0))
    }
}

/// Body of `plm_task_insert` / `plm_task_update`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskPayload {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub id: Option<i64>,
    pub fields_id: i64,
    pub vehicles_id: i64,
    pub attachments_id: i64,
    pub description: String,
    pub duration: u64,
    pub begin: String,
    pub end: String,
}
