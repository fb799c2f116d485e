mod http;

pub use http::HttpService;

use crate::config::Config;
use crate::error::AppError;
use crate::model::{
    Attachment, Crop, Farm, Field, FieldInfo, FieldInfoPayload, HarvestYear, TaskPayload,
    TaskRecord, Vehicle,
};

pub const TASKS_ENDPOINT: &str = "plm_tasks_matched";
pub const FIELDS_ENDPOINT: &str = "plm_fields";
pub const VEHICLES_ENDPOINT: &str = "plm_vehicles";
pub const ATTACHMENTS_ENDPOINT: &str = "plm_attachments";
pub const FARMS_ENDPOINT: &str = "plm_farms";
pub const CROPS_ENDPOINT: &str = "plm_crops";
pub const YEARS_ENDPOINT: &str = "plm_years";
pub const FIELD_INFO_ENDPOINT: &str = "plm_fieldinfo";
pub const TASK_INSERT_ENDPOINT: &str = "plm_task_insert";
pub const TASK_UPDATE_ENDPOINT: &str = "plm_task_update";

/// The remote data service. Every call is a single blocking request.
pub trait PlmService {
    fn fetch_tasks(&self) -> Result<Vec<TaskRecord>, AppError>;
    fn fetch_fields(&self) -> Result<Vec<Field>, AppError>;
    fn fetch_vehicles(&self) -> Result<Vec<Vehicle>, AppError>;
    fn fetch_attachments(&self) -> Result<Vec<Attachment>, AppError>;
    fn fetch_farms(&self) -> Result<Vec<Farm>, AppError>;
    fn fetch_crops(&self) -> Result<Vec<Crop>, AppError>;
    fn fetch_years(&self) -> Result<Vec<HarvestYear>, AppError>;
    fn fetch_field_infos(&self) -> Result<Vec<FieldInfo>, AppError>;
    fn create_field_info(&self, payload: &FieldInfoPayload) -> Result<(), AppError>;
    fn update_field_info(&self, id: i64, payload: &FieldInfoPayload) -> Result<(), AppError>;
    fn delete_field_info(&self, id: i64) -> Result<(), AppError>;
    fn create_task(&self, payload: &TaskPayload) -> Result<(), AppError>;
    fn update_task(&self, payload: &TaskPayload) -> Result<(), AppError>;
}

pub fn service_from_config(config: &Config) -> Result<Box<dyn PlmService>, AppError> {
    let service = HttpService::new(&config.base_url(), config.timeout_secs())?;
    Ok(Box::new(service))
}
