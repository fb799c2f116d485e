use serde::{Deserialize, Serialize};

/// A harvest-year assignment row from `plm_fieldinfo`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldInfo {
    pub id: i64,
    #[serde(default)]
    pub farm_name: Option<String>,
    #[serde(default)]
    pub crop_name: Option<String>,
    #[serde(default)]
    pub crop_id: Option<i64>,
    #[serde(default)]
    pub field_name: Option<String>,
    #[serde(default)]
    pub field_id: Option<i64>,
    #[serde(default, deserialize_with = "super::lenient_area")]
    pub field_size: Option<f64>,
    pub year: i32,
    #[serde(default)]
    pub begin_date: Option<String>,
}

/// Body of the create/update calls on `plm_fieldinfo`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldInfoPayload {
    pub fields: Vec<i64>,
    pub begin: String,
    pub year: i32,
    #[serde(rename = "cropId")]
    pub crop_id: i64,
    #[serde(rename = "taskInfoId")]
    pub task_info_id: Option<i64>,
}
