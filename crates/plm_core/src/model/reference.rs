use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub id: i64,
    pub name: String,
    #[serde(default, rename = "farmId", alias = "farm_id")]
    pub farm_id: Option<i64>,
    #[serde(default, rename = "farmName", alias = "farm_name")]
    pub farm_name: Option<String>,
    #[serde(default, deserialize_with = "super::lenient_area")]
    pub size: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Farm {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Crop {
    #[serde(rename = "crop_id", alias = "id")]
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HarvestYear {
    pub year: i32,
}

/// Reference collections fetched next to the task list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct References {
    pub farms: Vec<Farm>,
    pub fields: Vec<Field>,
    pub vehicles: Vec<Vehicle>,
    pub attachments: Vec<Attachment>,
    pub crops: Vec<Crop>,
    pub years: Vec<HarvestYear>,
}

impl References {
    pub fn field(&self, id: i64) -> Option<&Field> {
        self.fields.iter().find(|field| field.id == id)
    }

    pub fn vehicle(&self, id: i64) -> Option<&Vehicle> {
        self.vehicles.iter().find(|vehicle| vehicle.id == id)
    }

    pub fn attachment(&self, id: i64) -> Option<&Attachment> {
        self.attachments
            .iter()
            .find(|attachment| attachment.id == id)
    }

    pub fn crop(&self, id: i64) -> Option<&Crop> {
        self.crops.iter().find(|crop| crop.id == id)
    }

    /// Fields belonging to any of `farm_ids`; all fields when none are given.
    pub fn fields_of_farms(&self, farm_ids: &[i64]) -> Vec<&Field> {
        self.fields
            .iter()
            .filter(|field| {
                farm_ids.is_empty()
                    || field
                        .farm_id
                        .is_some_and(|farm_id| farm_ids.contains(&farm_id))
            })
            .collect()
    }
}
