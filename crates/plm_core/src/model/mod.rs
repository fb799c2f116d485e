mod field_info;
mod reference;
mod task;

pub use field_info::{FieldInfo, FieldInfoPayload};
pub use reference::{Attachment, Crop, Farm, Field, HarvestYear, References, Vehicle};
pub use task::{Task, TaskFieldInfo, TaskPayload, TaskRecord};

use serde::{Deserialize, Deserializer};

/// Area columns arrive as JSON numbers or as decimal strings, depending on
/// how the service serialized the database column.
pub(crate) fn lenient_area<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Area {
        Number(f64),
        Text(String),
    }

    match Option::<Area>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Area::Number(value)) => Ok(Some(value)),
        Some(Area::Text(text)) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                return Ok(None);
            }
            trimmed
                .parse::<f64>()
                .map(Some)
                .map_err(|_| serde::de::Error::custom(format!("invalid area value '{trimmed}'")))
        }
    }
}
