use crate::collate::locale_compare;
use crate::error::AppError;
use crate::model::Task;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortKey {
    #[default]
    Date,
    Duration,
    Field,
    Crop,
    Year,
    Vehicle,
    Attachment,
    Size,
    Performance,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortKey {
    pub const ALL: [SortKey; 9] = [
        SortKey::Date,
        SortKey::Duration,
        SortKey::Field,
        SortKey::Crop,
        SortKey::Year,
        SortKey::Vehicle,
        SortKey::Attachment,
        SortKey::Size,
        SortKey::Performance,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SortKey::Date => "date",
            SortKey::Duration => "duration",
            SortKey::Field => "field",
            SortKey::Crop => "crop",
            SortKey::Year => "year",
            SortKey::Vehicle => "vehicle",
            SortKey::Attachment => "attachment",
            SortKey::Size => "size",
            SortKey::Performance => "performance",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SortKey::Date => "Datum",
            SortKey::Duration => "Dauer",
            SortKey::Field => "Feld",
            SortKey::Crop => "Frucht",
            SortKey::Year => "Erntejahr",
            SortKey::Vehicle => "Fahrzeug",
            SortKey::Attachment => "Gerät",
            SortKey::Size => "Größe",
            SortKey::Performance => "Flächenleistung",
        }
    }
}

impl SortOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SortOrder::Asc => "Aufsteigend",
            SortOrder::Desc => "Absteigend",
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortKey {
    type Err = AppError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let normalized = raw.trim().to_ascii_lowercase();
        SortKey::ALL
            .into_iter()
            .find(|key| key.as_str() == normalized)
            .ok_or_else(|| {
                AppError::invalid_input(format!(
                    "unknown sort key '{}'; expected one of: {}",
                    raw.trim(),
                    SortKey::ALL.map(SortKey::as_str).join(", ")
                ))
            })
    }
}

impl FromStr for SortOrder {
    type Err = AppError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(SortOrder::Asc),
            "desc" | "descending" => Ok(SortOrder::Desc),
            _ => Err(AppError::invalid_input(format!(
                "unknown sort order '{}'; expected asc or desc",
                raw.trim()
            ))),
        }
    }
}

// Stand-ins for missing values. They are asymmetric on purpose so that tasks
// without a value end up at the bottom in both directions.
const MISSING_YEAR_ASC: i32 = 100_000;
const MISSING_YEAR_DESC: i32 = 0;
const MISSING_CROP_DESC: &str = "zzz";
const MISSING_PERFORMANCE_DESC: f64 = -1.0;
const MISSING_PERFORMANCE_ASC: f64 = f64::INFINITY;

/// Stable in-place sort by `key` and `order`.
pub fn sort_tasks(tasks: &mut [Task], key: SortKey, order: SortOrder) {
    tasks.sort_by(|a, b| compare(a, b, key, order));
}

pub fn compare(a: &Task, b: &Task, key: SortKey, order: SortOrder) -> Ordering {
    let asc = order == SortOrder::Asc;
    match key {
        SortKey::Date => directed(a.begin_date.cmp(&b.begin_date), asc),
        SortKey::Duration => directed(a.duration.cmp(&b.duration), asc),
        SortKey::Size => {
            let size = |task: &Task| task.size().unwrap_or(0.0);
            directed(size(a).total_cmp(&size(b)), asc)
        }
        SortKey::Vehicle => directed(
            locale_compare(
                a.vehicle_name().unwrap_or_default(),
                b.vehicle_name().unwrap_or_default(),
            ),
            asc,
        ),
        SortKey::Attachment => directed(
            locale_compare(
                a.attachment_name().unwrap_or_default(),
                b.attachment_name().unwrap_or_default(),
            ),
            asc,
        ),
        SortKey::Field => {
            let (a, b) = (
                a.field_name().unwrap_or_default(),
                b.field_name().unwrap_or_default(),
            );
            // ascending compares b to a
            if asc {
                locale_compare(b, a)
            } else {
                locale_compare(a, b)
            }
        }
        SortKey::Crop => {
            if asc {
                locale_compare(
                    b.crop_name.as_deref().unwrap_or_default(),
                    a.crop_name.as_deref().unwrap_or_default(),
                )
            } else {
                locale_compare(
                    a.crop_name.as_deref().unwrap_or(MISSING_CROP_DESC),
                    b.crop_name.as_deref().unwrap_or(MISSING_CROP_DESC),
                )
            }
        }
        SortKey::Year => {
            let missing = if asc {
                MISSING_YEAR_ASC
            } else {
                MISSING_YEAR_DESC
            };
            let year = |task: &Task| task.year.unwrap_or(missing);
            directed(year(a).cmp(&year(b)), asc)
        }
        SortKey::Performance => {
            let missing = if asc {
                MISSING_PERFORMANCE_ASC
            } else {
                MISSING_PERFORMANCE_DESC
            };
            let performance = |task: &Task| task.performance().unwrap_or(missing);
            directed(performance(a).total_cmp(&performance(b)), asc)
        }
    }
}

fn directed(ordering: Ordering, asc: bool) -> Ordering {
    if asc { ordering } else { ordering.reverse() }
}
