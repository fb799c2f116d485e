use crate::collate::locale_compare;
use crate::model::{FieldInfo, Task};
use std::collections::HashSet;

/// Label used wherever a farm or crop name is missing.
pub const UNKNOWN_LABEL: &str = "Unbekannt";

/// Anything that contributes an area to a farm/crop summary.
pub trait AreaRecord {
    fn farm_label(&self) -> Option<&str>;
    fn crop_label(&self) -> Option<&str>;
    fn area(&self) -> Option<f64>;
}

impl AreaRecord for FieldInfo {
    fn farm_label(&self) -> Option<&str> {
        self.farm_name.as_deref()
    }

    fn crop_label(&self) -> Option<&str> {
        self.crop_name.as_deref()
    }

    fn area(&self) -> Option<f64> {
        self.field_size
    }
}

impl AreaRecord for Task {
    fn farm_label(&self) -> Option<&str> {
        self.farm_name()
    }

    fn crop_label(&self) -> Option<&str> {
        self.crop_name.as_deref()
    }

    fn area(&self) -> Option<f64> {
        self.size()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CropSummary {
    pub crop: String,
    pub field_count: usize,
    pub total_area: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FarmSummary {
    pub farm: String,
    pub total_area: f64,
    pub crops: Vec<CropSummary>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AreaSummary {
    pub farms: Vec<FarmSummary>,
    pub total_area: f64,
    pub total_fields: usize,
}

/// Crop rows by farm columns, with totals on both axes.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CropFarmMatrix {
    pub farms: Vec<String>,
    pub crops: Vec<String>,
    /// `cells[crop][farm]`
    pub cells: Vec<Vec<f64>>,
    pub crop_totals: Vec<f64>,
    pub farm_totals: Vec<f64>,
    pub grand_total: f64,
}

impl AreaSummary {
    pub fn farm(&self, name: &str) -> Option<&FarmSummary> {
        self.farms.iter().find(|farm| farm.farm == name)
    }

    pub fn farm_totals(&self) -> Vec<(&str, f64)> {
        self.farms
            .iter()
            .map(|farm| (farm.farm.as_str(), farm.total_area))
            .collect()
    }

    pub fn matrix(&self) -> CropFarmMatrix {
        let farms: Vec<String> = self.farms.iter().map(|farm| farm.farm.clone()).collect();

        let mut crops: Vec<String> = Vec::new();
        for crop in self.farms.iter().flat_map(|farm| &farm.crops) {
            if !crops.contains(&crop.crop) {
                crops.push(crop.crop.clone());
            }
        }
        crops.sort_by(|a, b| locale_compare(a, b));

        let cells: Vec<Vec<f64>> = crops
            .iter()
            .map(|crop| {
                self.farms
                    .iter()
                    .map(|farm| {
                        farm.crops
                            .iter()
                            .find(|entry| &entry.crop == crop)
                            .map_or(0.0, |entry| entry.total_area)
                    })
                    .collect()
            })
            .collect();

        let crop_totals = cells.iter().map(|row| row.iter().sum::<f64>()).collect();
        let farm_totals = self.farms.iter().map(|farm| farm.total_area).collect();

        CropFarmMatrix {
            farms,
            crops,
            cells,
            crop_totals,
            farm_totals,
            grand_total: self.total_area,
        }
    }
}

/// Groups records by farm, then crop, in order of first appearance.
pub fn summarize<R: AreaRecord>(records: &[R]) -> AreaSummary {
    let mut summary = AreaSummary::default();

    for record in records {
        let farm_name = record.farm_label().unwrap_or(UNKNOWN_LABEL);
        let crop_name = record.crop_label().unwrap_or(UNKNOWN_LABEL);
        let area = record.area().unwrap_or(0.0);

        let farm_index = match summary.farms.iter().position(|farm| farm.farm == farm_name) {
            Some(index) => index,
            None => {
                summary.farms.push(FarmSummary {
                    farm: farm_name.to_string(),
                    total_area: 0.0,
                    crops: Vec::new(),
                });
                summary.farms.len() - 1
            }
        };
        let farm = &mut summary.farms[farm_index];

        let crop_index = match farm.crops.iter().position(|crop| crop.crop == crop_name) {
            Some(index) => index,
            None => {
                farm.crops.push(CropSummary {
                    crop: crop_name.to_string(),
                    field_count: 0,
                    total_area: 0.0,
                });
                farm.crops.len() - 1
            }
        };
        let crop = &mut farm.crops[crop_index];

        crop.field_count += 1;
        crop.total_area += area;
        farm.total_area += area;
        summary.total_area += area;
        summary.total_fields += 1;
    }

    summary
}

/// Header statistics for a task list.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TaskTotals {
    pub task_count: usize,
    /// Area of every distinct field touched.
    pub managed_area: f64,
    /// Area summed over all tasks, counting a field once per task.
    pub worked_area: f64,
    pub total_duration: u64,
}

impl TaskTotals {
    pub fn total_hours(&self) -> f64 {
        self.total_duration as f64 / 3600.0
    }

    pub fn hours_per_hectare(&self) -> Option<f64> {
        (self.managed_area != 0.0).then(|| self.total_hours() / self.managed_area)
    }

    pub fn hectares_per_hour(&self) -> Option<f64> {
        (self.total_duration != 0).then(|| self.worked_area / self.total_hours())
    }
}

pub fn task_totals(tasks: &[Task]) -> TaskTotals {
    let mut seen_fields = HashSet::new();
    let mut totals = TaskTotals {
        task_count: tasks.len(),
        ..TaskTotals::default()
    };

    for task in tasks {
        let size = task.size().unwrap_or(0.0);
        if let Some(name) = task.field_name()
            && seen_fields.insert(name)
        {
            totals.managed_area += size;
        }
        totals.worked_area += size;
        totals.total_duration += task.duration;
    }

    totals
}
