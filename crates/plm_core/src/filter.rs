use crate::model::{References, Task};
use std::collections::BTreeSet;
use time::OffsetDateTime;

/// Selections made in the filter bar. Every empty selection leaves its
/// dimension unfiltered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilter {
    pub farms: BTreeSet<i64>,
    pub vehicles: BTreeSet<i64>,
    pub attachments: BTreeSet<i64>,
    pub fields: BTreeSet<i64>,
    pub harvest_years: BTreeSet<i32>,
    pub crops: BTreeSet<i64>,
    pub start: Option<OffsetDateTime>,
    pub end: Option<OffsetDateTime>,
    pub search: String,
}

/// The complete option set of every selectable dimension.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterOptions {
    pub farms: BTreeSet<i64>,
    pub vehicles: BTreeSet<i64>,
    pub attachments: BTreeSet<i64>,
    pub fields: BTreeSet<i64>,
    pub harvest_years: BTreeSet<i32>,
    pub crops: BTreeSet<i64>,
}

impl FilterOptions {
    pub fn from_references(references: &References) -> Self {
        Self {
            farms: references.farms.iter().map(|farm| farm.id).collect(),
            vehicles: references.vehicles.iter().map(|vehicle| vehicle.id).collect(),
            attachments: references
                .attachments
                .iter()
                .map(|attachment| attachment.id)
                .collect(),
            fields: references.fields.iter().map(|field| field.id).collect(),
            harvest_years: references.years.iter().map(|year| year.year).collect(),
            crops: references.crops.iter().map(|crop| crop.id).collect(),
        }
    }
}

/// A selection is inactive when nothing is picked or when it covers every
/// available option ("select all").
pub fn selection_is_noop<T: Ord>(selected: &BTreeSet<T>, options: &BTreeSet<T>) -> bool {
    selected.is_empty() || (!options.is_empty() && options.is_subset(selected))
}

pub fn filter_tasks(tasks: &[Task], filter: &TaskFilter, options: &FilterOptions) -> Vec<Task> {
    let predicate = TaskPredicate::new(filter, options);
    tasks
        .iter()
        .filter(|task| predicate.matches(task))
        .cloned()
        .collect()
}

struct TaskPredicate<'a> {
    farms: Option<&'a BTreeSet<i64>>,
    vehicles: Option<&'a BTreeSet<i64>>,
    attachments: Option<&'a BTreeSet<i64>>,
    fields: Option<&'a BTreeSet<i64>>,
    harvest_years: Option<&'a BTreeSet<i32>>,
    crops: Option<&'a BTreeSet<i64>>,
    start: Option<OffsetDateTime>,
    end: Option<OffsetDateTime>,
    search: Option<String>,
}

fn active<'a, T: Ord>(selected: &'a BTreeSet<T>, options: &BTreeSet<T>) -> Option<&'a BTreeSet<T>> {
    if selection_is_noop(selected, options) {
        None
    } else {
        Some(selected)
    }
}

impl<'a> TaskPredicate<'a> {
    fn new(filter: &'a TaskFilter, options: &FilterOptions) -> Self {
        let search = filter.search.as_str();
        Self {
            farms: active(&filter.farms, &options.farms),
            vehicles: active(&filter.vehicles, &options.vehicles),
            attachments: active(&filter.attachments, &options.attachments),
            fields: active(&filter.fields, &options.fields),
            harvest_years: active(&filter.harvest_years, &options.harvest_years),
            crops: active(&filter.crops, &options.crops),
            start: filter.start,
            end: filter.end,
            search: (!search.is_empty()).then(|| search.to_lowercase()),
        }
    }

    fn matches(&self, task: &Task) -> bool {
        if let Some(farms) = self.farms
            && !task.farm_id().is_some_and(|farm| farms.contains(&farm))
        {
            return false;
        }
        if let Some(vehicles) = self.vehicles
            && !vehicles.contains(&task.vehicle_id)
        {
            return false;
        }
        if let Some(attachments) = self.attachments
            && !attachments.contains(&task.attachment_id)
        {
            return false;
        }
        if let Some(fields) = self.fields
            && !fields.contains(&task.field_id)
        {
            return false;
        }
        if let Some(years) = self.harvest_years
            && !task.year.is_some_and(|year| years.contains(&year))
        {
            return false;
        }
        if let Some(crops) = self.crops {
            let selected = task.crop_name.is_some()
                && task.crop_id.is_some_and(|crop| crops.contains(&crop));
            if !selected {
                return false;
            }
        }
        if self.start.is_some_and(|start| task.begin_date < start) {
            return false;
        }
        if self.end.is_some_and(|end| task.begin_date > end) {
            return false;
        }
        if let Some(search) = self.search.as_deref()
            && !task.description.to_lowercase().contains(search)
        {
            return false;
        }
        true
    }
}
