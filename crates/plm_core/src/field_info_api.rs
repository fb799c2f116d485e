use crate::collate::locale_compare;
use crate::config::YearRange;
use crate::datetime::{format_form_timestamp, parse_local_datetime, utc_form_value};
use crate::error::AppError;
use crate::format::format_hectares;
use crate::model::{FieldInfo, FieldInfoPayload, References};
use crate::service::PlmService;
use crate::summary::{AreaSummary, summarize};
use std::cmp::Ordering;
use std::collections::HashSet;
use time::UtcOffset;

/// All field-info records, newest year first.
pub fn list_field_infos(service: &dyn PlmService) -> Result<Vec<FieldInfo>, AppError> {
    let mut records = service.fetch_field_infos()?;
    records.sort_by(|a, b| b.year.cmp(&a.year));
    Ok(records)
}

/// Distinct years present in `records`, newest first.
pub fn available_years(records: &[FieldInfo]) -> Vec<i32> {
    let mut years: Vec<i32> = records.iter().map(|record| record.year).collect();
    years.sort_unstable_by(|a, b| b.cmp(a));
    years.dedup();
    years
}

/// The newest year with records, or `fallback` when there are none.
pub fn default_year(records: &[FieldInfo], fallback: i32) -> i32 {
    records
        .iter()
        .map(|record| record.year)
        .max()
        .unwrap_or(fallback)
}

fn compare_names(a: Option<&str>, b: Option<&str>) -> Ordering {
    locale_compare(a.unwrap_or_default(), b.unwrap_or_default())
}

/// Records of one year ordered by farm (records without a farm last), then
/// crop, then field.
pub fn records_for_year(records: &[FieldInfo], year: i32) -> Vec<FieldInfo> {
    let mut selected: Vec<FieldInfo> = records
        .iter()
        .filter(|record| record.year == year)
        .cloned()
        .collect();

    selected.sort_by(|a, b| {
        let farm = match (a.farm_name.as_deref(), b.farm_name.as_deref()) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Greater,
            (Some(_), None) => Ordering::Less,
            (Some(a), Some(b)) => locale_compare(a, b),
        };
        farm.then_with(|| compare_names(a.crop_name.as_deref(), b.crop_name.as_deref()))
            .then_with(|| compare_names(a.field_name.as_deref(), b.field_name.as_deref()))
    });
    selected
}

/// Per farm: `<crop> (<n>x) - <area> ha` lines.
pub fn summary_lines(summary: &AreaSummary) -> Vec<(String, Vec<String>)> {
    summary
        .farms
        .iter()
        .map(|farm| {
            let lines = farm
                .crops
                .iter()
                .map(|crop| {
                    format!(
                        "{} ({}x) - {} ha",
                        crop.crop,
                        crop.field_count,
                        format_hectares(crop.total_area)
                    )
                })
                .collect();
            (farm.farm.clone(), lines)
        })
        .collect()
}

pub fn year_summary(records: &[FieldInfo], year: i32) -> AreaSummary {
    summarize(&records_for_year(records, year))
}

pub fn find_field_info(records: &[FieldInfo], id: i64) -> Result<&FieldInfo, AppError> {
    records
        .iter()
        .find(|record| record.id == id)
        .ok_or_else(|| AppError::invalid_input(format!("field info {id} not found")))
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldInfoDraft {
    pub fields: Vec<i64>,
    pub begin: String,
    pub year: i32,
    pub crop_id: i64,
}

/// Editable parts of an existing record. Fields and year are fixed once the
/// record exists.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldInfoEdit {
    pub begin: Option<String>,
    pub crop_id: Option<i64>,
}

fn check_crop(references: &References, crop_id: i64) -> Result<(), AppError> {
    if references.crop(crop_id).is_none() {
        return Err(AppError::invalid_input(format!("unknown crop id {crop_id}")));
    }
    Ok(())
}

pub fn create_field_info(
    service: &dyn PlmService,
    references: &References,
    years: YearRange,
    draft: &FieldInfoDraft,
) -> Result<FieldInfoPayload, AppError> {
    if draft.fields.is_empty() {
        return Err(AppError::invalid_input("at least one field is required"));
    }
    if let Some(unknown) = draft
        .fields
        .iter()
        .find(|id| references.field(**id).is_none())
    {
        return Err(AppError::invalid_input(format!("unknown field id {unknown}")));
    }
    if !years.contains(draft.year) {
        return Err(AppError::invalid_input(format!(
            "year {} is outside {}..={}",
            draft.year, years.min, years.max
        )));
    }
    check_crop(references, draft.crop_id)?;
    let begin = format_form_timestamp(parse_local_datetime(&draft.begin)?)?;

    let mut seen = HashSet::new();
    let mut fields = draft.fields.clone();
    fields.retain(|id| seen.insert(*id));
    let payload = FieldInfoPayload {
        fields,
        begin,
        year: draft.year,
        crop_id: draft.crop_id,
        task_info_id: None,
    };

    service.create_field_info(&payload)?;
    tracing::debug!(year = payload.year, fields = payload.fields.len(), "field info created");
    Ok(payload)
}

pub fn update_field_info(
    service: &dyn PlmService,
    references: &References,
    record: &FieldInfo,
    edit: &FieldInfoEdit,
    local_offset: UtcOffset,
) -> Result<FieldInfoPayload, AppError> {
    let field_id = record.field_id.ok_or_else(|| {
        AppError::invalid_data(format!("field info {} has no field", record.id))
    })?;
    let crop_id = edit
        .crop_id
        .or(record.crop_id)
        .ok_or_else(|| AppError::invalid_input("crop is required"))?;
    check_crop(references, crop_id)?;

    let begin = match (edit.begin.as_deref(), record.begin_date.as_deref()) {
        (Some(raw), _) => format_form_timestamp(parse_local_datetime(raw)?)?,
        (None, Some(stored)) => utc_form_value(stored, local_offset)?,
        (None, None) => return Err(AppError::invalid_input("begin is required")),
    };

    let payload = FieldInfoPayload {
        fields: vec![field_id],
        begin,
        year: record.year,
        crop_id,
        task_info_id: Some(record.id),
    };

    service.update_field_info(record.id, &payload)?;
    tracing::debug!(id = record.id, "field info updated");
    Ok(payload)
}

pub fn delete_field_info(service: &dyn PlmService, id: i64) -> Result<(), AppError> {
    service.delete_field_info(id)?;
    tracing::debug!(id, "field info deleted");
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteStep {
    /// The first request for this id; it must be repeated to delete.
    ConfirmationRequired(i64),
    Deleted(i64),
}

/// Two-step delete: the first request arms the id, a second request for the
/// same id deletes it. Asking for a different id re-arms.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeleteConfirmation {
    pending: Option<i64>,
}

impl DeleteConfirmation {
    pub fn pending(&self) -> Option<i64> {
        self.pending
    }

    pub fn clear(&mut self) {
        self.pending = None;
    }

    pub fn request(&mut self, service: &dyn PlmService, id: i64) -> Result<DeleteStep, AppError> {
        if self.pending != Some(id) {
            self.pending = Some(id);
            return Ok(DeleteStep::ConfirmationRequired(id));
        }

        delete_field_info(service, id)?;
        self.pending = None;
        Ok(DeleteStep::Deleted(id))
    }
}

#[cfg(test)]
mod tests {
    use super::{
        DeleteConfirmation, DeleteStep, FieldInfoDraft, FieldInfoEdit, available_years,
        create_field_info, default_year, records_for_year, summary_lines, update_field_info,
        year_summary,
    };
    use crate::config::YearRange;
    use crate::error::AppError;
    use crate::model::{Crop, Field, FieldInfo, References};
    use crate::service::testing::{Call, RecordingService};
    use time::macros::offset;

    fn info(
        id: i64,
        year: i32,
        farm: Option<&str>,
        crop: &str,
        field: &str,
        size: f64,
    ) -> FieldInfo {
        FieldInfo {
            id,
            farm_name: farm.map(str::to_string),
            crop_name: Some(crop.to_string()),
            crop_id: Some(1),
            field_name: Some(field.to_string()),
            field_id: Some(id * 10),
            field_size: Some(size),
            year,
            begin_date: Some("2024-03-01T07:30:00.000Z".to_string()),
        }
    }

    fn references() -> References {
        References {
            fields: vec![
                Field {
                    id: 10,
                    name: "Acker".to_string(),
                    farm_id: None,
                    farm_name: None,
                    size: None,
                },
                Field {
                    id: 20,
                    name: "Wiese".to_string(),
                    farm_id: None,
                    farm_name: None,
                    size: None,
                },
            ],
            crops: vec![
                Crop {
                    id: 1,
                    name: "Weizen".to_string(),
                },
                Crop {
                    id: 2,
                    name: "Mais".to_string(),
                },
            ],
            ..References::default()
        }
    }

    fn records() -> Vec<FieldInfo> {
        vec![
            info(1, 2023, Some("Nord"), "Weizen", "Acker", 5.0),
            info(2, 2024, None, "Mais", "Senke", 1.0),
            info(3, 2024, Some("Süd"), "Mais", "Hang", 2.0),
            info(4, 2024, Some("Nord"), "Weizen", "Koppel", 5.0),
            info(5, 2024, Some("Nord"), "Weizen", "Anger", 3.0),
        ]
    }

    #[test]
    fn years_and_default_year() {
        assert_eq!(available_years(&records()), vec![2024, 2023]);
        assert_eq!(default_year(&records(), 2030), 2024);
        assert_eq!(default_year(&[], 2030), 2030);
    }

    #[test]
    fn year_rows_sort_by_farm_crop_field_with_missing_farm_last() {
        let rows = records_for_year(&records(), 2024);
        let ids: Vec<i64> = rows.iter().map(|row| row.id).collect();
        assert_eq!(ids, vec![5, 4, 3, 2]);
    }

    #[test]
    fn summary_lines_per_farm() {
        let summary = year_summary(&records(), 2024);
        let lines = summary_lines(&summary);

        assert_eq!(lines[0].0, "Nord");
        assert_eq!(lines[0].1, vec!["Weizen (2x) - 8.00 ha"]);
        assert_eq!(lines[1].0, "Süd");
        assert_eq!(lines[1].1, vec!["Mais (1x) - 2.00 ha"]);
        assert_eq!(lines[2].0, "Unbekannt");
        assert_eq!(summary.total_area, 11.0);
    }

    #[test]
    fn create_validates_and_sends_form_payload() {
        let service = RecordingService::default();
        let draft = FieldInfoDraft {
            fields: vec![10, 20],
            begin: "2024-03-15 08:00".to_string(),
            year: 2024,
            crop_id: 2,
        };

        let payload =
            create_field_info(&service, &references(), YearRange::default(), &draft).unwrap();

        assert_eq!(payload.begin, "2024-03-15T08:00");
        assert_eq!(payload.task_info_id, None);
        assert_eq!(service.calls(), vec![Call::CreateFieldInfo(payload)]);
    }

    #[test]
    fn create_drops_repeated_fields_in_first_seen_order() {
        let service = RecordingService::default();
        let draft = FieldInfoDraft {
            fields: vec![20, 10, 20, 10],
            begin: "2024-03-15 08:00".to_string(),
            year: 2024,
            crop_id: 1,
        };

        let payload =
            create_field_info(&service, &references(), YearRange::default(), &draft).unwrap();

        assert_eq!(payload.fields, vec![20, 10]);
    }

    #[test]
    fn create_rejects_bad_input_without_calling_the_service() {
        let service = RecordingService::default();
        let valid = FieldInfoDraft {
            fields: vec![10],
            begin: "2024-03-15".to_string(),
            year: 2024,
            crop_id: 1,
        };

        let cases = [
            FieldInfoDraft {
                fields: Vec::new(),
                ..valid.clone()
            },
            FieldInfoDraft {
                fields: vec![99],
                ..valid.clone()
            },
            FieldInfoDraft {
                year: 1949,
                ..valid.clone()
            },
            FieldInfoDraft {
                crop_id: 77,
                ..valid.clone()
            },
            FieldInfoDraft {
                begin: "morgen".to_string(),
                ..valid.clone()
            },
        ];
        for draft in &cases {
            let err = create_field_info(&service, &references(), YearRange::default(), draft)
                .unwrap_err();
            assert_eq!(err.code(), "invalid_input", "{draft:?}");
        }
        assert!(service.calls().is_empty());
    }

    #[test]
    fn update_only_changes_begin_and_crop() {
        let service = RecordingService::default();
        let record = info(4, 2024, Some("Nord"), "Weizen", "Koppel", 5.0);

        let payload = update_field_info(
            &service,
            &references(),
            &record,
            &FieldInfoEdit {
                crop_id: Some(2),
                begin: None,
            },
            offset!(+1),
        )
        .unwrap();

        assert_eq!(payload.fields, vec![40]);
        assert_eq!(payload.year, 2024);
        assert_eq!(payload.crop_id, 2);
        assert_eq!(payload.begin, "2024-03-01T07:30");
        assert_eq!(payload.task_info_id, Some(4));
        assert_eq!(service.calls(), vec![Call::UpdateFieldInfo(4, payload)]);
    }

    #[test]
    fn delete_needs_two_requests_for_the_same_id() {
        let service = RecordingService::default();
        let mut confirmation = DeleteConfirmation::default();

        assert_eq!(
            confirmation.request(&service, 3).unwrap(),
            DeleteStep::ConfirmationRequired(3)
        );
        assert_eq!(
            confirmation.request(&service, 4).unwrap(),
            DeleteStep::ConfirmationRequired(4)
        );
        assert!(service.calls().is_empty());

        assert_eq!(confirmation.request(&service, 4).unwrap(), DeleteStep::Deleted(4));
        assert_eq!(confirmation.pending(), None);
        assert_eq!(service.calls(), vec![Call::DeleteFieldInfo(4)]);

        confirmation.request(&service, 5).unwrap();
        confirmation.clear();
        assert_eq!(
            confirmation.request(&service, 5).unwrap(),
            DeleteStep::ConfirmationRequired(5)
        );
    }

    #[test]
    fn failed_delete_keeps_the_confirmation_armed() {
        let service = RecordingService {
            fail_with: Some(AppError::http("plm_fieldinfo/3 returned status 500")),
            ..RecordingService::default()
        };
        let mut confirmation = DeleteConfirmation::default();

        confirmation.request(&service, 3).unwrap();
        assert!(confirmation.request(&service, 3).is_err());
        assert_eq!(confirmation.pending(), Some(3));
    }
}
