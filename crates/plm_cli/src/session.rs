//! State kept between commands: the loaded dashboard, the field-info records
//! and a pending delete confirmation.

use crate::cli::OptionKind;
use crate::output::option_pairs;
use plm_core::config::{Config, Palette, palette_for_theme};
use plm_core::error::AppError;
use plm_core::field_info_api::{
    self, DeleteConfirmation, DeleteStep, FieldInfoDraft, FieldInfoEdit, find_field_info,
    list_field_infos,
};
use plm_core::model::{FieldInfo, FieldInfoPayload, Task};
use plm_core::service::{PlmService, service_from_config};
use plm_core::task_api::{self, Dashboard, TaskDraft, TaskEdit, TaskReceipt, load_dashboard};
use plm_core::view::{Query, ViewResult};
use time::macros::format_description;
use time::{OffsetDateTime, UtcOffset};

pub struct Session {
    service: Box<dyn PlmService>,
    config: Config,
    palette: Palette,
    local_offset: UtcOffset,
    dashboard: Option<Dashboard>,
    field_infos: Option<Vec<FieldInfo>>,
    delete: DeleteConfirmation,
}

impl Session {
    pub fn new(service: Box<dyn PlmService>, config: Config, local_offset: UtcOffset) -> Self {
        let palette = palette_for_theme(config.theme.as_deref());
        Self {
            service,
            config,
            palette,
            local_offset,
            dashboard: None,
            field_infos: None,
            delete: DeleteConfirmation::default(),
        }
    }

    pub fn from_config(config: Config, local_offset: UtcOffset) -> Result<Self, AppError> {
        let service = service_from_config(&config)?;
        Ok(Self::new(service, config, local_offset))
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    pub fn local_offset(&self) -> UtcOffset {
        self.local_offset
    }

    pub fn pending_delete(&self) -> Option<i64> {
        self.delete.pending()
    }

    /// Any command other than a delete disarms the confirmation.
    pub fn clear_pending_delete(&mut self) {
        self.delete.clear();
    }

    pub fn reload(&mut self) {
        self.dashboard = None;
        self.field_infos = None;
        tracing::debug!("cached data dropped");
    }

    /// Current local wall clock as `YYYY-MM-DD HH:MM`.
    pub fn now_local(&self) -> String {
        OffsetDateTime::now_utc()
            .to_offset(self.local_offset)
            .format(format_description!("[year]-[month]-[day] [hour]:[minute]"))
            .unwrap_or_default()
    }

    pub fn current_year(&self) -> i32 {
        OffsetDateTime::now_utc().to_offset(self.local_offset).year()
    }

    pub fn dashboard(&mut self) -> Result<&Dashboard, AppError> {
        cached_dashboard(&mut self.dashboard, self.service.as_ref(), self.local_offset)
    }

    pub fn view(&mut self, query: &Query) -> Result<ViewResult, AppError> {
        Ok(self.dashboard()?.view(query))
    }

    pub fn task(&mut self, id: i64) -> Result<Task, AppError> {
        self.dashboard()?.task(id).cloned()
    }

    pub fn options(
        &mut self,
        kind: OptionKind,
        farms: &[i64],
    ) -> Result<Vec<(String, String)>, AppError> {
        Ok(option_pairs(self.dashboard()?, kind, farms))
    }

    pub fn create_task(&mut self, draft: &TaskDraft) -> Result<TaskReceipt, AppError> {
        let dashboard =
            cached_dashboard(&mut self.dashboard, self.service.as_ref(), self.local_offset)?;
        let receipt = task_api::create_task(self.service.as_ref(), &dashboard.references, draft)?;
        self.dashboard = None;
        Ok(receipt)
    }

    pub fn update_task(&mut self, id: i64, edit: &TaskEdit) -> Result<TaskReceipt, AppError> {
        let dashboard =
            cached_dashboard(&mut self.dashboard, self.service.as_ref(), self.local_offset)?;
        let task = dashboard.task(id)?;
        let receipt = task_api::update_task(
            self.service.as_ref(),
            &dashboard.references,
            task,
            edit,
            self.local_offset,
        )?;
        self.dashboard = None;
        Ok(receipt)
    }

    pub fn field_infos(&mut self) -> Result<&[FieldInfo], AppError> {
        let records = match self.field_infos.take() {
            Some(records) => records,
            None => list_field_infos(self.service.as_ref())?,
        };
        Ok(self.field_infos.insert(records).as_slice())
    }

    pub fn create_field_info(
        &mut self,
        draft: &FieldInfoDraft,
    ) -> Result<FieldInfoPayload, AppError> {
        let years = self.config.year_range();
        let dashboard =
            cached_dashboard(&mut self.dashboard, self.service.as_ref(), self.local_offset)?;
        let payload = field_info_api::create_field_info(
            self.service.as_ref(),
            &dashboard.references,
            years,
            draft,
        )?;
        self.invalidate_field_infos();
        Ok(payload)
    }

    pub fn update_field_info(
        &mut self,
        id: i64,
        edit: &FieldInfoEdit,
    ) -> Result<FieldInfoPayload, AppError> {
        let record = find_field_info(self.field_infos()?, id)?.clone();
        let dashboard =
            cached_dashboard(&mut self.dashboard, self.service.as_ref(), self.local_offset)?;
        let payload = field_info_api::update_field_info(
            self.service.as_ref(),
            &dashboard.references,
            &record,
            edit,
            self.local_offset,
        )?;
        self.invalidate_field_infos();
        Ok(payload)
    }

    /// Deletes right away when `confirmed`, otherwise goes through the
    /// two-step confirmation.
    pub fn delete_field_info(&mut self, id: i64, confirmed: bool) -> Result<DeleteStep, AppError> {
        find_field_info(self.field_infos()?, id)?;

        let step = if confirmed {
            field_info_api::delete_field_info(self.service.as_ref(), id)?;
            self.delete.clear();
            DeleteStep::Deleted(id)
        } else {
            self.delete.request(self.service.as_ref(), id)?
        };

        if let DeleteStep::Deleted(_) = step {
            self.invalidate_field_infos();
        }
        Ok(step)
    }

    // Tasks carry the crop of their field-info record, so both caches go.
    fn invalidate_field_infos(&mut self) {
        self.field_infos = None;
        self.dashboard = None;
    }
}

fn cached_dashboard<'a>(
    slot: &'a mut Option<Dashboard>,
    service: &dyn PlmService,
    local_offset: UtcOffset,
) -> Result<&'a Dashboard, AppError> {
    let dashboard = match slot.take() {
        Some(dashboard) => dashboard,
        None => load_dashboard(service, local_offset)?,
    };
    Ok(&*slot.insert(dashboard))
}

#[cfg(test)]
mod tests {
    use super::Session;
    use plm_core::config::Config;
    use plm_core::error::AppError;
    use plm_core::field_info_api::{DeleteStep, FieldInfoEdit};
    use plm_core::model::{
        Attachment, Crop, Farm, Field, FieldInfo, FieldInfoPayload, HarvestYear, TaskPayload,
        TaskRecord, Vehicle,
    };
    use plm_core::service::PlmService;
    use plm_core::task_api::TaskEdit;
    use plm_core::view::Query;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;
    use time::macros::offset;

    #[derive(Default)]
    struct Counters {
        task_fetches: Cell<usize>,
        field_info_fetches: Cell<usize>,
        deleted: RefCell<Vec<i64>>,
        updated: RefCell<Vec<TaskPayload>>,
    }

    struct FakeService {
        counters: Rc<Counters>,
    }

    impl PlmService for FakeService {
        fn fetch_tasks(&self) -> Result<Vec<TaskRecord>, AppError> {
            self.counters
                .task_fetches
                .set(self.counters.task_fetches.get() + 1);
            Ok(vec![TaskRecord {
                id: 1,
                fields_id: 10,
                vehicles_id: 20,
                attachments_id: 30,
                description: Some("Pflügen".into()),
                duration: 3600,
                begin: "2024-05-01T06:00:00Z".into(),
                end: None,
                year: Some(2024),
                crop_id: Some(5),
                crop_name: Some("Mais".into()),
                field_info_id: Some(40),
                field_id: Some(10),
                field_info_begin: None,
            }])
        }

        fn fetch_fields(&self) -> Result<Vec<Field>, AppError> {
            Ok(vec![Field {
                id: 10,
                name: "Acker".into(),
                farm_id: Some(1),
                farm_name: Some("Hof".into()),
                size: Some(2.0),
            }])
        }

        fn fetch_vehicles(&self) -> Result<Vec<Vehicle>, AppError> {
            Ok(vec![Vehicle {
                id: 20,
                name: "Fendt".into(),
            }])
        }

        fn fetch_attachments(&self) -> Result<Vec<Attachment>, AppError> {
            Ok(vec![Attachment {
                id: 30,
                name: "Pflug".into(),
            }])
        }

        fn fetch_farms(&self) -> Result<Vec<Farm>, AppError> {
            Ok(vec![Farm {
                id: 1,
                name: "Hof".into(),
            }])
        }

        fn fetch_crops(&self) -> Result<Vec<Crop>, AppError> {
            Ok(vec![Crop {
                id: 5,
                name: "Mais".into(),
            }])
        }

        fn fetch_years(&self) -> Result<Vec<HarvestYear>, AppError> {
            Ok(vec![HarvestYear { year: 2024 }])
        }

        fn fetch_field_infos(&self) -> Result<Vec<FieldInfo>, AppError> {
            self.counters
                .field_info_fetches
                .set(self.counters.field_info_fetches.get() + 1);
            Ok(vec![FieldInfo {
                id: 40,
                farm_name: Some("Hof".into()),
                crop_name: Some("Mais".into()),
                crop_id: Some(5),
                field_name: Some("Acker".into()),
                field_id: Some(10),
                field_size: Some(2.0),
                year: 2024,
                begin_date: Some("2024-04-01T08:00:00Z".into()),
            }])
        }

        fn create_field_info(&self, _payload: &FieldInfoPayload) -> Result<(), AppError> {
            Ok(())
        }

        fn update_field_info(&self, _id: i64, _payload: &FieldInfoPayload) -> Result<(), AppError> {
            Ok(())
        }

        fn delete_field_info(&self, id: i64) -> Result<(), AppError> {
            self.counters.deleted.borrow_mut().push(id);
            Ok(())
        }

        fn create_task(&self, _payload: &TaskPayload) -> Result<(), AppError> {
            Ok(())
        }

        fn update_task(&self, payload: &TaskPayload) -> Result<(), AppError> {
            self.counters.updated.borrow_mut().push(payload.clone());
            Ok(())
        }
    }

    fn session() -> (Session, Rc<Counters>) {
        let counters = Rc::new(Counters::default());
        let service = FakeService {
            counters: Rc::clone(&counters),
        };
        (
            Session::new(Box::new(service), Config::default(), offset!(UTC)),
            counters,
        )
    }

    #[test]
    fn base_list_is_fetched_once_across_views() {
        let (mut session, counters) = session();

        let first = session.view(&Query::default()).unwrap();
        let second = session.view(&Query::default()).unwrap();

        assert_eq!(first.tasks.len(), 1);
        assert_eq!(first, second);
        assert_eq!(counters.task_fetches.get(), 1);
    }

    #[test]
    fn updating_a_task_reloads_the_base_list() {
        let (mut session, counters) = session();

        let edit = TaskEdit {
            description: Some("Grubbern".into()),
            ..TaskEdit::default()
        };
        let receipt = session.update_task(1, &edit).unwrap();
        session.view(&Query::default()).unwrap();

        assert_eq!(receipt.payload.description, "Grubbern");
        assert_eq!(counters.updated.borrow().len(), 1);
        assert_eq!(counters.task_fetches.get(), 2);
    }

    #[test]
    fn reload_drops_both_caches() {
        let (mut session, counters) = session();

        session.dashboard().unwrap();
        session.field_infos().unwrap();
        session.reload();
        session.dashboard().unwrap();
        session.field_infos().unwrap();

        assert_eq!(counters.task_fetches.get(), 2);
        assert_eq!(counters.field_info_fetches.get(), 2);
    }

    #[test]
    fn delete_needs_a_second_request_unless_confirmed() {
        let (mut session, counters) = session();

        assert_eq!(
            session.delete_field_info(40, false).unwrap(),
            DeleteStep::ConfirmationRequired(40)
        );
        assert_eq!(session.pending_delete(), Some(40));
        assert!(counters.deleted.borrow().is_empty());

        assert_eq!(
            session.delete_field_info(40, false).unwrap(),
            DeleteStep::Deleted(40)
        );
        assert_eq!(session.pending_delete(), None);

        assert_eq!(
            session.delete_field_info(40, true).unwrap(),
            DeleteStep::Deleted(40)
        );
        assert_eq!(*counters.deleted.borrow(), vec![40, 40]);
    }

    #[test]
    fn clearing_disarms_a_pending_delete() {
        let (mut session, counters) = session();

        session.delete_field_info(40, false).unwrap();
        session.clear_pending_delete();
        let step = session.delete_field_info(40, false).unwrap();

        assert_eq!(step, DeleteStep::ConfirmationRequired(40));
        assert!(counters.deleted.borrow().is_empty());
    }

    #[test]
    fn unknown_field_info_is_rejected_before_arming() {
        let (mut session, _) = session();

        let err = session.delete_field_info(99, false).unwrap_err();

        assert_eq!(err.code(), "invalid_input");
        assert_eq!(session.pending_delete(), None);
    }

    #[test]
    fn field_info_edit_keeps_field_and_year() {
        let (mut session, counters) = session();

        let payload = session
            .update_field_info(40, &FieldInfoEdit::default())
            .unwrap();

        assert_eq!(payload.fields, vec![10]);
        assert_eq!(payload.year, 2024);
        assert_eq!(payload.begin, "2024-04-01T08:00");
        assert_eq!(payload.task_info_id, Some(40));
        assert_eq!(counters.field_info_fetches.get(), 1);
    }
}
