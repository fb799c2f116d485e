use super::{
    ATTACHMENTS_ENDPOINT, CROPS_ENDPOINT, FARMS_ENDPOINT, FIELD_INFO_ENDPOINT, FIELDS_ENDPOINT,
    PlmService, TASK_INSERT_ENDPOINT, TASK_UPDATE_ENDPOINT, TASKS_ENDPOINT, VEHICLES_ENDPOINT,
    YEARS_ENDPOINT,
};
use crate::error::AppError;
use crate::model::{
    Attachment, Crop, Farm, Field, FieldInfo, FieldInfoPayload, HarvestYear, TaskPayload,
    TaskRecord, Vehicle,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use url::Url;

const ERROR_BODY_LIMIT: usize = 200;

/// Blocking JSON client for the field-operations service.
#[derive(Debug, Clone)]
pub struct HttpService {
    agent: ureq::Agent,
    base_url: Url,
}

impl HttpService {
    pub fn new(base_url: &str, timeout_secs: u64) -> Result<Self, AppError> {
        if timeout_secs == 0 {
            return Err(AppError::invalid_input("timeout_secs must be at least 1"));
        }
        let base_url = Url::parse(base_url).map_err(|err| {
            AppError::invalid_input(format!("invalid base url '{base_url}': {err}"))
        })?;
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(timeout_secs))
            .build();

        Ok(Self { agent, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, AppError> {
        self.base_url
            .join(path)
            .map_err(|err| AppError::invalid_input(format!("invalid endpoint '{path}': {err}")))
    }

    fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, AppError> {
        let response = self.request("GET", path, None::<&()>)?;
        response
            .into_json()
            .map_err(|err| AppError::invalid_data(format!("{path}: {err}")))
    }

    fn post<B: Serialize>(&self, path: &str, body: &B) -> Result<(), AppError> {
        self.request("POST", path, Some(body)).map(drop)
    }

    fn put<B: Serialize>(&self, path: &str, body: &B) -> Result<(), AppError> {
        self.request("PUT", path, Some(body)).map(drop)
    }

    fn delete(&self, path: &str) -> Result<(), AppError> {
        self.request("DELETE", path, None::<&()>).map(drop)
    }

    fn request<B: Serialize>(
        &self,
        method: &str,
        path: &str,
        body: Option<&B>,
    ) -> Result<ureq::Response, AppError> {
        let url = self.endpoint(path)?;
        tracing::debug!(%method, %url, "service request");

        let request = self.agent.request_url(method, &url);
        let result = match body {
            Some(body) => {
                let value = serde_json::to_value(body)
                    .map_err(|err| AppError::invalid_data(err.to_string()))?;
                request.send_json(value)
            }
            None => request.call(),
        };

        result.map_err(|err| {
            let err = map_transport_error(path, err);
            tracing::warn!(%method, %url, %err, "service request failed");
            err
        })
    }
}

fn map_transport_error(path: &str, err: ureq::Error) -> AppError {
    match err {
        ureq::Error::Status(code, response) => {
            let body = response.into_string().unwrap_or_default();
            let body: String = body.trim().chars().take(ERROR_BODY_LIMIT).collect();
            if body.is_empty() {
                AppError::http(format!("{path} returned status {code}"))
            } else {
                AppError::http(format!("{path} returned status {code}: {body}"))
            }
        }
        ureq::Error::Transport(transport) => AppError::http(format!("{path}: {transport}")),
    }
}

impl PlmService for HttpService {
    fn fetch_tasks(&self) -> Result<Vec<TaskRecord>, AppError> {
        self.get(TASKS_ENDPOINT)
    }

    fn fetch_fields(&self) -> Result<Vec<Field>, AppError> {
        self.get(FIELDS_ENDPOINT)
    }

    fn fetch_vehicles(&self) -> Result<Vec<Vehicle>, AppError> {
        self.get(VEHICLES_ENDPOINT)
    }

    fn fetch_attachments(&self) -> Result<Vec<Attachment>, AppError> {
        self.get(ATTACHMENTS_ENDPOINT)
    }

    fn fetch_farms(&self) -> Result<Vec<Farm>, AppError> {
        self.get(FARMS_ENDPOINT)
    }

    fn fetch_crops(&self) -> Result<Vec<Crop>, AppError> {
        self.get(CROPS_ENDPOINT)
    }

    fn fetch_years(&self) -> Result<Vec<HarvestYear>, AppError> {
        self.get(YEARS_ENDPOINT)
    }

    fn fetch_field_infos(&self) -> Result<Vec<FieldInfo>, AppError> {
        self.get(FIELD_INFO_ENDPOINT)
    }

    fn create_field_info(&self, payload: &FieldInfoPayload) -> Result<(), AppError> {
        self.post(FIELD_INFO_ENDPOINT, payload)
    }

    fn update_field_info(&self, id: i64, payload: &FieldInfoPayload) -> Result<(), AppError> {
        self.put(&format!("{FIELD_INFO_ENDPOINT}/{id}"), payload)
    }

    fn delete_field_info(&self, id: i64) -> Result<(), AppError> {
        self.delete(&format!("{FIELD_INFO_ENDPOINT}/{id}"))
    }

    fn create_task(&self, payload: &TaskPayload) -> Result<(), AppError> {
        self.post(TASK_INSERT_ENDPOINT, payload)
    }

    fn update_task(&self, payload: &TaskPayload) -> Result<(), AppError> {
        self.post(TASK_UPDATE_ENDPOINT, payload)
    }
}
