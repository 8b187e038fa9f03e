use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use reqwest::Method;
use serde_json::{json, Value};
use tracing::debug;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::SupabaseClient;
use shared_models::error::AppError;

use crate::models::{
    AvailabilityOverride, AvailabilityWindow, BookedAppointment, CreateOverrideRequest,
    CreateWindowRequest, UpdateWindowRequest,
};

const TIME_FORMAT: &str = "%H:%M:%S";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Read/write access to a doctor's schedule.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AvailabilityRepository: Send + Sync {
    async fn list_windows(&self, doctor_id: Uuid) -> Result<Vec<AvailabilityWindow>, AppError>;

    async fn windows_for_day(
        &self,
        doctor_id: Uuid,
        day_of_week: i32,
    ) -> Result<Vec<AvailabilityWindow>, AppError>;

    async fn get_window(&self, window_id: Uuid) -> Result<Option<AvailabilityWindow>, AppError>;

    async fn insert_window(
        &self,
        doctor_id: Uuid,
        request: &CreateWindowRequest,
    ) -> Result<AvailabilityWindow, AppError>;

    async fn update_window(
        &self,
        window_id: Uuid,
        request: &UpdateWindowRequest,
    ) -> Result<AvailabilityWindow, AppError>;

    async fn delete_window(&self, window_id: Uuid) -> Result<(), AppError>;

    async fn override_for_date(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
    ) -> Result<Option<AvailabilityOverride>, AppError>;

    async fn insert_override(
        &self,
        doctor_id: Uuid,
        request: &CreateOverrideRequest,
    ) -> Result<AvailabilityOverride, AppError>;

    /// Appointments of `doctor_id` starting in `[from, to)`.
    async fn appointments_between(
        &self,
        doctor_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<BookedAppointment>, AppError>;
}

pub struct SupabaseAvailabilityRepository {
    supabase: SupabaseClient,
}

impl SupabaseAvailabilityRepository {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    async fn fetch_windows(&self, path: &str) -> Result<Vec<AvailabilityWindow>, AppError> {
        let result: Vec<Value> = self.supabase.request(Method::GET, path, None, None).await?;

        let windows = result
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<AvailabilityWindow>, _>>()?;

        Ok(windows)
    }
}

fn first_row<T: serde::de::DeserializeOwned>(rows: Vec<Value>, what: &str) -> Result<T, AppError> {
    let row = rows
        .into_iter()
        .next()
        .ok_or_else(|| AppError::Database(format!("No {} row returned", what)))?;
    Ok(serde_json::from_value(row)?)
}

#[async_trait]
impl AvailabilityRepository for SupabaseAvailabilityRepository {
    async fn list_windows(&self, doctor_id: Uuid) -> Result<Vec<AvailabilityWindow>, AppError> {
        let path = format!(
            "/rest/v1/availability_windows?doctor_id=eq.{}&order=day_of_week.asc,start_time.asc",
            doctor_id
        );
        self.fetch_windows(&path).await
    }

    async fn windows_for_day(
        &self,
        doctor_id: Uuid,
        day_of_week: i32,
    ) -> Result<Vec<AvailabilityWindow>, AppError> {
        let path = format!(
            "/rest/v1/availability_windows?doctor_id=eq.{}&day_of_week=eq.{}&order=start_time.asc",
            doctor_id, day_of_week
        );
        self.fetch_windows(&path).await
    }

    async fn get_window(&self, window_id: Uuid) -> Result<Option<AvailabilityWindow>, AppError> {
        let path = format!("/rest/v1/availability_windows?id=eq.{}", window_id);
        Ok(self.fetch_windows(&path).await?.into_iter().next())
    }

    async fn insert_window(
        &self,
        doctor_id: Uuid,
        request: &CreateWindowRequest,
    ) -> Result<AvailabilityWindow, AppError> {
        let now = Utc::now().to_rfc3339();
        let body = json!({
            "doctor_id": doctor_id,
            "day_of_week": request.day_of_week,
            "start_time": request.start_time.format(TIME_FORMAT).to_string(),
            "end_time": request.end_time.format(TIME_FORMAT).to_string(),
            "is_available": true,
            "created_at": now,
            "updated_at": now
        });

        let rows: Vec<Value> = self
            .supabase
            .request_returning(Method::POST, "/rest/v1/availability_windows", None, Some(body))
            .await?;

        first_row(rows, "availability window")
    }

    async fn update_window(
        &self,
        window_id: Uuid,
        request: &UpdateWindowRequest,
    ) -> Result<AvailabilityWindow, AppError> {
        let mut update_data = serde_json::Map::new();

        if let Some(start_time) = request.start_time {
            update_data.insert("start_time".to_string(), json!(start_time.format(TIME_FORMAT).to_string()));
        }
        if let Some(end_time) = request.end_time {
            update_data.insert("end_time".to_string(), json!(end_time.format(TIME_FORMAT).to_string()));
        }
        if let Some(is_available) = request.is_available {
            update_data.insert("is_available".to_string(), json!(is_available));
        }
        update_data.insert("updated_at".to_string(), json!(Utc::now().to_rfc3339()));

        let path = format!("/rest/v1/availability_windows?id=eq.{}", window_id);
        let rows: Vec<Value> = self
            .supabase
            .request_returning(Method::PATCH, &path, None, Some(Value::Object(update_data)))
            .await?;

        first_row(rows, "availability window")
    }

    async fn delete_window(&self, window_id: Uuid) -> Result<(), AppError> {
        let path = format!("/rest/v1/availability_windows?id=eq.{}", window_id);
        self.supabase.execute(Method::DELETE, &path, None, None).await
    }

    async fn override_for_date(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
    ) -> Result<Option<AvailabilityOverride>, AppError> {
        let path = format!(
            "/rest/v1/availability_overrides?doctor_id=eq.{}&override_date=eq.{}",
            doctor_id, date
        );
        let rows: Vec<Value> = self.supabase.request(Method::GET, &path, None, None).await?;

        match rows.into_iter().next() {
            Some(row) => Ok(Some(serde_json::from_value(row)?)),
            None => Ok(None),
        }
    }

    async fn insert_override(
        &self,
        doctor_id: Uuid,
        request: &CreateOverrideRequest,
    ) -> Result<AvailabilityOverride, AppError> {
        let body = json!({
            "doctor_id": doctor_id,
            "override_date": request.override_date,
            "is_available": request.is_available,
            "reason": request.reason,
            "created_at": Utc::now().to_rfc3339()
        });

        let rows: Vec<Value> = self
            .supabase
            .request_returning(Method::POST, "/rest/v1/availability_overrides", None, Some(body))
            .await?;

        first_row(rows, "availability override")
    }

    async fn appointments_between(
        &self,
        doctor_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<BookedAppointment>, AppError> {
        debug!("Loading appointments for doctor {} between {} and {}", doctor_id, from, to);

        let path = format!(
            "/rest/v1/appointments?select=doctor_id,start_time,status&doctor_id=eq.{}&start_time=gte.{}&start_time=lt.{}&order=start_time.asc",
            doctor_id,
            from.format(TIMESTAMP_FORMAT),
            to.format(TIMESTAMP_FORMAT)
        );
        let rows: Vec<Value> = self.supabase.request(Method::GET, &path, None, None).await?;

        let appointments = rows
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<BookedAppointment>, _>>()?;

        Ok(appointments)
    }
}
