use async_trait::async_trait;
use chrono::Utc;
use reqwest::Method;
use serde_json::{json, Value};
use tracing::warn;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::SupabaseClient;
use shared_models::{AppError, AppointmentStatus};

use crate::models::{Appointment, NewAppointment};

/// Postgres function inserting an appointment unless another blocking
/// appointment of the same doctor overlaps it; the overlap is reported as 409.
pub const BOOK_APPOINTMENT_FN: &str = "book_appointment";

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AppointmentRepository: Send + Sync {
    async fn insert_appointment(&self, appointment: &NewAppointment) -> Result<Appointment, AppError>;

    async fn get_appointment(&self, appointment_id: Uuid) -> Result<Option<Appointment>, AppError>;

    /// Move an appointment to `next`, provided it is still in `expected`.
    async fn update_status(
        &self,
        appointment_id: Uuid,
        expected: AppointmentStatus,
        next: AppointmentStatus,
    ) -> Result<Appointment, AppError>;
}

pub struct SupabaseAppointmentRepository {
    supabase: SupabaseClient,
}

impl SupabaseAppointmentRepository {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }
}

#[async_trait]
impl AppointmentRepository for SupabaseAppointmentRepository {
    async fn insert_appointment(&self, appointment: &NewAppointment) -> Result<Appointment, AppError> {
        let args = json!({ "p_appointment": appointment });
        let rows: Vec<Value> = self.supabase.rpc(BOOK_APPOINTMENT_FN, None, args).await?;

        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| AppError::Conflict("Appointment slot was taken concurrently".to_string()))?;
        Ok(serde_json::from_value(row)?)
    }

    async fn get_appointment(&self, appointment_id: Uuid) -> Result<Option<Appointment>, AppError> {
        let path = format!("/rest/v1/appointments?id=eq.{}", appointment_id);
        let rows: Vec<Value> = self.supabase.request(Method::GET, &path, None, None).await?;

        match rows.into_iter().next() {
            Some(row) => Ok(Some(serde_json::from_value(row)?)),
            None => Ok(None),
        }
    }

    async fn update_status(
        &self,
        appointment_id: Uuid,
        expected: AppointmentStatus,
        next: AppointmentStatus,
    ) -> Result<Appointment, AppError> {
        let path = format!("/rest/v1/appointments?id=eq.{}&status=eq.{}", appointment_id, expected);
        let body = json!({
            "status": next,
            "updated_at": Utc::now().to_rfc3339()
        });

        let rows: Vec<Value> = self
            .supabase
            .request_returning(Method::PATCH, &path, None, Some(body))
            .await?;

        match rows.into_iter().next() {
            Some(row) => Ok(serde_json::from_value(row)?),
            None => {
                warn!("Appointment {} is no longer {}", appointment_id, expected);
                Err(AppError::Conflict(format!(
                    "Appointment {} changed status concurrently",
                    appointment_id
                )))
            }
        }
    }
}
