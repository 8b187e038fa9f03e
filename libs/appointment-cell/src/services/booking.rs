use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use doctor_cell::models::SlotQuery;
use doctor_cell::services::AvailabilityService;
use notification_cell::NotificationDispatcher;
use shared_config::AppConfig;
use shared_models::{AppError, AppointmentStatus, DomainEvent};

use crate::models::{Appointment, AppointmentError, BookAppointmentRequest, NewAppointment};
use crate::services::lifecycle::validate_status_transition;
use crate::services::repository::{AppointmentRepository, SupabaseAppointmentRepository};

pub struct AppointmentBookingService {
    availability: Arc<AvailabilityService>,
    repository: Arc<dyn AppointmentRepository>,
    notifier: Arc<dyn NotificationDispatcher>,
}

impl AppointmentBookingService {
    pub fn new(config: &AppConfig, notifier: Arc<dyn NotificationDispatcher>) -> Self {
        Self {
            availability: Arc::new(AvailabilityService::new(config)),
            repository: Arc::new(SupabaseAppointmentRepository::new(config)),
            notifier,
        }
    }

    pub fn with_parts(
        availability: Arc<AvailabilityService>,
        repository: Arc<dyn AppointmentRepository>,
        notifier: Arc<dyn NotificationDispatcher>,
    ) -> Self {
        Self {
            availability,
            repository,
            notifier,
        }
    }

    /// Book the slot starting at `request.start_time`.
    ///
    /// The start must be one of the slots currently offered for that day. The
    /// store re-checks overlaps on insert, so a slot taken between the read and
    /// the write comes back as `ConflictDetected`.
    pub async fn book_appointment(
        &self,
        request: BookAppointmentRequest,
        now: DateTime<Utc>,
    ) -> Result<Appointment, AppointmentError> {
        debug!("Booking appointment for patient {} with doctor {} at {}",
               request.patient_id, request.doctor_id, request.start_time);

        let query = SlotQuery::for_date(request.start_time.date_naive());
        let slots = self
            .availability
            .slots_for_date(request.doctor_id, &query, now)
            .await?;

        let slot = slots
            .iter()
            .take_while(|slot| slot.start_time <= request.start_time)
            .find(|slot| slot.start_time == request.start_time)
            .ok_or_else(|| {
                warn!("Requested start {} is not an available slot for doctor {}", request.start_time, request.doctor_id);
                AppointmentError::SlotNotAvailable
            })?;

        let new_appointment = NewAppointment {
            id: Uuid::new_v4(),
            doctor_id: request.doctor_id,
            patient_id: request.patient_id,
            start_time: slot.start_time,
            end_time: slot.end_time,
            status: AppointmentStatus::Pending,
            notes: request.notes,
        };

        let appointment = self.repository.insert_appointment(&new_appointment).await?;
        info!("Appointment {} booked for doctor {} at {}", appointment.id, appointment.doctor_id, appointment.start_time);

        self.notifier.dispatch(DomainEvent::AppointmentBooked {
            appointment_id: appointment.id,
            doctor_id: appointment.doctor_id,
            patient_id: appointment.patient_id,
            start_time: appointment.start_time,
            occurred_at: now,
        });

        Ok(appointment)
    }

    pub async fn get_appointment(&self, appointment_id: Uuid) -> Result<Appointment, AppointmentError> {
        self.repository
            .get_appointment(appointment_id)
            .await?
            .ok_or(AppointmentError::NotFound)
    }

    pub async fn confirm_appointment(&self, appointment_id: Uuid) -> Result<Appointment, AppointmentError> {
        self.transition(appointment_id, AppointmentStatus::Confirmed).await
    }

    pub async fn complete_appointment(&self, appointment_id: Uuid) -> Result<Appointment, AppointmentError> {
        self.transition(appointment_id, AppointmentStatus::Completed).await
    }

    /// Cancel an appointment, freeing its slot.
    pub async fn cancel_appointment(
        &self,
        appointment_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Appointment, AppointmentError> {
        let cancelled = self.transition(appointment_id, AppointmentStatus::Cancelled).await?;

        self.notifier.dispatch(DomainEvent::AppointmentCancelled {
            appointment_id: cancelled.id,
            doctor_id: cancelled.doctor_id,
            start_time: cancelled.start_time,
            occurred_at: now,
        });

        Ok(cancelled)
    }

    async fn transition(
        &self,
        appointment_id: Uuid,
        next: AppointmentStatus,
    ) -> Result<Appointment, AppointmentError> {
        let current = self.get_appointment(appointment_id).await?;
        validate_status_transition(current.status, next)?;

        let updated = self
            .repository
            .update_status(appointment_id, current.status, next)
            .await
            .map_err(|err| match err {
                AppError::Conflict(_) => AppointmentError::StatusChanged,
                other => other.into(),
            })?;

        info!("Appointment {} moved from {} to {}", appointment_id, current.status, updated.status);
        Ok(updated)
    }
}
