use std::sync::Arc;

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::error::AppError;

use crate::models::{
    day_of_week_index, window_end_offset, AvailabilityOverride, AvailabilityWindow, CreateOverrideRequest,
    CreateWindowRequest, Slot, SlotPolicy, SlotQuery, UpdateWindowRequest,
};
use crate::services::repository::{AvailabilityRepository, SupabaseAvailabilityRepository};
use crate::services::slots::{generate_slots, Slots};

pub struct AvailabilityService {
    repository: Arc<dyn AvailabilityRepository>,
    policy: SlotPolicy,
}

impl AvailabilityService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            repository: Arc::new(SupabaseAvailabilityRepository::new(config)),
            policy: SlotPolicy::from_config(config),
        }
    }

    pub fn with_repository(repository: Arc<dyn AvailabilityRepository>, policy: SlotPolicy) -> Self {
        Self { repository, policy }
    }

    /// Create a recurring weekly window for a doctor
    pub async fn create_window(
        &self,
        doctor_id: Uuid,
        request: CreateWindowRequest,
    ) -> Result<AvailabilityWindow, AppError> {
        debug!("Creating availability window for doctor: {}", doctor_id);

        validate_time_range(request.start_time, request.end_time)?;

        if !(0..=6).contains(&request.day_of_week) {
            return Err(AppError::ValidationError(
                "Day of week must be between 0 (Sunday) and 6 (Saturday)".to_string(),
            ));
        }

        self.check_window_conflicts(doctor_id, request.day_of_week, request.start_time, request.end_time, None)
            .await?;

        let window = self.repository.insert_window(doctor_id, &request).await?;
        info!("Availability window {} created for doctor {}", window.id, doctor_id);

        Ok(window)
    }

    pub async fn update_window(
        &self,
        window_id: Uuid,
        request: UpdateWindowRequest,
    ) -> Result<AvailabilityWindow, AppError> {
        debug!("Updating availability window: {}", window_id);

        let current = self
            .repository
            .get_window(window_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Availability window {} not found", window_id)))?;

        let start_time = request.start_time.unwrap_or(current.start_time);
        let end_time = request.end_time.unwrap_or(current.end_time);
        validate_time_range(start_time, end_time)?;

        self.check_window_conflicts(current.doctor_id, current.day_of_week, start_time, end_time, Some(window_id))
            .await?;

        self.repository.update_window(window_id, &request).await
    }

    pub async fn delete_window(&self, window_id: Uuid) -> Result<(), AppError> {
        debug!("Deleting availability window: {}", window_id);
        self.repository.delete_window(window_id).await
    }

    pub async fn list_windows(&self, doctor_id: Uuid) -> Result<Vec<AvailabilityWindow>, AppError> {
        self.repository.list_windows(doctor_id).await
    }

    /// Create availability override (vacation, sick day, etc.)
    pub async fn create_override(
        &self,
        doctor_id: Uuid,
        request: CreateOverrideRequest,
    ) -> Result<AvailabilityOverride, AppError> {
        debug!("Creating availability override for doctor {} on {}", doctor_id, request.override_date);

        if self.repository.override_for_date(doctor_id, request.override_date).await?.is_some() {
            warn!("Override already exists for doctor {} on {}", doctor_id, request.override_date);
            return Err(AppError::Conflict(
                "Availability override already exists for this date".to_string(),
            ));
        }

        self.repository.insert_override(doctor_id, &request).await
    }

    /// Lazily computed free slots of a doctor for one date.
    pub async fn slots_for_date(
        &self,
        doctor_id: Uuid,
        query: &SlotQuery,
        now: DateTime<Utc>,
    ) -> Result<Slots, AppError> {
        let slot_duration = match query.duration_minutes {
            Some(minutes) => Duration::try_minutes(minutes).unwrap_or(Duration::zero()),
            None => self.policy.slot_duration,
        };

        // Nothing longer than a day fits into a window.
        if slot_duration <= Duration::zero() || slot_duration > Duration::days(1) {
            warn!("Unusable slot duration {:?} requested for doctor {}", query.duration_minutes, doctor_id);
            return Ok(generate_slots(&[], &[], query.date, Duration::zero(), self.policy.buffer, now));
        }

        if let Some(entry) = self.repository.override_for_date(doctor_id, query.date).await? {
            if !entry.is_available {
                debug!("Doctor {} has availability override for {}: not available", doctor_id, query.date);
                return Ok(generate_slots(&[], &[], query.date, slot_duration, self.policy.buffer, now));
            }
        }

        let windows = self
            .repository
            .windows_for_day(doctor_id, day_of_week_index(query.date.weekday()))
            .await?;

        // Bookings from just before midnight can still reach into the day.
        let day_start = query.date.and_time(NaiveTime::MIN).and_utc();
        let from = day_start.checked_sub_signed(slot_duration).unwrap_or(DateTime::<Utc>::MIN_UTC);
        let to = day_start.checked_add_signed(Duration::days(1)).unwrap_or(DateTime::<Utc>::MAX_UTC);
        let booked = self.repository.appointments_between(doctor_id, from, to).await?;

        Ok(generate_slots(&windows, &booked, query.date, slot_duration, self.policy.buffer, now))
    }

    /// Calculate available slots for a specific date
    pub async fn get_available_slots(
        &self,
        doctor_id: Uuid,
        query: SlotQuery,
        now: DateTime<Utc>,
    ) -> Result<Vec<Slot>, AppError> {
        debug!("Calculating available slots for doctor {} on {}", doctor_id, query.date);

        let slots: Vec<Slot> = self.slots_for_date(doctor_id, &query, now).await?.iter().collect();

        debug!("Found {} available slots", slots.len());
        Ok(slots)
    }

    /// First free slot on or after `from`, looking at most `days_ahead` days forward.
    pub async fn next_available_slot(
        &self,
        doctor_id: Uuid,
        from: NaiveDate,
        days_ahead: u32,
        now: DateTime<Utc>,
    ) -> Result<Option<Slot>, AppError> {
        for date in from.iter_days().take(days_ahead as usize + 1) {
            let slots = self.slots_for_date(doctor_id, &SlotQuery::for_date(date), now).await?;
            if let Some(slot) = slots.iter().next() {
                return Ok(Some(slot));
            }
        }

        Ok(None)
    }

    async fn check_window_conflicts(
        &self,
        doctor_id: Uuid,
        day_of_week: i32,
        start_time: NaiveTime,
        end_time: NaiveTime,
        exclude_id: Option<Uuid>,
    ) -> Result<(), AppError> {
        let existing = self.repository.windows_for_day(doctor_id, day_of_week).await?;

        let conflict = existing
            .iter()
            .filter(|w| Some(w.id) != exclude_id)
            .any(|w| w.overlaps(start_time, end_time));

        if conflict {
            warn!("Availability window conflicts with existing schedule for doctor {}", doctor_id);
            return Err(AppError::Conflict(
                "Availability conflicts with existing schedule".to_string(),
            ));
        }

        Ok(())
    }
}

fn validate_time_range(start: NaiveTime, end: NaiveTime) -> Result<(), AppError> {
    if start - NaiveTime::MIN >= window_end_offset(end) {
        return Err(AppError::ValidationError("Start time must be before end time".to_string()));
    }
    Ok(())
}
