use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Utc, Weekday};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::AppointmentStatus;

/// Map a weekday onto the stored `day_of_week` (0 = Sunday, 6 = Saturday).
pub fn day_of_week_index(weekday: Weekday) -> i32 {
    weekday.num_days_from_sunday() as i32
}

/// How far into the day a window reaches. An end of `00:00` means midnight at
/// the end of the day, since `NaiveTime` has no 24:00.
pub fn window_end_offset(end: NaiveTime) -> Duration {
    if end == NaiveTime::MIN {
        Duration::days(1)
    } else {
        end - NaiveTime::MIN
    }
}

fn default_true() -> bool {
    true
}

/// One recurring weekly block during which a doctor takes appointments.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AvailabilityWindow {
    pub id: Uuid,
    pub doctor_id: Uuid,
    pub day_of_week: i32, // 0 = Sunday, 1 = Monday, etc.
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    #[serde(default = "default_true")]
    pub is_available: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl AvailabilityWindow {
    pub fn applies_to(&self, date: NaiveDate) -> bool {
        self.is_available && self.day_of_week == day_of_week_index(date.weekday())
    }

    pub fn overlaps(&self, start: NaiveTime, end: NaiveTime) -> bool {
        start - NaiveTime::MIN < window_end_offset(self.end_time)
            && window_end_offset(end) > self.start_time - NaiveTime::MIN
    }

    /// The window's concrete UTC bounds on `date`.
    pub fn span_on(&self, date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
        let midnight = date.and_time(NaiveTime::MIN).and_utc();
        let end = midnight
            .checked_add_signed(window_end_offset(self.end_time))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        (date.and_time(self.start_time).and_utc(), end)
    }
}

/// Dated exception to the weekly schedule (vacation, sick day, ...).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AvailabilityOverride {
    pub id: Uuid,
    pub doctor_id: Uuid,
    pub override_date: NaiveDate,
    pub is_available: bool,
    pub reason: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

/// What slot generation needs to know about an existing appointment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BookedAppointment {
    pub doctor_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub status: AppointmentStatus,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Slot {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

impl Slot {
    pub fn duration_minutes(&self) -> i64 {
        (self.end_time - self.start_time).num_minutes()
    }
}

/// Slot length and trailing buffer used when carving windows into slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotPolicy {
    pub slot_duration: Duration,
    pub buffer: Duration,
}

impl SlotPolicy {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            slot_duration: config.slot_duration(),
            buffer: config.slot_buffer(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateWindowRequest {
    pub day_of_week: i32,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateWindowRequest {
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub is_available: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOverrideRequest {
    pub override_date: NaiveDate,
    pub is_available: bool,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotQuery {
    pub date: NaiveDate,
    pub duration_minutes: Option<i64>,
}

impl SlotQuery {
    pub fn for_date(date: NaiveDate) -> Self {
        Self {
            date,
            duration_minutes: None,
        }
    }
}
