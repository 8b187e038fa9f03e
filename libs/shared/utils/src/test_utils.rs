use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;

pub struct TestConfig {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub slot_duration_minutes: i64,
    pub slot_buffer_minutes: i64,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            supabase_url: "http://localhost:54321".to_string(),
            supabase_anon_key: "test-anon-key".to_string(),
            slot_duration_minutes: 30,
            slot_buffer_minutes: 10,
        }
    }
}

impl TestConfig {
    pub fn with_url(url: &str) -> Self {
        Self {
            supabase_url: url.to_string(),
            ..Self::default()
        }
    }

    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            supabase_url: self.supabase_url.clone(),
            supabase_anon_key: self.supabase_anon_key.clone(),
            slot_duration_minutes: self.slot_duration_minutes,
            slot_buffer_minutes: self.slot_buffer_minutes,
        }
    }
}

/// 2025-06-16 is a Monday.
pub fn monday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 16).unwrap()
}

pub fn hm(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
}

pub fn at(date: NaiveDate, hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(hm(hour, minute)))
}

/// A clock reading well before any fixture date.
pub fn long_ago() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap()
}

pub struct MockSupabaseResponses;

impl MockSupabaseResponses {
    pub fn window_row(doctor_id: Uuid, day_of_week: i32, start: &str, end: &str) -> Value {
        json!({
            "id": Uuid::new_v4(),
            "doctor_id": doctor_id,
            "day_of_week": day_of_week,
            "start_time": start,
            "end_time": end,
            "is_available": true,
            "created_at": "2025-01-01T00:00:00Z",
            "updated_at": "2025-01-01T00:00:00Z"
        })
    }

    pub fn override_row(doctor_id: Uuid, date: &str, is_available: bool) -> Value {
        json!({
            "id": Uuid::new_v4(),
            "doctor_id": doctor_id,
            "override_date": date,
            "is_available": is_available,
            "reason": "Conference",
            "created_at": "2025-01-01T00:00:00Z"
        })
    }

    pub fn appointment_row(doctor_id: Uuid, start: &str, end: &str, status: &str) -> Value {
        json!({
            "id": Uuid::new_v4(),
            "doctor_id": doctor_id,
            "patient_id": Uuid::new_v4(),
            "start_time": start,
            "end_time": end,
            "status": status,
            "notes": null,
            "created_at": "2025-01-01T00:00:00Z",
            "updated_at": "2025-01-01T00:00:00Z"
        })
    }

    pub fn invoice_row(invoice_id: Uuid, total: i64, paid: i64, status: &str, version: i64) -> Value {
        json!({
            "id": invoice_id,
            "patient_id": Uuid::new_v4(),
            "total_amount": total,
            "amount_paid": paid,
            "status": status,
            "version": version,
            "created_at": "2025-01-01T00:00:00Z",
            "updated_at": "2025-01-01T00:00:00Z"
        })
    }

    pub fn payment_row(invoice_id: Uuid, amount: i64, mode: &str) -> Value {
        json!({
            "id": Uuid::new_v4(),
            "invoice_id": invoice_id,
            "amount": amount,
            "paid_at": "2025-06-16T10:00:00Z",
            "mode": mode
        })
    }

    pub fn error_response(message: &str, code: &str) -> Value {
        json!({
            "message": message,
            "code": code
        })
    }
}
