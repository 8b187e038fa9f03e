use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Events raised by a successful mutation. They are returned next to the
/// mutated entity and handed to a dispatcher by the caller once the write
/// has been persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DomainEvent {
    InvoicePaid {
        invoice_id: Uuid,
        payment_id: Uuid,
        amount_paid: i64,
        total_amount: i64,
        occurred_at: DateTime<Utc>,
    },
    InvoicePartiallyPaid {
        invoice_id: Uuid,
        payment_id: Uuid,
        amount_paid: i64,
        total_amount: i64,
        occurred_at: DateTime<Utc>,
    },
    AppointmentBooked {
        appointment_id: Uuid,
        doctor_id: Uuid,
        patient_id: Uuid,
        start_time: DateTime<Utc>,
        occurred_at: DateTime<Utc>,
    },
    AppointmentCancelled {
        appointment_id: Uuid,
        doctor_id: Uuid,
        start_time: DateTime<Utc>,
        occurred_at: DateTime<Utc>,
    },
}

impl DomainEvent {
    pub fn name(&self) -> &'static str {
        match self {
            DomainEvent::InvoicePaid { .. } => "invoice_paid",
            DomainEvent::InvoicePartiallyPaid { .. } => "invoice_partially_paid",
            DomainEvent::AppointmentBooked { .. } => "appointment_booked",
            DomainEvent::AppointmentCancelled { .. } => "appointment_cancelled",
        }
    }

    /// Id of the entity the event is about.
    pub fn subject_id(&self) -> Uuid {
        match self {
            DomainEvent::InvoicePaid { invoice_id, .. }
            | DomainEvent::InvoicePartiallyPaid { invoice_id, .. } => *invoice_id,
            DomainEvent::AppointmentBooked { appointment_id, .. }
            | DomainEvent::AppointmentCancelled { appointment_id, .. } => *appointment_id,
        }
    }
}
