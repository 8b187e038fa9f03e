use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use shared_models::{AppError, DomainEvent};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    Unpaid,
    PartiallyPaid,
    Paid,
}

impl InvoiceStatus {
    /// Status implied by the amounts; the only way a status is ever computed.
    pub fn derive(amount_paid: i64, total_amount: i64) -> Self {
        if amount_paid >= total_amount {
            InvoiceStatus::Paid
        } else if amount_paid > 0 {
            InvoiceStatus::PartiallyPaid
        } else {
            InvoiceStatus::Unpaid
        }
    }
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvoiceStatus::Unpaid => write!(f, "unpaid"),
            InvoiceStatus::PartiallyPaid => write!(f, "partially_paid"),
            InvoiceStatus::Paid => write!(f, "paid"),
        }
    }
}

/// Amounts are in minor currency units (cents).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Invoice {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub total_amount: i64,
    pub amount_paid: i64,
    pub status: InvoiceStatus,
    /// Optimistic-concurrency token, bumped by the store on every write.
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Invoice {
    pub fn new(patient_id: Uuid, total_amount: i64, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            patient_id,
            total_amount,
            amount_paid: 0,
            status: InvoiceStatus::derive(0, total_amount),
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn remaining_balance(&self) -> i64 {
        (self.total_amount - self.amount_paid).max(0)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMode {
    Cash,
    Card,
    BankTransfer,
    Check,
    Insurance,
}

impl fmt::Display for PaymentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentMode::Cash => write!(f, "cash"),
            PaymentMode::Card => write!(f, "card"),
            PaymentMode::BankTransfer => write!(f, "bank_transfer"),
            PaymentMode::Check => write!(f, "check"),
            PaymentMode::Insurance => write!(f, "insurance"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Payment {
    pub id: Uuid,
    pub invoice_id: Uuid,
    pub amount: i64,
    pub paid_at: DateTime<Utc>,
    pub mode: PaymentMode,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateInvoiceRequest {
    pub patient_id: Uuid,
    pub total_amount: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordPaymentRequest {
    pub amount: i64,
    pub mode: PaymentMode,
    pub paid_at: Option<DateTime<Utc>>,
}

/// Result of a successful payment: the invoice as it should now be stored,
/// the payment row to append, and the events to dispatch once both are saved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentOutcome {
    pub invoice: Invoice,
    pub payment: Payment,
    pub events: Vec<DomainEvent>,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PaymentError {
    #[error("Payment amount must be positive, got {0}")]
    InvalidAmount(i64),

    #[error("Payment of {amount} exceeds remaining balance of {remaining}")]
    ExceedsBalance { amount: i64, remaining: i64 },

    #[error("Invoice is already paid")]
    AlreadyPaid,
}

impl From<PaymentError> for AppError {
    fn from(err: PaymentError) -> Self {
        AppError::ValidationError(err.to_string())
    }
}
