use async_trait::async_trait;
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::SupabaseClient;
use shared_models::error::AppError;

use crate::models::{Invoice, Payment};

/// Postgres function that re-checks `version`, updates the invoice and
/// inserts the payment in one transaction. Returns the updated invoice row,
/// or no row when the version no longer matches.
pub const RECORD_PAYMENT_FN: &str = "record_invoice_payment";

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait InvoiceRepository: Send + Sync {
    async fn insert_invoice(&self, invoice: &Invoice) -> Result<Invoice, AppError>;

    async fn get_invoice(&self, invoice_id: Uuid) -> Result<Option<Invoice>, AppError>;

    async fn list_payments(&self, invoice_id: Uuid) -> Result<Vec<Payment>, AppError>;

    /// Store `updated` and append `payment` atomically, provided the stored
    /// invoice still carries `expected_version`. A stale version is reported
    /// as `AppError::Conflict`.
    async fn save_payment(
        &self,
        updated: &Invoice,
        expected_version: i64,
        payment: &Payment,
    ) -> Result<Invoice, AppError>;
}

pub struct SupabaseInvoiceRepository {
    supabase: SupabaseClient,
}

impl SupabaseInvoiceRepository {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }
}

#[async_trait]
impl InvoiceRepository for SupabaseInvoiceRepository {
    async fn insert_invoice(&self, invoice: &Invoice) -> Result<Invoice, AppError> {
        let body = serde_json::to_value(invoice)?;

        let rows: Vec<Value> = self
            .supabase
            .request_returning(Method::POST, "/rest/v1/invoices", None, Some(body))
            .await?;

        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| AppError::Database("Failed to create invoice".to_string()))?;
        Ok(serde_json::from_value(row)?)
    }

    async fn get_invoice(&self, invoice_id: Uuid) -> Result<Option<Invoice>, AppError> {
        let path = format!("/rest/v1/invoices?id=eq.{}", invoice_id);
        let rows: Vec<Value> = self.supabase.request(Method::GET, &path, None, None).await?;

        match rows.into_iter().next() {
            Some(row) => Ok(Some(serde_json::from_value(row)?)),
            None => Ok(None),
        }
    }

    async fn list_payments(&self, invoice_id: Uuid) -> Result<Vec<Payment>, AppError> {
        let path = format!("/rest/v1/payments?invoice_id=eq.{}&order=paid_at.asc", invoice_id);
        let rows: Vec<Value> = self.supabase.request(Method::GET, &path, None, None).await?;

        let payments = rows
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<Payment>, _>>()?;

        Ok(payments)
    }

    async fn save_payment(
        &self,
        updated: &Invoice,
        expected_version: i64,
        payment: &Payment,
    ) -> Result<Invoice, AppError> {
        debug!("Saving payment {} on invoice {} at version {}", payment.id, updated.id, expected_version);

        let args = json!({
            "p_invoice_id": updated.id,
            "p_expected_version": expected_version,
            "p_amount_paid": updated.amount_paid,
            "p_status": updated.status,
            "p_payment_id": payment.id,
            "p_amount": payment.amount,
            "p_paid_at": payment.paid_at.to_rfc3339(),
            "p_mode": payment.mode
        });

        let rows: Vec<Value> = self.supabase.rpc(RECORD_PAYMENT_FN, None, args).await?;

        match rows.into_iter().next() {
            Some(row) => Ok(serde_json::from_value(row)?),
            None => {
                warn!("Invoice {} changed since version {} was read", updated.id, expected_version);
                Err(AppError::Conflict(format!(
                    "Invoice {} was modified concurrently",
                    updated.id
                )))
            }
        }
    }
}
