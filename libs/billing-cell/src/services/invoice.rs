use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use notification_cell::NotificationDispatcher;
use shared_config::AppConfig;
use shared_models::error::AppError;

use crate::models::{CreateInvoiceRequest, Invoice, Payment, PaymentOutcome, RecordPaymentRequest};
use crate::services::ledger::apply_payment;
use crate::services::repository::{InvoiceRepository, SupabaseInvoiceRepository};

pub struct InvoiceService {
    repository: Arc<dyn InvoiceRepository>,
    notifier: Arc<dyn NotificationDispatcher>,
}

impl InvoiceService {
    pub fn new(config: &AppConfig, notifier: Arc<dyn NotificationDispatcher>) -> Self {
        Self {
            repository: Arc::new(SupabaseInvoiceRepository::new(config)),
            notifier,
        }
    }

    pub fn with_repository(
        repository: Arc<dyn InvoiceRepository>,
        notifier: Arc<dyn NotificationDispatcher>,
    ) -> Self {
        Self { repository, notifier }
    }

    pub async fn create_invoice(
        &self,
        request: CreateInvoiceRequest,
        now: DateTime<Utc>,
    ) -> Result<Invoice, AppError> {
        debug!("Creating invoice for patient {}", request.patient_id);

        if request.total_amount <= 0 {
            return Err(AppError::ValidationError(
                "Invoice total must be greater than zero".to_string(),
            ));
        }

        let invoice = Invoice::new(request.patient_id, request.total_amount, now);
        let created = self.repository.insert_invoice(&invoice).await?;

        info!("Invoice {} created for {} minor units", created.id, created.total_amount);
        Ok(created)
    }

    pub async fn get_invoice(&self, invoice_id: Uuid) -> Result<Invoice, AppError> {
        self.repository
            .get_invoice(invoice_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Invoice {} not found", invoice_id)))
    }

    pub async fn list_payments(&self, invoice_id: Uuid) -> Result<Vec<Payment>, AppError> {
        self.repository.list_payments(invoice_id).await
    }

    pub async fn outstanding_balance(&self, invoice_id: Uuid) -> Result<i64, AppError> {
        Ok(self.get_invoice(invoice_id).await?.remaining_balance())
    }

    /// Apply a payment to the stored invoice.
    ///
    /// The write is conditional on the version read here. If another payment
    /// landed in between, `AppError::Conflict` is returned and nothing is
    /// dispatched; the caller should re-read and retry.
    pub async fn record_payment(
        &self,
        invoice_id: Uuid,
        request: RecordPaymentRequest,
        now: DateTime<Utc>,
    ) -> Result<PaymentOutcome, AppError> {
        debug!("Recording payment of {} on invoice {}", request.amount, invoice_id);

        let invoice = self.get_invoice(invoice_id).await?;
        let paid_at = request.paid_at.unwrap_or(now);

        let outcome = apply_payment(&invoice, request.amount, request.mode, paid_at).map_err(|e| {
            warn!("Payment rejected for invoice {}: {}", invoice_id, e);
            AppError::from(e)
        })?;

        let stored = self
            .repository
            .save_payment(&outcome.invoice, invoice.version, &outcome.payment)
            .await?;

        info!(
            "Invoice {} now {} ({} of {} paid)",
            stored.id, stored.status, stored.amount_paid, stored.total_amount
        );

        self.notifier.dispatch_all(outcome.events.clone());

        Ok(PaymentOutcome {
            invoice: stored,
            ..outcome
        })
    }
}
