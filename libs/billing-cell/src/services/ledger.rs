//! Payment accumulation against a single invoice.
//!
//! Pure: nothing is persisted here. Applying the same payment twice credits it
//! twice; deduplication, if any, belongs to the caller.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use shared_models::DomainEvent;

use crate::models::{Invoice, InvoiceStatus, Payment, PaymentError, PaymentMode, PaymentOutcome};

pub fn apply_payment(
    invoice: &Invoice,
    amount: i64,
    mode: PaymentMode,
    paid_at: DateTime<Utc>,
) -> Result<PaymentOutcome, PaymentError> {
    if amount <= 0 {
        return Err(PaymentError::InvalidAmount(amount));
    }

    let remaining = invoice.remaining_balance();
    if invoice.status == InvoiceStatus::Paid || remaining == 0 {
        return Err(PaymentError::AlreadyPaid);
    }

    if amount > remaining {
        return Err(PaymentError::ExceedsBalance { amount, remaining });
    }

    let amount_paid = invoice.amount_paid + amount;
    let status = InvoiceStatus::derive(amount_paid, invoice.total_amount);

    let updated = Invoice {
        amount_paid,
        status,
        updated_at: paid_at,
        ..invoice.clone()
    };

    let payment = Payment {
        id: Uuid::new_v4(),
        invoice_id: invoice.id,
        amount,
        paid_at,
        mode,
    };

    let event = match status {
        InvoiceStatus::Paid => DomainEvent::InvoicePaid {
            invoice_id: invoice.id,
            payment_id: payment.id,
            amount_paid,
            total_amount: invoice.total_amount,
            occurred_at: paid_at,
        },
        _ => DomainEvent::InvoicePartiallyPaid {
            invoice_id: invoice.id,
            payment_id: payment.id,
            amount_paid,
            total_amount: invoice.total_amount,
            occurred_at: paid_at,
        },
    };

    Ok(PaymentOutcome {
        invoice: updated,
        payment,
        events: vec![event],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn invoice(total: i64, paid: i64) -> Invoice {
        let mut invoice = Invoice::new(Uuid::new_v4(), total, Utc::now());
        invoice.amount_paid = paid;
        invoice.status = InvoiceStatus::derive(paid, total);
        invoice
    }

    #[test]
    fn test_non_positive_amounts_are_rejected() {
        let inv = invoice(100, 0);

        assert_eq!(apply_payment(&inv, -5, PaymentMode::Cash, Utc::now()), Err(PaymentError::InvalidAmount(-5)));
        assert_eq!(apply_payment(&inv, 0, PaymentMode::Cash, Utc::now()), Err(PaymentError::InvalidAmount(0)));
    }

    #[test]
    fn test_overpayment_is_rejected() {
        let result = apply_payment(&invoice(100, 0), 150, PaymentMode::Card, Utc::now());
        assert_eq!(result, Err(PaymentError::ExceedsBalance { amount: 150, remaining: 100 }));

        let result = apply_payment(&invoice(100, 70), 31, PaymentMode::Card, Utc::now());
        assert_eq!(result, Err(PaymentError::ExceedsBalance { amount: 31, remaining: 30 }));
    }

    #[test]
    fn test_full_payment_marks_invoice_paid() {
        let inv = invoice(100, 0);
        let outcome = apply_payment(&inv, 100, PaymentMode::BankTransfer, Utc::now()).unwrap();

        assert_eq!(outcome.invoice.status, InvoiceStatus::Paid);
        assert_eq!(outcome.invoice.amount_paid, 100);
        assert_eq!(outcome.payment.amount, 100);
        assert_eq!(outcome.payment.invoice_id, inv.id);
        assert_matches!(outcome.events.as_slice(), [DomainEvent::InvoicePaid { amount_paid: 100, .. }]);
    }

    #[test]
    fn test_partial_payment_marks_invoice_partially_paid() {
        let outcome = apply_payment(&invoice(100, 0), 40, PaymentMode::Cash, Utc::now()).unwrap();

        assert_eq!(outcome.invoice.status, InvoiceStatus::PartiallyPaid);
        assert_eq!(outcome.invoice.amount_paid, 40);
        assert_matches!(outcome.events.as_slice(), [DomainEvent::InvoicePartiallyPaid { amount_paid: 40, .. }]);
    }

    #[test]
    fn test_repeated_payments_accumulate() {
        let start = invoice(100, 0);

        let first = apply_payment(&start, 40, PaymentMode::Cash, Utc::now()).unwrap();
        let second = apply_payment(&first.invoice, 40, PaymentMode::Cash, Utc::now()).unwrap();
        assert_eq!(second.invoice.amount_paid, 80);
        assert_eq!(second.invoice.status, InvoiceStatus::PartiallyPaid);
        assert_ne!(first.payment.id, second.payment.id);

        let third = apply_payment(&second.invoice, 20, PaymentMode::Check, Utc::now()).unwrap();
        assert_eq!(third.invoice.amount_paid, 100);
        assert_eq!(third.invoice.status, InvoiceStatus::Paid);

        assert_eq!(
            apply_payment(&third.invoice, 40, PaymentMode::Cash, Utc::now()),
            Err(PaymentError::AlreadyPaid)
        );
    }

    #[test]
    fn test_input_invoice_is_untouched() {
        let inv = invoice(100, 10);
        let outcome = apply_payment(&inv, 50, PaymentMode::Insurance, Utc::now()).unwrap();

        assert_eq!(inv.amount_paid, 10);
        assert_eq!(outcome.invoice.amount_paid, 60);
        assert_eq!(outcome.invoice.version, inv.version);
    }

    #[test]
    fn test_paid_never_exceeds_total_across_payment_sequences() {
        let sequences: [&[i64]; 4] = [&[10, 20, 30, 40], &[100], &[1, 99, 5], &[-1, 60, 60, 40]];

        for amounts in sequences {
            let mut current = invoice(100, 0);
            for &amount in amounts {
                if let Ok(outcome) = apply_payment(&current, amount, PaymentMode::Cash, Utc::now()) {
                    current = outcome.invoice;
                }
                assert!(current.amount_paid >= 0 && current.amount_paid <= current.total_amount);
                assert_eq!(current.status, InvoiceStatus::derive(current.amount_paid, current.total_amount));
            }
        }
    }
}
