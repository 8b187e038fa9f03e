pub mod invoice;
pub mod ledger;
pub mod repository;

pub use invoice::InvoiceService;
pub use ledger::apply_payment;
pub use repository::{InvoiceRepository, SupabaseInvoiceRepository};
