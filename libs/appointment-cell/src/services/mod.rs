pub mod booking;
pub mod lifecycle;
pub mod repository;

pub use booking::AppointmentBookingService;
pub use lifecycle::{valid_transitions, validate_status_transition};
pub use repository::{AppointmentRepository, SupabaseAppointmentRepository};
