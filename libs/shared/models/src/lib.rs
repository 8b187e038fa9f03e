pub mod appointment;
pub mod error;
pub mod events;

pub use appointment::AppointmentStatus;
pub use error::AppError;
pub use events::DomainEvent;
