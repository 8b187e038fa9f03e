pub mod availability;
pub mod repository;
pub mod slots;

pub use availability::AvailabilityService;
pub use repository::{AvailabilityRepository, SupabaseAvailabilityRepository};
pub use slots::{generate_slots, SlotIter, Slots};
