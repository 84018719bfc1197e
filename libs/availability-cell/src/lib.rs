pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use models::{Availability, AvailabilityError};
pub use router::AvailabilityState;
pub use services::{
    AvailabilityCache, AvailabilityRepository, AvailabilityService, AvailabilitySnapshot,
    CalendarGate, NormalizedSlots,
};
