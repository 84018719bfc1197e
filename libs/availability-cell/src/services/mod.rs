pub mod availability;
pub mod cache;
pub mod calendar;
pub mod normalizer;

pub use availability::{AvailabilityRepository, AvailabilityService};
pub use cache::{AvailabilityCache, AvailabilitySnapshot};
pub use calendar::{CalendarDay, CalendarGate, SlotView};
pub use normalizer::{normalize, NormalizedSlots};
