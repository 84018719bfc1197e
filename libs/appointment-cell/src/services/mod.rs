pub mod appointments;
pub mod committer;
pub mod lifecycle;
pub mod store;
pub mod workflow;

pub use appointments::{AppointmentRepository, AppointmentService};
pub use committer::{
    BookingCommitter, BookingSelection, BookingServices, CommitState, SLOT_UNAVAILABLE_MESSAGE,
};
pub use store::AppointmentsStore;
pub use workflow::{AvailabilityLoad, BookingSessions, BookingWorkflow, Selection};
