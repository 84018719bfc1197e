pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use models::{Appointment, AppointmentStatus, BookingReceipt, APPOINTMENTS_ROUTE};
pub use router::AppointmentState;
pub use services::{
    AppointmentRepository, AppointmentService, AppointmentsStore, BookingCommitter,
    BookingServices, BookingSessions, BookingWorkflow, SLOT_UNAVAILABLE_MESSAGE,
};
