// libs/appointment-cell/src/models.rs
use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use shared_backend::BackendError;
use shared_models::error::AppError;

/// Where the dashboard sends a patient after a successful booking.
pub const APPOINTMENTS_ROUTE: &str = "/dashboard/appointments";

// ==============================================================================
// CORE APPOINTMENT MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub id: String,
    pub patient_id: String,
    pub professional_id: String,
    #[serde(default)]
    pub availability_id: Option<String>,
    pub appointment_date: DateTime<Utc>,
    pub status: AppointmentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Appointment {
    /// Scheduled and not yet in the past.
    pub fn is_pending(&self, today: NaiveDate) -> bool {
        self.status == AppointmentStatus::Scheduled && self.appointment_date.date_naive() >= today
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AppointmentStatus {
    Scheduled,
    Completed,
    Cancelled,
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Scheduled => write!(f, "SCHEDULED"),
            AppointmentStatus::Completed => write!(f, "COMPLETED"),
            AppointmentStatus::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

/// Body of `POST /api/appointments`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreateAppointmentRequest {
    pub patient_id: String,
    pub professional_id: String,
    pub availability_id: String,
    pub appointment_date: DateTime<Utc>,
    pub status: AppointmentStatus,
}

/// What a patient posts to book a slot.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookAppointmentRequest {
    pub professional_id: String,
    pub availability_id: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BookingReceipt {
    pub appointment: Appointment,
    pub redirect_to: String,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentStats {
    pub total_appointments: usize,
    pub completed_appointments: usize,
    pub pending_appointments: usize,
}

impl AppointmentStats {
    pub fn from_appointments(appointments: &[Appointment], today: NaiveDate) -> Self {
        Self {
            total_appointments: appointments.len(),
            completed_appointments: appointments
                .iter()
                .filter(|a| a.status == AppointmentStatus::Completed)
                .count(),
            pending_appointments: appointments.iter().filter(|a| a.is_pending(today)).count(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentsOverview {
    pub appointments: Vec<Appointment>,
    pub statistics: AppointmentStats,
    pub upcoming: Vec<Appointment>,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Error, Debug)]
pub enum AppointmentError {
    #[error("Appointment {0} not found")]
    NotFound(String),

    #[error("Unauthorized access to appointment {0}")]
    NotOwner(String),

    #[error("Appointment cannot move from {from} to {to}")]
    InvalidStatusTransition {
        from: AppointmentStatus,
        to: AppointmentStatus,
    },

    #[error(transparent)]
    Backend(#[from] BackendError),
}

#[derive(Error, Debug)]
pub enum BookingError {
    #[error("A booking is already being submitted")]
    AlreadySubmitting,

    #[error("Slot {0} is no longer available")]
    SlotUnavailable(String),

    #[error(transparent)]
    Failed(#[from] AppointmentError),
}

#[derive(Error, Debug)]
pub enum WorkflowError {
    #[error("Select a professional first")]
    NoProfessional,

    #[error("Select a date first")]
    NoDate,

    #[error("Select a time slot first")]
    NoSlot,

    #[error("Availability has not been loaded for the selected professional")]
    NotLoaded,

    #[error("Availability for this professional could not be loaded")]
    AvailabilityUnavailable,

    #[error("The selected professional changed while availability was loading")]
    Superseded,

    #[error("{0} has no bookable slots")]
    DateNotSelectable(NaiveDate),

    #[error("Slot {0} not found on the selected date")]
    SlotNotFound(String),

    #[error("Slot {0} is already booked")]
    SlotNotSelectable(String),

    #[error(transparent)]
    Booking(#[from] BookingError),
}

impl From<AppointmentError> for AppError {
    fn from(err: AppointmentError) -> Self {
        match err {
            AppointmentError::NotFound(_) => AppError::NotFound(err.to_string()),
            AppointmentError::NotOwner(_) => AppError::Forbidden(err.to_string()),
            AppointmentError::InvalidStatusTransition { .. } => AppError::BadRequest(err.to_string()),
            AppointmentError::Backend(backend) => backend.into(),
        }
    }
}

impl From<BookingError> for AppError {
    fn from(err: BookingError) -> Self {
        match err {
            BookingError::AlreadySubmitting | BookingError::SlotUnavailable(_) => {
                AppError::Conflict(err.to_string())
            }
            BookingError::Failed(inner) => inner.into(),
        }
    }
}

impl From<WorkflowError> for AppError {
    fn from(err: WorkflowError) -> Self {
        match err {
            WorkflowError::NoProfessional
            | WorkflowError::NoDate
            | WorkflowError::NoSlot
            | WorkflowError::NotLoaded => {
                AppError::BadRequest(err.to_string())
            }
            WorkflowError::AvailabilityUnavailable => AppError::ExternalService(err.to_string()),
            WorkflowError::Superseded
            | WorkflowError::DateNotSelectable(_)
            | WorkflowError::SlotNotSelectable(_) => AppError::Conflict(err.to_string()),
            WorkflowError::SlotNotFound(_) => AppError::NotFound(err.to_string()),
            WorkflowError::Booking(inner) => inner.into(),
        }
    }
}
