// libs/appointment-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Extension, Path, State},
    Json,
};
use axum_extra::TypedHeader;
use chrono::{Local, NaiveDate};
use headers::{Authorization, authorization::Bearer};
use tracing::{debug, info};

use shared_models::auth::UserProfile;
use shared_models::error::AppError;
use shared_models::ApiResponse;

use crate::models::{
    Appointment, AppointmentStats, AppointmentsOverview, BookAppointmentRequest, BookingReceipt,
    WorkflowError,
};
use crate::router::AppointmentState;
use crate::services::store::upcoming_from;
use crate::services::workflow::{AvailabilityLoad, BookingWorkflow};

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn overview(appointments: &[Appointment], today: NaiveDate) -> AppointmentsOverview {
    AppointmentsOverview {
        appointments: appointments.to_vec(),
        statistics: AppointmentStats::from_appointments(appointments, today),
        upcoming: upcoming_from(appointments, today),
    }
}

// ==============================================================================
// PATIENT HANDLERS
// ==============================================================================

pub async fn list_appointments(
    State(state): State<Arc<AppointmentState>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(profile): Extension<UserProfile>,
) -> Result<Json<ApiResponse<AppointmentsOverview>>, AppError> {
    let appointments = state.store.load(&profile.id, auth.token()).await?;
    Ok(Json(ApiResponse::ok(overview(&appointments, today()))))
}

/// Walks the caller's booking session through professional, date and slot,
/// then commits.
pub async fn book_appointment(
    State(state): State<Arc<AppointmentState>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(profile): Extension<UserProfile>,
    Json(request): Json<BookAppointmentRequest>,
) -> Result<Json<ApiResponse<BookingReceipt>>, AppError> {
    debug!(
        "Patient {} booking slot {} with professional {}",
        profile.id, request.availability_id, request.professional_id
    );

    let workflow = state.bookings.workflow_for(&profile.id);
    let outcome = walk_booking(&workflow, &request, auth.token(), today()).await;
    drop(workflow);

    let receipt = outcome?;
    state.bookings.release(&profile.id);

    Ok(Json(ApiResponse::with_message(receipt, "Appointment booked")))
}

async fn walk_booking(
    workflow: &BookingWorkflow,
    request: &BookAppointmentRequest,
    token: &str,
    today: NaiveDate,
) -> Result<BookingReceipt, WorkflowError> {
    workflow.select_professional(&request.professional_id);

    let snapshot = match workflow.load_availability(token).await? {
        AvailabilityLoad::Loaded(snapshot) => snapshot,
        AvailabilityLoad::Superseded => return Err(WorkflowError::Superseded),
    };
    if snapshot.failed {
        return Err(WorkflowError::AvailabilityUnavailable);
    }

    let slot = snapshot
        .find(&request.availability_id)
        .cloned()
        .ok_or_else(|| WorkflowError::SlotNotFound(request.availability_id.clone()))?;

    workflow.select_date(slot.available_date, today)?;
    workflow.select_slot(&slot.id)?;
    workflow.book(token, today).await
}

pub async fn get_appointment(
    State(state): State<Arc<AppointmentState>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(profile): Extension<UserProfile>,
    Path(appointment_id): Path<String>,
) -> Result<Json<ApiResponse<Appointment>>, AppError> {
    let appointment = state.store
        .get_for_patient(&profile.id, &appointment_id, auth.token())
        .await?;
    Ok(Json(ApiResponse::ok(appointment)))
}

pub async fn cancel_appointment(
    State(state): State<Arc<AppointmentState>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(profile): Extension<UserProfile>,
    Path(appointment_id): Path<String>,
) -> Result<Json<ApiResponse<AppointmentsOverview>>, AppError> {
    let refreshed = state.store
        .cancel(&profile.id, &appointment_id, auth.token())
        .await?;

    Ok(Json(ApiResponse::with_message(
        overview(&refreshed, today()),
        "Appointment cancelled",
    )))
}

// ==============================================================================
// PROFESSIONAL HANDLERS
// ==============================================================================

pub async fn list_professional_appointments(
    State(state): State<Arc<AppointmentState>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(profile): Extension<UserProfile>,
) -> Result<Json<ApiResponse<Vec<Appointment>>>, AppError> {
    let appointments = state.store.for_professional(&profile.id, auth.token()).await?;
    Ok(Json(ApiResponse::ok(appointments)))
}

pub async fn complete_appointment(
    State(state): State<Arc<AppointmentState>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(profile): Extension<UserProfile>,
    Path(appointment_id): Path<String>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    state.store
        .complete(&profile.id, &appointment_id, auth.token())
        .await?;

    info!("Professional {} completed appointment {}", profile.id, appointment_id);
    Ok(Json(ApiResponse::with_message((), "Appointment completed")))
}
