use std::sync::Arc;

use axum::{
    extract::{Extension, Path, State},
    Json,
};
use axum_extra::TypedHeader;
use chrono::{Local, NaiveDate};
use headers::{Authorization, authorization::Bearer};
use serde::Serialize;
use tracing::{debug, info};

use shared_models::auth::UserProfile;
use shared_models::error::AppError;
use shared_models::ApiResponse;

use crate::models::{Availability, AvailabilityError, NewAvailability, UpdateAvailabilityRequest};
use crate::router::AvailabilityState;
use crate::services::cache::LOAD_FAILED_MESSAGE;
use crate::services::calendar::CalendarDay;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarView {
    pub professional_id: String,
    pub selectable_dates: Vec<NaiveDate>,
    pub days: Vec<CalendarDay>,
    pub load_failed: bool,
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

// ==============================================================================
// PATIENT CALENDAR
// ==============================================================================

pub async fn get_calendar(
    State(state): State<Arc<AvailabilityState>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(professional_id): Path<String>,
) -> Json<ApiResponse<CalendarView>> {
    debug!("Building calendar for professional: {}", professional_id);

    let snapshot = state.cache.load(&professional_id, auth.token()).await;
    let gate = snapshot.gate(today());

    let view = CalendarView {
        professional_id,
        selectable_dates: gate.selectable_dates(),
        days: gate.calendar(),
        load_failed: snapshot.failed,
    };

    if snapshot.failed {
        Json(ApiResponse::with_message(view, LOAD_FAILED_MESSAGE))
    } else {
        Json(ApiResponse::ok(view))
    }
}

pub async fn get_calendar_day(
    State(state): State<Arc<AvailabilityState>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path((professional_id, date)): Path<(String, NaiveDate)>,
) -> Json<ApiResponse<CalendarDay>> {
    let snapshot = state.cache.load(&professional_id, auth.token()).await;
    Json(ApiResponse::ok(snapshot.gate(today()).day(date)))
}

// ==============================================================================
// PROFESSIONAL MANAGEMENT
// ==============================================================================

pub async fn list_own_availability(
    State(state): State<Arc<AvailabilityState>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(profile): Extension<UserProfile>,
) -> Result<Json<ApiResponse<Vec<Availability>>>, AppError> {
    let mut slots = state.repository
        .list_for_professional(&profile.id, auth.token())
        .await?;
    slots.sort_by(|a, b| a.start_time.cmp(&b.start_time));

    Ok(Json(ApiResponse::ok(slots)))
}

pub async fn create_availability(
    State(state): State<Arc<AvailabilityState>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(profile): Extension<UserProfile>,
    Json(body): Json<NewAvailability>,
) -> Result<Json<ApiResponse<Availability>>, AppError> {
    let request = body.for_professional(&profile.id);
    request.validate()?;

    let availability = state.repository.create(request, auth.token()).await?;
    state.cache.invalidate(&profile.id).await;

    info!("Professional {} published slot {}", profile.id, availability.id);
    Ok(Json(ApiResponse::with_message(availability, "Availability created")))
}

pub async fn update_availability(
    State(state): State<Arc<AvailabilityState>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(profile): Extension<UserProfile>,
    Path(availability_id): Path<String>,
    Json(request): Json<UpdateAvailabilityRequest>,
) -> Result<Json<ApiResponse<Availability>>, AppError> {
    let current = owned_slot(&state, &availability_id, &profile, auth.token()).await?;
    request.validate_against(&current)?;

    let updated = state.repository
        .update(&availability_id, request, auth.token())
        .await?;
    state.cache.invalidate(&profile.id).await;

    Ok(Json(ApiResponse::with_message(updated, "Availability updated")))
}

pub async fn delete_availability(
    State(state): State<Arc<AvailabilityState>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(profile): Extension<UserProfile>,
    Path(availability_id): Path<String>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    owned_slot(&state, &availability_id, &profile, auth.token()).await?;

    state.repository.delete(&availability_id, auth.token()).await?;
    state.cache.invalidate(&profile.id).await;

    info!("Professional {} removed slot {}", profile.id, availability_id);
    Ok(Json(ApiResponse::with_message((), "Availability deleted")))
}

async fn owned_slot(
    state: &AvailabilityState,
    availability_id: &str,
    profile: &UserProfile,
    auth_token: &str,
) -> Result<Availability, AvailabilityError> {
    let slot = state.repository.get(availability_id, auth_token).await?;
    if slot.professional_id != profile.id {
        return Err(AvailabilityError::NotOwner(availability_id.to_string()));
    }
    Ok(slot)
}
