// libs/appointment-cell/src/router.rs
use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
    middleware,
};

use auth_cell::{role_gate, RoleGate, RouteAccess, SessionService};
use shared_config::AppConfig;
use shared_models::auth::Role;
use shared_utils::extractor::auth_middleware;

use crate::handlers;
use crate::services::store::AppointmentsStore;
use crate::services::workflow::BookingSessions;

pub struct AppointmentState {
    pub store: Arc<AppointmentsStore>,
    pub bookings: Arc<BookingSessions>,
}

pub fn appointment_routes(
    config: Arc<AppConfig>,
    sessions: Arc<SessionService>,
    state: Arc<AppointmentState>,
) -> Router {
    let patient_routes = Router::new()
        .route("/", get(handlers::list_appointments))
        .route("/book", post(handlers::book_appointment))
        .route("/{appointment_id}", get(handlers::get_appointment))
        .route("/{appointment_id}/cancel", post(handlers::cancel_appointment))
        .layer(middleware::from_fn_with_state(
            RoleGate::new(sessions.clone(), RouteAccess::only(Role::Patient)),
            role_gate,
        ))
        .layer(middleware::from_fn_with_state(config.clone(), auth_middleware));

    let professional_routes = Router::new()
        .route("/professional", get(handlers::list_professional_appointments))
        .route("/{appointment_id}/complete", post(handlers::complete_appointment))
        .layer(middleware::from_fn_with_state(
            RoleGate::new(sessions, RouteAccess::only(Role::Professional)),
            role_gate,
        ))
        .layer(middleware::from_fn_with_state(config, auth_middleware));

    Router::new()
        .merge(patient_routes)
        .merge(professional_routes)
        .with_state(state)
}
