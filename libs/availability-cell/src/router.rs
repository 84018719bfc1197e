use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post, put},
    middleware,
};

use auth_cell::{role_gate, RoleGate, RouteAccess, SessionService};
use shared_config::AppConfig;
use shared_models::auth::Role;
use shared_utils::extractor::auth_middleware;

use crate::handlers;
use crate::services::availability::AvailabilityRepository;
use crate::services::cache::AvailabilityCache;

pub struct AvailabilityState {
    pub repository: Arc<dyn AvailabilityRepository>,
    pub cache: Arc<AvailabilityCache>,
}

pub fn availability_routes(
    config: Arc<AppConfig>,
    sessions: Arc<SessionService>,
    state: Arc<AvailabilityState>,
) -> Router {
    let patient_routes = Router::new()
        .route("/professionals/{professional_id}/calendar", get(handlers::get_calendar))
        .route("/professionals/{professional_id}/calendar/{date}", get(handlers::get_calendar_day))
        .layer(middleware::from_fn_with_state(
            RoleGate::new(sessions.clone(), RouteAccess::only(Role::Patient)),
            role_gate,
        ))
        .layer(middleware::from_fn_with_state(config.clone(), auth_middleware));

    let professional_routes = Router::new()
        .route("/", post(handlers::create_availability))
        .route("/mine", get(handlers::list_own_availability))
        .route(
            "/{availability_id}",
            put(handlers::update_availability).delete(handlers::delete_availability),
        )
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
