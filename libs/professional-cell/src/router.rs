use std::sync::Arc;

use axum::{
    Router,
    routing::get,
    middleware,
};

use auth_cell::{role_gate, RoleGate, RouteAccess, SessionService};
use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::directory::ProfessionalDirectory;
use crate::handlers;

pub struct ProfessionalState {
    pub directory: Arc<ProfessionalDirectory>,
}

pub fn professional_routes(
    config: Arc<AppConfig>,
    sessions: Arc<SessionService>,
    directory: Arc<ProfessionalDirectory>,
) -> Router {
    let state = Arc::new(ProfessionalState { directory });

    Router::new()
        .route("/", get(handlers::list_professionals))
        .route("/{professional_id}", get(handlers::get_professional))
        .layer(middleware::from_fn_with_state(RoleGate::new(sessions, RouteAccess::All), role_gate))
        .layer(middleware::from_fn_with_state(config, auth_middleware))
        .with_state(state)
}
