use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
    middleware,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::access::RouteAccess;
use crate::gate::{role_gate, RoleGate};
use crate::handlers;
use crate::session::SessionService;

pub struct AuthState {
    pub config: Arc<AppConfig>,
    pub sessions: Arc<SessionService>,
}

pub fn auth_routes(config: Arc<AppConfig>, sessions: Arc<SessionService>) -> Router {
    let state = Arc::new(AuthState {
        config: config.clone(),
        sessions: sessions.clone(),
    });

    let public_routes = Router::new()
        .route("/validate", post(handlers::validate_session));

    let protected_routes = Router::new()
        .route("/me", get(handlers::get_me))
        .layer(middleware::from_fn_with_state(RoleGate::new(sessions, RouteAccess::All), role_gate))
        .layer(middleware::from_fn_with_state(config, auth_middleware));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}
