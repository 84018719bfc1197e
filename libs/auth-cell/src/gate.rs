// libs/auth-cell/src/gate.rs
use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use tracing::warn;

use shared_models::error::AppError;
use shared_utils::extractor::{bearer_token, extract_user};

use crate::access::{check_access, AccessDecision, RouteAccess};
use crate::session::SessionService;

/// Role requirement for one group of routes.
pub struct RoleGate {
    pub sessions: Arc<SessionService>,
    pub access: RouteAccess,
}

impl RoleGate {
    pub fn new(sessions: Arc<SessionService>, access: RouteAccess) -> Arc<Self> {
        Arc::new(Self { sessions, access })
    }
}

/// Runs after `auth_middleware`: loads the caller's profile, applies the
/// gate and stores the [`shared_models::auth::UserProfile`] in the request
/// extensions.
pub async fn role_gate(
    State(gate): State<Arc<RoleGate>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let user = extract_user(&request)?;
    let token = bearer_token(request.headers())?.to_string();

    let profile = gate.sessions.profile(&user.id, &token).await?;

    match check_access(Some(&profile), &gate.access) {
        AccessDecision::Granted => {
            request.extensions_mut().insert(profile);
            Ok(next.run(request).await)
        }
        AccessDecision::Denied => {
            warn!("User {} with role {} denied access to {}", user.id, profile.role, request.uri().path());
            Err(AppError::Forbidden("Access denied for this role".to_string()))
        }
        AccessDecision::RedirectToLogin => {
            Err(AppError::Auth("Authentication required".to_string()))
        }
    }
}
