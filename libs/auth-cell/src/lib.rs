pub mod access;
pub mod gate;
pub mod handlers;
pub mod router;
pub mod session;

pub use access::{check_access, is_allowed, AccessDecision, RouteAccess};
pub use gate::{role_gate, RoleGate};
pub use session::SessionService;
