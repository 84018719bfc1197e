// libs/auth-cell/src/access.rs
use shared_models::auth::{Role, UserProfile};

pub const LOGIN_ROUTE: &str = "/login";
pub const ACCESS_DENIED_ROUTE: &str = "/access-denied";

/// Which roles may enter a dashboard area.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteAccess {
    /// Any authenticated user.
    All,
    Roles(Vec<Role>),
}

impl RouteAccess {
    pub fn only(role: Role) -> Self {
        RouteAccess::Roles(vec![role])
    }

    pub fn any_of(roles: &[Role]) -> Self {
        RouteAccess::Roles(roles.to_vec())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    Granted,
    RedirectToLogin,
    Denied,
}

impl AccessDecision {
    pub fn redirect_target(&self) -> Option<&'static str> {
        match self {
            AccessDecision::Granted => None,
            AccessDecision::RedirectToLogin => Some(LOGIN_ROUTE),
            AccessDecision::Denied => Some(ACCESS_DENIED_ROUTE),
        }
    }
}

pub fn is_allowed(role: Role, access: &RouteAccess) -> bool {
    match access {
        RouteAccess::All => true,
        RouteAccess::Roles(roles) => roles.contains(&role),
    }
}

/// Gate for a dashboard area. No profile means the caller is not signed in.
pub fn check_access(profile: Option<&UserProfile>, access: &RouteAccess) -> AccessDecision {
    match profile {
        None => AccessDecision::RedirectToLogin,
        Some(profile) if is_allowed(profile.role, access) => AccessDecision::Granted,
        Some(_) => AccessDecision::Denied,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(role: Role) -> UserProfile {
        UserProfile {
            id: "u-1".into(),
            auth_user_id: None,
            email: None,
            first_name: None,
            last_name: None,
            full_name: None,
            role,
        }
    }

    #[test]
    fn all_admits_every_role() {
        for role in [Role::Patient, Role::Professional, Role::Admin] {
            assert!(is_allowed(role, &RouteAccess::All));
        }
    }

    #[test]
    fn listed_roles_only() {
        let access = RouteAccess::only(Role::Professional);
        assert!(is_allowed(Role::Professional, &access));
        assert!(!is_allowed(Role::Patient, &access));
        assert!(!is_allowed(Role::Admin, &access));

        let access = RouteAccess::any_of(&[Role::Patient, Role::Professional]);
        assert!(is_allowed(Role::Patient, &access));
    }

    #[test]
    fn empty_role_list_denies_everyone() {
        assert!(!is_allowed(Role::Admin, &RouteAccess::Roles(vec![])));
    }

    #[test]
    fn decisions_and_redirects() {
        let access = RouteAccess::only(Role::Patient);

        let decision = check_access(None, &access);
        assert_eq!(decision, AccessDecision::RedirectToLogin);
        assert_eq!(decision.redirect_target(), Some("/login"));

        let decision = check_access(Some(&profile(Role::Professional)), &access);
        assert_eq!(decision, AccessDecision::Denied);
        assert_eq!(decision.redirect_target(), Some("/access-denied"));

        let decision = check_access(Some(&profile(Role::Patient)), &access);
        assert_eq!(decision, AccessDecision::Granted);
        assert_eq!(decision.redirect_target(), None);
    }
}
