//! Route guard: decides, per navigation, whether a protected view may render.
//!
//! The decision is a closed set of outcomes checked in a fixed order:
//! loading, then unauthenticated, then role mismatch. Anything that passes
//! all three is authorized. The guard never suspends; it reads an already
//! resolved [`SessionState`].

use payment_voucher_core::Role;
use tracing::debug;

use crate::session::SessionState;

/// Path of the login view.
pub const LOGIN_VIEW_PATH: &str = "/login";

/// Default landing view for authenticated users.
pub const DASHBOARD_VIEW_PATH: &str = "/dashboard";

/// Role requirement attached to a protected view at registration time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct RouteConstraint {
    /// Role the identity must hold, or `None` for any logged-in user.
    pub required_role: Option<Role>,
}

impl RouteConstraint {
    /// Any authenticated identity may render the view.
    #[must_use]
    pub const fn authenticated() -> Self {
        Self {
            required_role: None,
        }
    }

    /// Only identities holding `role` may render the view.
    #[must_use]
    pub const fn requires(role: Role) -> Self {
        Self {
            required_role: Some(role),
        }
    }
}

/// Where a rejected navigation should go instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    /// Target path.
    pub to: &'static str,
    /// Originally requested location, for the target to return to.
    pub from: Option<String>,
}

impl Redirect {
    /// Redirect to `to` with no return location.
    #[must_use]
    pub const fn to(to: &'static str) -> Self {
        Self { to, from: None }
    }

    /// Redirect to the login view, remembering `return_to`.
    #[must_use]
    pub const fn login(return_to: String) -> Self {
        Self {
            to: LOGIN_VIEW_PATH,
            from: Some(return_to),
        }
    }

    /// The redirect as a single location, carrying `from` as a query parameter.
    #[must_use]
    pub fn href(&self) -> String {
        match &self.from {
            Some(from) => {
                let encoded: String = url::form_urlencoded::byte_serialize(from.as_bytes()).collect();
                format!("{}?from={encoded}", self.to)
            }
            None => self.to.to_string(),
        }
    }
}

/// Outcome of guarding one navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    /// Session initialization has not finished: show a waiting indicator.
    Loading,
    /// Nobody is logged in: go to the login view, remembering `return_to`.
    Unauthenticated {
        /// Location the user asked for.
        return_to: String,
    },
    /// Logged in, but without the role the view requires: go to the dashboard.
    RoleMismatch {
        /// Role the view requires.
        required: Role,
        /// Raw role the identity holds.
        actual: String,
    },
    /// Render the view.
    Authorized,
}

impl GuardDecision {
    /// Redirect implied by this decision, if any.
    #[must_use]
    pub fn redirect(&self) -> Option<Redirect> {
        match self {
            Self::Loading | Self::Authorized => None,
            Self::Unauthenticated { return_to } => Some(Redirect::login(return_to.clone())),
            Self::RoleMismatch { .. } => Some(Redirect::to(DASHBOARD_VIEW_PATH)),
        }
    }

    /// Whether the guarded view renders.
    #[must_use]
    pub const fn is_authorized(&self) -> bool {
        matches!(self, Self::Authorized)
    }
}

/// Guard a navigation to `location`, a view registered with `constraint`.
#[must_use]
pub fn evaluate(state: &SessionState, constraint: RouteConstraint, location: &str) -> GuardDecision {
    let decision = match (state.loading, &state.identity, constraint.required_role) {
        (true, _, _) => GuardDecision::Loading,
        (false, None, _) => GuardDecision::Unauthenticated {
            return_to: location.to_string(),
        },
        (false, Some(identity), Some(required)) if !identity.has_role(required) => {
            GuardDecision::RoleMismatch {
                required,
                actual: identity.role_name.clone(),
            }
        }
        (false, Some(_), _) => GuardDecision::Authorized,
    };

    debug!(location, decision = ?decision, "Route guard evaluated");
    decision
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use payment_voucher_core::{Identity, UserId};

    use super::*;

    fn identity(role: &str) -> Identity {
        Identity {
            id: UserId::new("u-7"),
            username: "someone".to_string(),
            email: "someone@example.com".to_string(),
            role_name: role.to_string(),
            full_name: "Some One".to_string(),
            department: "Ops".to_string(),
        }
    }

    fn logged_in(role: &str) -> SessionState {
        SessionState::authenticated(identity(role))
    }

    #[test]
    fn test_loading_wins_over_everything() {
        let states = [
            SessionState::loading(),
            SessionState {
                identity: Some(identity("creator")),
                loading: true,
            },
        ];
        for state in &states {
            for constraint in [
                RouteConstraint::authenticated(),
                RouteConstraint::requires(Role::Admin),
            ] {
                let decision = evaluate(state, constraint, "/user-management");
                assert_eq!(decision, GuardDecision::Loading);
                assert!(decision.redirect().is_none());
            }
        }
    }

    #[test]
    fn test_unauthenticated_redirects_to_login_with_origin() {
        for constraint in [
            RouteConstraint::authenticated(),
            RouteConstraint::requires(Role::Approver),
        ] {
            let decision = evaluate(
                &SessionState::unauthenticated(),
                constraint,
                "/pending-approvals",
            );
            assert_eq!(
                decision,
                GuardDecision::Unauthenticated {
                    return_to: "/pending-approvals".to_string()
                }
            );
            let redirect = decision.redirect().unwrap();
            assert_eq!(redirect.to, "/login");
            assert_eq!(redirect.from.as_deref(), Some("/pending-approvals"));
        }
    }

    #[test]
    fn test_role_mismatch_redirects_to_dashboard_not_login() {
        let decision = evaluate(
            &logged_in("creator"),
            RouteConstraint::requires(Role::Admin),
            "/user-management",
        );
        assert_eq!(
            decision,
            GuardDecision::RoleMismatch {
                required: Role::Admin,
                actual: "creator".to_string()
            }
        );
        assert_eq!(decision.redirect(), Some(Redirect::to("/dashboard")));
    }

    #[test]
    fn test_matching_role_is_authorized() {
        let decision = evaluate(
            &logged_in("creator"),
            RouteConstraint::requires(Role::Creator),
            "/new-voucher",
        );
        assert!(decision.is_authorized());
        assert!(decision.redirect().is_none());
    }

    #[test]
    fn test_no_required_role_authorizes_any_identity() {
        for role in ["admin", "approver", "creator", "auditor"] {
            let decision = evaluate(
                &logged_in(role),
                RouteConstraint::authenticated(),
                "/dashboard",
            );
            assert_eq!(decision, GuardDecision::Authorized, "role {role}");
        }
    }

    #[test]
    fn test_unknown_role_never_satisfies_a_requirement() {
        for required in Role::ALL {
            let decision = evaluate(
                &logged_in("auditor"),
                RouteConstraint::requires(required),
                "/x",
            );
            assert!(matches!(decision, GuardDecision::RoleMismatch { .. }));
        }
    }

    #[test]
    fn test_redirect_href_encodes_origin() {
        let redirect = Redirect {
            to: LOGIN_VIEW_PATH,
            from: Some("/reset-password/a b?x=1".to_string()),
        };
        assert_eq!(
            redirect.href(),
            "/login?from=%2Freset-password%2Fa+b%3Fx%3D1"
        );
        assert_eq!(Redirect::to(DASHBOARD_VIEW_PATH).href(), "/dashboard");
    }
}
