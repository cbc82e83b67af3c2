//! View registry and navigation.
//!
//! Views register under a path pattern (`/reset-password/:token`) with either
//! public access or a [`RouteConstraint`]. [`RouteTable::navigate`] resolves
//! a location and runs the guard for protected views.

use std::collections::BTreeMap;

use payment_voucher_core::Role;
use tracing::debug;

use crate::guard::{self, DASHBOARD_VIEW_PATH, GuardDecision, Redirect, RouteConstraint};
use crate::session::SessionState;

/// Upper bound on redirect hops followed by [`RouteTable::follow`].
const MAX_REDIRECTS: usize = 4;

/// Views known to the console.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum View {
    /// Username and password form.
    Login,
    /// Request a password reset email.
    ChangePassword,
    /// Set a new password from an emailed token.
    ResetPassword,
    /// Landing view for every logged-in user.
    Dashboard,
    /// Admin: manage console users.
    UserManagement,
    /// Admin: manage payment beneficiaries.
    BeneficiaryManagement,
    /// Admin: every voucher in the system.
    AllVouchers,
    /// Approver: vouchers awaiting a decision.
    PendingApprovals,
    /// Approver: vouchers already approved.
    ApprovedVouchers,
    /// Creator: draft a new voucher.
    NewVoucher,
    /// Creator: vouchers the user created.
    MyVouchers,
}

impl View {
    /// Human-readable title.
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Login => "Login",
            Self::ChangePassword => "Change Password",
            Self::ResetPassword => "Reset Password",
            Self::Dashboard => "Dashboard",
            Self::UserManagement => "User Management",
            Self::BeneficiaryManagement => "Beneficiary Management",
            Self::AllVouchers => "All Vouchers",
            Self::PendingApprovals => "Pending Approvals",
            Self::ApprovedVouchers => "Approved Vouchers",
            Self::NewVoucher => "New Voucher",
            Self::MyVouchers => "My Vouchers",
        }
    }
}

/// Who may open a view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Anyone, logged in or not.
    Public,
    /// Goes through the route guard.
    Protected(RouteConstraint),
}

/// What a matched pattern leads to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteTarget {
    /// Render `view` subject to `access`.
    View {
        /// View to render.
        view: View,
        /// Access rule.
        access: Access,
    },
    /// Unconditionally send the user elsewhere.
    Redirect(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
}

/// One registered pattern.
#[derive(Debug, Clone)]
pub struct Route {
    pattern: String,
    segments: Vec<Segment>,
    target: RouteTarget,
}

impl Route {
    fn new(pattern: &str, target: RouteTarget) -> Self {
        let segments = split_path(pattern)
            .map(|segment| {
                segment.strip_prefix(':').map_or_else(
                    || Segment::Literal(segment.to_string()),
                    |name| Segment::Param(name.to_string()),
                )
            })
            .collect();

        Self {
            pattern: pattern.to_string(),
            segments,
            target,
        }
    }

    /// Pattern as registered.
    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Target of the route.
    #[must_use]
    pub const fn target(&self) -> RouteTarget {
        self.target
    }

    fn matches(&self, path: &str) -> Option<BTreeMap<String, String>> {
        let mut params = BTreeMap::new();
        let mut parts = split_path(path);

        for segment in &self.segments {
            let part = parts.next()?;
            match segment {
                Segment::Literal(literal) if literal == part => {}
                Segment::Literal(_) => return None,
                Segment::Param(name) => {
                    params.insert(name.clone(), part.to_string());
                }
            }
        }

        parts.next().is_none().then_some(params)
    }
}

/// A location matched against a registered route.
#[derive(Debug, Clone)]
pub struct ResolvedRoute<'a> {
    /// The matching route.
    pub route: &'a Route,
    /// Values captured by `:name` segments.
    pub params: BTreeMap<String, String>,
}

/// Result of navigating to a location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    /// Render `view`.
    Render {
        /// View to render.
        view: View,
        /// Captured path parameters.
        params: BTreeMap<String, String>,
    },
    /// Session still initializing; show a waiting indicator.
    Wait,
    /// Go somewhere else.
    Redirect(Redirect),
    /// No route matches.
    NotFound,
}

/// Ordered collection of routes; the first matching pattern wins.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    /// An empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The console's standard views and their access rules.
    #[must_use]
    pub fn standard() -> Self {
        let mut table = Self::new();
        table
            .register("/login", View::Login, Access::Public)
            .register("/change-password", View::ChangePassword, Access::Public)
            .register("/reset-password/:token", View::ResetPassword, Access::Public)
            .register("/dashboard", View::Dashboard, authenticated())
            .register("/user-management", View::UserManagement, role(Role::Admin))
            .register(
                "/beneficiary-management",
                View::BeneficiaryManagement,
                role(Role::Admin),
            )
            .register("/all-vouchers", View::AllVouchers, role(Role::Admin))
            .register(
                "/pending-approvals",
                View::PendingApprovals,
                role(Role::Approver),
            )
            .register(
                "/approved-vouchers",
                View::ApprovedVouchers,
                role(Role::Approver),
            )
            .register("/new-voucher", View::NewVoucher, role(Role::Creator))
            .register("/my-vouchers", View::MyVouchers, role(Role::Creator))
            .register_redirect("/", DASHBOARD_VIEW_PATH);
        table
    }

    /// Register `view` under `pattern`.
    pub fn register(&mut self, pattern: &str, view: View, access: Access) -> &mut Self {
        self.routes
            .push(Route::new(pattern, RouteTarget::View { view, access }));
        self
    }

    /// Register an unconditional redirect from `pattern` to `to`.
    pub fn register_redirect(&mut self, pattern: &str, to: &'static str) -> &mut Self {
        self.routes
            .push(Route::new(pattern, RouteTarget::Redirect(to)));
        self
    }

    /// Registered routes in match order.
    pub fn routes(&self) -> impl Iterator<Item = &Route> {
        self.routes.iter()
    }

    /// Find the first route matching `location` (query and fragment ignored).
    #[must_use]
    pub fn resolve(&self, location: &str) -> Option<ResolvedRoute<'_>> {
        let path = strip_query(location);
        self.routes.iter().find_map(|route| {
            route
                .matches(path)
                .map(|params| ResolvedRoute { route, params })
        })
    }

    /// Navigate to `location` given the current session state.
    #[must_use]
    pub fn navigate(&self, state: &SessionState, location: &str) -> Navigation {
        let Some(resolved) = self.resolve(location) else {
            debug!(location, "No route matches");
            return Navigation::NotFound;
        };

        match resolved.route.target {
            RouteTarget::Redirect(to) => Navigation::Redirect(Redirect::to(to)),
            RouteTarget::View {
                view,
                access: Access::Public,
            } => Navigation::Render {
                view,
                params: resolved.params,
            },
            RouteTarget::View {
                view,
                access: Access::Protected(constraint),
            } => match guard::evaluate(state, constraint, location) {
                GuardDecision::Loading => Navigation::Wait,
                GuardDecision::Authorized => Navigation::Render {
                    view,
                    params: resolved.params,
                },
                GuardDecision::Unauthenticated { return_to } => {
                    Navigation::Redirect(Redirect::login(return_to))
                }
                GuardDecision::RoleMismatch { .. } => {
                    Navigation::Redirect(Redirect::to(DASHBOARD_VIEW_PATH))
                }
            },
        }
    }

    /// Navigate to `location`, following redirects until something renders,
    /// waits, or is not found. Returns the final location and outcome.
    #[must_use]
    pub fn follow(&self, state: &SessionState, location: &str) -> (String, Navigation) {
        let mut current = location.to_string();
        for _ in 0..MAX_REDIRECTS {
            match self.navigate(state, &current) {
                Navigation::Redirect(redirect) => current = redirect.to.to_string(),
                outcome => return (current, outcome),
            }
        }
        let outcome = self.navigate(state, &current);
        (current, outcome)
    }
}

const fn authenticated() -> Access {
    Access::Protected(RouteConstraint::authenticated())
}

const fn role(required: Role) -> Access {
    Access::Protected(RouteConstraint::requires(required))
}

fn split_path(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|segment| !segment.is_empty())
}

fn strip_query(location: &str) -> &str {
    location
        .split(['?', '#'])
        .next()
        .unwrap_or(location)
}
