//! Pure permit/deny policy for dashboard actions.
//!
//! Consulted by the view layer before rendering affordances and again
//! defensively before issuing a mutation through the sync engine. The
//! server enforces the same policy; this check is a UX optimization, not a
//! security boundary.

use thiserror::Error;

use crate::Identity;

/// A UI-initiated action subject to role policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    ViewSupplierList,
    ViewSupplierDetail,
    MutateSupplierStatus,
    ManageUsers,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::ViewSupplierList => "suppliers.list",
            Action::ViewSupplierDetail => "suppliers.detail",
            Action::MutateSupplierStatus => "suppliers.mutate_status",
            Action::ManageUsers => "users.manage",
        }
    }
}

impl core::fmt::Display for Action {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum AuthzError {
    /// No identity present; the caller should route to the login surface.
    #[error("login required")]
    LoginRequired,

    #[error("forbidden: '{0}' requires the admin role")]
    Forbidden(&'static str),
}

/// Policy truth table.
///
/// | action                    | member | admin |
/// |---------------------------|--------|-------|
/// | view supplier list/detail | allow  | allow |
/// | mutate supplier status    | deny   | allow |
/// | manage users              | deny   | allow |
///
/// An absent identity denies everything. No I/O, no panics.
pub fn can_perform(identity: Option<&Identity>, action: Action) -> bool {
    let Some(identity) = identity else {
        return false;
    };

    match action {
        Action::ViewSupplierList | Action::ViewSupplierDetail => true,
        Action::MutateSupplierStatus | Action::ManageUsers => identity.role.is_admin(),
    }
}

/// Same policy as [`can_perform`], with a reportable reason: absent identity
/// maps to [`AuthzError::LoginRequired`] so the caller knows to redirect.
pub fn authorize(identity: Option<&Identity>, action: Action) -> Result<(), AuthzError> {
    match identity {
        None => Err(AuthzError::LoginRequired),
        Some(_) if can_perform(identity, action) => Ok(()),
        Some(_) => Err(AuthzError::Forbidden(action.as_str())),
    }
}
