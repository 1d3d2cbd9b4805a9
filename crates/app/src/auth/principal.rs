//! Authenticated caller identity.

use crate::domain::users::records::{Role, UserUuid};

/// The user a request acts on behalf of, together with their role.
///
/// Services receive this explicitly; they never look the role up themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Principal {
    pub user: UserUuid,
    pub role: Role,
}

impl Principal {
    #[must_use]
    pub const fn new(user: UserUuid, role: Role) -> Self {
        Self { user, role }
    }

    /// Only consumers own carts and place orders.
    #[must_use]
    pub const fn is_consumer(&self) -> bool {
        matches!(self.role, Role::Consumer)
    }

    /// Staff and admins manage the catalog and every user's orders.
    #[must_use]
    pub const fn is_staff(&self) -> bool {
        matches!(self.role, Role::Staff | Role::Admin)
    }
}
