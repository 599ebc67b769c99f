//! The authenticated party performing an operation.

use serde::{Deserialize, Serialize};

use crate::account::Role;
use crate::error::DomainError;
use crate::value_objects::AccountId;

/// An account acting in a given role.
///
/// Identity is established by the authentication collaborator; the domain only
/// checks that the role fits the operation and that the actor owns what it
/// touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: AccountId,
    pub role: Role,
}

impl Actor {
    /// Creates a new actor.
    pub fn new(id: AccountId, role: Role) -> Self {
        Self { id, role }
    }

    /// Shorthand for a supplier actor.
    pub fn supplier(id: AccountId) -> Self {
        Self::new(id, Role::Supplier)
    }

    /// Shorthand for a merchant actor.
    pub fn merchant(id: AccountId) -> Self {
        Self::new(id, Role::Merchant)
    }

    /// Shorthand for a shipping company actor.
    pub fn shipping_company(id: AccountId) -> Self {
        Self::new(id, Role::ShippingCompany)
    }

    /// Fails with `PermissionDenied` unless the actor has `role`.
    pub fn require(&self, role: Role) -> Result<(), DomainError> {
        if self.role == role {
            Ok(())
        } else {
            Err(DomainError::PermissionDenied(format!(
                "{} role required, acting as {}",
                role, self.role
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn require_accepts_matching_role() {
        let actor = Actor::merchant(AccountId::new());
        assert!(actor.require(Role::Merchant).is_ok());
    }

    #[test]
    fn require_rejects_other_roles() {
        let actor = Actor::shipping_company(AccountId::new());
        let err = actor.require(Role::Supplier).unwrap_err();
        assert!(matches!(err, DomainError::PermissionDenied(_)));
        assert!(err.to_string().contains("supplier role required"));
    }
}
