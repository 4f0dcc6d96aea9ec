//! Authorization checks shared by catalog operations.

use ccg_rbac::{Action, Actor, Permission, ResourceKind};
use uuid::Uuid;

use crate::error::{CatalogError, CatalogResult};

/// Require a role-granted permission.
pub(crate) fn require(actor: &Actor, kind: ResourceKind, action: Action) -> CatalogResult<()> {
    let permission = Permission::new(kind, action);
    if actor.can(&permission) {
        Ok(())
    } else {
        Err(CatalogError::PermissionDenied(format!("missing permission {}", permission)))
    }
}

/// Require the Admin role or superuser capability.
pub(crate) fn require_admin(actor: &Actor, operation: &str) -> CatalogResult<()> {
    if actor.is_admin() {
        Ok(())
    } else {
        Err(CatalogError::PermissionDenied(format!("only administrators can {}", operation)))
    }
}

/// Require that the actor owns the resource.
pub(crate) fn require_owner(actor: &Actor, owner_id: Uuid, operation: &str) -> CatalogResult<()> {
    if actor.owns(owner_id) {
        Ok(())
    } else {
        Err(CatalogError::PermissionDenied(format!("only the owner can {}", operation)))
    }
}

/// Require ownership or admin capability.
pub(crate) fn require_owner_or_admin(actor: &Actor, owner_id: Uuid, operation: &str) -> CatalogResult<()> {
    if actor.owns(owner_id) || actor.is_admin() {
        Ok(())
    } else {
        Err(CatalogError::PermissionDenied(format!(
            "only the owner or an administrator can {}",
            operation
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ccg_rbac::Role;

    #[test]
    fn test_role_permissions() {
        let user = Actor::new(Uuid::now_v7()).with_role(Role::User);
        require(&user, ResourceKind::Resource, Action::Fork).unwrap();
        assert!(require(&user, ResourceKind::Resource, Action::Validate).is_err());

        let nobody = Actor::new(Uuid::now_v7());
        let err = require(&nobody, ResourceKind::Resource, Action::Create).unwrap_err();
        assert_eq!(err.to_string(), "Permission denied: missing permission resource:create");
    }

    #[test]
    fn test_admin_and_owner_checks() {
        let owner = Actor::new(Uuid::now_v7()).with_role(Role::User);
        let admin = Actor::new(Uuid::now_v7()).with_role(Role::Admin);
        let root = Actor::new(Uuid::now_v7()).superuser();

        assert!(require_admin(&owner, "validate resources").is_err());
        require_admin(&admin, "validate resources").unwrap();
        require_admin(&root, "validate resources").unwrap();

        require_owner(&owner, owner.id, "publish versions").unwrap();
        assert!(require_owner(&admin, owner.id, "publish versions").is_err());

        require_owner_or_admin(&admin, owner.id, "delete").unwrap();
        assert!(require_owner_or_admin(&Actor::new(Uuid::now_v7()), owner.id, "delete").is_err());
    }
}
