//! Authorization checks shared by the service operations.

use uuid::Uuid;

use roster_types::models::{GroupOwner, User};

use crate::error::{Result, RosterError};

pub fn require_system_admin(user: &User) -> Result<()> {
    if !user.is_system_admin() {
        return Err(RosterError::unauthorized("system administrator required"));
    }
    Ok(())
}

/// Admin of any account, the system account included.
pub fn require_account_admin(user: &User) -> Result<()> {
    if !user.admin {
        return Err(RosterError::unauthorized("user is not an account admin"));
    }
    Ok(())
}

pub fn require_tenant_admin(user: &User) -> Result<()> {
    if !user.is_tenant_admin() {
        return Err(RosterError::unauthorized("tenant administrator required"));
    }
    Ok(())
}

/// Whether `actor` may list, add or remove members of a group with `owner`.
/// Unknown owner kinds never grant anything.
pub fn can_manage_members(owner: &GroupOwner, actor: &User) -> bool {
    match owner {
        GroupOwner::User(id) => actor.id == *id,
        GroupOwner::Account(id) => actor.is_tenant_admin() && actor.account.id == *id,
        GroupOwner::Other { .. } => false,
    }
}

/// The user themselves, an admin of their account, or the system administrator.
pub fn can_change_password(actor: &User, user_id: Uuid, account_id: Uuid) -> bool {
    actor.id == user_id
        || actor.is_system_admin()
        || (actor.is_tenant_admin() && actor.account.id == account_id)
}
