//! Group hierarchy: groups, sub-groups, cross-account invitations, group
//! fields and memberships.

use std::collections::HashSet;

use anyhow::anyhow;
use tracing::{debug, info, warn};
use uuid::Uuid;

use roster_db::Connection;
use roster_db::models::{GroupRow, MemberRow};
use roster_db::queries::groups::GroupDeletion;
use roster_db::queries::{fields, groups, members, metas, users};
use roster_types::api::{GroupUpdate, GroupsFilter, NewGroupRequest, UsersFilter};
use roster_types::models::{
    EntityClass, Field, Group, GroupMember, GroupOwner, MemberType, Metas, User,
};

use crate::access::{can_manage_members, require_account_admin};
use crate::attributes::validate_names;
use crate::error::{Result, RosterError};
use crate::{Roster, parse_sort};

/// Ids of the ancestors of `id`, nearest first.
///
/// Fails with `NotFound` when `id` itself does not exist, and with a storage
/// error when the chain loops or is longer than `max_depth`.
fn ancestors(conn: &Connection, id: Uuid, max_depth: usize) -> Result<Vec<Uuid>> {
    let mut seen = HashSet::from([id]);
    let mut chain = Vec::new();
    let mut current = groups::parent_of(conn, id)?
        .ok_or_else(|| RosterError::not_found("group", id))?;

    while let Some(parent) = current {
        if !seen.insert(parent) {
            return Err(anyhow!("group({id}) has a cyclic parent chain").into());
        }
        if chain.len() >= max_depth {
            return Err(anyhow!("group({id}) is nested deeper than {max_depth} levels").into());
        }
        chain.push(parent);
        current = groups::parent_of(conn, parent)?
            .ok_or_else(|| anyhow!("parent group({parent}) of group({id}) does not exist"))?;
    }
    Ok(chain)
}

fn group_data(conn: &Connection, id: Uuid) -> Result<Metas> {
    Ok(metas::get(conn, EntityClass::Groups, &id.to_string())?)
}

/// A group with its data and the whole parent chain resolved.
fn load_group(conn: &Connection, id: Uuid, max_depth: usize) -> Result<Group> {
    let row = groups::get(conn, id)?.ok_or_else(|| RosterError::not_found("group", id))?;

    let mut parent: Option<Group> = None;
    for ancestor_id in ancestors(conn, id, max_depth)?.into_iter().rev() {
        let ancestor = groups::get(conn, ancestor_id)?
            .ok_or_else(|| anyhow!("parent group({ancestor_id}) disappeared"))?;
        let data = group_data(conn, ancestor_id)?;
        parent = Some(ancestor.into_group(parent, data));
    }

    let data = group_data(conn, id)?;
    Ok(row.into_group(parent, data))
}

fn trimmed_description(description: Option<&str>) -> Option<String> {
    description
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(str::to_string)
}

/// A group row together with the admin to notify when it is an invitation.
struct PreparedGroup {
    row: GroupRow,
    invitee: Option<User>,
}

impl Roster {
    /// Creates a group in the actor's account, or, when `req.account_id`
    /// names another account, an invitation for that account to create a
    /// sub-group of one of the actor's groups.
    pub fn add_group(&self, actor: &User, req: &NewGroupRequest) -> Result<Group> {
        require_account_admin(actor)?;
        validate_names(req.data.keys())?;

        let max_depth = self.config.max_group_depth;
        let prepared = self.db.with_tx(|tx| -> Result<PreparedGroup> {
            let prepared = match req.account_id {
                Some(account_id) => prepare_invitation(tx, actor, account_id, req)?,
                None => prepare_group(tx, actor, req)?,
            };
            if let Some(parent_id) = prepared.row.parent_group_id {
                if ancestors(tx, parent_id, max_depth)?.len() + 1 > max_depth {
                    return Err(RosterError::validation(format!(
                        "group({parent_id}) cannot have sub-groups: nesting is limited to {max_depth} levels"
                    )));
                }
            }
            groups::insert(tx, &prepared.row)?;
            if !req.data.is_empty() {
                metas::set(tx, EntityClass::Groups, &prepared.row.id.to_string(), &req.data)?;
            }
            Ok(prepared)
        })?;

        let group = self.get_group(prepared.row.id)?;
        info!(
            "Group \"{}\"({}) created in account \"{}\"",
            group.name, group.id, group.account.name
        );

        if let Some(invitee) = prepared.invitee {
            let text = format!("You are invited to create a new group inside {}", group.name);
            match self.send_message(actor.id, Some(invitee.id), &text) {
                Ok(message_id) => debug!("Sent invitation message {}", message_id),
                Err(e) => warn!(
                    "Failed to send invitation for group({}) to \"{}\": {}",
                    group.id, invitee.username, e
                ),
            }
        }
        Ok(group)
    }

    pub fn get_group(&self, id: Uuid) -> Result<Group> {
        let max_depth = self.config.max_group_depth;
        self.db.with_conn(|conn| load_group(conn, id, max_depth))
    }

    /// Groups with their account; parents and data are not resolved.
    pub fn get_groups(&self, filter: &GroupsFilter, sort: &str, limit: u32) -> Result<Vec<Group>> {
        debug!("GetGroups(filter: {:?}, sort: {:?}, limit: {})", filter, sort, limit);
        let sort = parse_sort(sort, groups::SORT_KEYS)?;
        let rows = self
            .db
            .with_conn(|conn| groups::list(conn, filter, &sort, limit))?;
        Ok(rows
            .into_iter()
            .map(|row| row.into_group(None, Metas::new()))
            .collect())
    }

    /// Replaces name and description and patches the data: `None` values
    /// delete a key, others are upserted, unmentioned keys stay.
    pub fn upd_group(&self, actor: &User, id: Uuid, update: &GroupUpdate) -> Result<Group> {
        require_account_admin(actor)?;
        let name = update.name.trim();
        if name.is_empty() {
            return Err(RosterError::validation("missing name"));
        }
        validate_names(update.data.keys())?;
        let description = trimmed_description(update.description.as_deref());

        let mut to_delete = Vec::new();
        let mut to_set = Metas::new();
        for (key, value) in &update.data {
            match value {
                Some(value) => {
                    to_set.insert(key.clone(), value.clone());
                }
                None => to_delete.push(key.clone()),
            }
        }

        self.db.with_tx(|tx| -> Result<()> {
            let row = groups::get(tx, id)?.ok_or_else(|| RosterError::not_found("group", id))?;
            if row.account.id != actor.account.id {
                return Err(RosterError::unauthorized("group does not belong to you"));
            }
            groups::update(tx, actor.account.id, id, name, description.as_deref())?;

            let key = id.to_string();
            if !to_delete.is_empty() {
                metas::delete(tx, EntityClass::Groups, &key, &to_delete)?;
            }
            if !to_set.is_empty() {
                metas::set(tx, EntityClass::Groups, &key, &to_set)?;
            }
            Ok(())
        })?;

        info!("Group({}) updated", id);
        self.get_group(id)
    }

    /// Deletes one of the actor's own groups together with its data, fields
    /// and the memberships it holds in other groups. Unless exactly one row
    /// is removed the delete is a conflict, so an unknown id and another
    /// account's id fail the same way.
    pub fn del_group(&self, actor: &User, id: Uuid) -> Result<()> {
        require_account_admin(actor)?;
        self.db.with_tx(|tx| -> Result<()> {
            match groups::delete(tx, actor.account.id, id)? {
                GroupDeletion::HasChildren => {
                    return Err(RosterError::conflict(format!(
                        "group({id}) still has sub-groups"
                    )));
                }
                GroupDeletion::Removed(1) => {}
                GroupDeletion::Removed(n) => {
                    return Err(RosterError::conflict(format!(
                        "deleted {n} groups with id {id} in your account instead of 1"
                    )));
                }
            }
            let key = id.to_string();
            metas::delete_all(tx, EntityClass::Groups, &key)?;
            fields::delete_all(tx, EntityClass::Groups, &key)?;
            members::delete_member_everywhere(tx, MemberType::Group.as_str(), id)?;
            Ok(())
        })?;
        info!("Group({}) deleted", id);
        Ok(())
    }

    // -- Fields --

    /// The group's field descriptors, optionally preceded by those of its
    /// ancestors, outermost first.
    pub fn get_group_fields(&self, id: Uuid, include_parent_fields: bool) -> Result<Vec<Field>> {
        let max_depth = self.config.max_group_depth;
        self.db.with_conn(|conn| -> Result<Vec<Field>> {
            let lineage = if include_parent_fields {
                ancestors(conn, id, max_depth)?
            } else {
                if groups::parent_of(conn, id)?.is_none() {
                    return Err(RosterError::not_found("group", id));
                }
                Vec::new()
            };

            let mut result = Vec::new();
            for group_id in lineage.into_iter().rev().chain(std::iter::once(id)) {
                result.extend(fields::get(conn, EntityClass::Groups, &group_id.to_string())?);
            }
            Ok(result)
        })
    }

    pub fn set_group_fields(&self, actor: &User, id: Uuid, values: &[Field]) -> Result<()> {
        self.require_own_group(actor, id)?;
        self.set_fields(EntityClass::Groups, &id.to_string(), values)
    }

    pub fn del_group_fields(&self, actor: &User, id: Uuid, names: &[String]) -> Result<()> {
        self.require_own_group(actor, id)?;
        self.del_fields(EntityClass::Groups, &id.to_string(), names)
    }

    fn require_own_group(&self, actor: &User, id: Uuid) -> Result<()> {
        require_account_admin(actor)?;
        let row = self
            .db
            .with_conn(|conn| groups::get(conn, id))?
            .ok_or_else(|| RosterError::not_found("group", id))?;
        if row.account.id != actor.account.id {
            return Err(RosterError::unauthorized("group does not belong to you"));
        }
        Ok(())
    }

    // -- Members --

    /// Adds a user or a group of the group's own account.
    pub fn add_group_member(
        &self,
        actor: &User,
        group_id: Uuid,
        member_type: MemberType,
        member_id: Uuid,
    ) -> Result<GroupMember> {
        let max_depth = self.config.max_group_depth;
        let member = self.db.with_tx(|tx| -> Result<GroupMember> {
            let group = load_group(tx, group_id, max_depth)?;
            if !can_manage_members(&group.owner, actor) {
                return Err(RosterError::unauthorized(
                    "not allowed to manage members of this group",
                ));
            }

            let member_account = match member_type {
                MemberType::User => users::account_of(tx, member_id)?,
                MemberType::Group => groups::get(tx, member_id)?.map(|g| g.account.id),
            };
            let member_account = member_account
                .ok_or_else(|| RosterError::not_found(member_type.as_str(), member_id))?;
            if member_account != group.account.id {
                return Err(RosterError::unauthorized(format!(
                    "cannot add {member_type} from other account"
                )));
            }
            if member_type == MemberType::Group && member_id == group_id {
                return Err(RosterError::validation("a group cannot be a member of itself"));
            }
            if members::exists(tx, group_id, member_type.as_str(), member_id)? {
                return Err(RosterError::conflict(format!(
                    "{member_type}({member_id}) is already a member"
                )));
            }

            let row = MemberRow {
                id: Uuid::new_v4(),
                group_id,
                member_type: member_type.as_str().to_string(),
                member_id,
            };
            members::insert(tx, &row)?;
            Ok(GroupMember {
                id: row.id,
                group,
                member_type,
                member_id,
            })
        })?;
        info!(
            "Added {}({}) to group({})",
            member.member_type, member.member_id, group_id
        );
        Ok(member)
    }

    pub fn get_group_members(
        &self,
        actor: &User,
        group_id: Uuid,
        limit: u32,
    ) -> Result<Vec<GroupMember>> {
        let max_depth = self.config.max_group_depth;
        self.db.with_conn(|conn| -> Result<Vec<GroupMember>> {
            let group = load_group(conn, group_id, max_depth)?;
            if !can_manage_members(&group.owner, actor) {
                return Err(RosterError::unauthorized(
                    "not allowed to list members of this group",
                ));
            }
            members::list(conn, group_id, limit)?
                .into_iter()
                .map(|row| -> Result<GroupMember> {
                    let member_type = row
                        .member_type
                        .parse::<MemberType>()
                        .map_err(|e| anyhow!("group_members row {}: {}", row.id, e))?;
                    Ok(GroupMember {
                        id: row.id,
                        group: group.clone(),
                        member_type,
                        member_id: row.member_id,
                    })
                })
                .collect()
        })
    }

    pub fn del_group_member(
        &self,
        actor: &User,
        group_id: Uuid,
        member_type: MemberType,
        member_id: Uuid,
    ) -> Result<()> {
        self.db.with_conn(|conn| -> Result<()> {
            let row = groups::get(conn, group_id)?
                .ok_or_else(|| RosterError::not_found("group", group_id))?;
            let owner = GroupOwner::from_parts(&row.owner_type, &row.owner_id);
            if !can_manage_members(&owner, actor) {
                return Err(RosterError::unauthorized(
                    "not allowed to manage members of this group",
                ));
            }
            if members::delete(conn, group_id, member_type.as_str(), member_id)? == 0 {
                return Err(RosterError::not_found("group member", member_id));
            }
            Ok(())
        })?;
        info!("Removed {}({}) from group({})", member_type, member_id, group_id);
        Ok(())
    }
}

/// A group or sub-group in the actor's own account.
fn prepare_group(conn: &Connection, actor: &User, req: &NewGroupRequest) -> Result<PreparedGroup> {
    let name = req.name.trim();
    if name.is_empty() {
        return Err(RosterError::validation("missing name"));
    }
    if let Some(parent_id) = req.parent_group_id {
        if groups::get_in_account(conn, actor.account.id, parent_id)?.is_none() {
            return Err(RosterError::not_found("group", parent_id));
        }
    }
    let owner = match req.owner_user_id {
        Some(user_id) => {
            if users::account_of(conn, user_id)? != Some(actor.account.id) {
                return Err(RosterError::validation(format!(
                    "owner user({user_id}) is not in your account"
                )));
            }
            GroupOwner::User(user_id)
        }
        None => GroupOwner::Account(actor.account.id),
    };

    Ok(PreparedGroup {
        row: GroupRow {
            id: Uuid::new_v4(),
            account: actor.account.clone(),
            parent_group_id: req.parent_group_id,
            name: name.to_string(),
            description: trimmed_description(req.description.as_deref()),
            invitation: false,
            owner_type: owner.owner_type().to_string(),
            owner_id: owner.owner_id(),
        },
        invitee: None,
    })
}

/// A group stored under `account_id`, nested in one of the actor's groups
/// whose name and description it copies.
fn prepare_invitation(
    conn: &Connection,
    actor: &User,
    account_id: Uuid,
    req: &NewGroupRequest,
) -> Result<PreparedGroup> {
    if !req.name.is_empty() || req.description.as_deref().is_some_and(|d| !d.is_empty()) {
        return Err(RosterError::validation(
            "name and description specified for sub group invitation",
        ));
    }
    if req.owner_user_id.is_some() {
        return Err(RosterError::validation(
            "owner_user_id cannot be set for sub group invitation",
        ));
    }
    let parent_id = req.parent_group_id.ok_or_else(|| {
        RosterError::validation("parent_group_id required for sub group invitation")
    })?;
    if account_id == actor.account.id {
        return Err(RosterError::validation(
            "account_id must be different from your own",
        ));
    }

    let account = roster_db::queries::accounts::get(conn, account_id)?
        .ok_or_else(|| RosterError::not_found("account", account_id))?;
    let filter = UsersFilter {
        account_id: Some(account_id),
        admin: Some(true),
        ..Default::default()
    };
    let invitee = users::list(conn, &filter, &[], 1)?
        .into_iter()
        .next()
        .ok_or_else(|| RosterError::not_found("admin user of account", account_id))?;
    let parent = groups::get_in_account(conn, actor.account.id, parent_id)?
        .ok_or_else(|| RosterError::not_found("group", parent_id))?;

    Ok(PreparedGroup {
        row: GroupRow {
            id: Uuid::new_v4(),
            parent_group_id: Some(parent.id),
            name: parent.name,
            description: parent.description,
            invitation: true,
            owner_type: GroupOwner::Account(account.id).owner_type().to_string(),
            owner_id: account.id.to_string(),
            account,
        },
        invitee: Some(invitee.into_user(None)),
    })
}
