//! Accounts, users and sessions.

use chrono::{DateTime, Utc};
use tracing::{debug, info};
use uuid::Uuid;

use roster_db::Connection;
use roster_db::SYSTEM_ACCOUNT_ID;
use roster_db::models::{SessionRow, UserRow};
use roster_db::queries::{accounts, persons, sessions, users};
use roster_types::api::{
    AccountSecret, AccountsFilter, NewAccountRequest, NewAccountResponse, NewUserRequest,
    UsersFilter,
};
use roster_types::models::{Account, Session, User};

use crate::access::{can_change_password, require_system_admin, require_tenant_admin};
use crate::error::{Result, RosterError};
use crate::password::{self, valid_email};
use crate::{Roster, parse_sort};

/// Everything needed to create a user in an existing account.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub account_id: Uuid,
    pub username: String,
    pub password: String,
    pub admin: bool,
    pub active: bool,
    pub expiry: Option<DateTime<Utc>>,
    pub person_id: Option<Uuid>,
}

/// Validates `new` and inserts it into `account`. Usernames are unique
/// across all accounts.
pub(crate) fn insert_user(conn: &Connection, account: &Account, new: &NewUser) -> Result<UserRow> {
    let username = new.username.trim();
    if username.is_empty() {
        return Err(RosterError::validation("missing username"));
    }
    if new.password.is_empty() {
        return Err(RosterError::validation("missing password"));
    }
    if users::get_by_username(conn, username)?.is_some() {
        return Err(RosterError::conflict(format!(
            "username \"{username}\" is already taken"
        )));
    }

    let id = Uuid::new_v4();
    let row = UserRow {
        id,
        account: account.clone(),
        username: username.to_string(),
        passhash: password::hash(id, account.id, &new.password),
        admin: new.admin,
        active: new.active,
        expiry: new.expiry,
        person_id: new.person_id,
    };
    users::insert(conn, &row)?;
    Ok(row)
}

fn load_user(conn: &Connection, row: UserRow) -> Result<User> {
    let person = match row.person_id {
        Some(person_id) => persons::get(conn, person_id)?,
        None => None,
    };
    Ok(row.into_user(person))
}

fn into_session(row: SessionRow) -> Session {
    Session {
        token: row.token,
        user: row.user.into_user(None),
        time_created: row.time_created,
        time_updated: row.time_updated,
    }
}

fn expired(expiry: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    expiry.is_some_and(|t| t < now)
}

impl Roster {
    // -- Accounts --

    /// Creates a tenant account and its admin user.
    ///
    /// Without an admin email the admin is `<name>.admin`, active, and the
    /// secret is its generated password. With one, the admin is named after
    /// the address, starts inactive, and the secret is an activation token.
    pub fn add_account(&self, actor: &User, req: &NewAccountRequest) -> Result<NewAccountResponse> {
        require_system_admin(actor)?;

        let name = req.name.trim();
        if name.is_empty() {
            return Err(RosterError::validation("missing name"));
        }
        let admin_email = req
            .admin_email
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty());
        if let Some(email) = admin_email {
            if !valid_email(email) {
                return Err(RosterError::validation(format!("invalid email \"{email}\"")));
            }
        }

        let password = password::random_password(self.config.generated_password_length);
        let admin_user = self.db.with_tx(|tx| -> Result<UserRow> {
            if accounts::get_by_name(tx, name)?.is_some() {
                return Err(RosterError::conflict(format!(
                    "account \"{name}\" already exists"
                )));
            }
            let account = Account {
                id: Uuid::new_v4(),
                name: name.to_string(),
                active: true,
                admin: false,
                expiry: None,
            };
            accounts::insert(tx, &account)?;

            let username = match admin_email {
                Some(email) => email.to_string(),
                None => format!("{name}.admin"),
            };
            insert_user(
                tx,
                &account,
                &NewUser {
                    account_id: account.id,
                    username,
                    password: password.clone(),
                    admin: true,
                    active: admin_email.is_none(),
                    expiry: None,
                    person_id: None,
                },
            )
        })?;

        info!(
            "Account \"{}\" created with admin user \"{}\"",
            admin_user.account.name, admin_user.username
        );
        let secret = match admin_email {
            Some(_) => AccountSecret::ActivationToken(admin_user.passhash.clone()),
            None => AccountSecret::AdminPassword(password),
        };
        Ok(NewAccountResponse {
            admin_user: admin_user.into_user(None),
            secret,
        })
    }

    pub fn get_account(&self, id: Uuid) -> Result<Account> {
        self.db
            .with_conn(|conn| accounts::get(conn, id))?
            .ok_or_else(|| RosterError::not_found("account", id))
    }

    pub fn get_account_by_name(&self, name: &str) -> Result<Account> {
        self.db
            .with_conn(|conn| accounts::get_by_name(conn, name))?
            .ok_or_else(|| RosterError::not_found("account", name))
    }

    /// Non-system users only ever see their own account, and only while it
    /// is active.
    pub fn get_accounts(
        &self,
        actor: &User,
        filter: &AccountsFilter,
        sort: &str,
        limit: u32,
    ) -> Result<Vec<Account>> {
        debug!("GetAccounts(filter: {:?}, sort: {:?}, limit: {})", filter, sort, limit);
        let sort = parse_sort(sort, accounts::SORT_KEYS)?;
        let mut filter = filter.clone();
        if !actor.is_system_admin() {
            filter.id = Some(actor.account.id);
            filter.active = Some(true);
            filter.admin = Some(false);
        }
        Ok(self
            .db
            .with_conn(|conn| accounts::list(conn, &filter, &sort, limit))?)
    }

    pub fn set_account_active(&self, actor: &User, id: Uuid, active: bool) -> Result<Account> {
        require_system_admin(actor)?;
        if id == SYSTEM_ACCOUNT_ID && !active {
            return Err(RosterError::conflict("the system account cannot be deactivated"));
        }
        let account = self.db.with_conn(|conn| -> Result<Option<Account>> {
            if accounts::set_active(conn, id, active)? == 0 {
                return Ok(None);
            }
            Ok(accounts::get(conn, id)?)
        })?;
        let account = account.ok_or_else(|| RosterError::not_found("account", id))?;
        info!(
            "Account \"{}\" {}",
            account.name,
            if active { "activated" } else { "deactivated" }
        );
        Ok(account)
    }

    // -- Users --

    pub fn add_user(&self, new: &NewUser) -> Result<User> {
        if new.account_id.is_nil() {
            return Err(RosterError::validation("missing account id"));
        }
        let user = self.db.with_tx(|tx| -> Result<User> {
            let account = accounts::get(tx, new.account_id)?
                .ok_or_else(|| RosterError::not_found("account", new.account_id))?;
            let row = insert_user(tx, &account, new)?;
            load_user(tx, row)
        })?;
        info!(
            "User \"{}\" added to account \"{}\"",
            user.username, user.account.name
        );
        Ok(user)
    }

    /// A tenant admin adds an active, non-admin user to their own account.
    pub fn create_account_user(&self, actor: &User, req: &NewUserRequest) -> Result<User> {
        require_tenant_admin(actor)?;
        self.add_user(&NewUser {
            account_id: actor.account.id,
            username: req.username.clone(),
            password: req.password.clone(),
            admin: false,
            active: true,
            expiry: None,
            person_id: None,
        })
    }

    /// `scope` restricts the lookup to one account; system callers pass `None`.
    pub fn get_user(&self, scope: Option<Uuid>, id: Uuid) -> Result<User> {
        self.db.with_conn(|conn| -> Result<User> {
            let row = match scope {
                Some(account_id) => users::get_in_account(conn, account_id, id)?,
                None => users::get(conn, id)?,
            };
            let row = row.ok_or_else(|| RosterError::not_found("user", id))?;
            load_user(conn, row)
        })
    }

    /// Users visible to `actor`: everyone for the system administrator,
    /// otherwise the actor's own account.
    pub fn get_users(
        &self,
        actor: &User,
        filter: &UsersFilter,
        sort: &str,
        limit: u32,
    ) -> Result<Vec<User>> {
        debug!("GetUsers(filter: {:?}, sort: {:?}, limit: {})", filter, sort, limit);
        let sort = parse_sort(sort, users::SORT_KEYS)?;
        let mut filter = filter.clone();
        if !actor.is_system_admin() {
            filter.account_id = Some(actor.account.id);
        }
        let rows = self
            .db
            .with_conn(|conn| users::list(conn, &filter, &sort, limit))?;
        Ok(rows.into_iter().map(|row| row.into_user(None)).collect())
    }

    /// Sets a new password. The hash stays salted with the user's account.
    pub fn change_password(&self, user_id: Uuid, new_password: &str) -> Result<()> {
        if user_id.is_nil() {
            return Err(RosterError::validation("missing user id"));
        }
        if new_password.is_empty() {
            return Err(RosterError::validation("missing new password"));
        }

        self.db.with_conn(|conn| -> Result<()> {
            let account_id = users::account_of(conn, user_id)?
                .ok_or_else(|| RosterError::not_found("user", user_id))?;
            users::set_passhash(conn, user_id, &password::hash(user_id, account_id, new_password))?;
            Ok(())
        })?;
        info!("Password changed for user({})", user_id);
        Ok(())
    }

    /// [`change_password`](Self::change_password) on behalf of `actor`.
    pub fn change_password_as(&self, actor: &User, user_id: Uuid, new_password: &str) -> Result<()> {
        let account_id = self
            .db
            .with_conn(|conn| users::account_of(conn, user_id))?
            .ok_or_else(|| RosterError::not_found("user", user_id))?;
        if !can_change_password(actor, user_id, account_id) {
            return Err(RosterError::unauthorized(
                "cannot change another user's password",
            ));
        }
        self.change_password(user_id, new_password)
    }

    /// Creates the system administrator if there is none yet. Returns whether
    /// a user was created.
    pub fn bootstrap_system_admin(&self, username: &str, password: &str) -> Result<bool> {
        let created = self.db.with_tx(|tx| -> Result<bool> {
            if users::system_admin_exists(tx)? {
                return Ok(false);
            }
            let account = accounts::get(tx, SYSTEM_ACCOUNT_ID)?
                .ok_or_else(|| RosterError::not_found("account", SYSTEM_ACCOUNT_ID))?;
            insert_user(
                tx,
                &account,
                &NewUser {
                    account_id: account.id,
                    username: username.to_string(),
                    password: password.to_string(),
                    admin: true,
                    active: true,
                    expiry: None,
                    person_id: None,
                },
            )?;
            Ok(true)
        })?;
        if created {
            info!("System administrator \"{}\" created", username);
        }
        Ok(created)
    }

    // -- Sessions --

    /// Checks the password, then account expiry, account active, user expiry
    /// and user active, in that order. Any earlier session of the user is
    /// replaced.
    pub fn login(&self, username: &str, password: &str) -> Result<Session> {
        if username.is_empty() {
            return Err(RosterError::validation("missing username"));
        }
        if password.is_empty() {
            return Err(RosterError::validation("missing password"));
        }

        let session = self.db.with_tx(|tx| -> Result<Session> {
            let row = users::get_by_username(tx, username)?
                .ok_or_else(|| RosterError::Authentication("wrong password".into()))?;
            if row.passhash != password::hash(row.id, row.account.id, password) {
                debug!("Login user({}): wrong password", username);
                return Err(RosterError::Authentication("wrong password".into()));
            }

            let now = Utc::now();
            if expired(row.account.expiry, now) {
                return Err(RosterError::Authentication(format!(
                    "account {} expired",
                    row.account.name
                )));
            }
            if !row.account.active {
                return Err(RosterError::Authentication("account suspended".into()));
            }
            if expired(row.expiry, now) {
                return Err(RosterError::Authentication(format!(
                    "user({username}) login expired"
                )));
            }
            if !row.active {
                return Err(RosterError::Authentication(format!(
                    "user({username}) suspended"
                )));
            }

            sessions::delete_for_user(tx, row.id)?;
            let token = Uuid::new_v4().to_string();
            sessions::insert(tx, &token, row.id, row.account.id, now)?;
            Ok(Session {
                token,
                user: row.into_user(None),
                time_created: now,
                time_updated: now,
            })
        })?;

        info!("User \"{}\" logged in", session.user.username);
        Ok(session)
    }

    /// Deleting an unknown token is not an error.
    pub fn logout(&self, token: &str) -> Result<()> {
        let removed = self.db.with_conn(|conn| sessions::delete(conn, token))?;
        debug!("Logout removed {} session(s)", removed);
        Ok(())
    }

    /// Resolves a bearer token and refreshes its `time_updated`.
    pub fn get_session(&self, token: &str) -> Result<Session> {
        if token.is_empty() {
            return Err(RosterError::validation("missing token"));
        }
        self.db.with_conn(|conn| -> Result<Session> {
            let now = Utc::now();
            let mut row = sessions::get(conn, token)?
                .ok_or_else(|| RosterError::not_found("session", "token"))?;
            sessions::touch(conn, token, now)?;
            row.time_updated = now;
            Ok(into_session(row))
        })
    }
}
