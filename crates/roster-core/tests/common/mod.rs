#![allow(dead_code)]

use roster_core::{Roster, RosterConfig};
use roster_db::Database;
use roster_types::api::{AccountSecret, NewAccountRequest, NewUserRequest};
use roster_types::models::User;

pub const SYSADMIN: &str = "admin";
pub const SYSADMIN_PASSWORD: &str = "s3cret-admin";

pub fn roster() -> Roster {
    let db = Database::open_in_memory().unwrap();
    let roster = Roster::new(db, RosterConfig::default());
    assert!(roster.bootstrap_system_admin(SYSADMIN, SYSADMIN_PASSWORD).unwrap());
    roster
}

pub fn sysadmin(roster: &Roster) -> User {
    roster.login(SYSADMIN, SYSADMIN_PASSWORD).unwrap().user
}

/// Creates an account and returns its logged-in admin with the password.
pub fn tenant(roster: &Roster, name: &str) -> (User, String) {
    let created = roster
        .add_account(
            &sysadmin(roster),
            &NewAccountRequest {
                name: name.into(),
                admin_email: None,
            },
        )
        .unwrap();
    let AccountSecret::AdminPassword(password) = created.secret else {
        panic!("expected a generated admin password");
    };
    let session = roster
        .login(&created.admin_user.username, &password)
        .unwrap();
    (session.user, password)
}

/// A regular user in the admin's account.
pub fn member(roster: &Roster, admin: &User, username: &str) -> User {
    roster
        .create_account_user(
            admin,
            &NewUserRequest {
                username: username.into(),
                password: format!("{username}-password"),
            },
        )
        .unwrap()
}
