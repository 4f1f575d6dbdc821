mod common;

use common::{SYSADMIN, SYSADMIN_PASSWORD, member, roster, sysadmin, tenant};
use roster_core::{ErrorKind, NewUser, password};
use roster_db::SYSTEM_ACCOUNT_ID;
use roster_types::api::{
    AccountSecret, AccountsFilter, ActivateRequest, NewAccountRequest, NewUserRequest, UsersFilter,
};

#[test]
fn login_then_session_and_last_login_wins() {
    let roster = roster();
    let first = roster.login(SYSADMIN, SYSADMIN_PASSWORD).unwrap();

    let session = roster.get_session(&first.token).unwrap();
    assert_eq!(session.user.id, first.user.id);
    assert!(session.user.is_system_admin());
    assert!(session.time_updated >= session.time_created);

    let second = roster.login(SYSADMIN, SYSADMIN_PASSWORD).unwrap();
    assert_ne!(first.token, second.token);
    assert_eq!(
        roster.get_session(&first.token).unwrap_err().kind(),
        ErrorKind::NotFound
    );
    assert!(roster.get_session(&second.token).is_ok());
}

#[test]
fn wrong_or_unknown_credentials_fail_authentication() {
    let roster = roster();
    assert_eq!(
        roster.login(SYSADMIN, "nope").unwrap_err().kind(),
        ErrorKind::Authentication
    );
    assert_eq!(
        roster.login("ghost", "whatever").unwrap_err().kind(),
        ErrorKind::Authentication
    );
    assert_eq!(
        roster.login("", "whatever").unwrap_err().kind(),
        ErrorKind::Validation
    );
}

#[test]
fn change_password_replaces_the_old_one() {
    let roster = roster();
    let (admin, _) = tenant(&roster, "acme");
    let user = member(&roster, &admin, "jan");

    roster.change_password(user.id, "brand-new-pass").unwrap();
    assert!(roster.login("jan", "brand-new-pass").is_ok());
    assert_eq!(
        roster.login("jan", "jan-password").unwrap_err().kind(),
        ErrorKind::Authentication
    );

    // only activation enforces the strength policy
    roster.change_password(user.id, "newpw1").unwrap();
    assert!(roster.login("jan", "newpw1").is_ok());

    assert_eq!(
        roster.change_password(user.id, "").unwrap_err().kind(),
        ErrorKind::Validation
    );
    assert_eq!(
        roster.change_password(uuid::Uuid::nil(), "whatever-pass").unwrap_err().kind(),
        ErrorKind::Validation
    );
}

#[test]
fn stored_hash_is_salted_with_user_and_account() {
    let roster = roster();
    let (admin, _) = tenant(&roster, "acme");
    let user = member(&roster, &admin, "jan");

    let row = roster
        .db()
        .with_conn(|conn| roster_db::queries::users::get(conn, user.id))
        .unwrap()
        .unwrap();
    assert_eq!(
        row.passhash,
        password::hash(user.id, admin.account.id, "jan-password")
    );
}

#[test]
fn password_changes_need_the_right_actor() {
    let roster = roster();
    let (admin, _) = tenant(&roster, "acme");
    let (other_admin, _) = tenant(&roster, "globex");
    let jan = member(&roster, &admin, "jan");
    let piet = member(&roster, &admin, "piet");

    roster.change_password_as(&jan, jan.id, "mine-to-change").unwrap();
    roster.change_password_as(&admin, jan.id, "admin-changed-it").unwrap();
    roster
        .change_password_as(&sysadmin(&roster), jan.id, "sysadmin-too")
        .unwrap();

    assert_eq!(
        roster
            .change_password_as(&piet, jan.id, "not-yours")
            .unwrap_err()
            .kind(),
        ErrorKind::Unauthorized
    );
    assert_eq!(
        roster
            .change_password_as(&other_admin, jan.id, "not-yours")
            .unwrap_err()
            .kind(),
        ErrorKind::Unauthorized
    );
}

#[test]
fn account_provisioning_scenario() {
    let roster = roster();
    let created = roster
        .add_account(
            &sysadmin(&roster),
            &NewAccountRequest {
                name: "test1".into(),
                admin_email: None,
            },
        )
        .unwrap();
    assert_eq!(created.admin_user.username, "test1.admin");
    assert!(created.admin_user.admin);
    assert!(created.admin_user.active);
    let AccountSecret::AdminPassword(password) = created.secret else {
        panic!("expected a generated password");
    };
    assert_eq!(password.chars().count(), 10);

    let session = roster.login("test1.admin", &password).unwrap();
    let one = roster
        .create_account_user(
            &session.user,
            &NewUserRequest {
                username: "one".into(),
                password: "one".into(),
            },
        )
        .unwrap();
    assert_eq!(one.account.name, "test1");
    assert!(one.active);
    assert!(!one.admin);

    roster.logout(&session.token).unwrap();
    assert_eq!(
        roster.get_session(&session.token).unwrap_err().kind(),
        ErrorKind::NotFound
    );
    // logging out twice is fine
    roster.logout(&session.token).unwrap();
}

#[test]
fn account_with_admin_email_needs_activation() {
    let roster = roster();
    let created = roster
        .add_account(
            &sysadmin(&roster),
            &NewAccountRequest {
                name: "initech".into(),
                admin_email: Some("boss@initech.com".into()),
            },
        )
        .unwrap();
    assert_eq!(created.admin_user.username, "boss@initech.com");
    assert!(!created.admin_user.active);
    let AccountSecret::ActivationToken(token) = created.secret else {
        panic!("expected an activation token");
    };

    let user = roster
        .activate_user(&ActivateRequest {
            email: "boss@initech.com".into(),
            token,
            new_password: "chosen-password".into(),
        })
        .unwrap();
    assert!(user.active);
    assert!(roster.login("boss@initech.com", "chosen-password").is_ok());
}

#[test]
fn account_creation_rules() {
    let roster = roster();
    let system = sysadmin(&roster);
    let (tenant_admin, _) = tenant(&roster, "acme");

    let request = |name: &str, email: Option<&str>| NewAccountRequest {
        name: name.into(),
        admin_email: email.map(str::to_string),
    };
    assert_eq!(
        roster
            .add_account(&tenant_admin, &request("sneaky", None))
            .unwrap_err()
            .kind(),
        ErrorKind::Unauthorized
    );
    assert_eq!(
        roster.add_account(&system, &request("  ", None)).unwrap_err().kind(),
        ErrorKind::Validation
    );
    assert_eq!(
        roster
            .add_account(&system, &request("bad", Some("not-an-email")))
            .unwrap_err()
            .kind(),
        ErrorKind::Validation
    );
    assert_eq!(
        roster.add_account(&system, &request("acme", None)).unwrap_err().kind(),
        ErrorKind::Conflict
    );
}

#[test]
fn failed_account_creation_leaves_no_account_behind() {
    let roster = roster();
    let system = sysadmin(&roster);
    let (admin, _) = tenant(&roster, "acme");
    member(&roster, &admin, "taken@example.com");

    let err = roster
        .add_account(
            &system,
            &NewAccountRequest {
                name: "late".into(),
                admin_email: Some("taken@example.com".into()),
            },
        )
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert_eq!(
        roster.get_account_by_name("late").unwrap_err().kind(),
        ErrorKind::NotFound
    );
}

#[test]
fn inactive_account_cannot_log_in() {
    let roster = roster();
    let (admin, password) = tenant(&roster, "acme");
    let system = sysadmin(&roster);

    let account = roster
        .set_account_active(&system, admin.account.id, false)
        .unwrap();
    assert!(!account.active);
    let err = roster.login(&admin.username, &password).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Authentication);
    assert!(err.to_string().contains("suspended"));

    roster
        .set_account_active(&system, admin.account.id, true)
        .unwrap();
    assert!(roster.login(&admin.username, &password).is_ok());
}

#[test]
fn system_account_stays_active() {
    let roster = roster();
    let system = sysadmin(&roster);
    assert_eq!(
        roster
            .set_account_active(&system, SYSTEM_ACCOUNT_ID, false)
            .unwrap_err()
            .kind(),
        ErrorKind::Conflict
    );
    let (admin, _) = tenant(&roster, "acme");
    assert_eq!(
        roster
            .set_account_active(&admin, admin.account.id, false)
            .unwrap_err()
            .kind(),
        ErrorKind::Unauthorized
    );
}

#[test]
fn inactive_user_cannot_log_in() {
    let roster = roster();
    let (admin, _) = tenant(&roster, "acme");
    roster
        .add_user(&NewUser {
            account_id: admin.account.id,
            username: "dormant".into(),
            password: "dormant-pass".into(),
            admin: false,
            active: false,
            expiry: None,
            person_id: None,
        })
        .unwrap();
    let err = roster.login("dormant", "dormant-pass").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Authentication);
}

#[test]
fn expired_user_cannot_log_in() {
    let roster = roster();
    let (admin, _) = tenant(&roster, "acme");
    roster
        .add_user(&NewUser {
            account_id: admin.account.id,
            username: "temp".into(),
            password: "temp-pass".into(),
            admin: false,
            active: true,
            expiry: Some(chrono::Utc::now() - chrono::Duration::days(1)),
            person_id: None,
        })
        .unwrap();
    let err = roster.login("temp", "temp-pass").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Authentication);
    assert!(err.to_string().contains("expired"));
}

#[test]
fn usernames_are_unique_across_accounts() {
    let roster = roster();
    let (acme, _) = tenant(&roster, "acme");
    let (globex, _) = tenant(&roster, "globex");
    member(&roster, &acme, "sam");

    let err = roster
        .create_account_user(
            &globex,
            &NewUserRequest {
                username: "sam".into(),
                password: "other-sam".into(),
            },
        )
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
}

#[test]
fn only_tenant_admins_create_account_users() {
    let roster = roster();
    let (admin, _) = tenant(&roster, "acme");
    let jan = member(&roster, &admin, "jan");
    let request = NewUserRequest {
        username: "extra".into(),
        password: "extra-pass".into(),
    };

    assert_eq!(
        roster.create_account_user(&jan, &request).unwrap_err().kind(),
        ErrorKind::Unauthorized
    );
    assert_eq!(
        roster
            .create_account_user(&sysadmin(&roster), &request)
            .unwrap_err()
            .kind(),
        ErrorKind::Unauthorized
    );
}

#[test]
fn listings_are_scoped_to_the_callers_account() {
    let roster = roster();
    let (acme, _) = tenant(&roster, "acme");
    let (globex, _) = tenant(&roster, "globex");
    member(&roster, &acme, "jan");
    member(&roster, &globex, "hank");

    let accounts = roster
        .get_accounts(&acme, &AccountsFilter::default(), "", 0)
        .unwrap();
    assert_eq!(accounts.len(), 1);
    assert_eq!(accounts[0].id, acme.account.id);

    let everyone = roster
        .get_accounts(&sysadmin(&roster), &AccountsFilter::default(), "name", 0)
        .unwrap();
    let names: Vec<&str> = everyone.iter().map(|a| a.name.as_str()).collect();
    assert_eq!(names, ["acme", "globex", "public", "system"]);

    // asking for another account is silently narrowed to your own
    let filter = UsersFilter {
        account_id: Some(globex.account.id),
        ..Default::default()
    };
    let users = roster.get_users(&acme, &filter, "username", 0).unwrap();
    let usernames: Vec<&str> = users.iter().map(|u| u.username.as_str()).collect();
    assert_eq!(usernames, ["acme.admin", "jan"]);

    let users = roster
        .get_users(&sysadmin(&roster), &filter, "-username", 0)
        .unwrap();
    let usernames: Vec<&str> = users.iter().map(|u| u.username.as_str()).collect();
    assert_eq!(usernames, ["hank", "globex.admin"]);

    assert_eq!(
        roster
            .get_users(&acme, &UsersFilter::default(), "passhash", 0)
            .unwrap_err()
            .kind(),
        ErrorKind::Validation
    );
}

#[test]
fn get_user_respects_scope() {
    let roster = roster();
    let (acme, _) = tenant(&roster, "acme");
    let (globex, _) = tenant(&roster, "globex");
    let jan = member(&roster, &acme, "jan");

    assert_eq!(roster.get_user(Some(acme.account.id), jan.id).unwrap().id, jan.id);
    assert_eq!(roster.get_user(None, jan.id).unwrap().id, jan.id);
    assert_eq!(
        roster
            .get_user(Some(globex.account.id), jan.id)
            .unwrap_err()
            .kind(),
        ErrorKind::NotFound
    );
}

#[test]
fn bootstrap_is_idempotent() {
    let roster = roster();
    assert!(!roster.bootstrap_system_admin("another", "password1").unwrap());
    assert_eq!(
        roster.login("another", "password1").unwrap_err().kind(),
        ErrorKind::Authentication
    );
}
