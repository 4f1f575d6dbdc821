mod common;

use chrono::NaiveDate;

use common::roster;
use roster_core::{ErrorKind, MinLength, Roster, RosterConfig};
use roster_db::{Database, PUBLIC_ACCOUNT_ID};
use roster_types::api::{ActivateRequest, RegisterRequest};
use roster_types::models::Gender;

fn request(email: &str) -> RegisterRequest {
    RegisterRequest {
        email: email.into(),
        phone: "+27 82 555 0100".into(),
        name: "Thandi".into(),
        surname: "Mokoena".into(),
        dob: NaiveDate::from_ymd_opt(1990, 4, 27),
        gender: Some(Gender::Female),
        country_id: "ZA".into(),
        national_id: "9004270000000".into(),
    }
}

#[test]
fn register_then_activate_then_login() {
    let roster = roster();
    let registered = roster.register(&request("thandi@example.com")).unwrap();
    assert_eq!(registered.email, "thandi@example.com");
    assert_eq!(registered.token.len(), 40);

    // not active yet
    assert_eq!(
        roster
            .login("thandi@example.com", &registered.token)
            .unwrap_err()
            .kind(),
        ErrorKind::Authentication
    );

    let user = roster
        .activate_user(&ActivateRequest {
            email: registered.email.clone(),
            token: registered.token.clone(),
            new_password: "my-own-password".into(),
        })
        .unwrap();
    assert!(user.active);
    assert_eq!(user.account.id, PUBLIC_ACCOUNT_ID);

    let session = roster
        .login("thandi@example.com", "my-own-password")
        .unwrap();
    let full = roster.get_user(None, session.user.id).unwrap();
    let person = full.person.expect("registered user has a person");
    assert_eq!(person.surname, "Mokoena");
    assert_eq!(person.nationalities.len(), 1);
    assert_eq!(person.nationalities[0].country.id, "ZA");

    // a token can only be redeemed once
    let err = roster
        .activate_user(&ActivateRequest {
            email: registered.email,
            token: registered.token,
            new_password: "another-password".into(),
        })
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn activation_enforces_the_password_policy() {
    let roster = roster();
    let registered = roster.register(&request("weak@example.com")).unwrap();
    let err = roster
        .activate_user(&ActivateRequest {
            email: registered.email.clone(),
            token: registered.token.clone(),
            new_password: "short".into(),
        })
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    let err = roster
        .activate_user(&ActivateRequest {
            email: registered.email,
            token: "not-the-token".into(),
            new_password: "long-enough-now".into(),
        })
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn password_policy_is_pluggable() {
    let roster = Roster::new(Database::open_in_memory().unwrap(), RosterConfig::default())
        .with_password_policy(MinLength(20));
    let registered = roster.register(&request("strict@example.com")).unwrap();
    let err = roster
        .activate_user(&ActivateRequest {
            email: registered.email,
            token: registered.token,
            new_password: "twelve-chars".into(),
        })
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[test]
fn registration_input_is_validated() {
    let roster = roster();
    let cases: Vec<(&str, Box<dyn Fn(&mut RegisterRequest)>)> = vec![
        ("name", Box::new(|r: &mut RegisterRequest| r.name = " ".into())),
        ("surname", Box::new(|r: &mut RegisterRequest| r.surname.clear())),
        ("gender", Box::new(|r: &mut RegisterRequest| r.gender = None)),
        ("email", Box::new(|r: &mut RegisterRequest| r.email = "not-an-email".into())),
        ("phone", Box::new(|r: &mut RegisterRequest| r.phone.clear())),
        ("dob missing", Box::new(|r: &mut RegisterRequest| r.dob = None)),
        ("dob too old", Box::new(|r: &mut RegisterRequest| r.dob = NaiveDate::from_ymd_opt(1899, 12, 31))),
        ("dob in future", Box::new(|r: &mut RegisterRequest| r.dob = NaiveDate::from_ymd_opt(3000, 1, 1))),
        ("country", Box::new(|r: &mut RegisterRequest| r.country_id.clear())),
        ("unknown country", Box::new(|r: &mut RegisterRequest| r.country_id = "Atlantis".into())),
        ("national id", Box::new(|r: &mut RegisterRequest| r.national_id.clear())),
    ];
    for (what, mutate) in cases {
        let mut req = request("case@example.com");
        mutate(&mut req);
        let err = roster.register(&req).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation, "{what}");
    }
}

#[test]
fn country_can_be_given_by_name() {
    let roster = roster();
    let mut req = request("named@example.com");
    req.country_id = "south africa".into();
    assert!(roster.register(&req).is_ok());
}

#[test]
fn same_identity_reuses_the_person() {
    let roster = roster();
    roster.register(&request("first@example.com")).unwrap();
    roster.register(&request("second@example.com")).unwrap();

    let persons = roster
        .get_persons(&Default::default(), "", 0)
        .unwrap();
    assert_eq!(persons.len(), 1);

    let err = roster.register(&request("first@example.com")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
}

#[test]
fn failed_registration_does_not_leave_a_person() {
    let roster = roster();
    roster.register(&request("taken@example.com")).unwrap();

    let mut other = request("taken@example.com");
    other.name = "Someone".into();
    other.surname = "Else".into();
    assert_eq!(
        roster.register(&other).unwrap_err().kind(),
        ErrorKind::Conflict
    );
    assert_eq!(
        roster
            .get_persons(&Default::default(), "", 0)
            .unwrap()
            .len(),
        1
    );
}

#[test]
fn countries_are_seeded() {
    let roster = roster();
    let all = roster.get_countries("").unwrap();
    assert_eq!(all.len(), 10);
    let matched = roster.get_countries("land").unwrap();
    let names: Vec<&str> = matched.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, ["Netherlands"]);
}
