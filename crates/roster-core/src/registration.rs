//! Public self-registration and activation.

use chrono::{NaiveDate, Utc};
use tracing::{debug, info};
use uuid::Uuid;

use roster_db::queries::{accounts, countries, persons, users};
use roster_types::api::{ActivateRequest, RegisterRequest, RegisterResponse};
use roster_types::models::{Gender, Nationality, Person, User};

use crate::Roster;
use crate::error::{Result, RosterError};
use crate::identity::{NewUser, insert_user};
use crate::password::{self, valid_email};

/// Earliest accepted date of birth.
fn dob_min() -> NaiveDate {
    NaiveDate::from_ymd_opt(1900, 1, 1).unwrap_or(NaiveDate::MIN)
}

fn validate(req: &RegisterRequest) -> Result<(NaiveDate, Gender)> {
    if req.name.trim().is_empty() {
        return Err(RosterError::validation("missing name"));
    }
    if req.surname.trim().is_empty() {
        return Err(RosterError::validation("missing surname"));
    }
    let gender = req
        .gender
        .ok_or_else(|| RosterError::validation("gender not specified"))?;
    if req.email.is_empty() {
        return Err(RosterError::validation("missing email"));
    }
    if !valid_email(&req.email) {
        return Err(RosterError::validation(format!("invalid email \"{}\"", req.email)));
    }
    if req.phone.trim().is_empty() {
        return Err(RosterError::validation("missing phone"));
    }
    let dob = req
        .dob
        .ok_or_else(|| RosterError::validation("missing dob"))?;
    let today = Utc::now().date_naive();
    if dob < dob_min() || dob > today {
        return Err(RosterError::validation(format!(
            "dob:\"{dob}\" is outside range {} to {today}",
            dob_min()
        )));
    }
    if req.country_id.trim().is_empty() {
        return Err(RosterError::validation("missing country_id"));
    }
    if req.national_id.trim().is_empty() {
        return Err(RosterError::validation("missing national_id"));
    }
    Ok((dob, gender))
}

impl Roster {
    /// Creates an inactive user named after the email under the public
    /// account. The returned token is the hash of its generated password and
    /// must be presented to [`activate_user`](Self::activate_user).
    pub fn register(&self, req: &RegisterRequest) -> Result<RegisterResponse> {
        let (dob, gender) = validate(req)?;
        let name = req.name.trim();
        let surname = req.surname.trim();
        let country_key = req.country_id.trim();
        let public_account_id = self.config.public_account_id;
        let password = password::random_password(self.config.generated_password_length);

        let user = self.db.with_tx(|tx| -> Result<_> {
            let country = match countries::get(tx, country_key)? {
                Some(country) => country,
                None => countries::get_by_name(tx, country_key)?.ok_or_else(|| {
                    RosterError::validation(format!("unknown country({country_key})"))
                })?,
            };

            let person_id =
                match persons::find_by_identity(tx, name, surname, Some(dob), Some(gender))? {
                    Some(id) => {
                        debug!("Registering existing person({})", id);
                        id
                    }
                    None => {
                        let person = Person {
                            id: Uuid::new_v4(),
                            name: name.to_string(),
                            surname: surname.to_string(),
                            dob: Some(dob),
                            gender: Some(gender),
                            email: Some(req.email.clone()),
                            phone: Some(req.phone.trim().to_string()),
                            nationalities: vec![Nationality {
                                country,
                                national_id: req.national_id.trim().to_string(),
                            }],
                        };
                        persons::insert(tx, &person)?;
                        person.id
                    }
                };

            let account = accounts::get(tx, public_account_id)?
                .ok_or_else(|| RosterError::not_found("account", public_account_id))?;
            insert_user(
                tx,
                &account,
                &NewUser {
                    account_id: account.id,
                    username: req.email.clone(),
                    password: password.clone(),
                    admin: false,
                    active: false,
                    expiry: None,
                    person_id: Some(person_id),
                },
            )
        })?;

        info!("Registered inactive user \"{}\"", user.username);
        Ok(RegisterResponse {
            email: user.username,
            token: user.passhash,
        })
    }

    /// Redeems a registration (or account admin) activation token and sets
    /// the user's chosen password.
    pub fn activate_user(&self, req: &ActivateRequest) -> Result<User> {
        if req.new_password.is_empty() {
            return Err(RosterError::validation("missing new_password"));
        }
        self.policy.check(&req.new_password).map_err(|e| {
            RosterError::Validation(format!("new_password not strong enough: {e}"))
        })?;
        if req.email.is_empty() || req.token.is_empty() {
            return Err(RosterError::validation("missing email or token"));
        }

        let user = self.db.with_tx(|tx| -> Result<User> {
            let row = users::get_inactive_by_credentials(tx, &req.email, &req.token)?
                .ok_or_else(|| RosterError::not_found("user", &req.email))?;
            let passhash = password::hash(row.id, row.account.id, &req.new_password);
            users::activate(tx, row.id, &passhash)?;

            let mut user = row.into_user(None);
            user.active = true;
            Ok(user)
        })?;

        info!("User \"{}\" activated", user.username);
        Ok(user)
    }
}
