//! Credential helpers: the stored password hash, generated passwords and the
//! pluggable strength check applied on activation.

use rand::Rng;
use sha1::{Digest, Sha1};
use uuid::Uuid;

const PASSWORD_CHARSET: &[u8] =
    b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ1234567890!@#$%^&*()_+-={}[]:\";'\\|<>,.?/";

/// Hex SHA-1 of `user_id ++ account_id ++ password`.
///
/// Deterministic, so an inactive user's hash doubles as its activation token.
pub fn hash(user_id: Uuid, account_id: Uuid, password: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(user_id.to_string().as_bytes());
    hasher.update(account_id.to_string().as_bytes());
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

pub fn random_password(len: usize) -> String {
    let mut rng = rand::rng();
    (0..len)
        .map(|_| PASSWORD_CHARSET[rng.random_range(0..PASSWORD_CHARSET.len())] as char)
        .collect()
}

/// Decides whether a user-chosen password is acceptable.
pub trait PasswordPolicy: Send + Sync {
    /// `Err` carries a message that can be shown to the user.
    fn check(&self, password: &str) -> Result<(), String>;
}

/// Accepts passwords of at least `.0` characters.
#[derive(Debug, Clone, Copy)]
pub struct MinLength(pub usize);

impl PasswordPolicy for MinLength {
    fn check(&self, password: &str) -> Result<(), String> {
        if password.chars().count() < self.0 {
            return Err(format!("password must be at least {} characters", self.0));
        }
        Ok(())
    }
}

/// Loose syntactic check: one `@`, a non-empty local part and a dotted domain.
pub fn valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && domain.split('.').all(|label| !label.is_empty())
}
