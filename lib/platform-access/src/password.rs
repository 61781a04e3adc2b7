//! Password hashing and verification using Argon2id.

use argon2::password_hash::SaltString;
use argon2::password_hash::rand_core::OsRng;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use rootcause::Report;

use crate::error::AuthenticationError;
use crate::user::User;

/// Checked when no account matches the email, so a miss costs the same
/// Argon2 work as a hit. Uses the default Argon2id parameters.
const UNKNOWN_ACCOUNT_HASH: &str =
    "$argon2id$v=19$m=19456,t=2,p=1$aW5zdGFyLW5vLXVzZXIhIQ$AAECAwQFBgcICQoLDA0ODxAREhMUFRYXGBkaGxwdHh8";

/// Hashes a plaintext password into an Argon2id PHC string.
pub fn hash_password(password: &str) -> Result<String, Report<AuthenticationError>> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AuthenticationError::PasswordHash {
            reason: e.to_string(),
        })?;
    Ok(hash.to_string())
}

/// Verifies a plaintext password against a stored PHC string.
///
/// Returns `Ok(false)` on mismatch and an error only when the stored hash
/// itself cannot be parsed.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, Report<AuthenticationError>> {
    let parsed = PasswordHash::new(hash).map_err(|e| AuthenticationError::PasswordHash {
        reason: format!("invalid hash format: {e}"),
    })?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(AuthenticationError::PasswordHash {
            reason: e.to_string(),
        }
        .into()),
    }
}

/// Checks a login attempt against the account found for its email.
///
/// Unknown accounts and wrong passwords both fail with
/// `InvalidCredentials`. A banned account is refused with `AccountBanned`
/// only once its password checks out.
pub fn authenticate<'a>(
    account: Option<&'a User>,
    password: &str,
) -> Result<&'a User, Report<AuthenticationError>> {
    let Some(user) = account else {
        verify_password(password, UNKNOWN_ACCOUNT_HASH)?;
        return Err(AuthenticationError::InvalidCredentials.into());
    };

    if !verify_password(password, user.password_hash())? {
        return Err(AuthenticationError::InvalidCredentials.into());
    }
    if user.is_banned() {
        return Err(AuthenticationError::AccountBanned.into());
    }
    Ok(user)
}
