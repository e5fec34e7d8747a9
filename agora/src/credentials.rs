use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use serde_json::Value;

use crate::{
    auth::Principal,
    errors::RepoError,
    runtime::RowReader,
    schema::{ROLE_USER, USER},
};

/// Hashes a plaintext password into a PHC string.
pub fn hash_password(password: &str) -> Result<String, RepoError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|err| RepoError::Other {
            message: format!("failed to hash password: {err}").into(),
        })?;
    Ok(hash.to_string())
}

/// Returns `Ok(false)` for a wrong password and an error for a malformed hash.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, RepoError> {
    let parsed = PasswordHash::new(hash).map_err(|err| RepoError::Other {
        message: format!("invalid password hash format: {err}").into(),
    })?;
    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(err) => Err(RepoError::Other {
            message: format!("password verification failed: {err}").into(),
        }),
    }
}

/// Resolves email + password to the principal of a live user.
///
/// Emails compare case-insensitively, matching the unique constraint on `user.email`.
/// Unknown emails, deleted users and wrong passwords are all reported as `None`.
pub async fn authenticate<S>(store: &mut S, email: &str, password: &str) -> Result<Option<Principal>, RepoError>
where
    S: RowReader + ?Sized,
{
    let wanted = email.to_ascii_lowercase();
    for id in store.fetch_ids(USER.name).await? {
        let Some(row) = store.fetch_row(USER.name, id).await? else {
            continue;
        };
        if row.get("is_deleted").and_then(Value::as_bool) != Some(false) {
            continue;
        }
        let matches = row
            .get("email")
            .and_then(Value::as_str)
            .is_some_and(|candidate| candidate.to_ascii_lowercase() == wanted);
        if !matches {
            continue;
        }
        let Some(hash) = row.get("password").and_then(Value::as_str) else {
            return Ok(None);
        };
        if !verify_password(password, hash)? {
            return Ok(None);
        }
        let mut roles: Vec<String> = row
            .get("roles")
            .and_then(Value::as_array)
            .map(|roles| roles.iter().filter_map(Value::as_str).map(str::to_string).collect())
            .unwrap_or_default();
        if !roles.iter().any(|role| role == ROLE_USER) {
            roles.insert(0, ROLE_USER.to_string());
        }
        return Ok(Some(Principal::new(Some(id), roles)));
    }
    Ok(None)
}
