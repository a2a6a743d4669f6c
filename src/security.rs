//! Credential store: user records and password hashing/verification.
//!
//! Passwords are hashed with Argon2 into PHC strings before they ever reach
//! the database; plaintext is neither stored nor logged. Authentication
//! produces a single `InvalidCredentials` failure whether the username is
//! unknown or the hash check fails, so usernames cannot be enumerated.

use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use password_hash::{PasswordHash, SaltString};
use rusqlite::{params, Connection, OptionalExtension};

use crate::error::{ApiError, ApiResult};

/// Persisted user record. Immutable after registration; there is no update
/// or delete endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
}

fn hash_password(password: &str) -> ApiResult<String> {
    let mut salt_bytes = [0u8; 16];
    getrandom::getrandom(&mut salt_bytes).map_err(|e| ApiError::internal(e.to_string()))?;
    let salt = SaltString::encode_b64(&salt_bytes).map_err(|e| ApiError::internal(e.to_string()))?;
    let argon2 = Argon2::default();
    let phc = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| ApiError::internal(e.to_string()))?
        .to_string();
    Ok(phc)
}

fn verify_password(hash: &str, password: &str) -> bool {
    if let Ok(parsed) = PasswordHash::new(hash) {
        Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok()
    } else {
        false
    }
}

/// Creates a new user and returns its id. `DuplicateUsername` when the name
/// is already taken; the UNIQUE constraint backstops concurrent registration.
pub fn register(conn: &Connection, username: &str, password: &str) -> ApiResult<i64> {
    let existing: Option<i64> = conn
        .query_row("SELECT id FROM users WHERE username = ?1", [username], |row| row.get(0))
        .optional()?;
    if existing.is_some() {
        return Err(ApiError::DuplicateUsername);
    }

    let phc = hash_password(password)?;
    conn.execute(
        "INSERT INTO users (username, password_hash) VALUES (?1, ?2)",
        params![username, phc],
    )
    .map_err(|err| match err {
        rusqlite::Error::SqliteFailure(e, _)
            if e.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            ApiError::DuplicateUsername
        }
        other => other.into(),
    })?;

    Ok(conn.last_insert_rowid())
}

/// Verifies a username/password pair and returns the user id.
pub fn authenticate(conn: &Connection, username: &str, password: &str) -> ApiResult<i64> {
    let row: Option<(i64, String)> = conn
        .query_row(
            "SELECT id, password_hash FROM users WHERE username = ?1",
            [username],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?;

    match row {
        Some((id, phc)) if verify_password(&phc, password) => Ok(id),
        _ => Err(ApiError::InvalidCredentials),
    }
}

/// Resolves a user by id. Used by the auth middleware to cross-check token
/// identities against the store.
pub fn find_user(conn: &Connection, id: i64) -> ApiResult<Option<User>> {
    let user = conn
        .query_row(
            "SELECT id, username, password_hash FROM users WHERE id = ?1",
            [id],
            |row| {
                Ok(User {
                    id: row.get(0)?,
                    username: row.get(1)?,
                    password_hash: row.get(2)?,
                })
            },
        )
        .optional()?;
    Ok(user)
}
