use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use chrono::{Duration, Utc};
use rand::distributions::Alphanumeric;
use rand::rngs::OsRng;
use rand::Rng;
use sha2::{Digest, Sha256};
use tracing::{info, warn};

use crate::models::{Profile, Session, User};
use crate::state::AppState;
use crate::utils::AppError;

const SESSION_TOKEN_LEN: usize = 64;

#[derive(Debug)]
pub struct NewAccount {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Creates the user and, right after, its profile.
///
/// Every account ends up with exactly one profile; a failure of the hook
/// surfaces as an error of the whole call.
pub async fn create_user(state: &AppState, account: NewAccount) -> Result<User, AppError> {
    let password_hash = hash_password(&account.password)?;
    let mut user = User::new(account.username, account.email, password_hash);
    user.is_staff = state.config.is_staff_username(&user.username);

    let user = state.users.create(&user).await?;
    on_user_created(state, &user).await?;

    info!(user_id = %user.id, username = %user.username, staff = user.is_staff, "Account created");
    Ok(user)
}

/// Post-create hook: provisions the blank profile.
async fn on_user_created(state: &AppState, user: &User) -> Result<Profile, AppError> {
    let profile = Profile::for_user(
        user.id,
        &state.config.default_markup,
        state.config.message_max,
    );
    state.profiles.create(&profile).await
}

/// `None` for an unknown user or a wrong password.
pub async fn authenticate(
    state: &AppState,
    username: &str,
    password: &str,
) -> Result<Option<User>, AppError> {
    let Some(user) = state.users.find_by_username(username).await? else {
        return Ok(None);
    };
    if verify_password(password, &user.password_hash) {
        Ok(Some(user))
    } else {
        warn!(username = %username, "Failed login attempt");
        Ok(None)
    }
}

/// Starts a session and returns the raw token for the cookie.
pub async fn start_session(state: &AppState, user: &User) -> Result<String, AppError> {
    let token: String = OsRng
        .sample_iter(&Alphanumeric)
        .take(SESSION_TOKEN_LEN)
        .map(char::from)
        .collect();
    let session = Session::new(
        hash_token(&token),
        user.id,
        Duration::hours(state.config.session_ttl_hours),
    );
    state.sessions.create(&session).await?;
    Ok(token)
}

pub async fn end_session(state: &AppState, token: &str) -> Result<(), AppError> {
    state.sessions.delete(&hash_token(token)).await
}

pub async fn user_for_session(state: &AppState, token: &str) -> Result<Option<User>, AppError> {
    match state
        .sessions
        .find_active(&hash_token(token), Utc::now())
        .await?
    {
        Some(session) => state.users.find_by_id(session.user_id).await,
        None => Ok(None),
    }
}

pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::InternalServerError(format!("password hashing failed: {e}")))
}

pub fn verify_password(password: &str, stored: &str) -> bool {
    match PasswordHash::new(stored) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}
