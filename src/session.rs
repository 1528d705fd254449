//! Cookie session state: who is logged in, and flash messages for the next page.

use actix_session::Session;
use argon2::password_hash::{
    rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
};
use argon2::Argon2;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

const SESSION_USER_KEY: &str = "user_id";
const SESSION_FLASH_KEY: &str = "flash";

static ARGON2: Lazy<Argon2<'static>> = Lazy::new(Argon2::default);

pub fn get_argon2() -> &'static Argon2<'static> {
    &ARGON2
}

/// Hashes a plaintext password into a PHC string.
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    Ok(get_argon2()
        .hash_password(password.as_bytes(), &salt)?
        .to_string())
}

/// Returns false for a wrong password or an unparseable hash.
pub fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => get_argon2()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(err) => {
            log::error!("Stored password hash is malformed: {}", err);
            false
        }
    }
}

/// Binds the session to `user_id`, rotating the session key.
pub fn login(session: &Session, user_id: i32) -> Result<(), actix_web::Error> {
    session.renew();
    session
        .insert(SESSION_USER_KEY, user_id)
        .map_err(|_| actix_web::error::ErrorInternalServerError("middleware error"))
}

pub fn logout(session: &Session) {
    session.purge();
}

/// User id stored in the session, if any.
pub fn get_user_id(session: &Session) -> Option<i32> {
    match session.get::<i32>(SESSION_USER_KEY) {
        Ok(id) => id,
        Err(err) => {
            log::warn!("Discarding unreadable session user id: {}", err);
            None
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashLevel {
    Success,
    Info,
    Error,
}

impl FlashLevel {
    pub fn css_class(&self) -> &'static str {
        match self {
            Self::Success => "flash-success",
            Self::Info => "flash-info",
            Self::Error => "flash-error",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlashMessage {
    pub level: FlashLevel,
    pub text: String,
}

/// Queues a message for the next rendered page.
pub fn push_flash(session: &Session, level: FlashLevel, text: impl Into<String>) {
    let mut messages = session
        .get::<Vec<FlashMessage>>(SESSION_FLASH_KEY)
        .ok()
        .flatten()
        .unwrap_or_default();
    messages.push(FlashMessage {
        level,
        text: text.into(),
    });
    if let Err(err) = session.insert(SESSION_FLASH_KEY, messages) {
        log::error!("Unable to store flash message: {}", err);
    }
}

/// Removes and returns all queued messages.
pub fn take_flashes(session: &Session) -> Vec<FlashMessage> {
    session
        .remove_as::<Vec<FlashMessage>>(SESSION_FLASH_KEY)
        .and_then(Result::ok)
        .unwrap_or_default()
}

/// Puts popped messages back ahead of anything queued since.
pub fn restore_flashes(session: &Session, mut popped: Vec<FlashMessage>) {
    popped.extend(take_flashes(session));
    if let Err(err) = session.insert(SESSION_FLASH_KEY, popped) {
        log::error!("Unable to restore flash messages: {}", err);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_round_trip() {
        let hash = hash_password("correct horse").unwrap();
        assert!(verify_password("correct horse", &hash));
        assert!(!verify_password("battery staple", &hash));
    }

    #[test]
    fn test_malformed_hash_is_rejected() {
        assert!(!verify_password("anything", "not-a-phc-string"));
    }
}
