//! Per-session CSRF tokens.
//!
//! `ClientCtx` creates the token on the first request of a session. Every
//! form posts it back as `csrf_token`; htmx requests get it injected by the
//! script in `base.html`. Handlers check it before touching the database.

use actix_session::Session;
use actix_web::{error, Error};
use rand::{distributions::Alphanumeric, Rng};

pub const CSRF_TOKEN_LENGTH: usize = 32;
const CSRF_SESSION_KEY: &str = "csrf_token";

pub fn generate_csrf_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(CSRF_TOKEN_LENGTH)
        .map(char::from)
        .collect()
}

/// The session's token, stored on first use.
pub fn get_or_create_csrf_token(session: &Session) -> Result<String, Error> {
    if let Ok(Some(token)) = session.get::<String>(CSRF_SESSION_KEY) {
        return Ok(token);
    }
    let token = generate_csrf_token();
    session
        .insert(CSRF_SESSION_KEY, token.clone())
        .map_err(|_| error::ErrorInternalServerError("Failed to store CSRF token"))?;
    Ok(token)
}

/// 403 unless `provided` matches the session's token.
pub fn validate_csrf_token(session: &Session, provided: &str) -> Result<(), Error> {
    let expected = session
        .get::<String>(CSRF_SESSION_KEY)
        .map_err(|_| error::ErrorInternalServerError("Failed to read CSRF token"))?
        .ok_or_else(|| error::ErrorForbidden("CSRF token not found in session"))?;

    if provided.is_empty() || provided != expected {
        log::warn!("CSRF token validation failed");
        return Err(error::ErrorForbidden("Invalid CSRF token"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokens_are_alphanumeric_and_distinct() {
        let a = generate_csrf_token();
        let b = generate_csrf_token();
        assert_eq!(a.len(), CSRF_TOKEN_LENGTH);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(a, b);
    }
}
