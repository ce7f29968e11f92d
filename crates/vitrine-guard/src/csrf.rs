//! CSRF tokens kept in session storage.

use rand::distr::Alphanumeric;
use rand::Rng;

use crate::store::Storage;

/// Session storage key holding the token.
pub const CSRF_KEY: &str = "csrf_token";

const TOKEN_LEN: usize = 32;

/// A fresh random token.
pub fn generate_token() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LEN)
        .map(char::from)
        .collect()
}

/// The session's token, created and stored on first use.
pub fn token(session: &mut impl Storage) -> String {
    if let Some(existing) = session.get(CSRF_KEY) {
        return existing;
    }

    let fresh = generate_token();
    session.set(CSRF_KEY, fresh.clone());
    fresh
}

/// Whether `candidate` matches the session's token. A session without a
/// token accepts nothing.
pub fn verify(session: &impl Storage, candidate: &str) -> bool {
    session
        .get(CSRF_KEY)
        .is_some_and(|expected| !candidate.is_empty() && expected == candidate)
}
