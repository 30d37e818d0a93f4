use crate::models::{NewSession, User};
use crate::store::{Store, StoreResult};
use chrono::{Duration, Utc};
use uuid::Uuid;

use super::crypto::{generate_token, hash_token};

/// Opens a session for the user and returns the bearer token.
pub fn create_session(store: &dyn Store, user_id: Uuid, ttl: Duration) -> StoreResult<String> {
    let token = generate_token();
    let token_hash = hash_token(&token);
    let expires_at = Utc::now() + ttl;

    store.create_session(NewSession {
        user_id,
        token_hash: &token_hash,
        expires_at,
    })?;

    Ok(token)
}

pub fn get_user_from_token(store: &dyn Store, token: &str) -> StoreResult<Option<User>> {
    store.user_for_session(&hash_token(token), Utc::now())
}
