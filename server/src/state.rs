use crate::config::ListingDefaults;
use crate::store::Store;
use axum::extract::FromRef;
use chrono::Duration;
use std::sync::Arc;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub listing: ListingDefaults,
    pub session_ttl: Duration,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, listing: ListingDefaults, session_ttl_days: i64) -> Self {
        Self {
            store,
            listing,
            session_ttl: Duration::days(session_ttl_days),
        }
    }
}

impl FromRef<AppState> for Arc<dyn Store> {
    fn from_ref(state: &AppState) -> Self {
        state.store.clone()
    }
}
