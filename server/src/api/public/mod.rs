pub mod auth;
pub mod root;

use crate::AppState;
use axum::routing::{get, post};
use axum::Router;
use utoipa::OpenApi;

/// Returns the router for public endpoints (no auth required)
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(root::root))
        .route("/api/auth/signup", post(auth::signup::signup))
        .route("/api/auth/login", post(auth::login::login))
}

#[derive(OpenApi)]
#[openapi(
    paths(auth::login::login, auth::signup::signup, root::root),
    components(schemas(
        auth::login::LoginRequest,
        auth::signup::SignupRequest,
        auth::AuthResponse,
    ))
)]
pub struct ApiDoc;
