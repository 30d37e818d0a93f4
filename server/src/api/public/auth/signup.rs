use super::AuthResponse;
use crate::api::ErrorResponse;
use crate::auth::{create_session, hash_password};
use crate::error::{ApiError, JsonBody};
use crate::models::{NewUser, DEFAULT_PROFILE_IMAGE};
use crate::validation::{Validator, USERNAME_MAX_CHARS};
use crate::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Deserialize;
use utoipa::ToSchema;

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct SignupRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[utoipa::path(
    post,
    path = "/api/auth/signup",
    tag = "auth",
    request_body(content = SignupRequest, example = json!({"username": "chef", "email": "chef@example.com", "password": "secret1"})),
    responses(
        (status = 201, description = "User created successfully", body = AuthResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 409, description = "Username or email already taken", body = ErrorResponse)
    )
)]
pub async fn signup(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<SignupRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let mut v = Validator::new();
    let username = v
        .required("username", req.username)
        .and_then(|u| v.text("username", &u, Some(USERNAME_MAX_CHARS)));
    let email = v
        .required("email", req.email)
        .and_then(|e| v.email("email", &e));
    let password = v
        .required("password", req.password)
        .and_then(|p| v.password("password", &p));
    // Every field is present once no issue was recorded
    let (username, email, password) = v.finish(|| {
        (
            username.unwrap_or_default(),
            email.unwrap_or_default(),
            password.unwrap_or_default(),
        )
    })?;

    let password_hash = hash_password(&password).map_err(|e| {
        tracing::error!("Failed to hash password: {}", e);
        ApiError::Internal
    })?;

    let user = state.store.create_user(NewUser {
        username: &username,
        email: &email,
        password_hash: &password_hash,
        bio: "",
        profile_image: DEFAULT_PROFILE_IMAGE,
    })?;

    let token = create_session(state.store.as_ref(), user.id, state.session_ttl)?;

    tracing::info!(user_id = %user.id, "user signed up");

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            user_id: user.id,
            token,
        }),
    ))
}
