use crate::api::{parse_id, ErrorResponse};
use crate::auth::{hash_password, AuthUser};
use crate::error::{ApiError, JsonBody};
use crate::guard::profile_for_update;
use crate::models::UserChanges;
use crate::validation::{Validator, USERNAME_MAX_CHARS};
use crate::AppState;
use axum::{
    extract::{Path, State},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Empty or absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub username: Option<String>,
    pub bio: Option<String>,
    pub profile_image: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdatedProfileResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub profile_image: String,
    pub bio: String,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

#[utoipa::path(
    put,
    path = "/api/users/{id}",
    tag = "users",
    params(
        ("id" = uuid::Uuid, Path, description = "User ID")
    ),
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated", body = UpdatedProfileResponse),
        (status = 400, description = "Invalid fields", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Not the caller's own profile", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 409, description = "Username already taken", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_profile(
    AuthUser(caller): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(req): JsonBody<UpdateProfileRequest>,
) -> Result<Json<UpdatedProfileResponse>, ApiError> {
    let id = parse_id(&id, "User")?;
    profile_for_update(state.store.as_ref(), &caller, id)?;

    let mut v = Validator::new();
    let username =
        non_empty(req.username).and_then(|u| v.text("username", &u, Some(USERNAME_MAX_CHARS)));
    let profile_image = non_empty(req.profile_image).and_then(|i| v.url("profileImage", &i));
    let password = non_empty(req.password).and_then(|p| v.password("password", &p));
    let bio = non_empty(req.bio);
    let (username, profile_image, password) =
        v.finish(|| (username, profile_image, password))?;

    let password_hash = password
        .map(|p| hash_password(&p))
        .transpose()
        .map_err(|e| {
            tracing::error!("Failed to hash password: {}", e);
            ApiError::Internal
        })?;

    let user = state.store.update_user(
        id,
        &UserChanges {
            username,
            bio,
            profile_image,
            password_hash,
            updated_at: Utc::now(),
        },
    )?;
    tracing::info!(user_id = %id, "profile updated");

    Ok(Json(UpdatedProfileResponse {
        id: user.id,
        username: user.username,
        email: user.email,
        profile_image: user.profile_image,
        bio: user.bio,
    }))
}
