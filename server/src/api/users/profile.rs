use crate::api::{parse_id, ErrorResponse};
use crate::error::ApiError;
use crate::AppState;
use axum::{
    extract::{Path, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

/// Public profile. The password hash never leaves the store.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub bio: String,
    pub profile_image: String,
    /// Favorited recipe ids, oldest first
    pub favorites: Vec<Uuid>,
    pub recipe_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[utoipa::path(
    get,
    path = "/api/users/{id}",
    tag = "users",
    params(
        ("id" = uuid::Uuid, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User profile", body = ProfileResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    )
)]
pub async fn get_profile(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let id = parse_id(&id, "User")?;

    let user = state
        .store
        .find_user(id)?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    let favorites = state.store.favorite_ids(user.id)?;
    let recipe_count = state.store.count_recipes_by_author(user.id)?;

    Ok(Json(ProfileResponse {
        id: user.id,
        username: user.username,
        email: user.email,
        bio: user.bio,
        profile_image: user.profile_image,
        favorites,
        recipe_count,
        created_at: user.created_at,
        updated_at: user.updated_at,
    }))
}
