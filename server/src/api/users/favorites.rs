use crate::api::recipes::{with_authors, RecipeResponse};
use crate::api::{parse_id, ErrorResponse};
use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::ledger::LedgerError;
use crate::AppState;
use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Serialize, ToSchema)]
pub struct FavoritesResponse {
    pub message: String,
    /// The caller's favorites after the change, oldest first
    pub favorites: Vec<Uuid>,
}

#[utoipa::path(
    get,
    path = "/api/users/me/favorites",
    tag = "favorites",
    responses(
        (status = 200, description = "Favorited recipes in the order they were added", body = Vec<RecipeResponse>),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_favorites(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<RecipeResponse>>, ApiError> {
    let recipes = state.store.favorite_recipes(user.id)?;
    Ok(Json(with_authors(state.store.as_ref(), recipes)?))
}

#[utoipa::path(
    post,
    path = "/api/users/favorites/{recipeId}",
    tag = "favorites",
    params(
        ("recipeId" = uuid::Uuid, Path, description = "Recipe ID")
    ),
    responses(
        (status = 200, description = "Recipe added to favorites", body = FavoritesResponse),
        (status = 400, description = "Recipe already in favorites", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Recipe not found", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn add_favorite(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(recipe_id): Path<String>,
) -> Result<Json<FavoritesResponse>, ApiError> {
    let recipe_id = parse_id(&recipe_id, "Recipe")?;

    let update = state.store.add_favorite(user.id, recipe_id)?;
    tracing::info!(
        user_id = %user.id,
        recipe_id = %recipe_id,
        favorites_count = ?update.favorites_count,
        "favorite added"
    );

    Ok(Json(FavoritesResponse {
        message: "Recipe added to favorites".to_string(),
        favorites: update.favorites,
    }))
}

#[utoipa::path(
    delete,
    path = "/api/users/favorites/{recipeId}",
    tag = "favorites",
    params(
        ("recipeId" = uuid::Uuid, Path, description = "Recipe ID")
    ),
    responses(
        (status = 200, description = "Recipe removed from favorites", body = FavoritesResponse),
        (status = 400, description = "Recipe not in favorites", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn remove_favorite(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(recipe_id): Path<String>,
) -> Result<Json<FavoritesResponse>, ApiError> {
    // A malformed id can't be in anyone's favorites
    let recipe_id = parse_id(&recipe_id, "Recipe")
        .map_err(|_| ApiError::from(LedgerError::NotFavorited))?;

    let update = state.store.remove_favorite(user.id, recipe_id)?;
    tracing::info!(
        user_id = %user.id,
        recipe_id = %recipe_id,
        favorites_count = ?update.favorites_count,
        "favorite removed"
    );

    Ok(Json(FavoritesResponse {
        message: "Recipe removed from favorites".to_string(),
        favorites: update.favorites,
    }))
}
