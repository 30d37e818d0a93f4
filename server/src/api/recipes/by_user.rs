use super::{with_authors, RecipeResponse};
use crate::api::{parse_id, ErrorResponse};
use crate::error::ApiError;
use crate::AppState;
use axum::{
    extract::{Path, State},
    Json,
};

/// Every recipe by one author, newest first. Shared with `GET /api/users/{id}/recipes`.
pub fn authored_by(state: &AppState, raw_id: &str) -> Result<Vec<RecipeResponse>, ApiError> {
    // Unknown authors simply have no recipes
    let Ok(author_id) = parse_id(raw_id, "User") else {
        return Ok(Vec::new());
    };
    let recipes = state.store.recipes_by_author(author_id)?;
    with_authors(state.store.as_ref(), recipes)
}

#[utoipa::path(
    get,
    path = "/api/recipes/user/{userId}",
    tag = "recipes",
    params(
        ("userId" = uuid::Uuid, Path, description = "Author's user ID")
    ),
    responses(
        (status = 200, description = "All of the author's recipes, newest first", body = Vec<RecipeResponse>),
        (status = 500, description = "Store failure", body = ErrorResponse)
    )
)]
pub async fn recipes_by_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<RecipeResponse>>, ApiError> {
    Ok(Json(authored_by(&state, &user_id)?))
}
