use super::{with_author_detail, RecipeResponse};
use crate::api::{parse_id, ErrorResponse};
use crate::error::ApiError;
use crate::AppState;
use axum::{
    extract::{Path, State},
    Json,
};

#[utoipa::path(
    get,
    path = "/api/recipes/{id}",
    tag = "recipes",
    params(
        ("id" = uuid::Uuid, Path, description = "Recipe ID")
    ),
    responses(
        (status = 200, description = "Recipe details, author bio included", body = RecipeResponse),
        (status = 404, description = "Recipe not found", body = ErrorResponse)
    )
)]
pub async fn get_recipe(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<RecipeResponse>, ApiError> {
    let id = parse_id(&id, "Recipe")?;

    let recipe = state
        .store
        .find_recipe(id)?
        .ok_or_else(|| ApiError::NotFound("Recipe not found".to_string()))?;

    Ok(Json(with_author_detail(state.store.as_ref(), recipe)?))
}
