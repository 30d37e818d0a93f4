use crate::api::recipes::by_user::authored_by;
use crate::api::recipes::RecipeResponse;
use crate::api::ErrorResponse;
use crate::error::ApiError;
use crate::AppState;
use axum::{
    extract::{Path, State},
    Json,
};

#[utoipa::path(
    get,
    path = "/api/users/{id}/recipes",
    tag = "users",
    params(
        ("id" = uuid::Uuid, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "All of the user's recipes, newest first", body = Vec<RecipeResponse>),
        (status = 500, description = "Store failure", body = ErrorResponse)
    )
)]
pub async fn user_recipes(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<RecipeResponse>>, ApiError> {
    Ok(Json(authored_by(&state, &id)?))
}
