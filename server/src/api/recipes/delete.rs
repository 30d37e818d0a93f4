use crate::api::{parse_id, ErrorResponse, MessageResponse};
use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::guard::{recipe_for_mutation, RecipeAction};
use crate::AppState;
use axum::{
    extract::{Path, State},
    Json,
};

#[utoipa::path(
    delete,
    path = "/api/recipes/{id}",
    tag = "recipes",
    params(
        ("id" = uuid::Uuid, Path, description = "Recipe ID")
    ),
    responses(
        (status = 200, description = "Recipe deleted and pulled from all favorites", body = MessageResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Caller is not the author", body = ErrorResponse),
        (status = 404, description = "Recipe not found", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete_recipe(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let id = parse_id(&id, "Recipe")?;
    recipe_for_mutation(state.store.as_ref(), &user, id, RecipeAction::Delete)?;

    let pulled = state.store.delete_recipe(id)?;
    tracing::info!(recipe_id = %id, favorites_pulled = pulled, "recipe deleted");

    Ok(Json(MessageResponse {
        message: "Recipe deleted successfully".to_string(),
    }))
}
