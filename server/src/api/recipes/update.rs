use super::input::RecipeInput;
use super::{with_author, RecipeResponse};
use crate::api::{parse_id, ErrorResponse};
use crate::auth::AuthUser;
use crate::error::{ApiError, JsonBody};
use crate::guard::{recipe_for_mutation, RecipeAction};
use crate::AppState;
use axum::{
    extract::{Path, State},
    Json,
};
use chrono::Utc;

#[utoipa::path(
    put,
    path = "/api/recipes/{id}",
    tag = "recipes",
    params(
        ("id" = uuid::Uuid, Path, description = "Recipe ID")
    ),
    request_body = RecipeInput,
    responses(
        (status = 200, description = "Recipe updated successfully", body = RecipeResponse),
        (status = 400, description = "Invalid fields", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Caller is not the author", body = ErrorResponse),
        (status = 404, description = "Recipe not found", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_recipe(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(input): JsonBody<RecipeInput>,
) -> Result<Json<RecipeResponse>, ApiError> {
    let id = parse_id(&id, "Recipe")?;
    recipe_for_mutation(state.store.as_ref(), &user, id, RecipeAction::Update)?;

    let changes = input.into_changes(Utc::now())?;
    let recipe = state.store.update_recipe(id, &changes)?;
    tracing::info!(recipe_id = %id, "recipe updated");

    Ok(Json(with_author(state.store.as_ref(), recipe)?))
}
