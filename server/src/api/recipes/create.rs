use super::input::RecipeInput;
use super::{with_author, RecipeResponse};
use crate::api::ErrorResponse;
use crate::auth::AuthUser;
use crate::error::{ApiError, JsonBody};
use crate::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};

#[utoipa::path(
    post,
    path = "/api/recipes",
    tag = "recipes",
    request_body = RecipeInput,
    responses(
        (status = 201, description = "Recipe created successfully", body = RecipeResponse),
        (status = 400, description = "Missing or invalid fields", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_recipe(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    JsonBody(input): JsonBody<RecipeInput>,
) -> Result<impl IntoResponse, ApiError> {
    let new_recipe = input.into_new_recipe(user.id)?;

    let recipe = state.store.insert_recipe(&new_recipe)?;
    tracing::info!(recipe_id = %recipe.id, author_id = %user.id, "recipe created");

    Ok((
        StatusCode::CREATED,
        Json(with_author(state.store.as_ref(), recipe)?),
    ))
}
