pub mod favorites;
pub mod profile;
pub mod recipes;
pub mod update;

use crate::AppState;
use axum::routing::{get, post};
use axum::Router;
use utoipa::OpenApi;

/// Returns the router for /api/users endpoints (mounted at /api/users)
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/me/favorites", get(favorites::list_favorites))
        .route(
            "/favorites/{recipeId}",
            post(favorites::add_favorite).delete(favorites::remove_favorite),
        )
        .route(
            "/{id}",
            get(profile::get_profile).put(update::update_profile),
        )
        .route("/{id}/recipes", get(recipes::user_recipes))
}

#[derive(OpenApi)]
#[openapi(
    paths(
        profile::get_profile,
        update::update_profile,
        recipes::user_recipes,
        favorites::list_favorites,
        favorites::add_favorite,
        favorites::remove_favorite,
    ),
    components(schemas(
        profile::ProfileResponse,
        update::UpdateProfileRequest,
        update::UpdatedProfileResponse,
        favorites::FavoritesResponse,
    ))
)]
pub struct ApiDoc;
