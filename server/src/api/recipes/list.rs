use super::{with_authors, RecipeResponse};
use crate::api::ErrorResponse;
use crate::error::ApiError;
use crate::query::ListRecipesParams;
use crate::AppState;
use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ListRecipesResponse {
    pub recipes: Vec<RecipeResponse>,
    pub current_page: i64,
    pub total_pages: i64,
    pub total_recipes: i64,
}

#[utoipa::path(
    get,
    path = "/api/recipes",
    tag = "recipes",
    params(ListRecipesParams),
    responses(
        (status = 200, description = "One page of matching recipes", body = ListRecipesResponse),
        (status = 400, description = "Invalid parameters", body = ErrorResponse)
    )
)]
pub async fn list_recipes(
    State(state): State<AppState>,
    params: Result<Query<ListRecipesParams>, QueryRejection>,
) -> Result<Json<ListRecipesResponse>, ApiError> {
    let Query(params) = params?;
    let query = params.into_query(&state.listing)?;

    let page = state.store.search_recipes(&query)?;

    Ok(Json(ListRecipesResponse {
        recipes: with_authors(state.store.as_ref(), page.recipes)?,
        current_page: query.pagination.page,
        total_pages: query.pagination.total_pages(page.total),
        total_recipes: page.total,
    }))
}
