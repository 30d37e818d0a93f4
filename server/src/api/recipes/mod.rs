pub mod by_user;
pub mod create;
pub mod delete;
pub mod get;
pub mod input;
pub mod list;
pub mod update;

use crate::error::ApiError;
use crate::models::{Category, Cuisine, Difficulty, Ingredient, Recipe, User};
use crate::store::Store;
use crate::AppState;
use axum::routing::get;
use axum::Router;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use utoipa::{OpenApi, ToSchema};
use uuid::Uuid;

/// Returns the router for /api/recipes endpoints (mounted at /api/recipes)
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list::list_recipes).post(create::create_recipe))
        .route("/user/{userId}", get(by_user::recipes_by_user))
        .route(
            "/{id}",
            get(get::get_recipe)
                .put(update::update_recipe)
                .delete(delete::delete_recipe),
        )
}

#[derive(OpenApi)]
#[openapi(
    paths(
        create::create_recipe,
        list::list_recipes,
        get::get_recipe,
        update::update_recipe,
        delete::delete_recipe,
        by_user::recipes_by_user,
    ),
    components(schemas(
        input::RecipeInput,
        input::IngredientInput,
        list::ListRecipesResponse,
        RecipeResponse,
        AuthorSummary,
    ))
)]
pub struct ApiDoc;

/// Public view of a recipe's author
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthorSummary {
    pub id: Uuid,
    pub username: String,
    pub profile_image: String,
    /// Only included on single-recipe lookups
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
}

impl AuthorSummary {
    fn from_user(user: &User, with_bio: bool) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            profile_image: user.profile_image.clone(),
            bio: with_bio.then(|| user.bio.clone()),
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecipeResponse {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub ingredients: Vec<Ingredient>,
    pub instructions: Vec<String>,
    pub prep_time: i32,
    pub cook_time: i32,
    pub servings: i32,
    pub difficulty: Difficulty,
    pub cuisine: Cuisine,
    pub category: Category,
    pub image: String,
    pub tags: Vec<String>,
    /// `null` if the author account no longer exists
    pub author: Option<AuthorSummary>,
    pub favorites_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RecipeResponse {
    fn new(recipe: Recipe, author: Option<AuthorSummary>) -> Self {
        Self {
            id: recipe.id,
            title: recipe.title,
            description: recipe.description,
            ingredients: recipe.ingredients.0,
            instructions: recipe.instructions,
            prep_time: recipe.prep_time,
            cook_time: recipe.cook_time,
            servings: recipe.servings,
            difficulty: recipe.difficulty,
            cuisine: recipe.cuisine,
            category: recipe.category,
            image: recipe.image,
            tags: recipe.tags,
            author,
            favorites_count: recipe.favorites_count,
            created_at: recipe.created_at,
            updated_at: recipe.updated_at,
        }
    }
}

/// Attaches author projections, loading each distinct author once.
pub fn with_authors(store: &dyn Store, recipes: Vec<Recipe>) -> Result<Vec<RecipeResponse>, ApiError> {
    let mut author_ids: Vec<Uuid> = recipes.iter().map(|r| r.author_id).collect();
    author_ids.sort_unstable();
    author_ids.dedup();

    let authors: HashMap<Uuid, AuthorSummary> = store
        .find_users(&author_ids)?
        .iter()
        .map(|u| (u.id, AuthorSummary::from_user(u, false)))
        .collect();

    Ok(recipes
        .into_iter()
        .map(|recipe| {
            let author = authors.get(&recipe.author_id).cloned();
            RecipeResponse::new(recipe, author)
        })
        .collect())
}

/// Single recipe with the full author projection, bio included.
pub fn with_author_detail(store: &dyn Store, recipe: Recipe) -> Result<RecipeResponse, ApiError> {
    let author = store
        .find_user(recipe.author_id)?
        .map(|u| AuthorSummary::from_user(&u, true));
    Ok(RecipeResponse::new(recipe, author))
}

/// Recipe as returned from a write: author projected without bio.
pub fn with_author(store: &dyn Store, recipe: Recipe) -> Result<RecipeResponse, ApiError> {
    let author = store
        .find_user(recipe.author_id)?
        .map(|u| AuthorSummary::from_user(&u, false));
    Ok(RecipeResponse::new(recipe, author))
}
