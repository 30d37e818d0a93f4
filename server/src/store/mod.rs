//! Persistence for users, sessions, recipes and favorites.
//!
//! Implemented by [`PgStore`] (diesel over Postgres) and [`MemoryStore`]
//! (process memory, for local runs and HTTP tests). Methods are synchronous,
//! like the diesel calls underneath them.

mod memory;
mod pg;

pub use memory::MemoryStore;
pub use pg::PgStore;

use crate::ledger::{FavoritesUpdate, LedgerError};
use crate::models::{NewRecipe, NewSession, NewUser, Recipe, RecipeChanges, User, UserChanges};
use crate::query::RecipeQuery;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database connection failed: {0}")]
    Pool(#[from] diesel::r2d2::PoolError),

    #[error("Database error: {0}")]
    Database(#[from] diesel::result::Error),

    #[error("{0} already taken")]
    Conflict(&'static str),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// One page of a recipe listing.
#[derive(Debug, Clone)]
pub struct RecipePage {
    pub recipes: Vec<Recipe>,
    /// Matches across all pages
    pub total: i64,
}

pub trait Store: Send + Sync {
    /// Fails with `Conflict` when the username or email is taken.
    fn create_user(&self, user: NewUser<'_>) -> StoreResult<User>;

    fn find_user(&self, id: Uuid) -> StoreResult<Option<User>>;

    fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    /// Users among `ids`, in no particular order. Unknown ids are skipped.
    fn find_users(&self, ids: &[Uuid]) -> StoreResult<Vec<User>>;

    fn update_user(&self, id: Uuid, changes: &UserChanges) -> StoreResult<User>;

    fn create_session(&self, session: NewSession<'_>) -> StoreResult<()>;

    /// The user owning an unexpired session with this token hash.
    fn user_for_session(&self, token_hash: &str, now: DateTime<Utc>) -> StoreResult<Option<User>>;

    fn insert_recipe(&self, recipe: &NewRecipe) -> StoreResult<Recipe>;

    fn find_recipe(&self, id: Uuid) -> StoreResult<Option<Recipe>>;

    fn update_recipe(&self, id: Uuid, changes: &RecipeChanges) -> StoreResult<Recipe>;

    /// Deletes the recipe and pulls it from every user's favorites in one
    /// step. Returns how many favorites were pulled.
    fn delete_recipe(&self, id: Uuid) -> StoreResult<usize>;

    fn search_recipes(&self, query: &RecipeQuery) -> StoreResult<RecipePage>;

    /// All recipes by the author, newest first.
    fn recipes_by_author(&self, author_id: Uuid) -> StoreResult<Vec<Recipe>>;

    fn count_recipes_by_author(&self, author_id: Uuid) -> StoreResult<i64>;

    /// Appends the recipe to the user's favorites and bumps its counter,
    /// atomically. See [`crate::ledger`] for the rules.
    fn add_favorite(&self, user_id: Uuid, recipe_id: Uuid) -> StoreResult<FavoritesUpdate>;

    fn remove_favorite(&self, user_id: Uuid, recipe_id: Uuid) -> StoreResult<FavoritesUpdate>;

    /// Favorited recipe ids, oldest first.
    fn favorite_ids(&self, user_id: Uuid) -> StoreResult<Vec<Uuid>>;

    /// Favorited recipes, oldest favorite first.
    fn favorite_recipes(&self, user_id: Uuid) -> StoreResult<Vec<Recipe>>;
}
