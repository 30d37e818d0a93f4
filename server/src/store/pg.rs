use super::{RecipePage, Store, StoreError, StoreResult};
use crate::{any_tag_ilike, title_sort_key};
use crate::db::{DbConn, DbPool};
use crate::ledger::{self, FavoritesUpdate};
use crate::models::{
    NewFavorite, NewRecipe, NewSession, NewUser, Recipe, RecipeChanges, User, UserChanges,
};
use crate::query::{contains_pattern, Direction, RecipeFilter, RecipeQuery, Sort, SortBy};
use crate::schema::{favorites, recipes, sessions, users};
use chrono::{DateTime, Utc};
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use uuid::Uuid;

/// Postgres-backed store. Every operation runs inside a `db.query` span so
/// the per-request query counter sees it.
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn run<T>(
        &self,
        op: &'static str,
        f: impl FnOnce(&mut DbConn) -> StoreResult<T>,
    ) -> StoreResult<T> {
        let _span = tracing::info_span!("db.query", op).entered();
        let mut conn = self.pool.get()?;
        f(&mut conn)
    }
}

/// Maps unique violations on `users` to a conflict naming the taken field.
fn user_write_error(err: DieselError) -> StoreError {
    match err {
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
            if info.constraint_name().is_some_and(|c| c.contains("email")) {
                StoreError::Conflict("Email")
            } else {
                StoreError::Conflict("Username")
            }
        }
        other => StoreError::Database(other),
    }
}

fn filtered(filter: &RecipeFilter) -> recipes::BoxedQuery<'static, Pg> {
    let mut query = recipes::table.into_boxed();

    // Search is one OR clause, ANDed with the remaining filters
    if let Some(ref search) = filter.search {
        let pattern = contains_pattern(search);
        query = query.filter(
            recipes::title
                .ilike(pattern.clone())
                .or(recipes::description.ilike(pattern.clone()))
                .or(any_tag_ilike!(pattern)),
        );
    }
    if let Some(cuisine) = filter.cuisine {
        query = query.filter(recipes::cuisine.eq(cuisine));
    }
    if let Some(category) = filter.category {
        query = query.filter(recipes::category.eq(category));
    }
    if let Some(difficulty) = filter.difficulty {
        query = query.filter(recipes::difficulty.eq(difficulty));
    }
    if let Some(max) = filter.max_prep_time {
        query = query.filter(recipes::prep_time.le(max));
    }
    if let Some(max) = filter.max_cook_time {
        query = query.filter(recipes::cook_time.le(max));
    }

    query
}

fn ordered(
    query: recipes::BoxedQuery<'static, Pg>,
    sort: Sort,
) -> recipes::BoxedQuery<'static, Pg> {
    // Ties broken by id in the same direction, matching Sort::compare
    match sort.direction {
        Direction::Asc => match sort.by {
            SortBy::CreatedAt => query.order((recipes::created_at.asc(), recipes::id.asc())),
            SortBy::UpdatedAt => query.order((recipes::updated_at.asc(), recipes::id.asc())),
            SortBy::Title => query.order((title_sort_key!().asc(), recipes::id.asc())),
            SortBy::PrepTime => query.order((recipes::prep_time.asc(), recipes::id.asc())),
            SortBy::CookTime => query.order((recipes::cook_time.asc(), recipes::id.asc())),
            SortBy::Servings => query.order((recipes::servings.asc(), recipes::id.asc())),
            SortBy::FavoritesCount => {
                query.order((recipes::favorites_count.asc(), recipes::id.asc()))
            }
        },
        Direction::Desc => match sort.by {
            SortBy::CreatedAt => query.order((recipes::created_at.desc(), recipes::id.desc())),
            SortBy::UpdatedAt => query.order((recipes::updated_at.desc(), recipes::id.desc())),
            SortBy::Title => query.order((title_sort_key!().desc(), recipes::id.desc())),
            SortBy::PrepTime => query.order((recipes::prep_time.desc(), recipes::id.desc())),
            SortBy::CookTime => query.order((recipes::cook_time.desc(), recipes::id.desc())),
            SortBy::Servings => query.order((recipes::servings.desc(), recipes::id.desc())),
            SortBy::FavoritesCount => {
                query.order((recipes::favorites_count.desc(), recipes::id.desc()))
            }
        },
    }
}

fn load_favorite_ids(conn: &mut PgConnection, user_id: Uuid) -> QueryResult<Vec<Uuid>> {
    favorites::table
        .filter(favorites::user_id.eq(user_id))
        .order((favorites::created_at.asc(), favorites::recipe_id.asc()))
        .select(favorites::recipe_id)
        .load(conn)
}

/// Locks the recipe row for the rest of the transaction and returns its
/// counter, or `None` if the recipe doesn't exist.
fn lock_favorites_count(conn: &mut PgConnection, recipe_id: Uuid) -> QueryResult<Option<i32>> {
    recipes::table
        .find(recipe_id)
        .select(recipes::favorites_count)
        .for_update()
        .first(conn)
        .optional()
}

fn set_favorites_count(conn: &mut PgConnection, recipe_id: Uuid, count: i32) -> QueryResult<usize> {
    diesel::update(recipes::table.find(recipe_id))
        .set(recipes::favorites_count.eq(count))
        .execute(conn)
}

impl Store for PgStore {
    fn create_user(&self, user: NewUser<'_>) -> StoreResult<User> {
        self.run("create_user", |conn| {
            diesel::insert_into(users::table)
                .values(&user)
                .returning(User::as_returning())
                .get_result(conn)
                .map_err(user_write_error)
        })
    }

    fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        self.run("find_user", |conn| {
            Ok(users::table
                .find(id)
                .select(User::as_select())
                .first(conn)
                .optional()?)
        })
    }

    fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        self.run("find_user_by_email", |conn| {
            Ok(users::table
                .filter(users::email.eq(email))
                .select(User::as_select())
                .first(conn)
                .optional()?)
        })
    }

    fn find_users(&self, ids: &[Uuid]) -> StoreResult<Vec<User>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        self.run("find_users", |conn| {
            Ok(users::table
                .filter(users::id.eq_any(ids.to_vec()))
                .select(User::as_select())
                .load(conn)?)
        })
    }

    fn update_user(&self, id: Uuid, changes: &UserChanges) -> StoreResult<User> {
        self.run("update_user", |conn| {
            diesel::update(users::table.find(id))
                .set(changes)
                .returning(User::as_returning())
                .get_result(conn)
                .optional()
                .map_err(user_write_error)?
                .ok_or(StoreError::NotFound("User"))
        })
    }

    fn create_session(&self, session: NewSession<'_>) -> StoreResult<()> {
        self.run("create_session", |conn| {
            diesel::insert_into(sessions::table)
                .values(&session)
                .execute(conn)?;
            Ok(())
        })
    }

    fn user_for_session(&self, token_hash: &str, now: DateTime<Utc>) -> StoreResult<Option<User>> {
        self.run("user_for_session", |conn| {
            Ok(sessions::table
                .inner_join(users::table)
                .filter(sessions::token_hash.eq(token_hash))
                .filter(sessions::expires_at.gt(now))
                .select(User::as_select())
                .first(conn)
                .optional()?)
        })
    }

    fn insert_recipe(&self, recipe: &NewRecipe) -> StoreResult<Recipe> {
        self.run("insert_recipe", |conn| {
            Ok(diesel::insert_into(recipes::table)
                .values(recipe)
                .returning(Recipe::as_returning())
                .get_result(conn)?)
        })
    }

    fn find_recipe(&self, id: Uuid) -> StoreResult<Option<Recipe>> {
        self.run("find_recipe", |conn| {
            Ok(recipes::table
                .find(id)
                .select(Recipe::as_select())
                .first(conn)
                .optional()?)
        })
    }

    fn update_recipe(&self, id: Uuid, changes: &RecipeChanges) -> StoreResult<Recipe> {
        self.run("update_recipe", |conn| {
            diesel::update(recipes::table.find(id))
                .set(changes)
                .returning(Recipe::as_returning())
                .get_result(conn)
                .optional()?
                .ok_or(StoreError::NotFound("Recipe"))
        })
    }

    fn delete_recipe(&self, id: Uuid) -> StoreResult<usize> {
        self.run("delete_recipe", |conn| {
            conn.transaction::<_, StoreError, _>(|conn| {
                let pulled = diesel::delete(favorites::table.filter(favorites::recipe_id.eq(id)))
                    .execute(conn)?;
                let deleted = diesel::delete(recipes::table.find(id)).execute(conn)?;
                if deleted == 0 {
                    return Err(StoreError::NotFound("Recipe"));
                }
                Ok(pulled)
            })
        })
    }

    fn search_recipes(&self, query: &RecipeQuery) -> StoreResult<RecipePage> {
        self.run("search_recipes", |conn| {
            let total: i64 = filtered(&query.filter).count().get_result(conn)?;

            let recipes = ordered(filtered(&query.filter), query.sort)
                .select(Recipe::as_select())
                .limit(query.pagination.limit)
                .offset(query.pagination.offset())
                .load(conn)?;

            Ok(RecipePage { recipes, total })
        })
    }

    fn recipes_by_author(&self, author_id: Uuid) -> StoreResult<Vec<Recipe>> {
        self.run("recipes_by_author", |conn| {
            Ok(recipes::table
                .filter(recipes::author_id.eq(author_id))
                .order((recipes::created_at.desc(), recipes::id.desc()))
                .select(Recipe::as_select())
                .load(conn)?)
        })
    }

    fn count_recipes_by_author(&self, author_id: Uuid) -> StoreResult<i64> {
        self.run("count_recipes_by_author", |conn| {
            Ok(recipes::table
                .filter(recipes::author_id.eq(author_id))
                .count()
                .get_result(conn)?)
        })
    }

    fn add_favorite(&self, user_id: Uuid, recipe_id: Uuid) -> StoreResult<FavoritesUpdate> {
        self.run("add_favorite", |conn| {
            conn.transaction::<_, StoreError, _>(|conn| {
                let count = lock_favorites_count(conn, recipe_id)?;
                let mut favorites = load_favorite_ids(conn, user_id)?;
                ledger::check_add(&favorites, recipe_id, count.is_some())?;

                diesel::insert_into(favorites::table)
                    .values(&NewFavorite { user_id, recipe_id })
                    .execute(conn)?;

                let count = ledger::incremented(count.unwrap_or_default());
                set_favorites_count(conn, recipe_id, count)?;

                favorites.push(recipe_id);
                Ok(FavoritesUpdate {
                    favorites,
                    favorites_count: Some(count),
                })
            })
        })
    }

    fn remove_favorite(&self, user_id: Uuid, recipe_id: Uuid) -> StoreResult<FavoritesUpdate> {
        self.run("remove_favorite", |conn| {
            conn.transaction::<_, StoreError, _>(|conn| {
                let count = lock_favorites_count(conn, recipe_id)?;
                let mut favorites = load_favorite_ids(conn, user_id)?;
                ledger::check_remove(&favorites, recipe_id)?;

                diesel::delete(favorites::table.find((user_id, recipe_id))).execute(conn)?;

                let count = match count {
                    Some(current) => {
                        let next = ledger::decremented(current);
                        set_favorites_count(conn, recipe_id, next)?;
                        Some(next)
                    }
                    None => None,
                };

                favorites.retain(|id| *id != recipe_id);
                Ok(FavoritesUpdate {
                    favorites,
                    favorites_count: count,
                })
            })
        })
    }

    fn favorite_ids(&self, user_id: Uuid) -> StoreResult<Vec<Uuid>> {
        self.run("favorite_ids", |conn| Ok(load_favorite_ids(conn, user_id)?))
    }

    fn favorite_recipes(&self, user_id: Uuid) -> StoreResult<Vec<Recipe>> {
        self.run("favorite_recipes", |conn| {
            Ok(favorites::table
                .inner_join(recipes::table)
                .filter(favorites::user_id.eq(user_id))
                .order((favorites::created_at.asc(), favorites::recipe_id.asc()))
                .select(Recipe::as_select())
                .load(conn)?)
        })
    }
}
