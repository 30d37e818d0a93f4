use super::{RecipePage, Store, StoreError, StoreResult};
use crate::ledger::{self, FavoritesUpdate};
use crate::models::{NewRecipe, NewSession, NewUser, Recipe, RecipeChanges, User, UserChanges};
use crate::query::RecipeQuery;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

struct SessionRow {
    user_id: Uuid,
    expires_at: DateTime<Utc>,
}

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    sessions: HashMap<String, SessionRow>,
    recipes: HashMap<Uuid, Recipe>,
    /// Per user, oldest favorite first
    favorites: HashMap<Uuid, Vec<Uuid>>,
    last_timestamp: Option<DateTime<Utc>>,
}

impl Tables {
    /// Wall clock, nudged forward so timestamps never repeat within a store.
    fn now(&mut self) -> DateTime<Utc> {
        let mut now = Utc::now();
        if let Some(last) = self.last_timestamp {
            if now <= last {
                now = last + Duration::microseconds(1);
            }
        }
        self.last_timestamp = Some(now);
        now
    }
}

/// Process-local store. One lock guards every table, so each operation
/// (favorite toggles and cascading deletes included) is atomic.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Store for MemoryStore {
    fn create_user(&self, user: NewUser<'_>) -> StoreResult<User> {
        let mut tables = self.tables();
        if tables.users.values().any(|u| u.email == user.email) {
            return Err(StoreError::Conflict("Email"));
        }
        if tables.users.values().any(|u| u.username == user.username) {
            return Err(StoreError::Conflict("Username"));
        }

        let now = tables.now();
        let row = User {
            id: Uuid::new_v4(),
            username: user.username.to_string(),
            email: user.email.to_string(),
            password_hash: user.password_hash.to_string(),
            bio: user.bio.to_string(),
            profile_image: user.profile_image.to_string(),
            created_at: now,
            updated_at: now,
        };
        tables.users.insert(row.id, row.clone());
        Ok(row)
    }

    fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.tables().users.get(&id).cloned())
    }

    fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(self
            .tables()
            .users
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    fn find_users(&self, ids: &[Uuid]) -> StoreResult<Vec<User>> {
        let tables = self.tables();
        Ok(ids
            .iter()
            .filter_map(|id| tables.users.get(id).cloned())
            .collect())
    }

    fn update_user(&self, id: Uuid, changes: &UserChanges) -> StoreResult<User> {
        let mut tables = self.tables();
        if let Some(ref username) = changes.username {
            if tables
                .users
                .values()
                .any(|u| u.id != id && &u.username == username)
            {
                return Err(StoreError::Conflict("Username"));
            }
        }

        let user = tables.users.get_mut(&id).ok_or(StoreError::NotFound("User"))?;
        if let Some(ref username) = changes.username {
            user.username = username.clone();
        }
        if let Some(ref bio) = changes.bio {
            user.bio = bio.clone();
        }
        if let Some(ref image) = changes.profile_image {
            user.profile_image = image.clone();
        }
        if let Some(ref hash) = changes.password_hash {
            user.password_hash = hash.clone();
        }
        user.updated_at = changes.updated_at;
        Ok(user.clone())
    }

    fn create_session(&self, session: NewSession<'_>) -> StoreResult<()> {
        self.tables().sessions.insert(
            session.token_hash.to_string(),
            SessionRow {
                user_id: session.user_id,
                expires_at: session.expires_at,
            },
        );
        Ok(())
    }

    fn user_for_session(&self, token_hash: &str, now: DateTime<Utc>) -> StoreResult<Option<User>> {
        let tables = self.tables();
        Ok(tables
            .sessions
            .get(token_hash)
            .filter(|s| s.expires_at > now)
            .and_then(|s| tables.users.get(&s.user_id))
            .cloned())
    }

    fn insert_recipe(&self, recipe: &NewRecipe) -> StoreResult<Recipe> {
        let mut tables = self.tables();
        let now = tables.now();
        let row = Recipe {
            id: Uuid::new_v4(),
            author_id: recipe.author_id,
            title: recipe.title.clone(),
            description: recipe.description.clone(),
            ingredients: recipe.ingredients.clone(),
            instructions: recipe.instructions.clone(),
            prep_time: recipe.prep_time,
            cook_time: recipe.cook_time,
            servings: recipe.servings,
            difficulty: recipe.difficulty,
            cuisine: recipe.cuisine,
            category: recipe.category,
            image: recipe.image.clone(),
            tags: recipe.tags.clone(),
            favorites_count: 0,
            created_at: now,
            updated_at: now,
        };
        tables.recipes.insert(row.id, row.clone());
        Ok(row)
    }

    fn find_recipe(&self, id: Uuid) -> StoreResult<Option<Recipe>> {
        Ok(self.tables().recipes.get(&id).cloned())
    }

    fn update_recipe(&self, id: Uuid, changes: &RecipeChanges) -> StoreResult<Recipe> {
        let mut tables = self.tables();
        let recipe = tables
            .recipes
            .get_mut(&id)
            .ok_or(StoreError::NotFound("Recipe"))?;

        let changes = changes.clone();
        if let Some(title) = changes.title {
            recipe.title = title;
        }
        if let Some(description) = changes.description {
            recipe.description = description;
        }
        if let Some(ingredients) = changes.ingredients {
            recipe.ingredients = ingredients;
        }
        if let Some(instructions) = changes.instructions {
            recipe.instructions = instructions;
        }
        if let Some(prep_time) = changes.prep_time {
            recipe.prep_time = prep_time;
        }
        if let Some(cook_time) = changes.cook_time {
            recipe.cook_time = cook_time;
        }
        if let Some(servings) = changes.servings {
            recipe.servings = servings;
        }
        if let Some(difficulty) = changes.difficulty {
            recipe.difficulty = difficulty;
        }
        if let Some(cuisine) = changes.cuisine {
            recipe.cuisine = cuisine;
        }
        if let Some(category) = changes.category {
            recipe.category = category;
        }
        if let Some(image) = changes.image {
            recipe.image = image;
        }
        if let Some(tags) = changes.tags {
            recipe.tags = tags;
        }
        recipe.updated_at = changes.updated_at;
        Ok(recipe.clone())
    }

    fn delete_recipe(&self, id: Uuid) -> StoreResult<usize> {
        let mut tables = self.tables();
        if tables.recipes.remove(&id).is_none() {
            return Err(StoreError::NotFound("Recipe"));
        }

        let mut pulled = 0;
        for favorites in tables.favorites.values_mut() {
            let before = favorites.len();
            favorites.retain(|r| *r != id);
            pulled += before - favorites.len();
        }
        Ok(pulled)
    }

    fn search_recipes(&self, query: &RecipeQuery) -> StoreResult<RecipePage> {
        let tables = self.tables();
        let mut matches: Vec<&Recipe> = tables
            .recipes
            .values()
            .filter(|r| query.filter.matches(r))
            .collect();
        matches.sort_by(|a, b| query.sort.compare(a, b));

        let total = matches.len() as i64;
        let offset = usize::try_from(query.pagination.offset()).unwrap_or(usize::MAX);
        let limit = usize::try_from(query.pagination.limit).unwrap_or(usize::MAX);
        let recipes = matches
            .into_iter()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect();

        Ok(RecipePage { recipes, total })
    }

    fn recipes_by_author(&self, author_id: Uuid) -> StoreResult<Vec<Recipe>> {
        let tables = self.tables();
        let mut recipes: Vec<Recipe> = tables
            .recipes
            .values()
            .filter(|r| r.author_id == author_id)
            .cloned()
            .collect();
        recipes.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(recipes)
    }

    fn count_recipes_by_author(&self, author_id: Uuid) -> StoreResult<i64> {
        Ok(self
            .tables()
            .recipes
            .values()
            .filter(|r| r.author_id == author_id)
            .count() as i64)
    }

    fn add_favorite(&self, user_id: Uuid, recipe_id: Uuid) -> StoreResult<FavoritesUpdate> {
        let mut guard = self.tables();
        let tables = &mut *guard;

        let favorites = tables.favorites.entry(user_id).or_default();
        let recipe = tables.recipes.get_mut(&recipe_id);
        ledger::check_add(favorites, recipe_id, recipe.is_some())?;
        let Some(recipe) = recipe else {
            return Err(ledger::LedgerError::RecipeNotFound.into());
        };

        favorites.push(recipe_id);
        recipe.favorites_count = ledger::incremented(recipe.favorites_count);

        Ok(FavoritesUpdate {
            favorites: favorites.clone(),
            favorites_count: Some(recipe.favorites_count),
        })
    }

    fn remove_favorite(&self, user_id: Uuid, recipe_id: Uuid) -> StoreResult<FavoritesUpdate> {
        let mut guard = self.tables();
        let tables = &mut *guard;

        let favorites = tables.favorites.entry(user_id).or_default();
        ledger::check_remove(favorites, recipe_id)?;
        favorites.retain(|r| *r != recipe_id);

        let favorites_count = tables.recipes.get_mut(&recipe_id).map(|recipe| {
            recipe.favorites_count = ledger::decremented(recipe.favorites_count);
            recipe.favorites_count
        });

        Ok(FavoritesUpdate {
            favorites: favorites.clone(),
            favorites_count,
        })
    }

    fn favorite_ids(&self, user_id: Uuid) -> StoreResult<Vec<Uuid>> {
        Ok(self
            .tables()
            .favorites
            .get(&user_id)
            .cloned()
            .unwrap_or_default())
    }

    fn favorite_recipes(&self, user_id: Uuid) -> StoreResult<Vec<Recipe>> {
        let tables = self.tables();
        Ok(tables
            .favorites
            .get(&user_id)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| tables.recipes.get(id).cloned())
                    .collect()
            })
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::LedgerError;
    use crate::models::{Category, Cuisine, Difficulty, Ingredients};
    use crate::query::{Direction, Pagination, RecipeFilter, Sort, SortBy};

    fn user(store: &MemoryStore, name: &str) -> User {
        let email = format!("{name}@example.com");
        store
            .create_user(NewUser {
                username: name,
                email: &email,
                password_hash: "hash",
                bio: "",
                profile_image: "",
            })
            .unwrap()
    }

    fn recipe(store: &MemoryStore, author: Uuid, title: &str, prep: i32) -> Recipe {
        store
            .insert_recipe(&NewRecipe {
                author_id: author,
                title: title.to_string(),
                description: String::new(),
                ingredients: Ingredients::default(),
                instructions: vec!["Mix".to_string()],
                prep_time: prep,
                cook_time: 10,
                servings: 2,
                difficulty: Difficulty::Easy,
                cuisine: Cuisine::Other,
                category: Category::Snack,
                image: String::new(),
                tags: vec![],
            })
            .unwrap()
    }

    #[test]
    fn test_duplicate_email_and_username_conflict() {
        let store = MemoryStore::new();
        user(&store, "ana");

        let err = store
            .create_user(NewUser {
                username: "other",
                email: "ana@example.com",
                password_hash: "hash",
                bio: "",
                profile_image: "",
            })
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict("Email")));

        let err = store
            .create_user(NewUser {
                username: "ana",
                email: "new@example.com",
                password_hash: "hash",
                bio: "",
                profile_image: "",
            })
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict("Username")));
    }

    #[test]
    fn test_favorites_keep_list_and_counter_in_step() {
        let store = MemoryStore::new();
        let ana = user(&store, "ana");
        let ben = user(&store, "ben");
        let soup = recipe(&store, ana.id, "Soup", 5);

        let update = store.add_favorite(ana.id, soup.id).unwrap();
        assert_eq!(update.favorites, vec![soup.id]);
        assert_eq!(update.favorites_count, Some(1));
        store.add_favorite(ben.id, soup.id).unwrap();
        assert_eq!(store.find_recipe(soup.id).unwrap().unwrap().favorites_count, 2);

        let err = store.add_favorite(ana.id, soup.id).unwrap_err();
        assert!(matches!(err, StoreError::Ledger(LedgerError::AlreadyFavorited)));
        assert_eq!(store.find_recipe(soup.id).unwrap().unwrap().favorites_count, 2);

        let update = store.remove_favorite(ana.id, soup.id).unwrap();
        assert!(update.favorites.is_empty());
        assert_eq!(update.favorites_count, Some(1));

        let err = store.remove_favorite(ana.id, soup.id).unwrap_err();
        assert!(matches!(err, StoreError::Ledger(LedgerError::NotFavorited)));
    }

    #[test]
    fn test_add_favorite_of_missing_recipe() {
        let store = MemoryStore::new();
        let ana = user(&store, "ana");
        let err = store.add_favorite(ana.id, Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, StoreError::Ledger(LedgerError::RecipeNotFound)));
        assert!(store.favorite_ids(ana.id).unwrap().is_empty());
    }

    #[test]
    fn test_delete_pulls_recipe_from_every_favorites_list() {
        let store = MemoryStore::new();
        let ana = user(&store, "ana");
        let ben = user(&store, "ben");
        let soup = recipe(&store, ana.id, "Soup", 5);
        let stew = recipe(&store, ana.id, "Stew", 5);
        store.add_favorite(ana.id, soup.id).unwrap();
        store.add_favorite(ana.id, stew.id).unwrap();
        store.add_favorite(ben.id, soup.id).unwrap();

        assert_eq!(store.delete_recipe(soup.id).unwrap(), 2);
        assert_eq!(store.favorite_ids(ana.id).unwrap(), vec![stew.id]);
        assert!(store.favorite_ids(ben.id).unwrap().is_empty());
        assert!(matches!(
            store.delete_recipe(soup.id),
            Err(StoreError::NotFound("Recipe"))
        ));
    }

    #[test]
    fn test_search_sorts_and_pages() {
        let store = MemoryStore::new();
        let ana = user(&store, "ana");
        for (title, prep) in [("A", 30), ("B", 10), ("C", 20), ("D", 40)] {
            recipe(&store, ana.id, title, prep);
        }

        let query = RecipeQuery {
            filter: RecipeFilter {
                max_prep_time: Some(30),
                ..Default::default()
            },
            sort: Sort {
                by: SortBy::PrepTime,
                direction: Direction::Asc,
            },
            pagination: Pagination { page: 2, limit: 2 },
        };
        let page = store.search_recipes(&query).unwrap();
        assert_eq!(page.total, 3);
        let titles: Vec<_> = page.recipes.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["A"]);
    }

    #[test]
    fn test_timestamps_are_strictly_increasing() {
        let store = MemoryStore::new();
        let ana = user(&store, "ana");
        let first = recipe(&store, ana.id, "First", 1);
        let second = recipe(&store, ana.id, "Second", 1);
        assert!(second.created_at > first.created_at);

        let newest_first = store.recipes_by_author(ana.id).unwrap();
        assert_eq!(newest_first[0].id, second.id);
        assert_eq!(store.count_recipes_by_author(ana.id).unwrap(), 2);
    }

    #[test]
    fn test_expired_session_is_ignored() {
        let store = MemoryStore::new();
        let ana = user(&store, "ana");
        let now = Utc::now();
        store
            .create_session(NewSession {
                user_id: ana.id,
                token_hash: "abc",
                expires_at: now + Duration::days(1),
            })
            .unwrap();

        assert!(store.user_for_session("abc", now).unwrap().is_some());
        assert!(store
            .user_for_session("abc", now + Duration::days(2))
            .unwrap()
            .is_none());
        assert!(store.user_for_session("nope", now).unwrap().is_none());
    }
}
