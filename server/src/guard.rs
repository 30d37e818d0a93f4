//! Ownership checks run before any recipe or profile mutation. A missing
//! resource is reported before an ownership mismatch.

use crate::error::ApiError;
use crate::models::{Recipe, User};
use crate::store::Store;
use uuid::Uuid;

#[derive(Debug, Clone, Copy)]
pub enum RecipeAction {
    Update,
    Delete,
}

impl RecipeAction {
    fn verb(self) -> &'static str {
        match self {
            RecipeAction::Update => "update",
            RecipeAction::Delete => "delete",
        }
    }
}

/// Loads the recipe and checks that `caller` authored it.
pub fn recipe_for_mutation(
    store: &dyn Store,
    caller: &User,
    recipe_id: Uuid,
    action: RecipeAction,
) -> Result<Recipe, ApiError> {
    let recipe = store
        .find_recipe(recipe_id)?
        .ok_or_else(|| ApiError::NotFound("Recipe not found".to_string()))?;

    if recipe.author_id != caller.id {
        tracing::info!(
            recipe_id = %recipe_id,
            caller = %caller.id,
            "rejected {} by non-author",
            action.verb()
        );
        return Err(ApiError::Forbidden(format!(
            "Not authorized to {} this recipe",
            action.verb()
        )));
    }

    Ok(recipe)
}

/// Loads the profile and checks that `caller` is editing their own.
pub fn profile_for_update(store: &dyn Store, caller: &User, user_id: Uuid) -> Result<User, ApiError> {
    let user = store
        .find_user(user_id)?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    if user.id != caller.id {
        return Err(ApiError::Forbidden(
            "Not authorized to update this profile".to_string(),
        ));
    }

    Ok(user)
}
