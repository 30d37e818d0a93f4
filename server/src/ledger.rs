//! Favorites ledger rules.
//!
//! A favorite lives in two places: the user's ordered favorites list and the
//! recipe's `favorites_count`. Store backends apply these checks and counter
//! steps inside the same transaction (or lock) as the writes, so the two
//! sides move together.

use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Recipe not found")]
    RecipeNotFound,

    #[error("Recipe already in favorites")]
    AlreadyFavorited,

    #[error("Recipe not in favorites")]
    NotFavorited,
}

/// Result of a successful toggle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FavoritesUpdate {
    /// The user's favorites after the change, oldest first
    pub favorites: Vec<Uuid>,
    /// The recipe's counter after the change; `None` when the recipe row no
    /// longer exists
    pub favorites_count: Option<i32>,
}

/// The recipe must exist and must not already be a favorite.
pub fn check_add(favorites: &[Uuid], recipe_id: Uuid, recipe_exists: bool) -> Result<(), LedgerError> {
    if !recipe_exists {
        return Err(LedgerError::RecipeNotFound);
    }
    if favorites.contains(&recipe_id) {
        return Err(LedgerError::AlreadyFavorited);
    }
    Ok(())
}

/// Only membership matters for removal; a dangling id can always be pulled.
pub fn check_remove(favorites: &[Uuid], recipe_id: Uuid) -> Result<(), LedgerError> {
    if favorites.contains(&recipe_id) {
        Ok(())
    } else {
        Err(LedgerError::NotFavorited)
    }
}

pub fn incremented(count: i32) -> i32 {
    count.saturating_add(1)
}

/// Never goes below zero, even when the stored counter already reads zero.
pub fn decremented(count: i32) -> i32 {
    count.saturating_sub(1).max(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_requires_existing_recipe_first() {
        let id = Uuid::new_v4();
        // Missing recipe wins over duplicate membership
        assert_eq!(
            check_add(&[id], id, false),
            Err(LedgerError::RecipeNotFound)
        );
        assert_eq!(
            check_add(&[id], id, true),
            Err(LedgerError::AlreadyFavorited)
        );
        assert_eq!(check_add(&[], id, true), Ok(()));
    }

    #[test]
    fn test_remove_requires_membership() {
        let id = Uuid::new_v4();
        assert_eq!(check_remove(&[], id), Err(LedgerError::NotFavorited));
        assert_eq!(
            check_remove(&[Uuid::new_v4()], id),
            Err(LedgerError::NotFavorited)
        );
        assert_eq!(check_remove(&[id], id), Ok(()));
    }

    #[test]
    fn test_counter_is_floored_at_zero() {
        assert_eq!(incremented(0), 1);
        assert_eq!(decremented(1), 0);
        assert_eq!(decremented(0), 0);
        assert_eq!(decremented(-3), 0);
    }
}
