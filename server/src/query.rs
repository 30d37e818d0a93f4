//! Recipe listing: turns raw query-string parameters into a validated
//! [`RecipeQuery`] (filters, sort, page window) that both store backends
//! execute with the same semantics.
//!
//! - `search` is a case-insensitive substring match against title OR
//!   description OR any tag
//! - cuisine/category/difficulty are exact matches, time bounds are inclusive
//! - every supplied filter must hold (AND), the search clause included

use crate::config::ListingDefaults;
use crate::models::{Category, Cuisine, Difficulty, Recipe};
use crate::validation::{ValidationError, Validator};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::str::FromStr;
use utoipa::{IntoParams, ToSchema};

/// Sortable recipe fields. Anything else is rejected.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum SortBy {
    #[default]
    CreatedAt,
    UpdatedAt,
    Title,
    PrepTime,
    CookTime,
    Servings,
    FavoritesCount,
}

impl SortBy {
    pub const ALL: &'static [SortBy] = &[
        SortBy::CreatedAt,
        SortBy::UpdatedAt,
        SortBy::Title,
        SortBy::PrepTime,
        SortBy::CookTime,
        SortBy::Servings,
        SortBy::FavoritesCount,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SortBy::CreatedAt => "createdAt",
            SortBy::UpdatedAt => "updatedAt",
            SortBy::Title => "title",
            SortBy::PrepTime => "prepTime",
            SortBy::CookTime => "cookTime",
            SortBy::Servings => "servings",
            SortBy::FavoritesCount => "favoritesCount",
        }
    }
}

impl std::fmt::Display for SortBy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortBy {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL.iter().copied().find(|v| v.as_str() == s).ok_or(())
    }
}

/// Sort direction
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Ascending (oldest/lowest first)
    Asc,
    /// Descending (newest/highest first)
    #[default]
    Desc,
}

impl Direction {
    pub const ALL: &'static [Direction] = &[Direction::Asc, Direction::Desc];
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Direction::Asc => "asc",
            Direction::Desc => "desc",
        })
    }
}

impl FromStr for Direction {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(Direction::Asc),
            "desc" => Ok(Direction::Desc),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ListRecipesParams {
    /// Case-insensitive text matched against title, description and tags
    pub search: Option<String>,
    /// Exact cuisine (e.g. `Italian`)
    pub cuisine: Option<String>,
    /// Exact category (e.g. `Dinner`)
    pub category: Option<String>,
    /// Exact difficulty (`Easy`, `Medium`, `Hard`)
    pub difficulty: Option<String>,
    /// Inclusive upper bound on prep time, in minutes
    #[param(value_type = Option<i64>)]
    pub max_prep_time: Option<String>,
    /// Inclusive upper bound on cook time, in minutes
    #[param(value_type = Option<i64>)]
    pub max_cook_time: Option<String>,
    /// Sort field (default: createdAt)
    pub sort_by: Option<String>,
    /// Sort direction, `asc` or `desc` (default: desc)
    pub order: Option<String>,
    /// 1-based page number (default: 1)
    #[param(value_type = Option<i64>)]
    pub page: Option<String>,
    /// Page size (default: 12, capped at the configured maximum)
    #[param(value_type = Option<i64>)]
    pub limit: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecipeFilter {
    pub search: Option<String>,
    pub cuisine: Option<Cuisine>,
    pub category: Option<Category>,
    pub difficulty: Option<Difficulty>,
    pub max_prep_time: Option<i32>,
    pub max_cook_time: Option<i32>,
}

impl RecipeFilter {
    pub fn matches(&self, recipe: &Recipe) -> bool {
        if let Some(ref search) = self.search {
            let needle = search.to_lowercase();
            let hit = recipe.title.to_lowercase().contains(&needle)
                || recipe.description.to_lowercase().contains(&needle)
                || recipe
                    .tags
                    .iter()
                    .any(|tag| tag.to_lowercase().contains(&needle));
            if !hit {
                return false;
            }
        }

        self.cuisine.is_none_or(|c| recipe.cuisine == c)
            && self.category.is_none_or(|c| recipe.category == c)
            && self.difficulty.is_none_or(|d| recipe.difficulty == d)
            && self.max_prep_time.is_none_or(|max| recipe.prep_time <= max)
            && self.max_cook_time.is_none_or(|max| recipe.cook_time <= max)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Sort {
    pub by: SortBy,
    pub direction: Direction,
}

impl Sort {
    /// Total order used for listing. Ties fall back to the recipe id in the
    /// same direction so page boundaries are stable.
    pub fn compare(&self, a: &Recipe, b: &Recipe) -> Ordering {
        let primary = match self.by {
            SortBy::CreatedAt => a.created_at.cmp(&b.created_at),
            SortBy::UpdatedAt => a.updated_at.cmp(&b.updated_at),
            SortBy::Title => a.title.to_lowercase().cmp(&b.title.to_lowercase()),
            SortBy::PrepTime => a.prep_time.cmp(&b.prep_time),
            SortBy::CookTime => a.cook_time.cmp(&b.cook_time),
            SortBy::Servings => a.servings.cmp(&b.servings),
            SortBy::FavoritesCount => a.favorites_count.cmp(&b.favorites_count),
        };
        let ordering = primary.then_with(|| a.id.cmp(&b.id));
        match self.direction {
            Direction::Asc => ordering,
            Direction::Desc => ordering.reverse(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    /// 1-based
    pub page: i64,
    pub limit: i64,
}

impl Pagination {
    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.limit
    }

    pub fn total_pages(&self, total: i64) -> i64 {
        if total <= 0 {
            0
        } else {
            (total + self.limit - 1) / self.limit
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipeQuery {
    pub filter: RecipeFilter,
    pub sort: Sort,
    pub pagination: Pagination,
}

/// Non-blank, trimmed query-string value.
fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl ListRecipesParams {
    pub fn into_query(self, defaults: &ListingDefaults) -> Result<RecipeQuery, ValidationError> {
        let mut v = Validator::new();

        let cuisine = present(&self.cuisine).and_then(|c| v.one_of("cuisine", c, Cuisine::ALL));
        let category =
            present(&self.category).and_then(|c| v.one_of("category", c, Category::ALL));
        let difficulty =
            present(&self.difficulty).and_then(|d| v.one_of("difficulty", d, Difficulty::ALL));
        let max_prep_time = present(&self.max_prep_time)
            .and_then(|t| v.integer("maxPrepTime", t))
            .and_then(|t| v.at_least("maxPrepTime", t, 0));
        let max_cook_time = present(&self.max_cook_time)
            .and_then(|t| v.integer("maxCookTime", t))
            .and_then(|t| v.at_least("maxCookTime", t, 0));

        let sort_by = match present(&self.sort_by) {
            Some(s) => v.one_of("sortBy", s, SortBy::ALL).unwrap_or_default(),
            None => defaults.sort_by,
        };
        let direction = match present(&self.order) {
            Some(s) => v.one_of("order", s, Direction::ALL).unwrap_or_default(),
            None => defaults.order,
        };

        // Unparseable text is already recorded by `integer`
        let page = match present(&self.page) {
            Some(p) => v.integer("page", p).unwrap_or(1),
            None => 1,
        };
        if page < 1 {
            v.push("page", "min", "page must be at least 1");
        }
        let limit = match present(&self.limit) {
            Some(l) => v.integer("limit", l).unwrap_or(defaults.page_size),
            None => defaults.page_size,
        };
        if limit < 1 {
            v.push("limit", "min", "limit must be at least 1");
        }
        let limit = limit.min(defaults.max_page_size);
        if page >= 1 && limit >= 1 && (page - 1).checked_mul(limit).is_none() {
            v.push("page", "max", "page is too large");
        }

        let search = present(&self.search).map(str::to_string);

        v.finish(|| RecipeQuery {
            filter: RecipeFilter {
                search,
                cuisine,
                category,
                difficulty,
                max_prep_time,
                max_cook_time,
            },
            sort: Sort {
                by: sort_by,
                direction,
            },
            pagination: Pagination { page, limit },
        })
    }
}

/// `%needle%` for ILIKE, with LIKE metacharacters escaped so the search text
/// matches literally.
pub fn contains_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for c in needle.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Ingredients;
    use chrono::{Duration, TimeZone, Utc};
    use uuid::Uuid;

    fn recipe(title: &str, cuisine: Cuisine, prep: i32, cook: i32, tags: &[&str]) -> Recipe {
        let created = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        Recipe {
            id: Uuid::new_v4(),
            author_id: Uuid::new_v4(),
            title: title.to_string(),
            description: format!("All about {title}"),
            ingredients: Ingredients::default(),
            instructions: vec!["Cook it".to_string()],
            prep_time: prep,
            cook_time: cook,
            servings: 2,
            difficulty: Difficulty::Easy,
            cuisine,
            category: Category::Dinner,
            image: String::new(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            favorites_count: 0,
            created_at: created,
            updated_at: created,
        }
    }

    fn params() -> ListRecipesParams {
        ListRecipesParams::default()
    }

    #[test]
    fn test_defaults() {
        let query = params().into_query(&ListingDefaults::default()).unwrap();
        assert_eq!(query.filter, RecipeFilter::default());
        assert_eq!(query.sort.by, SortBy::CreatedAt);
        assert_eq!(query.sort.direction, Direction::Desc);
        assert_eq!(query.pagination, Pagination { page: 1, limit: 12 });
    }

    #[test]
    fn test_blank_values_are_ignored() {
        let query = ListRecipesParams {
            search: Some("   ".to_string()),
            cuisine: Some(String::new()),
            ..params()
        }
        .into_query(&ListingDefaults::default())
        .unwrap();
        assert_eq!(query.filter, RecipeFilter::default());
    }

    #[test]
    fn test_blank_numbers_are_ignored_and_text_is_rejected() {
        let defaults = ListingDefaults::default();
        let query = ListRecipesParams {
            max_prep_time: Some(String::new()),
            max_cook_time: Some(" ".to_string()),
            page: Some(String::new()),
            limit: Some(String::new()),
            ..params()
        }
        .into_query(&defaults)
        .unwrap();
        assert_eq!(query.filter, RecipeFilter::default());
        assert_eq!(query.pagination, Pagination { page: 1, limit: 12 });

        let query = ListRecipesParams {
            max_prep_time: Some(" 15 ".to_string()),
            ..params()
        }
        .into_query(&defaults)
        .unwrap();
        assert_eq!(query.filter.max_prep_time, Some(15));

        let err = ListRecipesParams {
            max_prep_time: Some("abc".to_string()),
            page: Some("two".to_string()),
            ..params()
        }
        .into_query(&defaults)
        .unwrap_err();
        let issues: Vec<_> = err
            .issues
            .iter()
            .map(|i| (i.field.as_str(), i.code.as_str()))
            .collect();
        assert_eq!(issues, vec![("maxPrepTime", "integer"), ("page", "integer")]);
    }

    #[test]
    fn test_unknown_sort_key_is_rejected() {
        let err = ListRecipesParams {
            sort_by: Some("password".to_string()),
            order: Some("sideways".to_string()),
            ..params()
        }
        .into_query(&ListingDefaults::default())
        .unwrap_err();
        let fields: Vec<_> = err.issues.iter().map(|i| i.field.as_str()).collect();
        assert_eq!(fields, vec!["sortBy", "order"]);
    }

    #[test]
    fn test_page_and_limit_bounds() {
        let defaults = ListingDefaults::default();
        let err = ListRecipesParams {
            page: Some("0".to_string()),
            limit: Some("0".to_string()),
            ..params()
        }
        .into_query(&defaults)
        .unwrap_err();
        assert_eq!(err.issues.len(), 2);

        let query = ListRecipesParams {
            limit: Some("10000".to_string()),
            ..params()
        }
        .into_query(&defaults)
        .unwrap();
        assert_eq!(query.pagination.limit, defaults.max_page_size);

        assert!(ListRecipesParams {
            page: Some(i64::MAX.to_string()),
            ..params()
        }
        .into_query(&defaults)
        .is_err());
    }

    #[test]
    fn test_offset_and_total_pages() {
        let p = Pagination { page: 3, limit: 12 };
        assert_eq!(p.offset(), 24);
        assert_eq!(p.total_pages(0), 0);
        assert_eq!(p.total_pages(1), 1);
        assert_eq!(p.total_pages(12), 1);
        assert_eq!(p.total_pages(13), 2);
        assert_eq!(Pagination { page: 1, limit: 1 }.total_pages(7), 7);
    }

    #[test]
    fn test_search_matches_title_description_or_tag() {
        let r = recipe("Green Curry", Cuisine::Thai, 15, 20, &["Spicy", "weeknight"]);
        let search = |s: &str| RecipeFilter {
            search: Some(s.to_string()),
            ..Default::default()
        };
        assert!(search("curry").matches(&r));
        assert!(search("ALL ABOUT").matches(&r));
        assert!(search("spic").matches(&r));
        assert!(!search("lasagna").matches(&r));
    }

    #[test]
    fn test_filters_are_conjunctive_and_bounds_inclusive() {
        let r = recipe("Carbonara", Cuisine::Italian, 10, 20, &[]);
        let filter = RecipeFilter {
            cuisine: Some(Cuisine::Italian),
            max_prep_time: Some(10),
            max_cook_time: Some(20),
            ..Default::default()
        };
        assert!(filter.matches(&r));

        let too_strict = RecipeFilter {
            max_cook_time: Some(19),
            ..filter.clone()
        };
        assert!(!too_strict.matches(&r));

        let wrong_cuisine = RecipeFilter {
            cuisine: Some(Cuisine::French),
            ..filter
        };
        assert!(!wrong_cuisine.matches(&r));
    }

    #[test]
    fn test_search_combines_with_filters() {
        let r = recipe("Tacos", Cuisine::Mexican, 5, 5, &["street"]);
        let filter = RecipeFilter {
            search: Some("street".to_string()),
            cuisine: Some(Cuisine::Indian),
            ..Default::default()
        };
        assert!(!filter.matches(&r));
    }

    #[test]
    fn test_sort_compare_breaks_ties_by_id() {
        let a = recipe("A", Cuisine::Other, 5, 5, &[]);
        let mut b = recipe("B", Cuisine::Other, 5, 5, &[]);
        b.created_at = a.created_at + Duration::minutes(1);

        let newest_first = Sort::default();
        assert_eq!(newest_first.compare(&a, &b), Ordering::Greater);

        let by_prep = Sort {
            by: SortBy::PrepTime,
            direction: Direction::Asc,
        };
        assert_eq!(by_prep.compare(&a, &b), a.id.cmp(&b.id));
    }

    #[test]
    fn test_title_sort_ignores_case() {
        let apple = recipe("apple pie", Cuisine::Other, 5, 5, &[]);
        let banana = recipe("Banana bread", Cuisine::Other, 5, 5, &[]);
        let by_title = Sort {
            by: SortBy::Title,
            direction: Direction::Asc,
        };
        assert_eq!(by_title.compare(&apple, &banana), Ordering::Less);

        let mut titles = vec![&banana, &apple];
        titles.sort_by(|a, b| by_title.compare(a, b));
        assert_eq!(titles[0].title, "apple pie");
    }

    #[test]
    fn test_contains_pattern_escapes_metacharacters() {
        assert_eq!(contains_pattern("chili"), "%chili%");
        assert_eq!(contains_pattern("100%_a\\b"), "%100\\%\\_a\\\\b%");
    }
}
