//! Raw SQL fragments that can't be expressed in Diesel's type-safe DSL.
//!
//! # Safety
//!
//! User input is ALWAYS passed via `.bind()` parameters, never interpolated.

/// Filter expression: some element of `recipes.tags` matches an ILIKE pattern.
///
/// # Safety
/// The pattern is passed via `.bind()`, not interpolated.
///
/// # Why raw SQL?
/// Diesel has no DSL for `unnest()` inside a predicate.
#[macro_export]
macro_rules! any_tag_ilike {
    ($pattern:expr) => {
        diesel::dsl::sql::<diesel::sql_types::Bool>(
            "EXISTS (SELECT 1 FROM unnest(recipes.tags) AS t(tag) WHERE t.tag ILIKE ",
        )
        .bind::<diesel::sql_types::Text, _>($pattern)
        .sql(")")
    };
}

/// Sort key for `sortBy=title`: lowercased title in byte order, so ordering
/// doesn't depend on the database collation.
///
/// # Why raw SQL?
/// Diesel's DSL has no `COLLATE`.
#[macro_export]
macro_rules! title_sort_key {
    () => {
        diesel::dsl::sql::<diesel::sql_types::Text>("lower(recipes.title) COLLATE \"C\"")
    };
}
