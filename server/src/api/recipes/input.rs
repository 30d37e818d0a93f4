//! Recipe request bodies and their validation.
//!
//! Every field is optional at the serde level so that missing fields surface
//! as validation issues rather than deserialization failures.

use crate::models::{
    Category, Cuisine, Difficulty, Ingredient, Ingredients, NewRecipe, RecipeChanges,
    DEFAULT_RECIPE_IMAGE,
};
use crate::validation::{ValidationError, Validator, DESCRIPTION_MAX_CHARS, TITLE_MAX_CHARS};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct IngredientInput {
    pub item: Option<String>,
    pub quantity: Option<String>,
    pub unit: Option<String>,
}

/// Body of `POST /api/recipes` and `PUT /api/recipes/{id}`. On update, absent
/// fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecipeInput {
    /// Up to 100 characters
    pub title: Option<String>,
    /// Up to 500 characters
    pub description: Option<String>,
    pub ingredients: Option<Vec<IngredientInput>>,
    pub instructions: Option<Vec<String>>,
    /// Minutes
    pub prep_time: Option<i64>,
    /// Minutes
    pub cook_time: Option<i64>,
    pub servings: Option<i64>,
    #[schema(value_type = Option<Difficulty>)]
    pub difficulty: Option<String>,
    #[schema(value_type = Option<Cuisine>)]
    pub cuisine: Option<String>,
    #[schema(value_type = Option<Category>)]
    pub category: Option<String>,
    /// Image URL; blank means the placeholder image
    pub image: Option<String>,
    pub tags: Option<Vec<String>>,
}

/// Fields that passed their checks. A field is `None` when it was absent or
/// failed (the failure is recorded in the validator).
#[derive(Default)]
struct Checked {
    title: Option<String>,
    description: Option<String>,
    ingredients: Option<Ingredients>,
    instructions: Option<Vec<String>>,
    prep_time: Option<i32>,
    cook_time: Option<i32>,
    servings: Option<i32>,
    difficulty: Option<Difficulty>,
    cuisine: Option<Cuisine>,
    category: Option<Category>,
    image: Option<String>,
    tags: Option<Vec<String>>,
}

fn need<T>(v: &mut Validator, required: bool, field: &str, value: Option<T>) -> Option<T> {
    if required {
        v.required(field, value)
    } else {
        value
    }
}

fn check_ingredients(v: &mut Validator, list: Vec<IngredientInput>) -> Option<Ingredients> {
    if list.is_empty() {
        v.push("ingredients", "required", "ingredients cannot be empty");
        return None;
    }

    let mut ingredients = Vec::with_capacity(list.len());
    for (i, input) in list.into_iter().enumerate() {
        let mut part = |name: &str, value: Option<String>| {
            let field = format!("ingredients[{i}].{name}");
            v.required(&field, value)
                .and_then(|text| v.text(&field, &text, None))
        };
        let item = part("item", input.item);
        let quantity = part("quantity", input.quantity);
        let unit = part("unit", input.unit);
        if let (Some(item), Some(quantity), Some(unit)) = (item, quantity, unit) {
            ingredients.push(Ingredient {
                item,
                quantity,
                unit,
            });
        }
    }
    Some(Ingredients(ingredients))
}

fn check_instructions(v: &mut Validator, list: Vec<String>) -> Option<Vec<String>> {
    if list.is_empty() {
        v.push("instructions", "required", "instructions cannot be empty");
        return None;
    }

    let steps: Vec<_> = list
        .iter()
        .enumerate()
        .filter_map(|(i, step)| v.text(&format!("instructions[{i}]"), step, None))
        .collect();
    Some(steps)
}

fn check_image(v: &mut Validator, image: String) -> Option<String> {
    if image.trim().is_empty() {
        Some(DEFAULT_RECIPE_IMAGE.to_string())
    } else {
        v.url("image", &image)
    }
}

/// Trimmed, blanks dropped, order kept.
fn clean_tags(tags: Vec<String>) -> Vec<String> {
    tags.into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

impl RecipeInput {
    fn check(self, v: &mut Validator, required: bool) -> Checked {
        let title = need(v, required, "title", self.title);
        let description = need(v, required, "description", self.description);
        let ingredients = need(v, required, "ingredients", self.ingredients);
        let instructions = need(v, required, "instructions", self.instructions);
        let prep_time = need(v, required, "prepTime", self.prep_time);
        let cook_time = need(v, required, "cookTime", self.cook_time);
        let servings = need(v, required, "servings", self.servings);
        let difficulty = need(v, required, "difficulty", self.difficulty);
        let cuisine = need(v, required, "cuisine", self.cuisine);
        let category = need(v, required, "category", self.category);

        Checked {
            title: title.and_then(|t| v.text("title", &t, Some(TITLE_MAX_CHARS))),
            description: description
                .and_then(|d| v.text("description", &d, Some(DESCRIPTION_MAX_CHARS))),
            ingredients: ingredients.and_then(|list| check_ingredients(v, list)),
            instructions: instructions.and_then(|list| check_instructions(v, list)),
            prep_time: prep_time.and_then(|t| v.at_least("prepTime", t, 0)),
            cook_time: cook_time.and_then(|t| v.at_least("cookTime", t, 0)),
            servings: servings.and_then(|s| v.at_least("servings", s, 1)),
            difficulty: difficulty.and_then(|d| v.one_of("difficulty", &d, Difficulty::ALL)),
            cuisine: cuisine.and_then(|c| v.one_of("cuisine", &c, Cuisine::ALL)),
            category: category.and_then(|c| v.one_of("category", &c, Category::ALL)),
            image: self.image.and_then(|i| check_image(v, i)),
            tags: self.tags.map(clean_tags),
        }
    }

    /// Validates a full recipe for creation.
    pub fn into_new_recipe(self, author_id: Uuid) -> Result<NewRecipe, ValidationError> {
        let mut v = Validator::new();
        let c = self.check(&mut v, true);

        let recipe = (|| {
            Some(NewRecipe {
                author_id,
                title: c.title?,
                description: c.description?,
                ingredients: c.ingredients?,
                instructions: c.instructions?,
                prep_time: c.prep_time?,
                cook_time: c.cook_time?,
                servings: c.servings?,
                difficulty: c.difficulty?,
                cuisine: c.cuisine?,
                category: c.category?,
                image: c.image.unwrap_or_else(|| DEFAULT_RECIPE_IMAGE.to_string()),
                tags: c.tags.unwrap_or_default(),
            })
        })();

        // A missing field always leaves an issue behind
        v.finish(|| recipe)?.ok_or_else(|| {
            ValidationError::single("body", "required", "recipe is incomplete")
        })
    }

    /// Validates the supplied fields of a partial update.
    pub fn into_changes(self, now: DateTime<Utc>) -> Result<RecipeChanges, ValidationError> {
        let mut v = Validator::new();
        let c = self.check(&mut v, false);

        v.finish(|| RecipeChanges {
            title: c.title,
            description: c.description,
            ingredients: c.ingredients,
            instructions: c.instructions,
            prep_time: c.prep_time,
            cook_time: c.cook_time,
            servings: c.servings,
            difficulty: c.difficulty,
            cuisine: c.cuisine,
            category: c.category,
            image: c.image,
            tags: c.tags,
            updated_at: now,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ingredient(item: &str) -> IngredientInput {
        IngredientInput {
            item: Some(item.to_string()),
            quantity: Some("1".to_string()),
            unit: Some("cup".to_string()),
        }
    }

    fn complete() -> RecipeInput {
        RecipeInput {
            title: Some("  Pancakes ".to_string()),
            description: Some("Fluffy".to_string()),
            ingredients: Some(vec![ingredient("flour")]),
            instructions: Some(vec!["Mix".to_string(), "Fry".to_string()]),
            prep_time: Some(10),
            cook_time: Some(20),
            servings: Some(4),
            difficulty: Some("Easy".to_string()),
            cuisine: Some("American".to_string()),
            category: Some("Breakfast".to_string()),
            image: None,
            tags: Some(vec![" sweet ".to_string(), "".to_string()]),
        }
    }

    fn fields(err: &ValidationError) -> Vec<&str> {
        err.issues.iter().map(|i| i.field.as_str()).collect()
    }

    #[test]
    fn test_complete_recipe_is_normalized() {
        let author = Uuid::new_v4();
        let recipe = complete().into_new_recipe(author).unwrap();
        assert_eq!(recipe.author_id, author);
        assert_eq!(recipe.title, "Pancakes");
        assert_eq!(recipe.image, DEFAULT_RECIPE_IMAGE);
        assert_eq!(recipe.tags, vec!["sweet"]);
        assert_eq!(recipe.difficulty, Difficulty::Easy);
        assert_eq!(recipe.ingredients.0.len(), 1);
    }

    #[test]
    fn test_empty_body_lists_every_required_field() {
        let err = RecipeInput::default()
            .into_new_recipe(Uuid::new_v4())
            .unwrap_err();
        assert_eq!(
            fields(&err),
            vec![
                "title",
                "description",
                "ingredients",
                "instructions",
                "prepTime",
                "cookTime",
                "servings",
                "difficulty",
                "cuisine",
                "category",
            ]
        );
    }

    #[test]
    fn test_field_constraints() {
        let err = RecipeInput {
            title: Some("x".repeat(101)),
            ingredients: Some(vec![]),
            instructions: Some(vec!["Mix".to_string(), "  ".to_string()]),
            prep_time: Some(-1),
            servings: Some(0),
            cuisine: Some("Martian".to_string()),
            image: Some("not a url".to_string()),
            ..complete()
        }
        .into_new_recipe(Uuid::new_v4())
        .unwrap_err();
        assert_eq!(
            fields(&err),
            vec![
                "title",
                "ingredients",
                "instructions[1]",
                "prepTime",
                "servings",
                "cuisine",
                "image",
            ]
        );
    }

    #[test]
    fn test_ingredient_parts_are_required() {
        let err = RecipeInput {
            ingredients: Some(vec![
                ingredient("egg"),
                IngredientInput {
                    item: Some("milk".to_string()),
                    quantity: None,
                    unit: Some(" ".to_string()),
                },
            ]),
            ..complete()
        }
        .into_new_recipe(Uuid::new_v4())
        .unwrap_err();
        assert_eq!(
            fields(&err),
            vec!["ingredients[1].quantity", "ingredients[1].unit"]
        );
    }

    #[test]
    fn test_partial_update_only_touches_supplied_fields() {
        let now = Utc::now();
        let changes = RecipeInput {
            title: Some("Crepes".to_string()),
            image: Some(String::new()),
            ..Default::default()
        }
        .into_changes(now)
        .unwrap();
        assert_eq!(changes.title.as_deref(), Some("Crepes"));
        assert_eq!(changes.image.as_deref(), Some(DEFAULT_RECIPE_IMAGE));
        assert!(changes.description.is_none());
        assert!(changes.prep_time.is_none());
        assert_eq!(changes.updated_at, now);

        let err = RecipeInput {
            title: Some(" ".to_string()),
            ..Default::default()
        }
        .into_changes(now)
        .unwrap_err();
        assert_eq!(fields(&err), vec!["title"]);
    }
}
