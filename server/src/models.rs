use chrono::{DateTime, Utc};
use diesel::deserialize::{self, FromSql, FromSqlRow};
use diesel::expression::AsExpression;
use diesel::pg::{Pg, PgValue};
use diesel::prelude::*;
use diesel::serialize::{self, IsNull, Output, ToSql};
use diesel::sql_types::Jsonb;
use serde::{Deserialize, Serialize};
use std::io::Write;
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

/// Image stored on a recipe when the author doesn't provide one.
pub const DEFAULT_RECIPE_IMAGE: &str = "https://via.placeholder.com/400x300?text=Recipe+Image";

/// Avatar assigned to new users.
pub const DEFAULT_PROFILE_IMAGE: &str = "https://via.placeholder.com/150?text=Chef";

#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = crate::schema::users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub bio: String,
    pub profile_image: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::users)]
pub struct NewUser<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub bio: &'a str,
    pub profile_image: &'a str,
}

/// Self-service profile edit. `None` leaves the column untouched.
#[derive(AsChangeset, Debug, Clone)]
#[diesel(table_name = crate::schema::users)]
pub struct UserChanges {
    pub username: Option<String>,
    pub bio: Option<String>,
    pub profile_image: Option<String>,
    pub password_hash: Option<String>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable, Clone)]
#[diesel(table_name = crate::schema::sessions)]
pub struct NewSession<'a> {
    pub user_id: Uuid,
    pub token_hash: &'a str,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Error)]
#[error("unknown {kind} '{value}'")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

/// Closed string enums stored as VARCHAR. The variant name is both the wire
/// value and the column value.
macro_rules! text_enum {
    ($(#[$meta:meta])* $name:ident, $kind:literal, [$($variant:ident),+ $(,)?]) => {
        $(#[$meta])*
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            Hash,
            Serialize,
            Deserialize,
            ToSchema,
            AsExpression,
            FromSqlRow,
        )]
        #[diesel(sql_type = diesel::sql_types::Text)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => stringify!($variant)),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str() == s)
                    .ok_or_else(|| UnknownVariant {
                        kind: $kind,
                        value: s.to_string(),
                    })
            }
        }

        impl ToSql<diesel::sql_types::Text, Pg> for $name {
            fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
                out.write_all(self.as_str().as_bytes())?;
                Ok(IsNull::No)
            }
        }

        impl FromSql<diesel::sql_types::Text, Pg> for $name {
            fn from_sql(bytes: PgValue<'_>) -> deserialize::Result<Self> {
                let raw = <String as FromSql<diesel::sql_types::Text, Pg>>::from_sql(bytes)?;
                Ok(raw.parse::<$name>()?)
            }
        }
    };
}

text_enum!(Difficulty, "difficulty", [Easy, Medium, Hard]);

text_enum!(
    Cuisine,
    "cuisine",
    [Italian, Chinese, Mexican, Indian, American, French, Japanese, Thai, Mediterranean, Other]
);

text_enum!(
    Category,
    "category",
    [Breakfast, Lunch, Dinner, Dessert, Snack, Beverage]
);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Ingredient {
    pub item: String,
    pub quantity: String,
    pub unit: String,
}

/// Ordered ingredient list, stored as a JSONB array.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema, AsExpression, FromSqlRow)]
#[diesel(sql_type = Jsonb)]
#[serde(transparent)]
pub struct Ingredients(pub Vec<Ingredient>);

impl ToSql<Jsonb, Pg> for Ingredients {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
        // JSONB binary format version
        out.write_all(&[1])?;
        serde_json::to_writer(&mut *out, &self.0)?;
        Ok(IsNull::No)
    }
}

impl FromSql<Jsonb, Pg> for Ingredients {
    fn from_sql(bytes: PgValue<'_>) -> deserialize::Result<Self> {
        let value = <serde_json::Value as FromSql<Jsonb, Pg>>::from_sql(bytes)?;
        Ok(serde_json::from_value(value)?)
    }
}

#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = crate::schema::recipes)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Recipe {
    pub id: Uuid,
    pub author_id: Uuid,
    pub title: String,
    pub description: String,
    pub ingredients: Ingredients,
    pub instructions: Vec<String>,
    pub prep_time: i32,
    pub cook_time: i32,
    pub servings: i32,
    pub difficulty: Difficulty,
    pub cuisine: Cuisine,
    pub category: Category,
    pub image: String,
    pub tags: Vec<String>,
    pub favorites_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::recipes)]
pub struct NewRecipe {
    pub author_id: Uuid,
    pub title: String,
    pub description: String,
    pub ingredients: Ingredients,
    pub instructions: Vec<String>,
    pub prep_time: i32,
    pub cook_time: i32,
    pub servings: i32,
    pub difficulty: Difficulty,
    pub cuisine: Cuisine,
    pub category: Category,
    pub image: String,
    pub tags: Vec<String>,
}

/// Partial recipe edit. The author and the favorites counter are never part
/// of an update.
#[derive(AsChangeset, Debug, Clone)]
#[diesel(table_name = crate::schema::recipes)]
pub struct RecipeChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub ingredients: Option<Ingredients>,
    pub instructions: Option<Vec<String>>,
    pub prep_time: Option<i32>,
    pub cook_time: Option<i32>,
    pub servings: Option<i32>,
    pub difficulty: Option<Difficulty>,
    pub cuisine: Option<Cuisine>,
    pub category: Option<Category>,
    pub image: Option<String>,
    pub tags: Option<Vec<String>>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::favorites)]
pub struct NewFavorite {
    pub user_id: Uuid,
    pub recipe_id: Uuid,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enum_round_trip_through_str() {
        for cuisine in Cuisine::ALL {
            assert_eq!(cuisine.as_str().parse::<Cuisine>().unwrap(), *cuisine);
        }
        assert_eq!(Cuisine::ALL.len(), 10);
        assert_eq!(Category::ALL.len(), 6);
        assert_eq!(Difficulty::ALL.len(), 3);
    }

    #[test]
    fn test_enum_parse_is_case_sensitive() {
        let err = "italian".parse::<Cuisine>().unwrap_err();
        assert_eq!(err.to_string(), "unknown cuisine 'italian'");
        assert!("Hard".parse::<Difficulty>().is_ok());
        assert!("Brunch".parse::<Category>().is_err());
    }

    #[test]
    fn test_ingredients_serialize_as_plain_array() {
        let ingredients = Ingredients(vec![Ingredient {
            item: "flour".to_string(),
            quantity: "2".to_string(),
            unit: "cups".to_string(),
        }]);
        let json = serde_json::to_value(&ingredients).unwrap();
        assert_eq!(
            json,
            serde_json::json!([{"item": "flour", "quantity": "2", "unit": "cups"}])
        );
    }
}
