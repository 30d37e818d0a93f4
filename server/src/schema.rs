// Maintained by hand. Array columns are `Array<Text>` because the migrations
// reject NULL elements.

diesel::table! {
    favorites (user_id, recipe_id) {
        user_id -> Uuid,
        recipe_id -> Uuid,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    recipes (id) {
        id -> Uuid,
        author_id -> Uuid,
        #[max_length = 100]
        title -> Varchar,
        #[max_length = 500]
        description -> Varchar,
        ingredients -> Jsonb,
        instructions -> Array<Text>,
        prep_time -> Int4,
        cook_time -> Int4,
        servings -> Int4,
        #[max_length = 16]
        difficulty -> Varchar,
        #[max_length = 32]
        cuisine -> Varchar,
        #[max_length = 32]
        category -> Varchar,
        image -> Varchar,
        tags -> Array<Text>,
        favorites_count -> Int4,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    sessions (id) {
        id -> Uuid,
        user_id -> Uuid,
        #[max_length = 255]
        token_hash -> Varchar,
        expires_at -> Timestamptz,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    users (id) {
        id -> Uuid,
        #[max_length = 50]
        username -> Varchar,
        #[max_length = 255]
        email -> Varchar,
        #[max_length = 255]
        password_hash -> Varchar,
        bio -> Text,
        profile_image -> Varchar,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::joinable!(favorites -> recipes (recipe_id));
diesel::joinable!(favorites -> users (user_id));
diesel::joinable!(recipes -> users (author_id));
diesel::joinable!(sessions -> users (user_id));

diesel::allow_tables_to_appear_in_same_query!(favorites, recipes, sessions, users,);
