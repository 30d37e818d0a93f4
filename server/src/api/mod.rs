pub mod public;
pub mod recipes;
pub mod users;

use crate::error::ApiError;
use crate::validation::ValidationIssue;
use serde::Serialize;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::{OpenApi, ToSchema};
use uuid::Uuid;

use crate::models::{Category, Cuisine, Difficulty, Ingredient};

/// Shared error response used by all endpoints
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    /// Violated constraints, present on validation failures
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<ValidationIssue>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

/// Path ids that aren't UUIDs can't name anything, so they read as missing.
pub fn parse_id(raw: &str, kind: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::NotFound(format!("{kind} not found")))
}

/// Generate the complete OpenAPI spec by merging all module specs
pub fn openapi() -> utoipa::openapi::OpenApi {
    // Base spec with shared components and security
    #[derive(OpenApi)]
    #[openapi(
        info(title = "Potluck", description = "Recipe sharing API"),
        components(schemas(
            ErrorResponse,
            MessageResponse,
            ValidationIssue,
            Ingredient,
            Difficulty,
            Cuisine,
            Category,
        ))
    )]
    struct BaseApi;

    let mut spec = BaseApi::openapi();

    // Add security scheme
    if let Some(components) = spec.components.as_mut() {
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        );
    }

    // Merge in each module's spec
    let modules: Vec<utoipa::openapi::OpenApi> = vec![
        public::ApiDoc::openapi(),
        recipes::ApiDoc::openapi(),
        users::ApiDoc::openapi(),
    ];

    for module_spec in modules {
        // Merge paths
        spec.paths.paths.extend(module_spec.paths.paths);

        // Merge components (schemas)
        if let Some(module_components) = module_spec.components {
            if let Some(spec_components) = spec.components.as_mut() {
                spec_components.schemas.extend(module_components.schemas);
            }
        }
    }

    spec
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_every_route() {
        let spec = openapi();
        for path in [
            "/",
            "/api/auth/signup",
            "/api/auth/login",
            "/api/recipes",
            "/api/recipes/{id}",
            "/api/recipes/user/{userId}",
            "/api/users/{id}",
            "/api/users/{id}/recipes",
            "/api/users/me/favorites",
            "/api/users/favorites/{recipeId}",
        ] {
            assert!(spec.paths.paths.contains_key(path), "missing {path}");
        }
    }

    fn param_schema<'a>(
        doc: &'a serde_json::Value,
        path: &str,
        method: &str,
        name: &str,
    ) -> &'a serde_json::Value {
        doc["paths"][path][method]["parameters"]
            .as_array()
            .and_then(|params| params.iter().find(|p| p["name"] == name))
            .map(|p| &p["schema"])
            .unwrap_or_else(|| panic!("no {name} parameter on {method} {path}"))
    }

    fn has_type(schema: &serde_json::Value, ty: &str) -> bool {
        schema["type"] == ty
            || schema["type"]
                .as_array()
                .is_some_and(|types| types.iter().any(|t| t == ty))
    }

    #[test]
    fn test_openapi_parameter_types() {
        let doc = serde_json::to_value(openapi()).unwrap();

        for (path, method, name) in [
            ("/api/recipes/{id}", "get", "id"),
            ("/api/recipes/{id}", "put", "id"),
            ("/api/recipes/{id}", "delete", "id"),
            ("/api/recipes/user/{userId}", "get", "userId"),
            ("/api/users/{id}/recipes", "get", "id"),
        ] {
            assert_eq!(
                param_schema(&doc, path, method, name)["format"],
                "uuid",
                "{method} {path}"
            );
        }

        for name in ["maxPrepTime", "maxCookTime", "page", "limit"] {
            let schema = param_schema(&doc, "/api/recipes", "get", name);
            assert!(has_type(schema, "integer"), "{name}: {schema}");
        }
    }

    #[test]
    fn test_parse_id_reads_garbage_as_missing() {
        assert!(matches!(
            parse_id("not-a-uuid", "Recipe"),
            Err(ApiError::NotFound(ref m)) if m == "Recipe not found"
        ));
        let id = Uuid::new_v4();
        assert_eq!(parse_id(&id.to_string(), "Recipe").unwrap(), id);
    }
}
