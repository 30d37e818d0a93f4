pub mod login;
pub mod signup;

use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

/// Issued on signup and login
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub user_id: Uuid,
    /// Bearer token for the Authorization header
    pub token: String,
}
