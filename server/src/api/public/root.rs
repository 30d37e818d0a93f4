use crate::api::MessageResponse;
use axum::Json;

#[utoipa::path(
    get,
    path = "/",
    tag = "public",
    responses(
        (status = 200, description = "API banner", body = MessageResponse)
    )
)]
pub async fn root() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: "Recipe Sharing Platform API".to_string(),
    })
}
