use axum::Json;

use crate::models::MessageResponse;

pub async fn index_handler() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: "POST to /log".to_string(),
    })
}
