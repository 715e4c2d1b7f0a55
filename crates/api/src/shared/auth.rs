use crate::error::TodoReminderError;
use actix_web::HttpRequest;

pub const USER_ID_HEADER: &str = "x-user-id";

/// Resolves the user making the request from the `x-user-id` header
pub fn protect_route(http_req: &HttpRequest) -> Result<String, TodoReminderError> {
    let user_id = http_req
        .headers()
        .get(USER_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.trim())
        .unwrap_or_default();

    if user_id.is_empty() {
        return Err(TodoReminderError::Unauthorized(format!(
            "Unable to find the user making the request. Must include the `{}` header",
            USER_ID_HEADER
        )));
    }

    Ok(user_id.to_string())
}
