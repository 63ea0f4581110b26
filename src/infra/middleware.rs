use axum::{extract::Request, middleware::Next, response::Response};
use uuid::Uuid;

use crate::infra::app_error::AppError;

/// Header carrying the user id verified by the upstream auth gateway.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Makes the caller's verified user id available as `Extension<Uuid>`.
pub async fn user_identity(mut req: Request, next: Next) -> Result<Response, AppError> {
    let user_id = req
        .headers()
        .get(USER_ID_HEADER)
        .ok_or_else(|| AppError::Unauthorized("Missing user identity".into()))?
        .to_str()
        .ok()
        .and_then(|raw| Uuid::parse_str(raw.trim()).ok())
        .ok_or_else(|| AppError::Unauthorized("Invalid user identity".into()))?;

    req.extensions_mut().insert(user_id);
    Ok(next.run(req).await)
}
