use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
};

use crate::AppState;

/// Extractor that validates the `X-Admin-Key` header against `config.admin_key`.
pub struct AdminAuth;

impl FromRequestParts<AppState> for AdminAuth {
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let expected = state
            .config
            .admin_key
            .as_deref()
            .ok_or((StatusCode::UNAUTHORIZED, "Admin API is disabled"))?;

        let key = parts
            .headers
            .get("X-Admin-Key")
            .and_then(|v| v.to_str().ok())
            .ok_or((StatusCode::UNAUTHORIZED, "Missing X-Admin-Key header"))?;

        if key != expected {
            return Err((StatusCode::UNAUTHORIZED, "Invalid admin key"));
        }

        Ok(AdminAuth)
    }
}
