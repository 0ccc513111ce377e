use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};

use crate::{models::notification::TopNotificationContext, AppState};

/// Cookie holding the timestamp of the activation a visitor dismissed.
pub const DISMISS_COOKIE: &str = "closed_notification_timestamp";

/// Extract a named cookie value from request headers.
pub fn get_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    let prefix = format!("{name}=");
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .find_map(|part| part.trim().strip_prefix(&prefix).map(str::to_string))
}

fn with_cookie(body: Value, cookie: String) -> Response {
    ([(header::SET_COOKIE, cookie)], Json(body)).into_response()
}

/// GET /banner — public, the banner context for this visitor.
pub async fn get_banner(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<TopNotificationContext>, (StatusCode, Json<Value>)> {
    let closed = get_cookie(&headers, DISMISS_COOKIE);
    let ctx = state.banner.resolve(closed.as_deref()).await?;
    Ok(Json(ctx))
}

/// POST /banner/dismiss — hide the current banner for this visitor.
pub async fn dismiss_banner(
    State(state): State<AppState>,
) -> Result<Response, (StatusCode, Json<Value>)> {
    let timestamp = state
        .banner
        .shown_notification()
        .await?
        .and_then(|n| n.shown_since_as_timestamp())
        .ok_or((
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "No notification is shown" })),
        ))?;

    let max_age = state.config.dismiss_cookie_days * 86_400;
    Ok(with_cookie(
        json!({ "dismissed": timestamp }),
        format!("{DISMISS_COOKIE}={timestamp}; SameSite=Lax; Path=/; Max-Age={max_age}"),
    ))
}

/// POST /banner/restore — show a dismissed banner again.
pub async fn restore_banner() -> Response {
    with_cookie(
        json!({ "ok": true }),
        format!("{DISMISS_COOKIE}=; SameSite=Lax; Path=/; Max-Age=0"),
    )
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn test_get_cookie() {
        let mut headers = HeaderMap::new();
        assert_eq!(get_cookie(&headers, DISMISS_COOKIE), None);

        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("sessionid=abc; closed_notification_timestamp=1700000000"),
        );
        assert_eq!(
            get_cookie(&headers, DISMISS_COOKIE).as_deref(),
            Some("1700000000")
        );
        assert_eq!(get_cookie(&headers, "sessionid").as_deref(), Some("abc"));
        assert_eq!(get_cookie(&headers, "closed_notification"), None);
    }

    #[test]
    fn test_get_cookie_across_headers() {
        let mut headers = HeaderMap::new();
        headers.append(header::COOKIE, HeaderValue::from_static("a=1"));
        headers.append(
            header::COOKIE,
            HeaderValue::from_static("closed_notification_timestamp=42"),
        );
        assert_eq!(get_cookie(&headers, DISMISS_COOKIE).as_deref(), Some("42"));
    }
}
