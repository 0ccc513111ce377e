pub mod banner;
pub mod health;
pub mod metrics;
pub mod notifications;

use axum::{
    http::{header, HeaderName, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use tower_http::cors::{AllowHeaders, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::AppState;

/// Allow the site itself plus localhost during development. Credentials are
/// allowed because the banner endpoints read and set the dismissal cookie.
fn cors_layer(app_base_url: &str) -> CorsLayer {
    let base = app_base_url.trim_end_matches('/').to_string();
    let origin = AllowOrigin::predicate(move |origin: &HeaderValue, _| {
        let Ok(o) = origin.to_str() else {
            return false;
        };
        o == base || o.starts_with("http://localhost") || o.starts_with("http://127.0.0.1")
    });

    CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers(AllowHeaders::list([
            header::CONTENT_TYPE,
            header::ACCEPT,
            HeaderName::from_static("x-admin-key"),
        ]))
        .allow_origin(origin)
        .allow_credentials(true)
}

pub fn router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.app_base_url);

    Router::new()
        .route("/health", get(health::health_check))
        .route("/metrics", get(metrics::metrics_handler))
        // Public banner
        .route("/banner", get(banner::get_banner))
        .route("/banner/dismiss", post(banner::dismiss_banner))
        .route("/banner/restore", post(banner::restore_banner))
        // Admin
        .route(
            "/admin/notifications",
            get(notifications::list_notifications).post(notifications::create_notification),
        )
        .route(
            "/admin/notifications/{id}",
            get(notifications::get_notification)
                .put(notifications::update_notification)
                .delete(notifications::delete_notification),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::Body,
        http::{HeaderMap, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;

    use super::*;
    use crate::{
        config::Config,
        services::{cache::MemoryCache, store::MemoryNotificationStore},
    };

    const ADMIN_KEY: &str = "test-admin-key";

    fn test_app() -> Router {
        let config = Arc::new(Config {
            database_url: "postgres://localhost/unused".into(),
            database_max_connections: 1,
            redis_url: "redis://127.0.0.1:6379".into(),
            host: "127.0.0.1".into(),
            port: 0,
            admin_key: Some(ADMIN_KEY.into()),
            app_base_url: "http://localhost".into(),
            cache_ttl_seconds: 86_400,
            cache_key_prefix: String::new(),
            dismiss_cookie_days: 7,
        });
        // Never connects: the banner and admin routes only use the in-process store.
        let db = PgPoolOptions::new()
            .connect_lazy(&config.database_url)
            .unwrap();
        let state = AppState::new(
            db,
            config,
            Arc::new(MemoryNotificationStore::new()),
            Arc::new(MemoryCache::new()),
        );
        router(state)
    }

    async fn send(app: &Router, req: Request<Body>) -> (StatusCode, HeaderMap, Value) {
        let res = app.clone().oneshot(req).await.unwrap();
        let status = res.status();
        let headers = res.headers().clone();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, headers, body)
    }

    fn admin(method: &str, uri: &str, body: Option<Value>) -> Request<Body> {
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("X-Admin-Key", ADMIN_KEY)
            .header(header::CONTENT_TYPE, "application/json");
        match body {
            Some(b) => builder.body(Body::from(b.to_string())).unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    fn banner_request(cookie: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri("/banner");
        if let Some(c) = cookie {
            builder = builder.header(header::COOKIE, c);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_admin_routes_require_key() {
        let app = test_app();
        let req = Request::builder()
            .method("POST")
            .uri("/admin/notifications")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json!({ "text": "x" }).to_string()))
            .unwrap();
        let (status, _, _) = send(&app, req).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let req = Request::builder()
            .uri("/admin/notifications")
            .header("X-Admin-Key", "wrong")
            .body(Body::empty())
            .unwrap();
        let (status, _, _) = send(&app, req).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_banner_shows_and_honours_dismissal_cookie() {
        let app = test_app();

        let (status, _, body) = send(&app, banner_request(None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "top_notification": null, "hide_top_notification": false }));

        let (status, _, created) = send(
            &app,
            admin(
                "POST",
                "/admin/notifications",
                Some(json!({ "text": "We are moving!", "show_this_message": true })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_ne!(created["shown_since_display"], "This message is not shown");

        let (_, _, body) = send(&app, banner_request(None)).await;
        assert_eq!(body["top_notification"]["text"], "We are moving!");
        assert_eq!(body["hide_top_notification"], false);

        let (status, headers, dismissed) = send(
            &app,
            Request::builder()
                .method("POST")
                .uri("/banner/dismiss")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let ts = dismissed["dismissed"].as_i64().unwrap();
        let set_cookie = headers[header::SET_COOKIE].to_str().unwrap();
        assert!(set_cookie.starts_with(&format!("closed_notification_timestamp={ts};")));
        assert!(set_cookie.contains("Max-Age=604800"));

        let cookie = format!("theme=dark; closed_notification_timestamp={ts}");
        let (_, _, body) = send(&app, banner_request(Some(&cookie))).await;
        assert_eq!(body["hide_top_notification"], true);

        let stale = format!("closed_notification_timestamp={}", ts - 1);
        let (_, _, body) = send(&app, banner_request(Some(&stale))).await;
        assert_eq!(body["hide_top_notification"], false);
    }

    #[tokio::test]
    async fn test_dismiss_without_banner_is_not_found() {
        let app = test_app();
        let req = Request::builder()
            .method("POST")
            .uri("/banner/dismiss")
            .body(Body::empty())
            .unwrap();
        let (status, headers, _) = send(&app, req).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(headers.get(header::SET_COOKIE).is_none());
    }

    #[tokio::test]
    async fn test_restore_expires_cookie() {
        let app = test_app();
        let req = Request::builder()
            .method("POST")
            .uri("/banner/restore")
            .body(Body::empty())
            .unwrap();
        let (status, headers, _) = send(&app, req).await;
        assert_eq!(status, StatusCode::OK);
        assert!(headers[header::SET_COOKIE]
            .to_str()
            .unwrap()
            .contains("Max-Age=0"));
    }

    #[tokio::test]
    async fn test_admin_crud_and_errors() {
        let app = test_app();

        let (status, _, body) = send(
            &app,
            admin("POST", "/admin/notifications", Some(json!({ "text": "   " }))),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("blank"));

        let (_, _, first) = send(
            &app,
            admin("POST", "/admin/notifications", Some(json!({ "text": "First" }))),
        )
        .await;
        let id = first["id"].as_i64().unwrap();
        assert_eq!(first["show_this_message"], false);
        assert_eq!(first["shown_since_display"], "This message is not shown");

        let (status, _, updated) = send(
            &app,
            admin(
                "PUT",
                &format!("/admin/notifications/{id}"),
                Some(json!({ "show_this_message": true })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["text"], "First");
        assert!(updated["shown_since"].is_string());

        send(
            &app,
            admin("POST", "/admin/notifications", Some(json!({ "text": "Second" }))),
        )
        .await;
        let (_, _, list) = send(&app, admin("GET", "/admin/notifications", None)).await;
        let list = list.as_array().unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0]["id"], id);

        let (_, _, found) =
            send(&app, admin("GET", "/admin/notifications?search=seco", None)).await;
        assert_eq!(found.as_array().unwrap().len(), 1);

        let (status, _, _) =
            send(&app, admin("DELETE", &format!("/admin/notifications/{id}"), None)).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _, _) =
            send(&app, admin("GET", &format!("/admin/notifications/{id}"), None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (_, _, body) = send(&app, banner_request(None)).await;
        assert_eq!(body["top_notification"], Value::Null);
    }
}
